use thiserror::Error;

use crate::core::introspect::ParamType;

/// Why a single attribute could not be bound to a property.
///
/// These errors never abort a parse: the binding rule absorbs them and only
/// reports them when strict validation is enabled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("no object on top of the stack")]
    NoTarget,

    #[error("{type_name} has no settable property '{property}'")]
    NoSuchProperty {
        type_name: &'static str,
        property: String,
    },

    #[error("cannot convert '{value}' to {expected} for property '{property}'")]
    Coercion {
        property: String,
        value: String,
        expected: ParamType,
    },

    #[error("setter for property '{property}' failed: {message}")]
    Invocation { property: String, message: String },
}

#[derive(Error, Debug)]
/// Digester error
pub enum DigesterError {
    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule failed at [{path}]: {message}")]
    Rule { path: String, message: String },
}
