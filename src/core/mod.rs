/// Type erased handle for the objects built by a parse
pub mod bean;

/// Stack of objects under construction, as seen by rules
pub mod context;

/// Property tables, type coercion and assignment
pub mod introspect;

/// Rule lifecycle and start tag attributes
pub mod rule;

/// Attributes reserved for other rules
pub mod skip;
