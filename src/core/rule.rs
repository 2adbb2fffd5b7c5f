use crate::{core::context::ParsingContext, error::DigesterError};

/// One attribute of a start tag, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local part of the name. Empty when the parser is not namespace aware.
    pub local_name: String,
    /// Name as written in the document, prefix included.
    pub qname: String,
    /// Unescaped value.
    pub value: String,
}

impl Attribute {
    pub fn new(local_name: impl Into<String>, qname: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            qname: qname.into(),
            value: value.into(),
        }
    }

    /// Attribute of a non namespace aware parser: only the qualified name is known.
    pub fn qualified(qname: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(String::new(), qname, value)
    }

    /// Name to bind: the local name, or the qualified name when it is empty.
    pub fn property_name(&self) -> &str {
        if self.local_name.is_empty() {
            &self.qname
        } else {
            &self.local_name
        }
    }
}

/// Handler fired by the digester for elements matching its pattern.
///
/// `begin` fires on the start tag, `body` with the element's text and `end` on
/// the end tag. Every phase defaults to doing nothing.
pub trait Rule {
    fn begin(
        &self,
        _ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
        _attributes: &[Attribute],
    ) -> Result<(), DigesterError> {
        Ok(())
    }

    fn body(
        &self,
        _ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
        _text: &str,
    ) -> Result<(), DigesterError> {
        Ok(())
    }

    fn end(
        &self,
        _ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
    ) -> Result<(), DigesterError> {
        Ok(())
    }
}
