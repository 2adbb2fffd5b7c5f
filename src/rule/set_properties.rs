use std::{fmt, sync::Arc};

use log::debug;

use crate::{
    core::{
        context::ParsingContext,
        introspect::{Introspector, PropertyAssigner},
        rule::{Attribute, Rule},
    },
    error::{BindError, DigesterError},
};

/// What happened to one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingOutcome {
    /// A setter accepted the value.
    Assigned,
    /// The attribute is reserved for another rule and was not looked up.
    SkippedByPolicy,
    /// No setter took the value; the error says why.
    Unmapped(BindError),
}

impl BindingOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, BindingOutcome::Assigned)
    }
}

/// Rule that sets properties on the object at the top of the stack, based on
/// attributes with corresponding names.
///
/// Attributes reserved by the context's skip set are left alone. Any other
/// attribute that cannot be bound is only reported, as a warning, when
/// validation is enabled: binding never fails the parse.
///
/// # Examples
///
/// ```
/// use digester_rs::core::context::{DigesterContext, ParsingContext};
/// use digester_rs::core::introspect::{IntrospectorBuilder, PropertyTableBuilder};
/// use digester_rs::core::rule::{Attribute, Rule};
/// use digester_rs::core::skip::SkipSet;
/// use digester_rs::rule::set_properties::SetPropertiesRule;
///
/// #[derive(Default)]
/// struct Server {
///     port: u16,
///     shutdown: String,
/// }
///
/// let introspector = IntrospectorBuilder::new()
///     .table(
///         PropertyTableBuilder::<Server>::new()
///             .property("port", |s: &mut Server, v: u16| s.port = v)
///             .property("shutdown", |s: &mut Server, v: String| s.shutdown = v)
///             .build(),
///     )
///     .build();
/// let rule = SetPropertiesRule::new(introspector);
///
/// let mut ctx = DigesterContext::new(SkipSet::new().skip_for_all(["className"]), true);
/// ctx.push(Box::new(Server::default()));
///
/// let attributes = vec![
///     Attribute::qualified("port", "8005"),
///     Attribute::qualified("shutdown", "SHUTDOWN"),
///     Attribute::qualified("className", "org.example.Server"),
/// ];
/// rule.begin(&mut ctx, "", "Server", &attributes).unwrap();
///
/// let server = ctx.pop().unwrap().into_any().downcast::<Server>().unwrap();
/// assert_eq!(server.port, 8005);
/// assert_eq!(server.shutdown, "SHUTDOWN");
/// ```
pub struct SetPropertiesRule<A = Arc<Introspector>> {
    assigner: A,
}

impl<A: PropertyAssigner> SetPropertiesRule<A> {
    pub fn new(assigner: A) -> Self {
        Self { assigner }
    }

    pub fn assigner(&self) -> &A {
        &self.assigner
    }

    /// Binds every attribute, in document order, to the top of the stack.
    pub fn bind(&self, ctx: &mut dyn ParsingContext, attributes: &[Attribute]) -> Vec<BindingOutcome> {
        let path = ctx.matched_path().to_string();
        match ctx.peek() {
            Some(top) => debug!("[SetPropertiesRule]{{{}}} Set {} properties", path, top.bean_name()),
            None => debug!("[SetPropertiesRule]{{{}}} Set NULL properties", path),
        }

        let skipped: Vec<bool> = attributes
            .iter()
            .map(|attribute| ctx.is_skipped(ctx.peek(), attribute.property_name()))
            .collect();

        let mut outcomes = Vec::with_capacity(attributes.len());
        let mut top = ctx.peek_mut();
        for (attribute, skipped) in attributes.iter().zip(skipped) {
            let name = attribute.property_name();
            debug!(
                "[SetPropertiesRule]{{{}}} Setting property '{}' to '{}'",
                path, name, attribute.value
            );

            let outcome = if skipped {
                BindingOutcome::SkippedByPolicy
            } else {
                match top.as_deref_mut() {
                    Some(target) => match self.assigner.try_assign(target, name, &attribute.value) {
                        Ok(()) => BindingOutcome::Assigned,
                        Err(err) => BindingOutcome::Unmapped(err),
                    },
                    None => BindingOutcome::Unmapped(BindError::NoTarget),
                }
            };
            outcomes.push(outcome);
        }

        if ctx.validation_enabled() {
            for (attribute, outcome) in attributes.iter().zip(&outcomes) {
                if let BindingOutcome::Unmapped(err) = outcome {
                    debug!("[SetPropertiesRule]{{{}}} {}", path, err);
                    ctx.report_warning(&format!(
                        "Match [{}] failed to set property [{}] to [{}]",
                        path,
                        attribute.property_name(),
                        attribute.value
                    ));
                }
            }
        }

        outcomes
    }
}

impl<A: PropertyAssigner> Rule for SetPropertiesRule<A> {
    fn begin(
        &self,
        ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
        attributes: &[Attribute],
    ) -> Result<(), DigesterError> {
        self.bind(ctx, attributes);
        Ok(())
    }
}

impl<A> fmt::Display for SetPropertiesRule<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetPropertiesRule[]")
    }
}
