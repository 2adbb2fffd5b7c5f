use std::any::{type_name, Any};

use log::debug;

use crate::{
    core::{bean::Bean, context::ParsingContext, rule::Rule},
    error::DigesterError,
};

type LinkFn = dyn Fn(&mut dyn Bean, &mut dyn Bean) -> bool + Send + Sync;

/// Rule that hands the top object to its parent on element end.
///
/// It must be registered after the [`ObjectCreateRule`](super::object_create::ObjectCreateRule)
/// of the same pattern, so that it fires before the child is popped.
pub struct SetNextRule {
    link: Box<LinkFn>,
    parent_type: &'static str,
    child_type: &'static str,
}

impl SetNextRule {
    pub fn new<P: Any, C: Any>(link: impl Fn(&mut P, &mut C) + Send + Sync + 'static) -> Self {
        let link = move |parent: &mut dyn Bean, child: &mut dyn Bean| {
            match (
                parent.as_any_mut().downcast_mut::<P>(),
                child.as_any_mut().downcast_mut::<C>(),
            ) {
                (Some(parent), Some(child)) => {
                    link(parent, child);
                    true
                }
                _ => false,
            }
        };
        Self {
            link: Box::new(link),
            parent_type: type_name::<P>(),
            child_type: type_name::<C>(),
        }
    }
}

impl Rule for SetNextRule {
    fn end(
        &self,
        ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
    ) -> Result<(), DigesterError> {
        let path = ctx.matched_path().to_string();
        let warning = match ctx.peek_parent_and_top() {
            Some((parent, child)) => {
                let found = (Bean::bean_name(&*parent), Bean::bean_name(&*child));
                if (self.link)(parent, child) {
                    debug!("[SetNextRule]{{{}}} Linked {} to {}", path, found.1, found.0);
                    None
                } else {
                    Some(format!(
                        "[SetNextRule]{{{}}} Expected {} under {}, found {} under {}",
                        path, self.child_type, self.parent_type, found.1, found.0
                    ))
                }
            }
            None => Some(format!(
                "[SetNextRule]{{{}}} No parent for the top object",
                path
            )),
        };

        if let Some(message) = warning {
            ctx.report_warning(&message);
        }
        Ok(())
    }
}
