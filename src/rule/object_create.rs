use std::{any::Any, collections::HashMap};

use log::debug;

use crate::{
    core::{
        bean::Bean,
        context::ParsingContext,
        rule::{Attribute, Rule},
    },
    error::DigesterError,
};

type Factory = Box<dyn Fn() -> Box<dyn Bean> + Send + Sync>;

fn boxed_factory<T: Any>(factory: impl Fn() -> T + Send + Sync + 'static) -> Factory {
    Box::new(move || Box::new(factory()) as Box<dyn Bean>)
}

/// Rule that creates a new object on element start and pushes it on the
/// stack. The object is popped again on element end.
///
/// An optional attribute (conventionally `className`) can name an alternative
/// registered with [`ObjectCreateRule::alternative`]. That attribute usually
/// sits in the skip set so the property binding leaves it alone.
pub struct ObjectCreateRule {
    factory: Factory,
    attribute_name: Option<String>,
    alternatives: HashMap<String, Factory>,
}

impl ObjectCreateRule {
    pub fn new<T: Any>(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            factory: boxed_factory(factory),
            attribute_name: None,
            alternatives: HashMap::new(),
        }
    }

    /// Creates `T::default()` for every matching element.
    pub fn of<T: Any + Default>() -> Self {
        Self::new(T::default)
    }

    /// Attribute whose value selects an alternative factory.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    pub fn alternative<T: Any>(
        mut self,
        class_name: impl Into<String>,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        self.alternatives
            .insert(class_name.into(), boxed_factory(factory));
        self
    }

    fn select(&self, attributes: &[Attribute]) -> Result<&Factory, String> {
        let Some(attribute_name) = &self.attribute_name else {
            return Ok(&self.factory);
        };
        match attributes
            .iter()
            .find(|attribute| attribute.property_name() == attribute_name)
        {
            Some(attribute) => self
                .alternatives
                .get(&attribute.value)
                .ok_or_else(|| format!("Unknown class name '{}'", attribute.value)),
            None => Ok(&self.factory),
        }
    }
}

impl Rule for ObjectCreateRule {
    fn begin(
        &self,
        ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
        attributes: &[Attribute],
    ) -> Result<(), DigesterError> {
        let factory = self.select(attributes).map_err(|message| DigesterError::Rule {
            path: ctx.matched_path().to_string(),
            message,
        })?;

        let bean = factory();
        debug!(
            "[ObjectCreateRule]{{{}}} New {}",
            ctx.matched_path(),
            bean.as_ref().bean_name()
        );
        ctx.push(bean);
        Ok(())
    }

    fn end(
        &self,
        ctx: &mut dyn ParsingContext,
        _namespace: &str,
        _name: &str,
    ) -> Result<(), DigesterError> {
        let bean = ctx.pop().ok_or_else(|| DigesterError::Rule {
            path: ctx.matched_path().to_string(),
            message: "Pop from an empty stack".to_string(),
        })?;
        debug!(
            "[ObjectCreateRule]{{{}}} Pop {}",
            ctx.matched_path(),
            bean.as_ref().bean_name()
        );
        if ctx.peek().is_none() {
            ctx.set_root(bean);
        }
        Ok(())
    }
}
