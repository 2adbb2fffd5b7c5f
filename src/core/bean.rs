use std::{
    any::{type_name, Any},
    fmt,
};

/// A target object living on the digester stack.
///
/// Every `'static` type is a `Bean`, so any struct can be created by a rule,
/// pushed on the stack and populated from attributes without extra derives.
///
/// Always call these methods on a `&dyn Bean` / `&mut dyn Bean` (for example
/// through `Box::as_mut`), never directly on a `Box<dyn Bean>`: the box is a
/// `Bean` too and would answer for itself.
pub trait Bean: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Runtime type name, used in diagnostics.
    fn bean_name(&self) -> &'static str;
}

impl<T: Any> Bean for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn bean_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl fmt::Debug for dyn Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bean({})", self.bean_name())
    }
}

/// Downcasts a boxed bean back to its concrete type.
pub fn downcast_bean<T: Any>(bean: Box<dyn Bean>) -> Result<Box<T>, Box<dyn Any>> {
    bean.into_any().downcast::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Engine {
        cylinders: u8,
    }

    #[test]
    fn bean_name_reports_concrete_type() {
        let bean: Box<dyn Bean> = Box::new(Engine::default());
        assert!(bean.as_ref().bean_name().ends_with("Engine"));
    }

    #[test]
    fn as_any_mut_reaches_concrete_value() {
        let mut bean: Box<dyn Bean> = Box::new(Engine::default());
        if let Some(engine) = bean.as_mut().as_any_mut().downcast_mut::<Engine>() {
            engine.cylinders = 6;
        }
        let engine = downcast_bean::<Engine>(bean).unwrap();
        assert_eq!(engine.cylinders, 6);
    }

    #[test]
    fn debug_shows_the_type_name() {
        let bean: Option<Box<dyn Bean>> = Some(Box::new(Engine::default()));
        let rendered = format!("{:?}", bean);
        assert!(rendered.starts_with("Some(Bean("));
        assert!(rendered.ends_with("Engine))"));
    }

    #[test]
    fn downcast_to_wrong_type_fails() {
        let bean: Box<dyn Bean> = Box::new(Engine::default());
        assert!(downcast_bean::<String>(bean).is_err());
    }
}
