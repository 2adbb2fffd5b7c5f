//! Property tables and type-coerced assignment.
//!
//! Rust has no runtime reflection, so every bindable type describes its
//! writable properties once, in a [`PropertyTable`], as a map from property
//! name to typed setter closures. The [`Introspector`] keeps one table per
//! type and resolves `(target, name, value)` requests against it.
//!
//! # Examples
//!
//! ```
//! use digester_rs::core::introspect::{
//!     IntrospectorBuilder, PropertyAssigner, PropertyTableBuilder,
//! };
//!
//! #[derive(Default)]
//! struct Connector {
//!     port: u16,
//!     secure: bool,
//! }
//!
//! let introspector = IntrospectorBuilder::new()
//!     .table(
//!         PropertyTableBuilder::<Connector>::new()
//!             .property("port", |c: &mut Connector, v: u16| c.port = v)
//!             .property("secure", |c: &mut Connector, v: bool| c.secure = v)
//!             .build(),
//!     )
//!     .build();
//!
//! let mut connector = Connector::default();
//! assert!(introspector.assign(&mut connector, "port", "8080"));
//! assert!(introspector.assign(&mut connector, "secure", "TRUE"));
//! assert!(!introspector.assign(&mut connector, "port", "http"));
//! assert_eq!(connector.port, 8080);
//! assert!(connector.secure);
//! ```

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    fmt::{self, Display},
    marker::PhantomData,
    str::FromStr,
};

use log::debug;

use crate::{core::bean::Bean, error::BindError};

/// Declared parameter type of a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Integer(&'static str),
    Float(&'static str),
    Char,
    String,
    /// Any type built from a single string through `FromStr`.
    Constructed(&'static str),
}

impl Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Bool => write!(f, "bool"),
            ParamType::Integer(name) | ParamType::Float(name) => write!(f, "{}", name),
            ParamType::Char => write!(f, "char"),
            ParamType::String => write!(f, "String"),
            ParamType::Constructed(name) => write!(f, "{}", name),
        }
    }
}

/// Conversion from a raw attribute value into a setter parameter.
///
/// Implemented for the fixed conversion table: `bool`, every integer
/// primitive, `f32`, `f64`, `char` and `String`.
pub trait FromAttribute: Sized {
    fn param_type() -> ParamType;

    /// Returns `None` when the value is not a valid literal for `Self`.
    fn from_attribute(value: &str) -> Option<Self>;
}

impl FromAttribute for bool {
    fn param_type() -> ParamType {
        ParamType::Bool
    }

    fn from_attribute(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

macro_rules! from_attribute_parse {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl FromAttribute for $ty {
                fn param_type() -> ParamType {
                    ParamType::$variant(stringify!($ty))
                }

                fn from_attribute(value: &str) -> Option<Self> {
                    value.parse::<$ty>().ok()
                }
            }
        )+
    };
}

from_attribute_parse!(Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
from_attribute_parse!(Float => f32, f64);

impl FromAttribute for char {
    fn param_type() -> ParamType {
        ParamType::Char
    }

    fn from_attribute(value: &str) -> Option<Self> {
        value.chars().next()
    }
}

impl FromAttribute for String {
    fn param_type() -> ParamType {
        ParamType::String
    }

    fn from_attribute(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

type SetterFn = dyn Fn(&mut dyn Any, &str, &str) -> Result<(), BindError> + Send + Sync;
type FallbackFn = dyn Fn(&mut dyn Any, &str, &str) -> bool + Send + Sync;

/// One typed setter, erased so that tables of different types can be stored
/// side by side.
struct Setter {
    param: ParamType,
    apply: Box<SetterFn>,
}

/// The writable-property surface of one type.
pub struct PropertyTable {
    type_id: TypeId,
    type_name: &'static str,
    setters: HashMap<String, Vec<Setter>>,
    fallback: Option<Box<FallbackFn>>,
}

impl PropertyTable {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Names of the declared properties, in no particular order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    /// Parameter types of the overloads declared for `name`, in resolution order.
    pub fn param_types(&self, name: &str) -> Vec<ParamType> {
        self.setters
            .get(name)
            .map(|overloads| overloads.iter().map(|s| s.param).collect())
            .unwrap_or_default()
    }

    /// Resolves and invokes a setter for `name`.
    ///
    /// Overloads are tried in registration order and the first one whose
    /// coercion succeeds is invoked. When all of them reject the value, the
    /// coercion error of the first overload is returned. The fallback setter
    /// only answers for names without any declared overload.
    fn apply(&self, target: &mut dyn Any, name: &str, value: &str) -> Result<(), BindError> {
        let Some(overloads) = self.setters.get(name) else {
            return match &self.fallback {
                Some(fallback) if fallback(target, name, value) => Ok(()),
                _ => Err(BindError::NoSuchProperty {
                    type_name: self.type_name,
                    property: name.to_string(),
                }),
            };
        };

        let mut first_error = None;
        for setter in overloads {
            match (setter.apply)(&mut *target, name, value) {
                Ok(()) => return Ok(()),
                Err(err @ BindError::Coercion { .. }) => {
                    debug!(
                        "Overload {}({}) of {} rejected '{}'",
                        name, setter.param, self.type_name, value
                    );
                    first_error.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(first_error.unwrap_or_else(|| BindError::NoSuchProperty {
            type_name: self.type_name,
            property: name.to_string(),
        }))
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.property_names().collect();
        names.sort_unstable();
        f.debug_struct("PropertyTable")
            .field("type_name", &self.type_name)
            .field("properties", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// A builder for the property table of `T`.
///
/// # Examples
///
/// ```
/// use digester_rs::core::introspect::{ParamType, PropertyTableBuilder};
/// use std::net::IpAddr;
///
/// #[derive(Default)]
/// struct Connector {
///     address: Option<IpAddr>,
///     max_threads: usize,
/// }
///
/// let table = PropertyTableBuilder::<Connector>::new()
///     .parsed_property("address", |c: &mut Connector, v: IpAddr| c.address = Some(v))
///     .try_property("maxThreads", |c: &mut Connector, v: usize| {
///         if v == 0 {
///             return Err("must be positive");
///         }
///         c.max_threads = v;
///         Ok(())
///     })
///     .build();
///
/// assert_eq!(table.param_types("maxThreads"), vec![ParamType::Integer("usize")]);
/// ```
pub struct PropertyTableBuilder<T> {
    setters: HashMap<String, Vec<Setter>>,
    fallback: Option<Box<FallbackFn>>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T: Any> Default for PropertyTableBuilder<T> {
    fn default() -> Self {
        Self {
            setters: HashMap::new(),
            fallback: None,
            _marker: PhantomData,
        }
    }
}

impl<T: Any> PropertyTableBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property with an infallible setter.
    ///
    /// Declaring the same name again adds an overload.
    pub fn property<V, F>(self, name: &str, setter: F) -> Self
    where
        V: FromAttribute + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.try_property(name, move |target: &mut T, value: V| {
            setter(target, value);
            Ok::<(), std::convert::Infallible>(())
        })
    }

    /// Declares a property whose setter can refuse a well-typed value.
    pub fn try_property<V, E, F>(self, name: &str, setter: F) -> Self
    where
        V: FromAttribute + 'static,
        E: Display,
        F: Fn(&mut T, V) -> Result<(), E> + Send + Sync + 'static,
    {
        self.overload(name, V::param_type(), V::from_attribute, setter)
    }

    /// Declares a property whose parameter type is built from the raw string
    /// through its `FromStr` implementation.
    pub fn parsed_property<V, F>(self, name: &str, setter: F) -> Self
    where
        V: FromStr + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.overload(
            name,
            ParamType::Constructed(type_name::<V>()),
            |value: &str| value.parse::<V>().ok(),
            move |target: &mut T, value: V| {
                setter(target, value);
                Ok::<(), std::convert::Infallible>(())
            },
        )
    }

    /// Catch-all setter for names that have no declared property.
    ///
    /// It returns whether it accepted the property.
    pub fn fallback<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut T, &str, &str) -> bool + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(move |target: &mut dyn Any, name: &str, value: &str| {
            match target.downcast_mut::<T>() {
                Some(target) => setter(target, name, value),
                None => false,
            }
        }));
        self
    }

    fn overload<V, E, C, F>(mut self, name: &str, param: ParamType, coerce: C, setter: F) -> Self
    where
        V: 'static,
        E: Display,
        C: Fn(&str) -> Option<V> + Send + Sync + 'static,
        F: Fn(&mut T, V) -> Result<(), E> + Send + Sync + 'static,
    {
        let apply = move |target: &mut dyn Any, name: &str, raw: &str| {
            // Coerce before touching the target so a rejected value leaves it intact.
            let value = coerce(raw).ok_or_else(|| BindError::Coercion {
                property: name.to_string(),
                value: raw.to_string(),
                expected: param,
            })?;
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| BindError::NoSuchProperty {
                    type_name: type_name::<T>(),
                    property: name.to_string(),
                })?;
            setter(target, value).map_err(|e| BindError::Invocation {
                property: name.to_string(),
                message: e.to_string(),
            })
        };

        self.setters.entry(name.to_string()).or_default().push(Setter {
            param,
            apply: Box::new(apply),
        });
        self
    }

    pub fn build(self) -> PropertyTable {
        PropertyTable {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            setters: self.setters,
            fallback: self.fallback,
        }
    }
}

/// Assigns raw attribute values to properties of a target bean.
///
/// This is the seam between the binding rule and property resolution.
pub trait PropertyAssigner {
    fn try_assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> Result<(), BindError>;

    /// Same as [`PropertyAssigner::try_assign`], reduced to a success flag.
    fn assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> bool {
        self.try_assign(target, name, value).is_ok()
    }
}

impl<A: PropertyAssigner + ?Sized> PropertyAssigner for &A {
    fn try_assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> Result<(), BindError> {
        (**self).try_assign(target, name, value)
    }
}

impl<A: PropertyAssigner + ?Sized> PropertyAssigner for std::sync::Arc<A> {
    fn try_assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> Result<(), BindError> {
        (**self).try_assign(target, name, value)
    }
}

/// Registry of property tables, one per bindable type.
///
/// It is immutable once built, so a single instance can be shared by every
/// rule and every parse (wrap it in an `Arc`).
#[derive(Debug, Default)]
pub struct Introspector {
    tables: HashMap<TypeId, PropertyTable>,
}

impl Introspector {
    pub fn table_for(&self, target: &dyn Bean) -> Option<&PropertyTable> {
        self.tables.get(&Any::type_id(target.as_any()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl PropertyAssigner for Introspector {
    fn try_assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> Result<(), BindError> {
        let table = self
            .table_for(target)
            .ok_or_else(|| BindError::NoSuchProperty {
                type_name: Bean::bean_name(&*target),
                property: name.to_string(),
            })?;
        table.apply(target.as_any_mut(), name, value)
    }
}

#[derive(Default)]
pub struct IntrospectorBuilder {
    tables: HashMap<TypeId, PropertyTable>,
}

impl IntrospectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table; a second table for the same type replaces the first.
    pub fn table(mut self, table: PropertyTable) -> Self {
        self.tables.insert(table.type_id, table);
        self
    }

    pub fn build(self) -> Introspector {
        Introspector {
            tables: self.tables,
        }
    }
}
