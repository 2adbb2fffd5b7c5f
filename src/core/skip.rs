use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
};

use crate::core::bean::Bean;

/// Attributes reserved for other rules, per target type.
///
/// When the target's type has its own entry, only that entry is consulted.
/// Otherwise the entry shared by every type applies (conventionally
/// `className`, consumed by the object creation rule).
///
/// # Examples
///
/// ```
/// use digester_rs::core::skip::SkipSet;
///
/// struct Connector;
/// struct Server;
///
/// let skip = SkipSet::new()
///     .skip_for_all(["className"])
///     .skip::<Connector>(["protocol"]);
///
/// assert!(skip.is_skipped(Some(&Server), "className"));
/// assert!(skip.is_skipped(Some(&Connector), "protocol"));
/// // Connector has its own entry, which replaces the shared one.
/// assert!(!skip.is_skipped(Some(&Connector), "className"));
/// assert!(!skip.is_skipped(None, "className"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    by_type: HashMap<TypeId, HashSet<String>>,
    any_type: HashSet<String>,
}

impl SkipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `names` on targets of type `T`.
    pub fn skip<T: Any>(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.by_type
            .entry(TypeId::of::<T>())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Reserves `names` on targets without a type specific entry.
    pub fn skip_for_all(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.any_type.extend(names.into_iter().map(Into::into));
        self
    }

    /// An absent target never skips anything.
    pub fn is_skipped(&self, target: Option<&dyn Bean>, name: &str) -> bool {
        let Some(target) = target else {
            return false;
        };
        match self.by_type.get(&Any::type_id(target.as_any())) {
            Some(names) => names.contains(name),
            None => self.any_type.contains(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.any_type.is_empty()
    }
}
