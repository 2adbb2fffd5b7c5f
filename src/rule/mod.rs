/// This module provides the rule creating the objects of a parse.
pub mod object_create;

/// This module provides the rule linking a child object to its parent.
pub mod set_next;

/// This module provides the rule binding attributes to properties of the top object.
pub mod set_properties;
