#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Digester for Rust

 Build live object graphs from declarative XML documents, such as the startup
 configuration of a server. A **digester** walks the document and, for every
 element, fires the **rules** registered for its path. Rules create objects,
 push them on a stack, set their properties from the element's attributes and
 link children to their parents.

 ## Core Concepts

- **Rule:** A handler with `begin`, `body` and `end` phases, fired for the elements matching its pattern.
- **Context stack:** The objects under construction. The topmost one is the target of the current element.
- **Property table:** The writable properties of a type, as a map from property name to typed setter.
- **Introspector:** The registry of property tables. It coerces the string value of an attribute into the setter's parameter type.
- **Skip set:** The attributes reserved for other rules (for example `className`), per target type.
- **Validation:** When enabled, attributes that could not be bound are reported as warnings. They never fail the parse.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| xml           | Enables the `quick-xml` based `Digester`                      |
| full          | Enables all available features                                |

 ## Getting Started
 Make sure you activated the suitable features crate on Cargo.toml:

```toml
[dependencies]
digester-rs = { version = "<version>", features = ["xml"] }
```

Then, on your main.rs:

```rust
# use digester_rs::{
#     core::{
#         introspect::{IntrospectorBuilder, PropertyTableBuilder},
#         skip::SkipSet,
#     },
#     error::DigesterError,
#     rule::object_create::ObjectCreateRule,
#     xml::DigesterBuilder,
# };
#[derive(Debug, Default)]
struct Connector {
    port: u16,
    protocol: String,
    secure: bool,
}

fn main() -> Result<(), DigesterError> {
    let introspector = IntrospectorBuilder::new()
        .table(
            PropertyTableBuilder::<Connector>::new()
                .property("port", |c: &mut Connector, v: u16| c.port = v)
                .property("protocol", |c: &mut Connector, v: String| c.protocol = v)
                .property("secure", |c: &mut Connector, v: bool| c.secure = v)
                .build(),
        )
        .build();

    let mut digester = DigesterBuilder::new()
        .validating(true) // report attributes without a property
        .skip_set(SkipSet::new().skip_for_all(["className"])) // consumed by ObjectCreateRule
        .introspector(introspector)
        .build();

    digester
        .add_rule("Connector", ObjectCreateRule::of::<Connector>())
        .add_set_properties("Connector");

    let connector: Box<Connector> =
        digester.parse_str_into(r#"<Connector port="8443" protocol="HTTP/1.1" secure="true"/>"#)?;

    assert_eq!(connector.port, 8443);
    assert_eq!(connector.protocol, "HTTP/1.1");
    assert!(connector.secure);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 */

/// Core module for binding attributes to objects
pub mod core;

/// Error types for binding and parsing
pub mod error;

#[doc(inline)]
pub use error::*;

/// Rules fired by the digester: object creation, property binding and parent linking
pub mod rule;

#[cfg(feature = "xml")]
/// This module provides the XML digester driving the rules.
pub mod xml;
