/// XML dispatch for rule-based object graph building.
///
/// This module drives `quick-xml` events through the rules registered on a
/// [`Digester`]. Each start tag fires the `begin` phase of the rules whose
/// pattern matches the element path, with the tag's attributes in document
/// order. Element text is delivered to `body`, and the end tag fires `end`.
///
/// # Examples
///
/// ```
/// use digester_rs::core::introspect::{IntrospectorBuilder, PropertyTableBuilder};
/// use digester_rs::core::skip::SkipSet;
/// use digester_rs::rule::object_create::ObjectCreateRule;
/// use digester_rs::rule::set_next::SetNextRule;
/// use digester_rs::xml::DigesterBuilder;
///
/// #[derive(Debug, Default)]
/// struct Service {
///     name: String,
///     engines: Vec<Engine>,
/// }
///
/// #[derive(Debug, Default, Clone)]
/// struct Engine {
///     name: String,
///     default_host: String,
/// }
///
/// let introspector = IntrospectorBuilder::new()
///     .table(
///         PropertyTableBuilder::<Service>::new()
///             .property("name", |s: &mut Service, v: String| s.name = v)
///             .build(),
///     )
///     .table(
///         PropertyTableBuilder::<Engine>::new()
///             .property("name", |e: &mut Engine, v: String| e.name = v)
///             .property("defaultHost", |e: &mut Engine, v: String| e.default_host = v)
///             .build(),
///     )
///     .build();
///
/// let mut digester = DigesterBuilder::new()
///     .validating(true)
///     .skip_set(SkipSet::new().skip_for_all(["className"]))
///     .introspector(introspector)
///     .build();
///
/// digester
///     .add_rule("Service", ObjectCreateRule::of::<Service>())
///     .add_set_properties("Service")
///     .add_rule("Service/Engine", ObjectCreateRule::of::<Engine>())
///     .add_set_properties("Service/Engine")
///     .add_rule(
///         "Service/Engine",
///         SetNextRule::new(|service: &mut Service, engine: &mut Engine| {
///             service.engines.push(engine.clone())
///         }),
///     );
///
/// let xml = r#"
/// <Service name="Catalina">
///   <Engine name="Catalina" defaultHost="localhost" className="org.example.Engine"/>
/// </Service>
/// "#;
///
/// let service = digester.parse_str_into::<Service>(xml).unwrap();
/// assert_eq!(service.name, "Catalina");
/// assert_eq!(service.engines.len(), 1);
/// assert_eq!(service.engines[0].default_host, "localhost");
/// ```
pub mod digester;

pub use digester::{Digester, DigesterBuilder};
