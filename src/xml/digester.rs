use crate::core::bean::Bean;
use crate::core::context::{DiagnosticSink, DigesterContext, ParsingContext};
use crate::core::introspect::Introspector;
use crate::core::rule::{Attribute, Rule};
use crate::core::skip::SkipSet;
use crate::error::DigesterError;
use crate::rule::set_properties::SetPropertiesRule;
use log::{debug, error};
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::any::Any;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// A builder for creating digesters.
///
/// # Examples
///
/// ```
/// use digester_rs::core::skip::SkipSet;
/// use digester_rs::xml::DigesterBuilder;
///
/// let digester = DigesterBuilder::new()
///     .validating(true)
///     .skip_set(SkipSet::new().skip_for_all(["className"]))
///     .build();
///
/// assert!(digester.is_validating());
/// ```
pub struct DigesterBuilder {
    validating: bool,
    namespace_aware: bool,
    skip_set: SkipSet,
    sink: Option<Box<dyn DiagnosticSink>>,
    introspector: Arc<Introspector>,
    capacity: usize,
}

impl Default for DigesterBuilder {
    fn default() -> Self {
        Self {
            validating: false,
            namespace_aware: false,
            skip_set: SkipSet::default(),
            sink: None,
            introspector: Arc::new(Introspector::default()),
            capacity: 8192,
        }
    }
}

impl DigesterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports attributes that could not be bound.
    pub fn validating(mut self, validating: bool) -> Self {
        self.validating = validating;
        self
    }

    /// Matches on local names and resolves namespace URIs. Otherwise the
    /// qualified names are used as written and the namespace is always empty.
    pub fn namespace_aware(mut self, namespace_aware: bool) -> Self {
        self.namespace_aware = namespace_aware;
        self
    }

    pub fn skip_set(mut self, skip_set: SkipSet) -> Self {
        self.skip_set = skip_set;
        self
    }

    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Property tables used by [`Digester::add_set_properties`].
    pub fn introspector(mut self, introspector: impl Into<Arc<Introspector>>) -> Self {
        self.introspector = introspector.into();
        self
    }

    /// Buffer capacity of the underlying reader.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Digester {
        let mut context = DigesterContext::new(self.skip_set, self.validating);
        if let Some(sink) = self.sink {
            context = context.with_sink(sink);
        }
        Digester {
            rules: Vec::new(),
            context,
            introspector: self.introspector,
            namespace_aware: self.namespace_aware,
            capacity: self.capacity,
        }
    }
}

struct RuleEntry {
    pattern: String,
    rule: Box<dyn Rule>,
}

/// State of an open element.
struct Frame {
    namespace: String,
    name: String,
    path: String,
    rules: Vec<usize>,
    text: String,
}

/// Drives XML events through the rules registered for each element path.
///
/// Patterns are element paths such as `Server/Service/Connector`, or suffix
/// wildcards such as `*/Connector`. An exact pattern wins over wildcards, and
/// among wildcards the longest one wins. The rules of the winning pattern fire
/// in registration order on element start, and in reverse order on element end.
///
/// # Examples
///
/// ```
/// use digester_rs::core::introspect::{IntrospectorBuilder, PropertyTableBuilder};
/// use digester_rs::core::skip::SkipSet;
/// use digester_rs::rule::object_create::ObjectCreateRule;
/// use digester_rs::xml::DigesterBuilder;
///
/// #[derive(Debug, Default)]
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
///
/// let mut digester = DigesterBuilder::new()
///     .skip_set(SkipSet::new().skip_for_all(["className"]))
///     .introspector(introspector)
///     .build();
/// digester
///     .add_rule("Server", ObjectCreateRule::of::<Server>())
///     .add_set_properties("Server");
///
/// let server: Box<Server> = digester
///     .parse_str_into(r#"<Server port="8005" shutdown="SHUTDOWN"/>"#)
///     .unwrap();
/// assert_eq!(server.port, 8005);
/// assert_eq!(server.shutdown, "SHUTDOWN");
/// ```
pub struct Digester {
    rules: Vec<RuleEntry>,
    context: DigesterContext,
    introspector: Arc<Introspector>,
    namespace_aware: bool,
    capacity: usize,
}

impl Digester {
    pub fn is_validating(&self) -> bool {
        self.context.validation_enabled()
    }

    pub fn is_namespace_aware(&self) -> bool {
        self.namespace_aware
    }

    pub fn add_rule(&mut self, pattern: &str, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(RuleEntry {
            pattern: pattern.to_string(),
            rule: Box::new(rule),
        });
        self
    }

    /// Binds the attributes of `pattern` elements with the digester's property tables.
    pub fn add_set_properties(&mut self, pattern: &str) -> &mut Self {
        let rule = SetPropertiesRule::new(Arc::clone(&self.introspector));
        self.add_rule(pattern, rule)
    }

    /// Seeds the stack, typically with the object the document configures.
    pub fn push<T: Any>(&mut self, bean: T) -> &mut Self {
        self.context.push(Box::new(bean));
        self
    }

    pub fn pop(&mut self) -> Option<Box<dyn Bean>> {
        self.context.pop()
    }

    pub fn peek(&self) -> Option<&dyn Bean> {
        self.context.peek()
    }

    /// Parses a document and returns its root object: the object the last
    /// creation rule popped off the stack, or else the bottom of the stack.
    ///
    /// A failed parse leaves the digester empty, ready for the next document.
    pub fn parse<R: Read>(&mut self, input: R) -> Result<Option<Box<dyn Bean>>, DigesterError> {
        let mut reader = NsReader::from_reader(BufReader::with_capacity(self.capacity, input));

        match self.read_events(&mut reader) {
            Ok(()) => {
                debug!("[Digester] End of document");
                Ok(self.context.take_root())
            }
            Err(err) => {
                error!("[Digester] Parse error: {}", err);
                self.context.clear();
                Err(err)
            }
        }
    }

    fn read_events<R: BufRead>(&mut self, reader: &mut NsReader<R>) -> Result<(), DigesterError> {
        let decoder = reader.decoder();
        let mut buffer = Vec::with_capacity(1024);
        let mut frames: Vec<Frame> = Vec::new();

        loop {
            buffer.clear();
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buffer)
                .map_err(|e| DigesterError::Xml(e.to_string()))?;
            let namespace = match resolved {
                ResolveResult::Bound(Namespace(uri)) if self.namespace_aware => {
                    decode(decoder, uri)?
                }
                _ => String::new(),
            };

            match event {
                Event::Start(ref start) => {
                    let frame = self.start_element(decoder, namespace, start, frames.last())?;
                    frames.push(frame);
                }
                Event::Empty(ref start) => {
                    let frame = self.start_element(decoder, namespace, start, frames.last())?;
                    self.end_element(frame, frames.last())?;
                }
                Event::End(_) => {
                    let frame = frames
                        .pop()
                        .ok_or_else(|| DigesterError::Xml("Unexpected end tag".to_string()))?;
                    self.end_element(frame, frames.last())?;
                }
                Event::Text(ref text) => {
                    if let Some(frame) = frames.last_mut() {
                        let text = text
                            .decode()
                            .map_err(|e| DigesterError::Xml(format!("Invalid text: {}", e)))?;
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(ref cdata) => {
                    if let Some(frame) = frames.last_mut() {
                        let text = cdata
                            .decode()
                            .map_err(|e| DigesterError::Xml(format!("Invalid CDATA: {}", e)))?;
                        frame.text.push_str(&text);
                    }
                }
                Event::GeneralRef(ref reference) => {
                    if let Some(frame) = frames.last_mut() {
                        frame.text.push_str(&resolve_reference(reference)?);
                    }
                }
                Event::Eof => break,
                _ => continue,
            }
        }

        match frames.last() {
            Some(frame) => Err(DigesterError::Xml(format!(
                "Unexpected end of document inside <{}>",
                frame.name
            ))),
            None => Ok(()),
        }
    }

    pub fn parse_str(&mut self, xml: &str) -> Result<Option<Box<dyn Bean>>, DigesterError> {
        self.parse(xml.as_bytes())
    }

    pub fn parse_path<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Option<Box<dyn Bean>>, DigesterError> {
        let file_path = path.as_ref();
        let file = File::open(file_path).map_err(|e| {
            error!("Failed to open XML file {}: {}", file_path.display(), e);
            DigesterError::Io(e)
        })?;
        self.parse(file)
    }

    /// Parses a document whose root object is a `T`.
    pub fn parse_str_into<T: Any>(&mut self, xml: &str) -> Result<Box<T>, DigesterError> {
        let root = self
            .parse_str(xml)?
            .ok_or_else(|| DigesterError::Xml("Document produced no object".to_string()))?;
        let found = root.as_ref().bean_name();
        root.into_any().downcast::<T>().map_err(|_| {
            DigesterError::Xml(format!(
                "Root object is {}, expected {}",
                found,
                std::any::type_name::<T>()
            ))
        })
    }

    fn start_element(
        &mut self,
        decoder: Decoder,
        namespace: String,
        start: &BytesStart<'_>,
        parent: Option<&Frame>,
    ) -> Result<Frame, DigesterError> {
        let name = if self.namespace_aware {
            decode(decoder, start.local_name().as_ref())?
        } else {
            decode(decoder, start.name().as_ref())?
        };
        let path = match parent {
            Some(parent) => format!("{}/{}", parent.path, name),
            None => name.clone(),
        };
        let attributes = self.attributes(decoder, start)?;
        let rules = self.matching_rules(&path);
        debug!("[Digester] begin {} ({} rules)", path, rules.len());

        self.context.set_matched_path(path.as_str());
        for &index in &rules {
            self.rules[index]
                .rule
                .begin(&mut self.context, &namespace, &name, &attributes)?;
        }

        Ok(Frame {
            namespace,
            name,
            path,
            rules,
            text: String::new(),
        })
    }

    fn end_element(&mut self, frame: Frame, parent: Option<&Frame>) -> Result<(), DigesterError> {
        debug!("[Digester] end {}", frame.path);
        self.context.set_matched_path(frame.path.as_str());

        let text = frame.text.trim();
        for &index in &frame.rules {
            self.rules[index]
                .rule
                .body(&mut self.context, &frame.namespace, &frame.name, text)?;
        }
        for &index in frame.rules.iter().rev() {
            self.rules[index]
                .rule
                .end(&mut self.context, &frame.namespace, &frame.name)?;
        }

        self.context
            .set_matched_path(parent.map(|p| p.path.as_str()).unwrap_or_default());
        Ok(())
    }

    /// Attributes in document order. Duplicates are kept.
    fn attributes(
        &self,
        decoder: Decoder,
        start: &BytesStart<'_>,
    ) -> Result<Vec<Attribute>, DigesterError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes().with_checks(false) {
            let attribute =
                attribute.map_err(|e| DigesterError::Xml(format!("Invalid attribute: {}", e)))?;
            let qname = decode(decoder, attribute.key.as_ref())?;
            let value = attribute
                .unescape_value()
                .map_err(|e| DigesterError::Xml(format!("Invalid value of {}: {}", qname, e)))?
                .into_owned();

            if !self.namespace_aware {
                attributes.push(Attribute::qualified(qname, value));
            } else if qname != "xmlns" && !qname.starts_with("xmlns:") {
                let local_name = decode(decoder, attribute.key.local_name().as_ref())?;
                attributes.push(Attribute::new(local_name, qname, value));
            }
        }
        Ok(attributes)
    }

    fn matching_rules(&self, path: &str) -> Vec<usize> {
        let indices_of = |pattern: &str| -> Vec<usize> {
            self.rules
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.pattern == pattern)
                .map(|(index, _)| index)
                .collect()
        };

        let exact = indices_of(path);
        if !exact.is_empty() {
            return exact;
        }

        let mut best: Option<&str> = None;
        for entry in &self.rules {
            let Some(suffix) = entry.pattern.strip_prefix("*/") else {
                continue;
            };
            let matches = path == suffix
                || (path.ends_with(suffix) && path[..path.len() - suffix.len()].ends_with('/'));
            if matches && best.is_none_or(|b| suffix.len() > b.len()) {
                best = Some(suffix);
            }
        }

        best.map(|suffix| indices_of(&format!("*/{}", suffix)))
            .unwrap_or_default()
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, DigesterError> {
    decoder
        .decode(bytes)
        .map(|name| name.into_owned())
        .map_err(|e| DigesterError::Xml(format!("Invalid name: {}", e)))
}

/// Character references and the five predefined entities. The digester reads
/// no DTD, so any other entity is an error.
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, DigesterError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| DigesterError::Xml(e.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|e| DigesterError::Xml(format!("Invalid entity: {}", e)))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| DigesterError::Xml(format!("Unknown entity &{};", name)))
}
