pub mod common;

use std::{cell::Cell, sync::Arc, thread};

use common::{
    init_logger,
    mocks::MockSink,
    model::{introspector, Connector, NioConnector, Server, Service},
};
use digester_rs::{
    core::{
        bean::{downcast_bean, Bean},
        context::{DigesterContext, ParsingContext},
        introspect::{Introspector, PropertyAssigner},
        rule::{Attribute, Rule},
        skip::SkipSet,
    },
    error::BindError,
    rule::set_properties::{BindingOutcome, SetPropertiesRule},
};

/// Delegates to the real introspector and counts the calls.
struct CountingIntrospector {
    inner: Introspector,
    calls: Cell<usize>,
}

impl CountingIntrospector {
    fn new() -> Self {
        Self {
            inner: introspector(),
            calls: Cell::new(0),
        }
    }
}

impl PropertyAssigner for CountingIntrospector {
    fn try_assign(&self, target: &mut dyn Bean, name: &str, value: &str) -> Result<(), BindError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.try_assign(target, name, value)
    }
}

fn skip_set() -> SkipSet {
    SkipSet::new()
        .skip_for_all(["className"])
        .skip::<NioConnector>(["className", "protocol"])
}

fn context(validating: bool, sink: MockSink) -> DigesterContext {
    let mut ctx = DigesterContext::new(skip_set(), validating).with_sink(Box::new(sink));
    ctx.set_matched_path("Server/Service/Connector");
    ctx
}

fn silent_sink() -> MockSink {
    let mut sink = MockSink::new();
    sink.expect_report().never();
    sink
}

fn attributes(pairs: &[(&str, &str)]) -> Vec<Attribute> {
    pairs
        .iter()
        .map(|(name, value)| Attribute::qualified(*name, *value))
        .collect()
}

fn pop<T: 'static>(ctx: &mut DigesterContext) -> T {
    *downcast_bean::<T>(ctx.pop().unwrap()).unwrap()
}

#[test]
fn string_property_is_assigned() {
    init_logger();
    let rule = SetPropertiesRule::new(introspector());
    let mut ctx = context(true, silent_sink());
    ctx.push(Box::new(Service::default()));

    let outcomes = rule.bind(&mut ctx, &attributes(&[("name", "tomcat")]));

    assert_eq!(outcomes, vec![BindingOutcome::Assigned]);
    assert_eq!(pop::<Service>(&mut ctx).name, "tomcat");
}

#[test]
fn every_type_of_the_conversion_table_is_coerced() {
    init_logger();
    let rule = SetPropertiesRule::new(introspector());
    let mut ctx = context(true, silent_sink());
    ctx.push(Box::new(Connector::default()));

    let outcomes = rule.bind(
        &mut ctx,
        &attributes(&[
            ("secure", "true"),
            ("port", "42"),
            ("compressionRatio", "2.5"),
            ("separator", ";;"),
            ("protocol", "HTTP/1.1"),
            ("address", "::1"),
        ]),
    );

    assert!(outcomes.iter().all(BindingOutcome::is_assigned));
    let connector = pop::<Connector>(&mut ctx);
    assert!(connector.secure);
    assert_eq!(connector.port, 42);
    assert_eq!(connector.compression_ratio, 2.5);
    assert_eq!(connector.separator, ';');
    assert_eq!(connector.protocol, "HTTP/1.1");
    assert_eq!(connector.address, Some("::1".parse().unwrap()));
}

#[test]
fn invalid_integer_is_reported_once_and_leaves_property_unchanged() {
    init_logger();
    let mut sink = MockSink::new();
    sink.expect_report()
        .withf(|message| message.contains("[port]") && message.contains("[abc]"))
        .times(1)
        .return_const(());
    let rule = SetPropertiesRule::new(introspector());
    let mut ctx = context(true, sink);
    ctx.push(Box::new(Connector {
        port: 8080,
        ..Connector::default()
    }));

    let outcomes = rule.bind(&mut ctx, &attributes(&[("port", "abc")]));

    assert!(matches!(
        outcomes.as_slice(),
        [BindingOutcome::Unmapped(BindError::Coercion { .. })]
    ));
    assert_eq!(pop::<Connector>(&mut ctx).port, 8080);
}

#[test]
fn reserved_attribute_never_reaches_the_introspector() {
    init_logger();
    let rule = SetPropertiesRule::new(CountingIntrospector::new());
    let mut ctx = context(true, silent_sink());
    ctx.push(Box::new(Server::default()));

    let outcomes = rule.bind(&mut ctx, &attributes(&[("className", "x.Y")]));

    assert_eq!(outcomes, vec![BindingOutcome::SkippedByPolicy]);
    assert_eq!(rule_calls(&rule), 0);
}

#[test]
fn type_specific_skip_entry_replaces_the_shared_one() {
    init_logger();
    let rule = SetPropertiesRule::new(CountingIntrospector::new());
    let mut ctx = context(false, silent_sink());
    ctx.push(Box::new(NioConnector::default()));

    let outcomes = rule.bind(
        &mut ctx,
        &attributes(&[
            ("className", "x.Nio"),
            ("protocol", "HTTP/1.1"),
            ("pollerThreads", "4"),
        ]),
    );

    assert_eq!(
        outcomes,
        vec![
            BindingOutcome::SkippedByPolicy,
            BindingOutcome::SkippedByPolicy,
            BindingOutcome::Assigned,
        ]
    );
    assert_eq!(rule_calls(&rule), 1);
    assert_eq!(pop::<NioConnector>(&mut ctx).poller_threads, 4);
}

#[test]
fn empty_attribute_list_does_nothing() {
    init_logger();
    let rule = SetPropertiesRule::new(CountingIntrospector::new());
    let mut ctx = context(true, silent_sink());
    ctx.push(Box::new(Server::default()));

    assert!(rule.bind(&mut ctx, &[]).is_empty());
    assert_eq!(rule_calls(&rule), 0);
    assert_eq!(pop::<Server>(&mut ctx), Server::default());
}

#[test]
fn absent_top_object_leaves_every_attribute_unmapped() {
    init_logger();
    let rule = SetPropertiesRule::new(CountingIntrospector::new());
    let mut ctx = context(false, silent_sink());

    let outcomes = rule.bind(&mut ctx, &attributes(&[("port", "8005"), ("className", "x.Y")]));

    assert!(outcomes
        .iter()
        .all(|outcome| *outcome == BindingOutcome::Unmapped(BindError::NoTarget)));
    assert_eq!(rule_calls(&rule), 0);
}

#[test]
fn absent_top_object_is_reported_when_validating() {
    init_logger();
    let mut sink = MockSink::new();
    sink.expect_report().times(2).return_const(());
    let rule = SetPropertiesRule::new(introspector());
    let mut ctx = context(true, sink);

    let result = rule.begin(
        &mut ctx,
        "",
        "Connector",
        &attributes(&[("port", "8005"), ("protocol", "AJP/1.3")]),
    );

    assert!(result.is_ok());
}

#[test]
fn unknown_and_refused_properties_are_reported_when_validating() {
    init_logger();
    let mut sink = MockSink::new();
    sink.expect_report()
        .withf(|message| message.contains("[maxThreads]"))
        .times(1)
        .return_const(());
    sink.expect_report()
        .withf(|message| message.contains("[connectionTimeout]"))
        .times(1)
        .return_const(());
    let rule = SetPropertiesRule::new(introspector());
    let mut ctx = context(true, sink);
    ctx.push(Box::new(Connector::default()));

    let outcomes = rule.bind(
        &mut ctx,
        &attributes(&[("maxThreads", "200"), ("connectionTimeout", "0"), ("port", "8009")]),
    );

    assert!(matches!(
        outcomes[0],
        BindingOutcome::Unmapped(BindError::NoSuchProperty { .. })
    ));
    assert!(matches!(
        outcomes[1],
        BindingOutcome::Unmapped(BindError::Invocation { .. })
    ));
    assert_eq!(outcomes[2], BindingOutcome::Assigned);
    assert_eq!(pop::<Connector>(&mut ctx).connection_timeout, 0);
}

#[test]
fn binding_twice_gives_the_same_state_as_once() {
    init_logger();
    let rule = SetPropertiesRule::new(introspector());
    let list = attributes(&[
        ("port", "8443"),
        ("secure", "TRUE"),
        ("protocol", "HTTP/1.1"),
        ("connectionTimeout", "20000"),
        ("port", "8444"),
    ]);

    let mut once = context(false, silent_sink());
    once.push(Box::new(Connector::default()));
    rule.bind(&mut once, &list);

    let mut twice = context(false, silent_sink());
    twice.push(Box::new(Connector::default()));
    rule.bind(&mut twice, &list);
    rule.bind(&mut twice, &list);

    let once = pop::<Connector>(&mut once);
    assert_eq!(once.port, 8444);
    assert_eq!(once, pop::<Connector>(&mut twice));
}

#[test]
fn introspector_is_shared_between_threads() {
    init_logger();
    let shared = Arc::new(introspector());

    let ports: Vec<u16> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4_u16)
            .map(|i| {
                let rule = SetPropertiesRule::new(Arc::clone(&shared));
                scope.spawn(move || {
                    let mut ctx = DigesterContext::new(skip_set(), false);
                    ctx.push(Box::new(Connector::default()));
                    let port = (8080 + i).to_string();
                    rule.bind(&mut ctx, &[Attribute::qualified("port", port)]);
                    pop::<Connector>(&mut ctx).port
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(ports, vec![8080, 8081, 8082, 8083]);
}

fn rule_calls(rule: &SetPropertiesRule<CountingIntrospector>) -> usize {
    rule.assigner().calls.get()
}
