//! Mock version of the digester's diagnostic sink.
use digester_rs::core::context::DiagnosticSink;
use mockall::mock;

mock! {
    pub Sink {}
    impl DiagnosticSink for Sink {
        fn report(&self, message: &str);
    }
}
