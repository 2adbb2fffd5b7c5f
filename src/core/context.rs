use log::{debug, warn};

use crate::core::{bean::Bean, skip::SkipSet};

/// Receiver of the warnings emitted while rules fire.
pub trait DiagnosticSink {
    fn report(&self, message: &str);
}

/// What a rule sees of the digester while it fires.
///
/// The stack is a plain LIFO of owned beans: rules push on element start and
/// pop on element end.
pub trait ParsingContext {
    fn peek(&self) -> Option<&(dyn Bean + 'static)>;

    fn peek_mut(&mut self) -> Option<&mut (dyn Bean + 'static)>;

    /// Parent (second from top) and child (top), borrowed together.
    fn peek_parent_and_top(
        &mut self,
    ) -> Option<(&mut (dyn Bean + 'static), &mut (dyn Bean + 'static))>;

    fn push(&mut self, bean: Box<dyn Bean>);

    fn pop(&mut self) -> Option<Box<dyn Bean>>;

    /// Keeps `root` as the result of the parse.
    fn set_root(&mut self, root: Box<dyn Bean>);

    /// Slash separated path of the element being processed.
    fn matched_path(&self) -> &str;

    fn is_skipped(&self, target: Option<&dyn Bean>, name: &str) -> bool;

    fn validation_enabled(&self) -> bool;

    fn report_warning(&self, message: &str);
}

/// Stack based [`ParsingContext`] used by the digester.
#[derive(Default)]
pub struct DigesterContext {
    stack: Vec<Box<dyn Bean>>,
    root: Option<Box<dyn Bean>>,
    match_path: String,
    skip_set: SkipSet,
    validating: bool,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl DigesterContext {
    pub fn new(skip_set: SkipSet, validating: bool) -> Self {
        Self {
            skip_set,
            validating,
            ..Self::default()
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_matched_path(&mut self, path: impl Into<String>) {
        self.match_path = path.into();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drops the stack, the retained root and the match path.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.root = None;
        self.match_path.clear();
    }

    /// Takes the parse result: the retained root, or else the bottom of the
    /// stack. Whatever else is left on the stack is dropped.
    pub fn take_root(&mut self) -> Option<Box<dyn Bean>> {
        let bottom = if self.stack.is_empty() {
            None
        } else {
            Some(self.stack.remove(0))
        };
        if !self.stack.is_empty() {
            debug!("Dropping {} objects left on the stack", self.stack.len());
            self.stack.clear();
        }
        self.root.take().or(bottom)
    }
}

impl ParsingContext for DigesterContext {
    fn peek(&self) -> Option<&(dyn Bean + 'static)> {
        self.stack.last().map(|bean| &**bean)
    }

    fn peek_mut(&mut self) -> Option<&mut (dyn Bean + 'static)> {
        self.stack.last_mut().map(|bean| &mut **bean)
    }

    fn peek_parent_and_top(
        &mut self,
    ) -> Option<(&mut (dyn Bean + 'static), &mut (dyn Bean + 'static))> {
        let (top, rest) = self.stack.split_last_mut()?;
        let parent = rest.last_mut()?;
        Some((&mut **parent, &mut **top))
    }

    fn push(&mut self, bean: Box<dyn Bean>) {
        debug!("Push {}", bean.as_ref().bean_name());
        self.stack.push(bean);
    }

    fn pop(&mut self) -> Option<Box<dyn Bean>> {
        let bean = self.stack.pop();
        if let Some(bean) = &bean {
            debug!("Pop {}", bean.as_ref().bean_name());
        }
        bean
    }

    fn set_root(&mut self, root: Box<dyn Bean>) {
        self.root = Some(root);
    }

    fn matched_path(&self) -> &str {
        &self.match_path
    }

    fn is_skipped(&self, target: Option<&dyn Bean>, name: &str) -> bool {
        self.skip_set.is_skipped(target, name)
    }

    fn validation_enabled(&self) -> bool {
        self.validating
    }

    fn report_warning(&self, message: &str) {
        warn!("{}", message);
        if let Some(sink) = &self.sink {
            sink.report(message);
        }
    }
}
