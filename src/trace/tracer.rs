use crate::export::SpanReporter;
use crate::trace::{Span, SpanContext};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Creates spans and hands finished ones to a [`SpanReporter`].
///
/// A `Tracer` is a cheap, cloneable handle. Construct one at process start
/// and pass it down explicitly; there is deliberately no process-wide
/// "current tracer" and no ambient mutable state.
///
/// # Examples
///
/// ```
/// use tracewire::export::InMemoryReporter;
/// use tracewire::trace::Tracer;
/// use tracewire::KeyValue;
///
/// let reporter = InMemoryReporter::default();
/// let tracer = Tracer::with_reporter(reporter.clone());
///
/// let mut root = tracer.start_root("root-span", true);
/// let mut step = tracer.start_child(root.context(), "step-1");
/// step.set_tag(KeyValue::new("func", "step1"));
/// step.finish();
/// root.finish();
///
/// assert_eq!(reporter.finished_spans().len(), 2);
/// ```
#[derive(Clone)]
pub struct Tracer {
    reporter: Arc<dyn SpanReporter>,
}

impl Tracer {
    /// Create a new `Tracer` reporting to the given sink.
    pub fn new(reporter: Arc<dyn SpanReporter>) -> Self {
        Tracer { reporter }
    }

    /// Create a new `Tracer` from an owned reporter.
    pub fn with_reporter<R>(reporter: R) -> Self
    where
        R: SpanReporter + 'static,
    {
        Tracer::new(Arc::new(reporter))
    }

    /// Start the root span of a new trace.
    ///
    /// The sampling decision is fixed here and inherited by every descendant
    /// span of the trace.
    pub fn start_root<T>(&self, name: T, sampled: bool) -> Span
    where
        T: Into<Cow<'static, str>>,
    {
        Span::new(SpanContext::new_root(sampled), name.into(), self.reporter.clone())
    }

    /// Start a span as a child of `parent`.
    ///
    /// `parent` may be a local context or one extracted from a carrier by a
    /// codec; either way the child joins the parent's trace and inherits its
    /// sampling flag and baggage.
    pub fn start_child<T>(&self, parent: &SpanContext, name: T) -> Span
    where
        T: Into<Cow<'static, str>>,
    {
        Span::new(parent.new_child(), name.into(), self.reporter.clone())
    }

    /// Start a root span, call `f` with it, and guarantee the span finishes
    /// when `f` returns or unwinds.
    pub fn in_span<T, F, R>(&self, name: T, sampled: bool, f: F) -> R
    where
        T: Into<Cow<'static, str>>,
        F: FnOnce(&mut Span) -> R,
    {
        let mut span = self.start_root(name, sampled);
        let result = f(&mut span);
        span.finish();
        result
    }

    /// Start a child span of `parent`, call `f` with it, and guarantee the
    /// span finishes when `f` returns or unwinds.
    pub fn in_child_span<T, F, R>(&self, parent: &SpanContext, name: T, f: F) -> R
    where
        T: Into<Cow<'static, str>>,
        F: FnOnce(&mut Span) -> R,
    {
        let mut span = self.start_child(parent, name);
        let result = f(&mut span);
        span.finish();
        result
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("reporter", &self.reporter)
            .finish()
    }
}
