//! Span reporters.
//!
//! A [`SpanReporter`] is the sink that receives finished spans. Transport to
//! a collector, batching, and retry/drop policy under backpressure all live
//! behind this trait; the tracing core only requires that a reporter accept a
//! finished [`SpanData`] record.
use crate::trace::SpanContext;
use crate::KeyValue;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// `SpanData` contains all the information collected by a [`Span`] and is the
/// standard input handed to reporters.
///
/// [`Span`]: crate::trace::Span
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// The propagatable identity of this span, including parent linkage and
    /// baggage.
    pub span_context: SpanContext,
    /// Operation name
    pub name: Cow<'static, str>,
    /// Span start time
    pub start_time: SystemTime,
    /// Span end time
    pub end_time: SystemTime,
    /// Span tags
    pub tags: Vec<KeyValue>,
}

/// The interface collector-facing sinks must implement so that they can be
/// plugged into a [`Tracer`].
///
/// `report` is called exactly once per span, when the span finishes. It must
/// not fail: a reporter that cannot deliver a span decides its own drop
/// policy and must not panic the caller.
///
/// [`Tracer`]: crate::trace::Tracer
pub trait SpanReporter: Send + Sync + Debug {
    /// Accept a finished span.
    fn report(&self, span: SpanData);
}

/// A reporter that discards every span.
///
/// Useful as a stand-in when no collector is configured.
#[derive(Clone, Debug, Default)]
pub struct NoopReporter {
    _private: (),
}

impl NoopReporter {
    /// Create a new `NoopReporter`.
    pub fn new() -> Self {
        NoopReporter { _private: () }
    }
}

impl SpanReporter for NoopReporter {
    fn report(&self, _span: SpanData) {}
}

/// An in-memory reporter that stores finished spans.
///
/// Useful for testing and debugging. Finished spans can be retrieved with
/// [`finished_spans`].
///
/// # Examples
///
/// ```
/// use tracewire::export::InMemoryReporter;
/// use tracewire::trace::Tracer;
///
/// let reporter = InMemoryReporter::default();
/// let tracer = Tracer::with_reporter(reporter.clone());
///
/// tracer.start_root("say hello", true).finish();
///
/// let spans = reporter.finished_spans();
/// assert_eq!(spans.len(), 1);
/// assert_eq!(spans[0].name, "say hello");
/// ```
///
/// [`finished_spans`]: InMemoryReporter::finished_spans
#[derive(Clone, Debug, Default)]
pub struct InMemoryReporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemoryReporter {
    /// Create a new, empty `InMemoryReporter`.
    pub fn new() -> Self {
        InMemoryReporter::default()
    }

    /// Returns the finished spans as a vector of [`SpanData`].
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.spans.lock().map(|mut spans| spans.clear());
    }
}

impl SpanReporter for InMemoryReporter {
    fn report(&self, span: SpanData) {
        let _ = self.spans.lock().map(|mut spans| spans.push(span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::SpanContext;

    fn test_span(name: &'static str) -> SpanData {
        let now = SystemTime::now();
        SpanData {
            span_context: SpanContext::new_root(true),
            name: Cow::Borrowed(name),
            start_time: now,
            end_time: now,
            tags: Vec::new(),
        }
    }

    #[test]
    fn in_memory_reporter_collects_and_resets() {
        let reporter = InMemoryReporter::new();
        reporter.report(test_span("one"));
        reporter.report(test_span("two"));

        let spans = reporter.finished_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "one");
        assert_eq!(spans[1].name, "two");

        reporter.reset();
        assert!(reporter.finished_spans().is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let reporter = InMemoryReporter::new();
        let clone = reporter.clone();
        clone.report(test_span("shared"));
        assert_eq!(reporter.finished_spans().len(), 1);
    }
}
