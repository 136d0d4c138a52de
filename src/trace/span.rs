use crate::export::{SpanData, SpanReporter};
use crate::trace::SpanContext;
use crate::KeyValue;
use std::borrow::Cow;
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::SystemTime;

/// A timed record of one logical operation within a trace.
///
/// A span is owned exclusively by the code region between its creation and
/// its finish call. Finishing stamps the end time and hands the sealed record
/// to the reporter exactly once; dropping an unfinished span finishes it, so
/// every exit path (including error paths and abandoned operations) reports.
pub struct Span {
    context: SpanContext,
    name: Cow<'static, str>,
    start_time: SystemTime,
    end_time: Option<SystemTime>,
    tags: Vec<KeyValue>,
    reporter: Arc<dyn SpanReporter>,
}

impl Span {
    pub(crate) fn new(
        context: SpanContext,
        name: Cow<'static, str>,
        reporter: Arc<dyn SpanReporter>,
    ) -> Self {
        Span {
            context,
            name,
            start_time: SystemTime::now(),
            end_time: None,
            tags: Vec::new(),
            reporter,
        }
    }

    /// The [`SpanContext`] identifying this span. This is what gets injected
    /// into a carrier to continue the trace in another process.
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a tag on this span.
    ///
    /// Tags set after the span has finished are discarded; the record is
    /// already sealed.
    pub fn set_tag(&mut self, tag: KeyValue) {
        if self.end_time.is_none() {
            self.tags.push(tag);
        }
    }

    /// Returns `true` once the span has been finished.
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Finish the span, stamping the end time and reporting it.
    ///
    /// Calling `finish` more than once has no effect after the first call.
    pub fn finish(&mut self) {
        self.finish_with_timestamp(SystemTime::now());
    }

    /// Finish the span with an explicit end timestamp.
    pub fn finish_with_timestamp(&mut self, timestamp: SystemTime) {
        if self.end_time.is_some() {
            return;
        }
        self.end_time = Some(timestamp);
        self.reporter.report(SpanData {
            span_context: self.context.clone(),
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: timestamp,
            tags: mem::take(&mut self.tags),
        });
    }
}

impl Drop for Span {
    /// Finish the span on drop if it was not explicitly finished, so that
    /// abandoned operations still report.
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("finished", &self.end_time.is_some())
            .finish()
    }
}
