//! Types for tracking the progression of a single request as it is handled
//! by the services that make up an application.
//!
//! A trace is a tree of [`Span`]s sharing one trace id. Each span times one
//! logical operation and carries a [`SpanContext`]: the identifiers and
//! baggage that tie it into the tree and that a codec can move across a
//! process boundary.
//!
//! The API consists of three main types:
//!
//! * [`Tracer`]s create spans and hand finished ones to a reporter.
//! * [`Span`]s time an operation and collect its tags.
//! * [`SpanContext`]s are the immutable, propagatable identity of a span.
//!
//! Context flows by explicit parameter passing: a caller derives children
//! from a parent context it holds, and crosses process boundaries via
//! [`HeaderCodec`]. There is no thread-local "current span".
//!
//! [`HeaderCodec`]: crate::propagation::HeaderCodec

mod span;
mod span_context;
mod tracer;

pub use self::{
    span::Span,
    span_context::{SpanContext, SpanId, TraceFlags, TraceId},
    tracer::Tracer,
};
