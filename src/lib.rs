//! A minimal distributed-tracing core.
//!
//! `tracewire` models immutable span contexts (trace id, span id, parent
//! linkage, sampling flag, baggage), records timed spans with tags, hands
//! finished spans to a pluggable reporter, and round-trips a span context
//! through a flat string-keyed carrier such as an HTTP header map so a trace
//! can cross a process boundary.
//!
//! Everything is in-memory and synchronous: no operation blocks or performs
//! I/O, and contexts are plain immutable values that are safe to share
//! across threads. HTTP wiring and the transport that delivers finished
//! spans to a collector belong to the caller.
//!
//! # In-process call chain
//!
//! ```
//! use tracewire::export::InMemoryReporter;
//! use tracewire::trace::Tracer;
//! use tracewire::KeyValue;
//!
//! let reporter = InMemoryReporter::default();
//! let tracer = Tracer::with_reporter(reporter.clone());
//!
//! let mut root = tracer.start_root("root-span", true);
//! let mut step = tracer.start_child(root.context(), "step-1");
//! step.set_tag(KeyValue::new("func", "step1"));
//! step.finish();
//! root.finish();
//!
//! let spans = reporter.finished_spans();
//! assert_eq!(spans.len(), 2);
//! assert_eq!(
//!     spans[0].span_context.trace_id(),
//!     spans[1].span_context.trace_id(),
//! );
//! ```
//!
//! # Crossing a process boundary
//!
//! The client injects its active context into outgoing request headers; the
//! server extracts it and derives children from the result. A request with
//! no upstream trace extracts as [`ExtractError::Missing`], which callers
//! treat as "start a new root".
//!
//! ```
//! use std::collections::HashMap;
//! use tracewire::export::InMemoryReporter;
//! use tracewire::propagation::{ExtractError, HeaderCodec};
//! use tracewire::trace::Tracer;
//!
//! let reporter = InMemoryReporter::default();
//! let tracer = Tracer::with_reporter(reporter.clone());
//! let codec = HeaderCodec::new();
//!
//! // Client side: attach the span context to the outgoing request.
//! let mut client_span = tracer.start_root("http-one-req", true);
//! let mut headers = HashMap::new();
//! codec.inject(client_span.context(), &mut headers);
//!
//! // Server side: pick the trace back up from the incoming headers.
//! let remote = codec.extract(&headers).expect("request carries a trace");
//! let mut server_span = tracer.start_child(&remote, "server-handle");
//! assert_eq!(
//!     server_span.context().trace_id(),
//!     client_span.context().trace_id(),
//! );
//! server_span.finish();
//! client_span.finish();
//!
//! // An untraced request has no context to extract.
//! let untraced: HashMap<String, String> = HashMap::new();
//! assert_eq!(codec.extract(&untraced), Err(ExtractError::Missing));
//! ```
//!
//! [`ExtractError::Missing`]: crate::propagation::ExtractError::Missing
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

pub mod baggage;
mod common;
pub mod export;
pub mod propagation;
pub mod trace;

pub use common::{Key, KeyValue, StringValue, Value};
