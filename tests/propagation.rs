//! End-to-end exercises of the two classic call shapes: an in-process call
//! chain and a cross-process hop where the trace travels through request
//! headers.

use std::collections::HashMap;

use tracewire::export::InMemoryReporter;
use tracewire::propagation::{ExtractError, HeaderCodec};
use tracewire::trace::Tracer;
use tracewire::{KeyValue, StringValue};

#[test]
fn local_call_chain_forms_one_trace() {
    let reporter = InMemoryReporter::new();
    let tracer = Tracer::with_reporter(reporter.clone());

    let mut root = tracer.start_root("root-span", true);
    for (name, func) in [("step-1", "step1"), ("step-2", "step2"), ("step-3", "step3")] {
        let mut step = tracer.start_child(root.context(), name);
        step.set_tag(KeyValue::new("func", func));
        step.finish();
    }
    let root_context = root.context().clone();
    root.finish();

    let spans = reporter.finished_spans();
    assert_eq!(spans.len(), 4);
    for span in &spans {
        assert_eq!(span.span_context.trace_id(), root_context.trace_id());
    }

    let step_names: Vec<_> = spans[..3].iter().map(|s| s.name.as_ref()).collect();
    assert_eq!(step_names, vec!["step-1", "step-2", "step-3"]);
    for step in &spans[..3] {
        assert_eq!(
            step.span_context.parent_span_id(),
            Some(root_context.span_id())
        );
    }
    assert_eq!(spans[3].name, "root-span");
    assert_eq!(spans[3].span_context.parent_span_id(), None);
}

#[test]
fn remote_call_chain_continues_the_trace_across_headers() {
    let codec = HeaderCodec::new();

    // Client process: a request span under a local root, injected into the
    // outgoing request headers.
    let client_reporter = InMemoryReporter::new();
    let client_tracer = Tracer::with_reporter(client_reporter.clone());

    let cross = client_tracer.start_root("cross-span", true);
    let mut request_span = client_tracer.start_child(cross.context(), "http-one-req");
    let mut headers: HashMap<String, String> = HashMap::new();
    headers.insert("host".to_string(), "localhost:8999".to_string());
    codec.inject(request_span.context(), &mut headers);

    // Server process: its own tracer and reporter, picking the trace up
    // from the incoming headers.
    let server_reporter = InMemoryReporter::new();
    let server_tracer = Tracer::with_reporter(server_reporter.clone());

    let wire_context = codec.extract(&headers).expect("request carries a trace");
    let mut server_root = server_tracer.start_child(&wire_context, "server-two-http-root");
    let mut handle = server_tracer.start_child(server_root.context(), "server-handle");
    handle.set_tag(KeyValue::new("func", "handle"));
    handle.finish();
    server_root.finish();

    request_span.finish();
    drop(cross);

    // Both processes observed the same trace.
    let client_spans = client_reporter.finished_spans();
    let server_spans = server_reporter.finished_spans();
    assert_eq!(client_spans.len(), 2);
    assert_eq!(server_spans.len(), 2);

    let trace_id = client_spans[0].span_context.trace_id();
    for span in client_spans.iter().chain(server_spans.iter()) {
        assert_eq!(span.span_context.trace_id(), trace_id);
    }

    // The server's top span parents to the client's request span.
    let request_context = client_spans
        .iter()
        .find(|s| s.name == "http-one-req")
        .map(|s| s.span_context.clone())
        .unwrap();
    let server_root_data = server_spans
        .iter()
        .find(|s| s.name == "server-two-http-root")
        .unwrap();
    assert_eq!(
        server_root_data.span_context.parent_span_id(),
        Some(request_context.span_id())
    );
    assert!(server_root_data.span_context.is_sampled());

    // The carrier's unrelated keys survived injection.
    assert_eq!(headers.get("host").map(String::as_str), Some("localhost:8999"));
}

#[test]
fn baggage_set_on_the_server_travels_downstream_not_upstream() {
    let codec = HeaderCodec::new();
    let reporter = InMemoryReporter::new();
    let tracer = Tracer::with_reporter(reporter.clone());

    let client = tracer.start_root("client", true);
    let mut headers: HashMap<String, String> = HashMap::new();
    codec.inject(client.context(), &mut headers);

    let wire_context = codec.extract(&headers).unwrap();
    let enriched = wire_context
        .with_baggage_item("params", "a very long string")
        .with_baggage_item("err", "a error with detail information");
    let downstream = tracer.start_child(&enriched, "server-handle");

    assert_eq!(
        downstream.context().baggage_item("params"),
        Some(&StringValue::from("a very long string"))
    );
    // The already-extracted wire context is unchanged.
    assert!(wire_context.baggage_item("params").is_none());
    // And so is the client's context.
    assert!(client.context().baggage_item("params").is_none());

    // A second hop carries the enriched baggage onward.
    let mut next_hop: HashMap<String, String> = HashMap::new();
    codec.inject(downstream.context(), &mut next_hop);
    let next_context = codec.extract(&next_hop).unwrap();
    assert_eq!(
        next_context.baggage_item("err"),
        Some(&StringValue::from("a error with detail information"))
    );
}

#[test]
fn untraced_request_falls_back_to_a_new_root() {
    let codec = HeaderCodec::new();
    let reporter = InMemoryReporter::new();
    let tracer = Tracer::with_reporter(reporter.clone());

    let headers: HashMap<String, String> =
        [("host".to_string(), "localhost:8999".to_string())].into();

    let span = match codec.extract(&headers) {
        Ok(remote) => tracer.start_child(&remote, "server-two-http-root"),
        Err(ExtractError::Missing) => tracer.start_root("server-two-http-root", true),
        Err(err) => panic!("unexpected extract error: {err}"),
    };

    assert_eq!(span.context().parent_span_id(), None);
    drop(span);
    assert_eq!(reporter.finished_spans().len(), 1);
}

#[test]
fn corrupt_headers_are_recoverable() {
    let codec = HeaderCodec::new();

    let headers: HashMap<String, String> = [
        ("tracewire-trace-id".to_string(), "not-a-number".to_string()),
        ("tracewire-span-id".to_string(), "1".to_string()),
    ]
    .into();

    match codec.extract(&headers) {
        Err(ExtractError::Malformed(_)) => {}
        other => panic!("expected malformed error, got {other:?}"),
    }
}
