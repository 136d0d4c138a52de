use crate::baggage::Baggage;
use crate::propagation::{ExtractError, Extractor, Injector};
use crate::trace::{SpanContext, SpanId, TraceFlags, TraceId};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const TRACE_ID_HEADER: &str = "tracewire-trace-id";
const SPAN_ID_HEADER: &str = "tracewire-span-id";
const SAMPLED_HEADER: &str = "tracewire-sampled";
const BAGGAGE_PREFIX: &str = "tracewire-ctx-";

const FIELDS: [&str; 3] = [TRACE_ID_HEADER, SPAN_ID_HEADER, SAMPLED_HEADER];

/// Characters escaped in baggage values so that any string survives the wire.
const BAGGAGE_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b';')
    .add(b',')
    .add(b'=')
    .add(b'%');

/// Round-trips a [`SpanContext`] through a flat string-keyed carrier.
///
/// The codec owns a reserved key namespace (wire format version 1) inside
/// the carrier:
///
/// | key                  | value                                  |
/// |----------------------|----------------------------------------|
/// | `tracewire-trace-id` | trace id, up to 32 lowercase hex chars |
/// | `tracewire-span-id`  | span id, up to 16 lowercase hex chars  |
/// | `tracewire-sampled`  | `1` or `0`                             |
/// | `tracewire-ctx-<k>`  | baggage entry `<k>`, percent-encoded   |
///
/// These names are stable for a deployment; an incompatible revision of the
/// format would change the `tracewire-` prefix. Injection writes only this
/// namespace and never removes or overwrites unrelated carrier keys. Baggage
/// keys are lowercased on the wire because carriers are typically HTTP
/// header maps, whose names are case-insensitive.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tracewire::propagation::HeaderCodec;
/// use tracewire::trace::SpanContext;
///
/// let codec = HeaderCodec::new();
/// let ctx = SpanContext::new_root(true).with_baggage_item("params", "a very long string");
///
/// let mut headers = HashMap::new();
/// codec.inject(&ctx, &mut headers);
///
/// let remote = codec.extract(&headers).unwrap();
/// assert_eq!(remote.trace_id(), ctx.trace_id());
/// assert_eq!(remote.parent_span_id(), Some(ctx.span_id()));
/// assert_eq!(remote.baggage(), ctx.baggage());
/// ```
#[derive(Clone, Debug, Default)]
pub struct HeaderCodec {
    _private: (),
}

impl HeaderCodec {
    /// Create a new `HeaderCodec`.
    pub fn new() -> Self {
        HeaderCodec { _private: () }
    }

    /// The fixed carrier keys this codec reads and writes, excluding the
    /// per-entry baggage keys.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        FIELDS.iter().copied()
    }

    /// Write `cx` into the carrier under the reserved key namespace.
    ///
    /// Injecting the same context twice yields the same carrier contents.
    /// An invalid context (zero trace or span id) injects nothing.
    pub fn inject(&self, cx: &SpanContext, injector: &mut dyn Injector) {
        if !cx.is_valid() {
            return;
        }
        injector.set(TRACE_ID_HEADER, cx.trace_id().to_string());
        injector.set(SPAN_ID_HEADER, cx.span_id().to_string());
        injector.set(
            SAMPLED_HEADER,
            if cx.is_sampled() { "1" } else { "0" }.to_string(),
        );
        for (key, value) in cx.baggage() {
            injector.set(
                &format!("{}{}", BAGGAGE_PREFIX, key),
                utf8_percent_encode(value.as_str(), BAGGAGE_ESCAPES).to_string(),
            );
        }
    }

    /// Read the reserved key namespace back into a [`SpanContext`].
    ///
    /// The extracted span id is recorded as the returned context's parent
    /// span id: children derived from it in the receiving process parent to
    /// the remote caller's span. The context is marked remote.
    ///
    /// Returns [`ExtractError::Missing`] when the mandatory trace-id and
    /// span-id keys are absent (the carrier holds no upstream trace), and
    /// [`ExtractError::Malformed`] when a mandatory key is present but
    /// unparseable. Both are recoverable; callers fall back to starting a
    /// new root.
    pub fn extract(&self, extractor: &dyn Extractor) -> Result<SpanContext, ExtractError> {
        let trace_id_hex = extractor.get(TRACE_ID_HEADER).map(str::trim);
        let span_id_hex = extractor.get(SPAN_ID_HEADER).map(str::trim);

        let (trace_id_hex, span_id_hex) = match (trace_id_hex, span_id_hex) {
            (None, None) => return Err(ExtractError::Missing),
            (Some(trace_id_hex), Some(span_id_hex)) => (trace_id_hex, span_id_hex),
            (Some(_), None) => {
                tracing::warn!(
                    header = SPAN_ID_HEADER,
                    "upstream context is missing its span id"
                );
                return Err(ExtractError::Malformed(SPAN_ID_HEADER));
            }
            (None, Some(_)) => {
                tracing::warn!(
                    header = TRACE_ID_HEADER,
                    "upstream context is missing its trace id"
                );
                return Err(ExtractError::Malformed(TRACE_ID_HEADER));
            }
        };

        let trace_id = parse_trace_id(trace_id_hex).ok_or_else(|| {
            tracing::warn!(
                header = TRACE_ID_HEADER,
                value = trace_id_hex,
                "malformed trace id in carrier"
            );
            ExtractError::Malformed(TRACE_ID_HEADER)
        })?;
        let span_id = parse_span_id(span_id_hex).ok_or_else(|| {
            tracing::warn!(
                header = SPAN_ID_HEADER,
                value = span_id_hex,
                "malformed span id in carrier"
            );
            ExtractError::Malformed(SPAN_ID_HEADER)
        })?;

        let trace_flags = match extractor.get(SAMPLED_HEADER).map(str::trim) {
            None | Some("0") => TraceFlags::NOT_SAMPLED,
            Some("1") => TraceFlags::SAMPLED,
            Some(flag) => {
                tracing::warn!(
                    header = SAMPLED_HEADER,
                    value = flag,
                    "malformed sampled flag in carrier"
                );
                return Err(ExtractError::Malformed(SAMPLED_HEADER));
            }
        };

        let baggage = extract_baggage(extractor);

        Ok(SpanContext::new(
            trace_id,
            span_id,
            Some(span_id),
            trace_flags,
            true,
            baggage,
        ))
    }
}

/// Parse a trace id from up to 32 hex chars. Zero ids are rejected.
fn parse_trace_id(hex: &str) -> Option<TraceId> {
    if hex.is_empty() || hex.len() > 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match TraceId::from_hex(hex) {
        Ok(TraceId::INVALID) | Err(_) => None,
        Ok(trace_id) => Some(trace_id),
    }
}

/// Parse a span id from up to 16 hex chars. Short values are left-padded;
/// zero ids are rejected.
fn parse_span_id(hex: &str) -> Option<SpanId> {
    if hex.is_empty() || hex.len() > 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match SpanId::from_hex(hex) {
        Ok(SpanId::INVALID) | Err(_) => None,
        Ok(span_id) => Some(span_id),
    }
}

/// Recover baggage entries by stripping the reserved prefix from carrier
/// keys. Entries whose values do not percent-decode to valid UTF-8 are
/// logged and skipped; they were never validly received.
fn extract_baggage(extractor: &dyn Extractor) -> Baggage {
    let mut baggage = Baggage::new();
    for key in extractor.keys() {
        let Some(name) = key.strip_prefix(BAGGAGE_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Some(raw) = extractor.get(key) else {
            continue;
        };
        match percent_decode_str(raw).decode_utf8() {
            Ok(value) => {
                baggage.insert(name.to_string(), value.into_owned());
            }
            Err(_) => {
                tracing::warn!(key = name, "baggage value in carrier is not valid UTF-8");
            }
        }
    }
    baggage
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn carrier(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn round_trip_preserves_identity_and_baggage() {
        let codec = HeaderCodec::new();
        let ctx = SpanContext::new_root(true)
            .with_baggage_item("a", "1")
            .with_baggage_item("b", "2");

        let mut headers = HashMap::new();
        codec.inject(&ctx, &mut headers);
        let decoded = codec.extract(&headers).unwrap();

        assert_eq!(decoded.trace_id(), ctx.trace_id());
        assert_eq!(decoded.span_id(), ctx.span_id());
        assert_eq!(decoded.parent_span_id(), Some(ctx.span_id()));
        assert_eq!(decoded.is_sampled(), ctx.is_sampled());
        assert_eq!(decoded.baggage(), ctx.baggage());
        assert!(decoded.is_remote());
    }

    #[test]
    fn round_trip_of_awkward_baggage_values() {
        let codec = HeaderCodec::new();
        let ctx = SpanContext::new_root(false)
            .with_baggage_item("params", "a very long string")
            .with_baggage_item("err", "a error with detail information")
            .with_baggage_item("pct", "50%=half, right;")
            .with_baggage_item("unicode", "héllo wörld");

        let mut headers = HashMap::new();
        codec.inject(&ctx, &mut headers);
        let decoded = codec.extract(&headers).unwrap();

        assert_eq!(decoded.baggage(), ctx.baggage());
        assert!(!decoded.is_sampled());
    }

    #[test]
    fn inject_is_idempotent() {
        let codec = HeaderCodec::new();
        let ctx = SpanContext::new_root(true).with_baggage_item("k", "v");

        let mut once = HashMap::new();
        codec.inject(&ctx, &mut once);
        let mut twice = once.clone();
        codec.inject(&ctx, &mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn inject_preserves_unrelated_keys() {
        let codec = HeaderCodec::new();
        let ctx = SpanContext::new_root(true).with_baggage_item("k", "v");

        let mut headers = carrier(&[("content-type", "text/plain"), ("host", "localhost:8999")]);
        codec.inject(&ctx, &mut headers);

        assert_eq!(headers.get("content-type").map(String::as_str), Some("text/plain"));
        assert_eq!(headers.get("host").map(String::as_str), Some("localhost:8999"));
    }

    #[test]
    fn inject_of_invalid_context_writes_nothing() {
        let codec = HeaderCodec::new();
        let invalid = SpanContext::new(
            TraceId::INVALID,
            SpanId::INVALID,
            None,
            TraceFlags::default(),
            false,
            Baggage::new(),
        );

        let mut headers = HashMap::new();
        codec.inject(&invalid, &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn extract_empty_carrier_is_missing() {
        let codec = HeaderCodec::new();
        let empty: HashMap<String, String> = HashMap::new();
        assert_eq!(codec.extract(&empty), Err(ExtractError::Missing));
    }

    #[test]
    fn extract_half_present_context_is_malformed() {
        let codec = HeaderCodec::new();

        let only_trace = carrier(&[("tracewire-trace-id", "4d0000000000000016")]);
        assert_eq!(
            codec.extract(&only_trace),
            Err(ExtractError::Malformed(SPAN_ID_HEADER))
        );

        let only_span = carrier(&[("tracewire-span-id", "17c29")]);
        assert_eq!(
            codec.extract(&only_span),
            Err(ExtractError::Malformed(TRACE_ID_HEADER))
        );
    }

    #[rustfmt::skip]
    fn malformed_carrier_test_data() -> Vec<(&'static str, &'static str, &'static str, &'static str)> {
        // (trace-id value, span-id value, sampled value, reason)
        vec![
            ("not-a-number", "1", "1", "bogus trace id"),
            ("4bf92f3577b34da6a3ce929d0e0e47361", "17c29", "1", "over-length trace id"),
            ("00000000000000000000000000000000", "17c29", "1", "zero trace id"),
            ("", "17c29", "1", "empty trace id"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "not-a-number", "1", "bogus span id"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "00f067aa0ba902b71", "1", "over-length span id"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "0000000000000000", "1", "zero span id"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "", "1", "empty span id"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "17c29", "yes", "bogus sampled flag"),
            ("4bf92f3577b34da6a3ce929d0e0e4736", "17c29", "01", "over-length sampled flag"),
        ]
    }

    #[test]
    fn extract_rejects_malformed_carriers() {
        let codec = HeaderCodec::new();

        for (trace_id, span_id, sampled, reason) in malformed_carrier_test_data() {
            let headers = carrier(&[
                ("tracewire-trace-id", trace_id),
                ("tracewire-span-id", span_id),
                ("tracewire-sampled", sampled),
            ]);
            assert!(
                matches!(codec.extract(&headers), Err(ExtractError::Malformed(_))),
                "{reason}"
            );
        }
    }

    #[test]
    fn extract_pads_short_span_ids() {
        let codec = HeaderCodec::new();
        let headers = carrier(&[
            ("tracewire-trace-id", "000000000000004d0000000000000016"),
            ("tracewire-span-id", "17c29"),
            ("tracewire-sampled", "1"),
        ]);

        let decoded = codec.extract(&headers).unwrap();
        assert_eq!(decoded.trace_id(), TraceId::from(0x4d0000000000000016u128));
        assert_eq!(decoded.span_id(), SpanId::from(0x17c29u64));
        assert!(decoded.is_sampled());
    }

    #[test]
    fn extract_without_sampled_header_defaults_to_not_sampled() {
        let codec = HeaderCodec::new();
        let headers = carrier(&[
            ("tracewire-trace-id", "4bf92f3577b34da6a3ce929d0e0e4736"),
            ("tracewire-span-id", "00f067aa0ba902b7"),
        ]);

        let decoded = codec.extract(&headers).unwrap();
        assert!(!decoded.is_sampled());
        assert!(decoded.baggage().is_empty());
    }

    #[test]
    fn extract_ignores_unrelated_and_empty_baggage_keys() {
        let codec = HeaderCodec::new();
        let headers = carrier(&[
            ("tracewire-trace-id", "4bf92f3577b34da6a3ce929d0e0e4736"),
            ("tracewire-span-id", "00f067aa0ba902b7"),
            ("tracewire-sampled", "1"),
            ("tracewire-ctx-user", "alice"),
            ("tracewire-ctx-", "dropped"),
            ("x-request-id", "abc123"),
        ]);

        let decoded = codec.extract(&headers).unwrap();
        assert_eq!(decoded.baggage().len(), 1);
        assert_eq!(
            decoded.baggage_item("user"),
            Some(&crate::StringValue::from("alice"))
        );
    }

    #[test]
    fn fields_lists_the_fixed_headers() {
        let codec = HeaderCodec::new();
        let fields: Vec<_> = codec.fields().collect();
        assert_eq!(
            fields,
            vec!["tracewire-trace-id", "tracewire-span-id", "tracewire-sampled"]
        );
    }
}
