use crate::baggage::Baggage;
use crate::StringValue;
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;
use std::num::ParseIntError;
use std::ops::{BitAnd, BitOr, Not};

/// Flags that can be set on a [`SpanContext`].
///
/// The only flag currently defined is [`TraceFlags::SAMPLED`]. The flags are
/// fixed when the root of a trace is created and inherited unchanged by every
/// descendant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// Trace flags with the `sampled` flag set to `0`.
    ///
    /// Spans that are not sampled will be ignored by most tracing tools.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    /// Trace flags with the `sampled` flag set to `1`.
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct new trace flags.
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Returns `true` if the `sampled` flag is set.
    pub fn is_sampled(&self) -> bool {
        (*self & TraceFlags::SAMPLED) == TraceFlags::SAMPLED
    }

    /// Returns a copy of the current flags with the `sampled` flag set.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            *self | TraceFlags::SAMPLED
        } else {
            *self & !TraceFlags::SAMPLED
        }
    }

    /// Returns the flags as a `u8`.
    pub fn to_u8(self) -> u8 {
        self.0
    }
}

impl BitAnd for TraceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Not for TraceFlags {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::LowerHex for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A 16-byte value which identifies a given trace.
///
/// The id is valid if it contains at least one non-zero byte. It is fixed for
/// the whole call tree: every span of a trace carries the same trace id.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Invalid trace id
    pub const INVALID: TraceId = TraceId(0);

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a trace id.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracewire::trace::TraceId;
    ///
    /// assert!(TraceId::from_hex("42").is_ok());
    /// assert!(TraceId::from_hex("58406520a006649127e371903a2de979").is_ok());
    ///
    /// assert!(TraceId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u128::from_str_radix(hex, 16).map(TraceId)
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte. Span ids are
/// generated randomly, which makes them unique within a trace with
/// overwhelming probability.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id
    pub const INVALID: SpanId = SpanId(0);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a span id.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracewire::trace::SpanId;
    ///
    /// assert!(SpanId::from_hex("42").is_ok());
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    ///
    /// assert!(SpanId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u64::from_str_radix(hex, 16).map(SpanId)
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_entropy());
}

fn random_trace_id() -> TraceId {
    CURRENT_RNG.with(|rng| TraceId::from(rng.borrow_mut().gen::<u128>()))
}

fn random_span_id() -> SpanId {
    CURRENT_RNG.with(|rng| SpanId::from(rng.borrow_mut().gen::<u64>()))
}

/// The identifying, propagatable portion of a [`Span`].
///
/// A `SpanContext` ties a span into its trace: the shared trace id, the
/// span's own id, the parent span id (`None` only for roots), the sampling
/// decision, and the [`Baggage`] inherited from its ancestors.
///
/// Contexts are immutable once created, except that [`with_baggage_item`]
/// derives a new context with an extra baggage entry. All derivation is pure;
/// none of these operations can fail.
///
/// [`Span`]: crate::trace::Span
/// [`with_baggage_item`]: SpanContext::with_baggage_item
#[derive(Clone, Debug, PartialEq)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    trace_flags: TraceFlags,
    is_remote: bool,
    baggage: Baggage,
}

impl SpanContext {
    /// Construct a `SpanContext` from raw parts.
    ///
    /// Most callers want [`new_root`] or [`new_child`] instead; this is the
    /// escape hatch used by codecs that rebuild a context from wire data.
    ///
    /// [`new_root`]: SpanContext::new_root
    /// [`new_child`]: SpanContext::new_child
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        trace_flags: TraceFlags,
        is_remote: bool,
        baggage: Baggage,
    ) -> Self {
        SpanContext {
            trace_id,
            span_id,
            parent_span_id,
            trace_flags,
            is_remote,
            baggage,
        }
    }

    /// Create the context for the root span of a new trace.
    ///
    /// Generates a fresh random trace id and span id. The sampling decision
    /// is fixed here for the life of the trace; children inherit it and
    /// cannot change it.
    pub fn new_root(sampled: bool) -> Self {
        SpanContext {
            trace_id: random_trace_id(),
            span_id: random_span_id(),
            parent_span_id: None,
            trace_flags: TraceFlags::default().with_sampled(sampled),
            is_remote: false,
            baggage: Baggage::new(),
        }
    }

    /// Derive the context for a child span of `self`.
    ///
    /// The child shares the trace id and trace flags, gets a fresh span id,
    /// records `self` as its parent, and snapshots the baggage by value:
    /// entries added to either context afterwards are not visible on the
    /// other.
    pub fn new_child(&self) -> Self {
        SpanContext {
            trace_id: self.trace_id,
            span_id: random_span_id(),
            parent_span_id: Some(self.span_id),
            trace_flags: self.trace_flags,
            is_remote: false,
            baggage: self.baggage.clone(),
        }
    }

    /// Returns a new context with `baggage[key] = value` merged on top of the
    /// existing baggage. Keys are case-sensitive; the last write for a given
    /// key wins. The entry propagates to children derived from the returned
    /// context, not to children derived earlier.
    pub fn with_baggage_item<K, V>(&self, key: K, value: V) -> Self
    where
        K: Into<crate::Key>,
        V: Into<StringValue>,
    {
        let mut derived = self.clone();
        derived.baggage.insert(key, value);
        derived
    }

    /// Returns the baggage value for `key`, if present.
    pub fn baggage_item(&self, key: &str) -> Option<&StringValue> {
        self.baggage.get(key)
    }

    /// The [`TraceId`] for this span context.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The [`SpanId`] for this span context.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The parent's [`SpanId`], or `None` if this is a root context.
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    /// Returns the trace flags.
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Returns `true` if the `sampled` trace flag is set.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// Returns `true` if the span context was extracted from a remote peer.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// A reference to this context's [`Baggage`].
    pub fn baggage(&self) -> &Baggage {
        &self.baggage
    }

    /// Returns `true` if the context has a valid (non-zero) `trace_id` and a
    /// valid (non-zero) `span_id`.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }
}
