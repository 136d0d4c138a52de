//! Name/value data that travels with a trace across system boundaries.
//!
//! Baggage is a set of user-defined string pairs attached to a
//! [`SpanContext`]. Entries are inherited by every child context derived
//! after they were set, and cross process boundaries when a context is
//! injected into a carrier.
//!
//! Baggage copies by value: deriving a child context snapshots the parent's
//! entries, and later writes on either side are invisible to the other.
//!
//! No entry-count or byte-size cap is enforced at this layer. Callers that
//! embed baggage in size-limited transports (HTTP headers, UDP datagrams)
//! should impose their own policy.
//!
//! [`SpanContext`]: crate::trace::SpanContext
use crate::{Key, StringValue};
use std::collections::{hash_map, HashMap};

/// A set of name/value pairs describing user-defined properties of a trace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Baggage {
    inner: HashMap<Key, StringValue>,
}

impl Baggage {
    /// Creates an empty `Baggage`.
    pub fn new() -> Self {
        Baggage {
            inner: HashMap::default(),
        }
    }

    /// Returns a reference to the value associated with a given name.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracewire::{baggage::Baggage, StringValue};
    ///
    /// let mut baggage = Baggage::new();
    /// let _ = baggage.insert("my-name", "my-value");
    ///
    /// assert_eq!(baggage.get("my-name"), Some(&StringValue::from("my-value")))
    /// ```
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&StringValue> {
        self.inner.get(key.as_ref())
    }

    /// Inserts a name/value pair into the baggage.
    ///
    /// Keys are case-sensitive. If the name was already present the value is
    /// replaced and the old value is returned (last write wins).
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<StringValue>
    where
        K: Into<Key>,
        V: Into<StringValue>,
    {
        self.inner.insert(key.into(), value.into())
    }

    /// Removes a name from the baggage, returning its value if the pair was
    /// previously in the map.
    pub fn remove<K: AsRef<str>>(&mut self, key: K) -> Option<StringValue> {
        self.inner.remove(key.as_ref())
    }

    /// Returns the number of entries in this baggage.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the baggage contains no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Gets an iterator over the baggage entries, in any order.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }
}

/// An iterator over the entries of a [`Baggage`].
#[derive(Debug)]
pub struct Iter<'a>(hash_map::Iter<'a, Key, StringValue>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Key, &'a StringValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<'a> IntoIterator for &'a Baggage {
    type Item = (&'a Key, &'a StringValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(self.inner.iter())
    }
}

impl FromIterator<(Key, StringValue)> for Baggage {
    fn from_iter<I: IntoIterator<Item = (Key, StringValue)>>(iter: I) -> Self {
        Baggage {
            inner: iter.into_iter().collect(),
        }
    }
}
