//! Label sets and canonical fingerprinting.
//!
//! A `LabelSet` keeps its pairs in insertion order because that is the order
//! they are rendered in, but series identity must not depend on the order
//! the runtime happened to attach labels. Identity is therefore a canonical
//! fingerprint: a SHA-256 digest over the sorted, sanitized key/value pairs.
//! The batcher computes the fingerprint once per record and caches it.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A label value as supplied by the instrumentation API.
///
/// Values are arbitrary scalars (the runtime does not constrain them) and
/// are only coerced to strings at serialization time.
pub type LabelValue = serde_json::Value;

/// Insertion-ordered key/value dimensions attached to one observed series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    pairs: Vec<(String, LabelValue)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, overwriting the value in place if the key exists.
    ///
    /// Overwriting keeps the key's original position so display order stays
    /// stable across repeated observations.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<LabelValue>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LabelValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in insertion order, as rendered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical fingerprint for series identity.
    ///
    /// Pairs are sanitized and coerced the same way the serializer renders
    /// them, then sorted, so two sets that produce identical exposition text
    /// always merge into one series. Keys and values are fed to the hasher
    /// separated by bytes that cannot occur in UTF-8, ruling out
    /// concatenation collisions.
    pub fn fingerprint(&self) -> String {
        let mut pairs: Vec<(Cow<'_, str>, String)> = self
            .pairs
            .iter()
            .map(|(k, v)| (sanitize_label_key(k), coerce_value(v)))
            .collect();
        pairs.sort();

        let mut hasher = Sha256::new();
        for (key, value) in &pairs {
            hasher.update(key.as_bytes());
            hasher.update([0xff]);
            hasher.update(value.as_bytes());
            hasher.update([0xfe]);
        }
        hex::encode(hasher.finalize())
    }
}

impl<K: Into<String>, V: Into<LabelValue>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// Borrows when the key is already valid, which is the common case.
pub fn sanitize_label_key(key: &str) -> Cow<'_, str> {
    if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Cow::Borrowed(key);
    }
    Cow::Owned(
        key.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect(),
    )
}

/// Coerce an arbitrary label value to its deterministic display string.
///
/// Strings render raw (no surrounding quotes); numbers and booleans use
/// their display form; `null` renders as the literal text `null`; arrays
/// and objects fall back to compact JSON. Coercion is total: any value the
/// runtime attaches renders as something.
pub fn coerce_value(value: &LabelValue) -> String {
    match value {
        LabelValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insertion_order_preserved() {
        let set: LabelSet = [("zeta", "1"), ("alpha", "2")].into_iter().collect();
        let keys: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut set = LabelSet::new();
        set.insert("a", "1");
        set.insert("b", "2");
        set.insert("a", "3");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a"), Some(&json!("3")));
        let keys: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn fingerprint_is_order_insensitive() {
        let a: LabelSet = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: LabelSet = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_distinguishes_values() {
        let a: LabelSet = [("x", "1")].into_iter().collect();
        let b: LabelSet = [("x", "2")].into_iter().collect();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_uses_sanitized_keys() {
        // "account-id" and "account_id" sanitize to the same key and must
        // collapse into one series.
        let a: LabelSet = [("account-id", "42")].into_iter().collect();
        let b: LabelSet = [("account_id", "42")].into_iter().collect();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn sanitize_passthrough_borrows() {
        assert!(matches!(sanitize_label_key("already_ok_123"), Cow::Borrowed(_)));
    }

    #[test]
    fn sanitize_replaces_invalid_chars() {
        assert_eq!(sanitize_label_key("account-id"), "account_id");
        assert_eq!(sanitize_label_key("host.name"), "host_name");
        assert_eq!(sanitize_label_key("naïve"), "na_ve");
    }

    #[test]
    fn coercion_is_total() {
        assert_eq!(coerce_value(&json!("plain")), "plain");
        assert_eq!(coerce_value(&json!(42)), "42");
        assert_eq!(coerce_value(&json!(1.5)), "1.5");
        assert_eq!(coerce_value(&json!(true)), "true");
        assert_eq!(coerce_value(&json!(null)), "null");
        assert_eq!(coerce_value(&json!({"a": 1})), "{\"a\":1}");
    }
}
