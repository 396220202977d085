use crate::binding::BindError;
use std::collections::HashMap;

/// A multi-valued, string keyed map, the shape query strings and forms decode into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: HashMap<String, Vec<String>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string, repeated keys keep every value in order
    pub fn parse(input: &str) -> Result<Self, BindError> {
        Self::parse_bytes(input.as_bytes())
    }

    pub fn parse_bytes(input: &[u8]) -> Result<Self, BindError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)?;
        Ok(pairs.into_iter().collect())
    }

    /// The first value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Every value of `key`, empty when the key is absent
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces every value of `key`
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.inner.insert(key.into(), values);
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Values::new();
        for (key, value) in iter {
            values.append(key, value);
        }
        values
    }
}
