//! The insertion-ordered string-keyed map backing [`Value::Dict`].
//!
//! Key uniqueness respects a per-map case-insensitivity flag; re-inserting an
//! existing key keeps the original spelling and replaces the value, the way
//! the format's reference implementation behaved. Insertion order is not
//! semantically significant but is preserved so re-encoding is deterministic,
//! and equality is key-order independent.

use crate::{config::Config, config::DictionaryStrategy, Value};

#[derive(Clone, Debug, Default)]
pub struct Dict {
    entries: Vec<(String, Value)>,
    ignore_case: bool,
    compact: bool,
}

fn keys_match(ignore_case: bool, a: &str, b: &str) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

impl Dict {
    pub fn new(ignore_case: bool, compact: bool) -> Dict {
        Dict {
            entries: Vec::new(),
            ignore_case,
            compact,
        }
    }

    /// A map honoring the configuration's key comparison and dictionary
    /// strategy.
    pub fn with_config(config: &Config) -> Dict {
        Dict::new(
            config.ignore_case,
            config.dictionary_strategy == DictionaryStrategy::Compact,
        )
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn ignore_case(&self) -> bool { self.ignore_case }

    /// Whether this map prefers the prefix-compressed key encoding.
    pub fn compact(&self) -> bool { self.compact }

    /// Marks this map as preferring the prefix-compressed key encoding.
    pub fn prefer_compact(&mut self) { self.compact = true; }

    /// Inserts or replaces an entry. When a key already exists under this
    /// map's comparison rule, its original spelling is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let ignore_case = self.ignore_case;
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| keys_match(ignore_case, k, &key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks a key up under this map's comparison rule.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| keys_match(self.ignore_case, k, key))
            .map(|(_, v)| v)
    }

    /// Looks a key up by exact spelling regardless of the comparison rule.
    pub fn get_exact(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool { self.get(key).is_some() }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let ignore_case = self.ignore_case;
        let at = self
            .entries
            .iter()
            .position(|(k, _)| keys_match(ignore_case, k, key))?;
        Some(self.entries.remove(at).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Builds a map from entries, deduplicating keys insert-style.
    pub fn from_entries<K, I>(entries: I, ignore_case: bool, compact: bool) -> Dict
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut dict = Dict::new(ignore_case, compact);
        for (k, v) in entries {
            dict.insert(k, v);
        }
        dict
    }

    /// Best-effort conversion from any value. Arrays become maps keyed by
    /// their decimal element indices.
    pub fn cast(value: &Value) -> Option<Dict> {
        match value {
            Value::Null => None,
            Value::Dict(d) => Some(d.clone()),
            Value::Array(a) => {
                let mut dict = Dict::new(false, false);
                for (i, item) in a.iter().enumerate() {
                    dict.insert(i.to_string(), item.clone());
                }
                Some(dict)
            }
            _ => None,
        }
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Dict) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get_exact(k) == Some(v))
    }
}

impl<K: Into<String>> std::iter::FromIterator<(K, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Dict {
        Dict::from_entries(iter, false, false)
    }
}

impl IntoIterator for Dict {
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    type Item = (String, Value);

    fn into_iter(self) -> Self::IntoIter { self.entries.into_iter() }
}
