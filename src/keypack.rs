//! Prefix compression for dictionary keys.
//!
//! For every pair of keys the longest common prefix longer than one character
//! becomes a candidate. Candidates are ranked longest first and assigned
//! sequential sentinel code points from the private use area; a key is
//! substituted by at most one prefix, the longest one that covers it. Keys
//! that contain a sentinel code point themselves are rejected before
//! compression is attempted, and a prefix table larger than the sentinel
//! range is a hard error.

use failure::Error;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::KeyPackError;

/// First sentinel code point (start of the private use area).
pub const MAP_START: u32 = 0xe000;
/// Last sentinel code point.
pub const MAP_END: u32 = 0xf8ff;

/// Whether a character lies in the reserved sentinel range.
pub fn is_sentinel(c: char) -> bool {
    let cp = c as u32;
    (MAP_START..=MAP_END).contains(&cp)
}

/// A prefix table together with the mapped spelling of each source key.
#[derive(Clone, Debug)]
pub struct KeyCompressor {
    ignore_case: bool,
    sources: Vec<String>,
    prefixes: Vec<String>,
    mapping: Vec<String>,
}

impl KeyCompressor {
    /// Builds the prefix table for a key set.
    pub fn build<'a, I>(keys: I, ignore_case: bool) -> Result<KeyCompressor, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sources: Vec<String> = keys.into_iter().map(str::to_owned).collect();
        for key in &sources {
            if key.chars().any(is_sentinel) {
                return Err(KeyPackError::ReservedCharacterInKey { key: key.clone() }.into());
            }
        }

        let mut prefix_map: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for i in 0..sources.len() {
            for j in i + 1..sources.len() {
                let prefix = common_prefix(&sources[i], &sources[j], ignore_case);
                if prefix.chars().count() > 1 {
                    let members = prefix_map.entry(prefix).or_insert_with(BTreeSet::new);
                    members.insert(i);
                    members.insert(j);
                }
            }
        }

        // longest first; the lexicographic tiebreak keeps the table
        // deterministic across runs
        let mut prefixes: Vec<String> = prefix_map.keys().cloned().collect();
        prefixes.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        if prefixes.len() > (MAP_END - MAP_START) as usize {
            return Err(KeyPackError::KeyCollisionUnrepresentable {
                prefixes: prefixes.len(),
            }
            .into());
        }

        let mut mapping = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let mut mapped = source.clone();
            for (pi, prefix) in prefixes.iter().enumerate() {
                let covers = prefix_map
                    .get(prefix)
                    .map_or(false, |members| members.contains(&i));
                // the exact-spelling requirement keeps decoded keys identical
                // to the originals under case-insensitive comparison
                if covers && source.starts_with(prefix.as_str()) {
                    let sentinel = sentinel_char(pi);
                    mapped = format!("{}{}", sentinel, &source[prefix.len()..]);
                    break;
                }
            }
            mapping.push(mapped);
        }

        Ok(KeyCompressor {
            ignore_case,
            sources,
            prefixes,
            mapping,
        })
    }

    /// Rebuilds the decode side of a table from the prefixes read off the
    /// wire.
    pub fn from_prefixes(prefixes: Vec<String>) -> KeyCompressor {
        KeyCompressor {
            ignore_case: false,
            sources: Vec::new(),
            prefixes,
            mapping: Vec::new(),
        }
    }

    pub fn prefixes(&self) -> &[String] { &self.prefixes }

    /// The wire spelling of a source key.
    pub fn compress(&self, key: &str) -> Option<&str> {
        self.sources
            .iter()
            .position(|s| {
                if self.ignore_case {
                    s.to_lowercase() == key.to_lowercase()
                } else {
                    s == key
                }
            })
            .map(|i| self.mapping[i].as_str())
    }

    /// The original spelling of a wire key.
    pub fn expand(&self, mapped: &str) -> String {
        let mut chars = mapped.chars();
        match chars.next() {
            Some(c) if is_sentinel(c) => {
                let index = (c as u32 - MAP_START) as usize;
                match self.prefixes.get(index) {
                    Some(prefix) => format!("{}{}", prefix, chars.as_str()),
                    None => mapped.to_string(),
                }
            }
            _ => mapped.to_string(),
        }
    }
}

fn sentinel_char(index: usize) -> char {
    // the table size was checked against the sentinel range at build time
    std::char::from_u32(MAP_START + index as u32).unwrap_or('\u{fffd}')
}

/// Longest common prefix of two keys, spelled as in `first`.
fn common_prefix(first: &str, second: &str, ignore_case: bool) -> String {
    let mut out = String::new();
    let mut rest = second.chars();
    for c in first.chars() {
        match rest.next() {
            Some(d) if chars_match(c, d, ignore_case) => out.push(c),
            _ => break,
        }
    }
    out
}

fn chars_match(a: char, b: char, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase().eq(b.to_lowercase())
    } else {
        a == b
    }
}
