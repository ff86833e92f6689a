//! Process-lifetime docstring cache.
//!
//! No TTL and no eviction: an entry lives until it is invalidated or the
//! cache is dropped.

use crate::metadata::{ArgMeta, FunctionMetadata, Style};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Stable hash of every generation input that can change the output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(meta: &FunctionMetadata, style: Style) -> Self {
        // Field order is fixed by the struct, so the JSON is canonical.
        #[derive(Serialize)]
        struct Key<'a> {
            name: &'a str,
            args_meta: &'a [ArgMeta],
            has_return: bool,
            returns: Option<&'a str>,
            raises: &'a [String],
            has_yields: bool,
            yields: Option<&'a str>,
            style: &'a str,
            source_code: &'a str,
        }

        let key = Key {
            name: &meta.name,
            args_meta: &meta.args_meta,
            has_return: meta.has_return,
            returns: meta.returns.as_deref(),
            raises: &meta.raises,
            has_yields: meta.has_yields,
            yields: meta.yields.as_deref(),
            style: style.as_str(),
            source_code: meta.source_code.as_deref().unwrap_or(""),
        };

        // Serializing plain strings and bools cannot fail.
        let canonical = serde_json::to_vec(&key).unwrap_or_default();
        let digest = Sha256::digest(&canonical);

        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint to generated body.
///
/// Writes replace the whole value, so two tasks racing on one fingerprint
/// just do the work twice.
#[derive(Debug, Default)]
pub struct DocstringCache {
    entries: RwLock<HashMap<Fingerprint, String>>,
}

impl DocstringCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Fingerprint) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: Fingerprint, body: String) {
        self.entries.write().insert(key, body);
    }

    pub fn invalidate(&self, key: &Fingerprint) -> Option<String> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
