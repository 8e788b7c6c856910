//! Immutable FAQ catalog.

use std::collections::HashMap;

use helpdesk_core::error::{HelpdeskError, Result};
use helpdesk_core::FaqEntry;

use crate::interaction::{encode_topic, MAX_PAYLOAD_BYTES};

/// Topic key → question/answer mapping, in menu order.
#[derive(Debug, Clone)]
pub struct FaqCatalog {
    entries: Vec<FaqEntry>,
    index: HashMap<String, usize>,
}

impl FaqCatalog {
    /// Build a catalog, rejecting empty or duplicate keys and keys whose
    /// button payload would not fit the transport's payload limit.
    pub fn new(entries: Vec<FaqEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(HelpdeskError::Config(format!(
                    "FAQ entry #{} has an empty key",
                    pos + 1
                )));
            }
            let payload_len = encode_topic(&entry.key).len();
            if payload_len > MAX_PAYLOAD_BYTES {
                return Err(HelpdeskError::Config(format!(
                    "FAQ key '{}' encodes to {} bytes, limit is {}",
                    entry.key, payload_len, MAX_PAYLOAD_BYTES
                )));
            }
            if index.insert(entry.key.clone(), pos).is_some() {
                return Err(HelpdeskError::Config(format!(
                    "duplicate FAQ key '{}'",
                    entry.key
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Look up a topic. Unknown keys yield `None`.
    pub fn lookup(&self, key: &str) -> Option<&FaqEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Topics in menu order.
    pub fn topics(&self) -> impl Iterator<Item = &FaqEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
