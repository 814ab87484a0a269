use std::collections::{
    HashSet,
    VecDeque,
};
use log::debug;

use crate::record::{
    EvidenceRecord, RecordKey
};

// a record together with the key computed when it was ingested
#[derive(Debug, Clone)]
struct Ingested {
    key: RecordKey,

    record: EvidenceRecord,
}

/// The engine's local record set, kept in arrival order (front = most recent).
///
/// Both ingestion paths write here: poll results replace the whole set, push
/// deliveries are prepended unless a record with the same key is present.
#[derive(Debug, Default)]
pub struct RecordSet {
    entries: VecDeque<Ingested>,

    // keys of every held entry, poll results may repeat a key
    keys: HashSet<RecordKey>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    // install a poll result as-is
    pub fn replace(&mut self, records: Vec<EvidenceRecord>) {
        self.entries.clear();
        self.keys.clear();
        for record in records {
            let key = record.key();
            self.keys.insert(key);
            self.entries.push_back(Ingested { key, record });
        }
    }

    // false when the record is already held
    pub fn prepend(&mut self, record: EvidenceRecord) -> bool {
        let key = record.key();
        if !self.keys.insert(key) {
            debug!("Ignored duplicate record `{key}` from the push channel.");
            return false;
        }
        self.entries.push_front(Ingested { key, record });
        true
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceRecord> + '_ {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn to_vec(&self) -> Vec<EvidenceRecord> {
        self.iter().cloned().collect()
    }
}
