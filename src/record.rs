use std::fmt;
use serde::{
    Serialize, Deserialize
};
use serde_json::Value;
use xxhash_rust::xxh3::Xxh3;

// proof types emitted by the known checks, the set is open though
pub const HEAD_CORRECTNESS: &str = "Head Correctness";
pub const FRESHNESS: &str = "Freshness";
pub const EXECUTION_CORRECTNESS: &str = "Execution Correctness";

/// One verification-check result: outcome, summary, and an opaque evidence bundle.
///
/// Fields are read-only once the record exists; the engine never edits a record,
/// it only stores, reorders and drops whole records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    #[serde(alias = "proofType")]
    proof_type: String,

    success: bool,

    message: String,

    // stored verbatim, never interpreted
    #[serde(default)]
    evidence: Value,

    // seconds since epoch, fractional
    timestamp: f64,
}

impl EvidenceRecord {
    pub fn new(
        proof_type: impl Into<String>,
        success: bool,
        message: impl Into<String>,
        evidence: Value,
        timestamp: f64,
    ) -> Self {
        EvidenceRecord {
            proof_type: proof_type.into(),
            success: success,
            message: message.into(),
            evidence: evidence,
            timestamp: timestamp,
        }
    }

    // lenient decode: anything not shaped like a record yields None
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn proof_type(&self) -> &str {
        &self.proof_type
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn evidence(&self) -> &Value {
        &self.evidence
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Identity used to recognise the same record arriving over both ingestion paths.
    pub fn key(&self) -> RecordKey {
        let mut hasher = Xxh3::new();
        hasher.update(self.proof_type.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(&self.timestamp.to_bits().to_le_bytes());
        hasher.update(self.message.as_bytes());
        RecordKey(hasher.digest128())
    }
}

/// xxh3-128 digest over proof type, timestamp bits and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey(u128);

impl RecordKey {
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
