use std::fmt;
use log::{
    debug, info, warn
};
use serde::{
    Serialize, Deserialize
};

use crate::{
    error::SourceError,
    record::EvidenceRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    // no cycle has completed yet
    Loading,

    // showing what the log server returned last
    Live,

    // the last applied cycle failed, showing the fallback dataset
    Degraded,
}

/// Sequence number handed out when a poll cycle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleId(u64);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arbitrates poll results: newest started cycle wins, failures degrade to the fallback.
#[derive(Debug)]
pub struct Acquisition {
    next_cycle: u64,

    last_applied: Option<CycleId>,

    status: SourceStatus,

    consecutive_failures: u32,

    fallback: Vec<EvidenceRecord>,
}

impl Acquisition {
    pub fn new(fallback: Vec<EvidenceRecord>) -> Self {
        Acquisition {
            next_cycle: 1,
            last_applied: None,
            status: SourceStatus::Loading,
            consecutive_failures: 0,
            fallback: fallback,
        }
    }

    pub fn begin(&mut self) -> CycleId {
        let id = CycleId(self.next_cycle);
        self.next_cycle += 1;
        id
    }

    // the records to install, or None if a newer cycle was already applied
    pub fn complete(
        &mut self,
        cycle: CycleId,
        result: Result<Vec<EvidenceRecord>, SourceError>,
    ) -> Option<Vec<EvidenceRecord>> {
        if self.last_applied.is_some_and(|last| cycle <= last) {
            debug!("Discarded stale poll cycle `{cycle}`.");
            return None;
        }
        self.last_applied = Some(cycle);
        match result {
            Ok(records) => {
                if self.status == SourceStatus::Degraded {
                    info!(
                        "Log server is reachable again after `{}` failed cycles.",
                        self.consecutive_failures
                    );
                }
                self.status = SourceStatus::Live;
                self.consecutive_failures = 0;
                Some(records)
            },

            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "Poll cycle `{cycle}` failed(`{}` in a row): `{e}`, showing sample data.",
                    self.consecutive_failures
                );
                self.status = SourceStatus::Degraded;
                Some(self.fallback.clone())
            },
        }
    }

    pub fn status(&self) -> SourceStatus {
        self.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_applied(&self) -> Option<CycleId> {
        self.last_applied
    }
}
