use log::{
    debug, warn
};
use serde::{
    Serialize, Deserialize
};

use crate::{
    acquisition::{
        Acquisition, CycleId, SourceStatus
    },
    error::{
        SourceError, ViewError
    },
    fallback,
    merge::RecordSet,
    record::EvidenceRecord,
    view::{
        SortOrder, ViewEngine
    },
};

// operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),

    ToggleSort,

    GoToPage(usize),
}

/// Everything the presentation surface needs to draw the current page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub status: SourceStatus,

    pub search: String,

    pub sort: SortOrder,

    pub page: usize,

    pub page_count: usize,

    pub total_matches: usize,

    pub total_records: usize,

    pub records: Vec<EvidenceRecord>,
}

/// Sole owner of the local record set.
///
/// Poll results, push deliveries and operator commands are applied one at a
/// time; each method returns whether the visible state may have changed.
#[derive(Debug)]
pub struct Engine {
    acquisition: Acquisition,

    records: RecordSet,

    view: ViewEngine,
}

impl Engine {
    pub fn new(page_size: usize) -> Self {
        Self::with_fallback(page_size, fallback::records())
    }

    pub fn with_fallback(page_size: usize, fallback: Vec<EvidenceRecord>) -> Self {
        Engine {
            acquisition: Acquisition::new(fallback),
            records: RecordSet::new(),
            view: ViewEngine::new(page_size),
        }
    }

    pub fn begin_cycle(&mut self) -> CycleId {
        let cycle = self.acquisition.begin();
        debug!("Started poll cycle `{cycle}`.");
        cycle
    }

    pub fn complete_cycle(
        &mut self,
        cycle: CycleId,
        result: Result<Vec<EvidenceRecord>, SourceError>,
    ) -> bool {
        match self.acquisition.complete(cycle, result) {
            Some(records) => {
                debug!("Cycle `{cycle}` installed `{}` records.", records.len());
                self.records.replace(records);
                self.view.clamp_page(&self.records);
                true
            },

            None => false,
        }
    }

    pub fn deliver(&mut self, record: EvidenceRecord) -> bool {
        self.records.prepend(record)
    }

    pub fn apply(&mut self, command: Command) -> Result<bool, ViewError> {
        match command {
            Command::Search(term) => Ok(self.view.set_search(&term)),

            Command::ToggleSort => {
                self.view.toggle_sort();
                Ok(true)
            },

            Command::GoToPage(page) => {
                if page == self.view.page() {
                    return Ok(false);
                }
                self.view.go_to_page(page, &self.records)?;
                Ok(true)
            },
        }
    }

    // commands from the operator are never fatal
    pub fn apply_or_warn(&mut self, command: Command) -> bool {
        match self.apply(command) {
            Ok(changed) => changed,

            Err(e) => {
                warn!("Ignored command: `{e}`");
                false
            },
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let view = self.view.compute(&self.records);
        ViewSnapshot {
            status: self.acquisition.status(),
            search: self.view.search().to_string(),
            sort: self.view.sort(),
            page: view.page,
            page_count: view.page_count,
            total_matches: view.total_matches,
            total_records: self.records.len(),
            records: view.records,
        }
    }

    pub fn status(&self) -> SourceStatus {
        self.acquisition.status()
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn view(&self) -> &ViewEngine {
        &self.view
    }
}
