use serde::{
    Serialize, Deserialize
};

use crate::{
    error::ViewError,
    merge::RecordSet,
    record::EvidenceRecord,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    // as held in the record set, most recent arrival first
    #[default]
    Arrival,

    Ascending,

    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Arrival | SortOrder::Descending => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Descending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Arrival => "arrival",
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One computed page of the filtered, sorted record set.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub records: Vec<EvidenceRecord>,

    // 1-based
    pub page: usize,

    pub page_count: usize,

    pub total_matches: usize,
}

/// Filter -> sort -> paginate over a [`RecordSet`].
///
/// Holds only the operator's choices; every [`View`] is recomputed from scratch.
#[derive(Debug, Clone)]
pub struct ViewEngine {
    search: String,

    // lowercased `search`
    needle: String,

    sort: SortOrder,

    page: usize,

    page_size: usize,
}

impl ViewEngine {
    pub fn new(page_size: usize) -> Self {
        ViewEngine {
            search: String::new(),
            needle: String::new(),
            sort: SortOrder::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // a new term always starts over from the first page
    pub fn set_search(&mut self, term: &str) -> bool {
        if term == self.search {
            return false;
        }
        self.search = term.to_string();
        self.needle = term.to_lowercase();
        self.page = 1;
        true
    }

    pub fn toggle_sort(&mut self) -> SortOrder {
        self.sort = self.sort.toggled();
        self.sort
    }

    pub fn go_to_page(&mut self, page: usize, set: &RecordSet) -> Result<(), ViewError> {
        let page_count = self.page_count(self.count_matches(set));
        if page == 0 || page > page_count {
            return Err(ViewError::PageOutOfRange { page, page_count });
        }
        self.page = page;
        Ok(())
    }

    // keep the page inside the set after it shrank
    pub fn clamp_page(&mut self, set: &RecordSet) -> bool {
        let last = self.page_count(self.count_matches(set)).max(1);
        if self.page > last {
            self.page = last;
            return true;
        }
        false
    }

    pub fn matches(&self, record: &EvidenceRecord) -> bool {
        self.needle.is_empty() ||
        record.message().to_lowercase().contains(&self.needle)
    }

    pub fn page_count(&self, matches: usize) -> usize {
        matches.div_ceil(self.page_size)
    }

    pub fn compute(&self, set: &RecordSet) -> View {
        let mut matched: Vec<&EvidenceRecord> = set
            .iter()
            .filter(|r| self.matches(r))
            .collect();
        match self.sort {
            SortOrder::Arrival => {},

            SortOrder::Ascending => {
                matched.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
            },

            SortOrder::Descending => {
                matched.sort_by(|a, b| b.timestamp().total_cmp(&a.timestamp()));
            },
        }
        let total_matches = matched.len();
        let records = matched
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();
        View {
            records: records,
            page: self.page,
            page_count: self.page_count(total_matches),
            total_matches: total_matches,
        }
    }

    fn count_matches(&self, set: &RecordSet) -> usize {
        set.iter().filter(|r| self.matches(r)).count()
    }
}
