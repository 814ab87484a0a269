use std::fmt::Write;

use crate::{
    acquisition::SourceStatus,
    engine::ViewSnapshot,
    record::EvidenceRecord,
    time::format_timestamp,
};

pub const VERIFIED: &str = "✓ VERIFIED";
pub const FAILURE_DETECTED: &str = "⚠ FAILURE DETECTED";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    // include the pretty-printed evidence bundle under each record
    pub evidence: bool,
}

pub fn status_banner(status: SourceStatus) -> &'static str {
    match status {
        SourceStatus::Loading => "Initializing verification engine...",
        SourceStatus::Live => "System Live | Monitoring Active",
        SourceStatus::Degraded => "Log server unreachable | Showing sample data",
    }
}

pub fn verdict(record: &EvidenceRecord) -> &'static str {
    if record.success() { VERIFIED } else { FAILURE_DETECTED }
}

pub fn render(snapshot: &ViewSnapshot, options: RenderOptions) -> String {
    render_with(snapshot, options, format_timestamp)
}

// `format_time` is injected so output can be pinned to a zone
pub fn render_with<F>(snapshot: &ViewSnapshot, options: RenderOptions, format_time: F) -> String
where
    F: Fn(f64) -> String,
{
    let mut out = String::new();
    let _ = writeln!(out, "== NCV Sentinel == {}", status_banner(snapshot.status));
    if snapshot.status == SourceStatus::Loading {
        return out;
    }
    let search = if snapshot.search.is_empty() {
        String::new()
    } else {
        format!(" | search: \"{}\"", snapshot.search)
    };
    let _ = writeln!(
        out,
        "Sort by Time ({}){search} | Showing {} entries",
        snapshot.sort.label(),
        snapshot.total_matches,
    );
    out.push('\n');

    if snapshot.total_records == 0 {
        let _ = writeln!(out, "No challenges recorded yet. Running...");
        return out;
    }
    if snapshot.records.is_empty() {
        let _ = writeln!(out, "No matching entries.");
    }
    for record in &snapshot.records {
        render_record(&mut out, record, options, &format_time);
    }

    let bar = page_bar(snapshot.page, snapshot.page_count);
    if !bar.is_empty() {
        let _ = writeln!(out, "Pages: {bar}");
    }
    out
}

fn render_record<F>(out: &mut String, record: &EvidenceRecord, options: RenderOptions, format_time: &F)
where
    F: Fn(f64) -> String,
{
    let _ = writeln!(
        out,
        "[{}] {} | {}",
        format_time(record.timestamp()),
        record.proof_type(),
        verdict(record),
    );
    let _ = writeln!(out, "    {}", record.message());
    if options.evidence && !record.evidence().is_null() {
        let pretty = serde_json::to_string_pretty(record.evidence())
            .unwrap_or_else(|_| record.evidence().to_string());
        for line in pretty.lines() {
            let _ = writeln!(out, "      {line}");
        }
    }
}

// "[1] 2 3", empty when there are no pages
pub fn page_bar(page: usize, page_count: usize) -> String {
    (1..=page_count)
        .map(|i| if i == page { format!("[{i}]") } else { i.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SortOrder;
    use serde_json::json;

    fn snapshot(status: SourceStatus, records: Vec<EvidenceRecord>) -> ViewSnapshot {
        ViewSnapshot {
            status: status,
            search: String::new(),
            sort: SortOrder::Ascending,
            page: 1,
            page_count: if records.is_empty() { 0 } else { 1 },
            total_matches: records.len(),
            total_records: records.len(),
            records: records,
        }
    }

    fn fixed_time(ts: f64) -> String {
        format!("t{ts}")
    }

    #[test]
    fn test_page_bar() {
        assert_eq!(page_bar(2, 3), "1 [2] 3");
        assert_eq!(page_bar(1, 0), "");
    }

    #[test]
    fn test_loading_shows_only_banner() {
        let text = render_with(&snapshot(SourceStatus::Loading, vec![]), RenderOptions::default(), fixed_time);
        assert_eq!(text, "== NCV Sentinel == Initializing verification engine...\n");
    }

    #[test]
    fn test_empty_live_set() {
        let text = render_with(&snapshot(SourceStatus::Live, vec![]), RenderOptions::default(), fixed_time);
        assert!(text.contains("No challenges recorded yet. Running..."));
        assert!(!text.contains("Pages:"));
    }

    #[test]
    fn test_records_and_evidence() {
        let record = EvidenceRecord::new(
            "Head Correctness",
            false,
            "STATE ROOT MISMATCH at block 7",
            json!({"block_number": 7}),
            3.0,
        );
        let view = snapshot(SourceStatus::Degraded, vec![record]);

        let text = render_with(&view, RenderOptions::default(), fixed_time);
        assert!(text.contains("Showing sample data"));
        assert!(text.contains("Sort by Time (asc) | Showing 1 entries"));
        assert!(text.contains("[t3] Head Correctness | ⚠ FAILURE DETECTED\n    STATE ROOT MISMATCH at block 7\n"));
        assert!(!text.contains("block_number"));
        assert!(text.ends_with("Pages: [1]\n"));

        let text = render_with(&view, RenderOptions { evidence: true }, fixed_time);
        assert!(text.contains("      \"block_number\": 7"));
    }

    #[test]
    fn test_no_matches() {
        let mut view = snapshot(SourceStatus::Live, vec![]);
        view.total_records = 5;
        view.search = "zzz".to_string();
        let text = render_with(&view, RenderOptions::default(), fixed_time);
        assert!(text.contains("search: \"zzz\" | Showing 0 entries"));
        assert!(text.contains("No matching entries."));
    }
}
