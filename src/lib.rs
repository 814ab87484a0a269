//! Evidence log stream engine for NCV Sentinel.
//!
//! Polls a log server for verification-evidence records, merges records pushed
//! over an event stream, and serves a filtered, sorted, paginated view of the
//! result. When the log server is unreachable a bundled sample dataset is shown
//! until it comes back.

pub mod acquisition;
pub mod config;
pub mod console;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod merge;
pub mod push;
pub mod record;
pub mod render;
pub mod source;
pub mod time;
pub mod view;

pub use acquisition::SourceStatus;
pub use config::Config;
pub use driver::{spawn, EngineHandle};
pub use engine::{Command, Engine, ViewSnapshot};
pub use record::{EvidenceRecord, RecordKey};
pub use source::{HttpLogSource, LogSource};
pub use view::SortOrder;
