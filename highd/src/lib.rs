//! `highd` — Data plumbing around the core: highD track files, JSON-lines
//! exchange, config files, synthetic scenarios.

pub mod jsonl;
pub mod scenarios;
pub mod tracks;

pub use jsonl::{load_config, load_records, load_verdicts, save_records, save_verdicts};
pub use scenarios::{Scenario, ScenarioKind};
pub use tracks::{collect_track_files, read_tracks, TrackFile};
