//! Leverage bracket picker.
//!
//! Combines a crowd pick sheet with a model forecast into a per-team, per-round
//! leverage score, then picks a consistent bracket (champion through Round of 32)
//! from those scores using only seed and region to respect the bracket's shape.

pub mod config;
pub mod error;
pub mod ingest;
pub mod leverage;
pub mod report;
pub mod selector;
pub mod topology;

pub use config::Config;
pub use error::{ConfigError, IngestError, RecordError, SelectionIssue, UnmappedSeed};
pub use ingest::{Team, TeamTable};
pub use leverage::{LeverageRecord, Round};
pub use report::OutputFormat;
pub use selector::{select, BracketPicks, BracketSelector, Phase};
pub use topology::{Granularity, RegionHalves, SeedSlot};
