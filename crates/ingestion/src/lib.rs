//! # Ingestion
//!
//! Input side of the synchronizer.
//!
//! Responsibilities:
//! - Load SkillCorner match metadata and the tracking stream
//! - Decode provider event documents (Wyscout, Opta, StatsBomb, Impect)
//! - Standardize provider events into canonical `Event`s mapped onto the roster
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{standardize_events, load_tracking, MatchData, WyscoutAdapter};
//!
//! let match_data = MatchData::from_json(&match_json)?;
//! let frames = load_tracking(Path::new("tracking.jsonl")).await?;
//! let adapter = WyscoutAdapter::from_json(&events_json)?;
//! let events = standardize_events(&adapter, &match_data)?;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockMatch, MockMatchConfig};
//!
//! let mock = MockMatch::generate(&MockMatchConfig::default());
//! ```

mod adapter;
mod adapters;
mod error;
mod match_data;
mod mock;
mod tracking;

// Re-exports
pub use adapter::{standardize_events, EventAdapter};
pub use adapters::{ImpectAdapter, OptaAdapter, StatsBombAdapter, WyscoutAdapter};
pub use error::{IngestionError, Result};
pub use match_data::{MatchData, MatchPlayer, MatchTeam, PlayerRole};
pub use mock::{
    mock_position, MockAdapter, MockMatch, MockMatchConfig, MockPeriod, MOCK_AWAY_TEAM,
    MOCK_HOME_TEAM,
};
pub use tracking::{load_json, load_tracking, parse_tracking, parse_tracking_line, read_text};
