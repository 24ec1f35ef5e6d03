//! # Sync Engine
//!
//! Aligns provider events with the tracking stream of one match.
//!
//! Responsibilities:
//! - Per-period offset estimation from pass events
//! - Frame refinement around the offset-implied frame
//! - Match validation against player-ball proximity
//! - Attacking side resolution and coordinate projection
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::SyncConfig;
//! use sync_engine::SyncEngine;
//!
//! let engine = SyncEngine::new(SyncConfig::default());
//! let index = engine.index(frames)?;
//! let outcome = engine.run(&context, &index, &events)?;
//!
//! for (event, result) in events.iter().zip(&outcome.results) {
//!     println!("{} -> {:?}", event.id, result.frame);
//! }
//! ```

mod engine;
mod error;
mod index;
pub mod kinematics;
mod matching;
mod offset;
mod refine;
mod side;

pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use index::TrackingIndex;
pub use matching::{MatchValidator, Verdict};
pub use offset::{quantile, OffsetEstimator};
pub use refine::{find_kick, FrameRefiner, KickSearch};
pub use side::SideMap;

// Re-export contracts types
pub use contracts::{PeriodOffset, SyncConfig, SyncOutcome, SyncResult};
