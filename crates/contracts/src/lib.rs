//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Tracking frames are the primary clock (`frame`, fixed `frame_rate`)
//! - Events carry seconds since their period's kick-off on the provider clock
//! - A period offset maps one onto the other:
//!   `tracking_frame = round(timestamp_s * frame_rate) + offset`

mod error;
mod event;
mod match_context;
mod provider_id;
mod report;
mod sink;
mod sync;
mod sync_config;
mod tracking;

pub use error::*;
pub use event::*;
pub use match_context::*;
pub use provider_id::ProviderId;
pub use report::*;
pub use sink::*;
pub use sync::*;
pub use sync_config::*;
pub use tracking::*;
