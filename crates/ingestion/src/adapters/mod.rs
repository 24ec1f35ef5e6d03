//! Provider adapters
//!
//! One adapter per event provider, each turning the provider's documents
//! into canonical `Event`s.

pub mod common;
mod impect;
mod opta;
mod statsbomb;
mod wyscout;

pub use impect::ImpectAdapter;
pub use opta::OptaAdapter;
pub use statsbomb::StatsBombAdapter;
pub use wyscout::WyscoutAdapter;
