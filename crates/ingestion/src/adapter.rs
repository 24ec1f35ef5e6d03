//! Event adapter trait
//!
//! One implementation per event provider. Adapters own the decoded provider
//! documents and turn them into canonical `Event`s against the match roster.

use contracts::{Event, LineupInfo, Provider};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::match_data::{MatchData, MatchPlayer};

/// Event adapter trait
///
/// Implementations are responsible for:
/// 1. Dropping records outside regular and extra time
/// 2. Expressing timestamps as seconds since the period kick-off
/// 3. Mapping provider player/team ids onto the roster
/// 4. Flagging pass/shot refinement and non-matchable types
pub trait EventAdapter: Send + Sync {
    /// Provider handled by this adapter
    fn provider(&self) -> Provider;

    /// Provider type names that never carry a ball-involving instant
    fn non_matchable_types(&self) -> &'static [&'static str];

    /// Convert provider records into canonical events, in provider order
    fn standardize(&self, match_data: &MatchData) -> Result<Vec<Event>>;
}

/// Run an adapter, order its events by period then timestamp, and attach
/// lineup metadata to every mapped event.
///
/// The sort is stable: events sharing an instant keep provider order.
#[instrument(name = "ingestion_standardize_events", skip_all, fields(provider = %adapter.provider()))]
pub fn standardize_events(adapter: &dyn EventAdapter, match_data: &MatchData) -> Result<Vec<Event>> {
    let mut events = adapter.standardize(match_data)?;
    events.sort_by(|a, b| {
        a.period
            .cmp(&b.period)
            .then(a.timestamp_s.total_cmp(&b.timestamp_s))
    });

    let mut unmapped = 0u64;
    for event in &mut events {
        event.lineup = event
            .player_id
            .and_then(|id| match_data.player(id))
            .map(lineup_of);
        if event.player_id.is_none() && event.has_provider_player_id() {
            unmapped += 1;
        }
    }

    let provider = adapter.provider().prefix();
    metrics::counter!("event_sync_events_standardized_total", "provider" => provider)
        .increment(events.len() as u64);
    metrics::counter!("event_sync_events_unmapped_player_total", "provider" => provider)
        .increment(unmapped);
    debug!(events = events.len(), unmapped, "events standardized");

    Ok(events)
}

fn lineup_of(player: &MatchPlayer) -> LineupInfo {
    LineupInfo {
        name: player.short_name.clone(),
        number: player.number,
        role: player.player_role.as_ref().and_then(|r| r.acronym.clone()),
        starting: player.start_time.as_deref() == Some("00:00:00"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_data::tests::sample;
    use crate::mock::MockAdapter;

    #[test]
    fn test_lineup_attached() {
        let mut mapped = Event::new("1", "pass", 1, 1.0);
        mapped.player_id = Some(1);
        let mut unmapped = Event::new("2", "pass", 1, 2.0);
        unmapped.provider_player_id = Some("777".into());

        let adapter = MockAdapter::new(Provider::Wyscout, vec![mapped, unmapped]);
        let events = standardize_events(&adapter, &sample()).unwrap();

        let lineup = events[0].lineup.as_ref().unwrap();
        assert_eq!(lineup.name.as_deref(), Some("H. Nine"));
        assert_eq!(lineup.number, Some(9));
        assert_eq!(lineup.role.as_deref(), Some("CF"));
        assert!(lineup.starting);
        assert_eq!(events[1].lineup, None);
    }

    #[test]
    fn test_events_ordered_by_period_and_time() {
        let events = vec![
            Event::new("late-1", "duel", 1, 30.0),
            Event::new("2a", "pass", 2, 5.0),
            Event::new("1a", "pass", 1, 10.0),
            Event::new("1b", "shot", 1, 10.0),
            Event::new("2b", "pass", 2, 1.0),
        ];
        let adapter = MockAdapter::new(Provider::Opta, events);
        let events = standardize_events(&adapter, &sample()).unwrap();

        let ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["1a", "1b", "late-1", "2b", "2a"]);
    }
}
