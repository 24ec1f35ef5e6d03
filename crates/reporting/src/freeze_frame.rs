//! Freeze-frame records.

use contracts::{Event, FrameSnapshotSource, FreezeFrameRecord, MatchContext, Provider, SyncResult};

use crate::event_team;

/// Snapshot at the assigned frame merged with the event, when the frame
/// exists in the tracking stream.
pub fn freeze_frame<S>(
    provider: Provider,
    context: &MatchContext,
    event: &Event,
    result: &SyncResult,
    snapshots: &S,
) -> Option<FreezeFrameRecord>
where
    S: FrameSnapshotSource + ?Sized,
{
    let snapshot = snapshots.snapshot(result.frame?)?;
    Some(FreezeFrameRecord {
        provider,
        snapshot,
        event_id: event.id.clone(),
        event_type: event.type_name.clone(),
        player_id: event.player_id,
        provider_player_id: event.provider_player_id.clone(),
        team_id: event_team(context, event),
        provider_team_id: event.provider_team_id.clone(),
        is_matched: result.reported_is_matched(),
        is_player_detected: result.is_player_detected,
        projected_x: result.projected_x,
        projected_y: result.projected_y,
    })
}
