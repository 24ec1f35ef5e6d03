//! `report_by_event` rows.

use contracts::{Event, EventReportRow, MatchContext, SyncResult};

use crate::event_team;

/// Row for one event. Player details come from the roster, else from the
/// lineup attached by the adapter.
pub fn event_row(context: &MatchContext, event: &Event, result: &SyncResult) -> EventReportRow {
    let roster = event.player_id.and_then(|id| context.player(id));
    let lineup = roster.map(|p| p.lineup()).or_else(|| event.lineup.clone()).unwrap_or_default();
    let team_id = event_team(context, event);
    let team = team_id.and_then(|id| context.team(id));

    EventReportRow {
        event_id: event.id.clone(),
        event_type: event.type_name.clone(),
        period: event.period,
        frame: result.frame,
        player_id: event.player_id,
        provider_player_id: event.provider_player_id.clone(),
        player_name: lineup.name,
        player_role: lineup.role,
        player_number: lineup.number,
        starting: lineup.starting,
        team_id,
        provider_team_id: event.provider_team_id.clone(),
        team_type: team.map(|(_, kind)| kind),
        team_name: team.map(|(info, _)| info.name.clone()),
        is_matched: result.reported_is_matched(),
        is_player_detected: result.is_player_detected,
        has_provider_player_id_attached: result.has_player_id_attached,
        frame_tracking_data_available: result.frame_tracking_data_available,
        is_matched_applicable: result.is_matched_applicable,
    }
}
