//! `report_by_event_type` aggregation.

use std::collections::BTreeMap;

use contracts::{EventReportRow, EventTypeReportRow};

/// Percentage of matched events over applicable ones, 1 decimal.
pub fn match_rate_pct(matched: usize, not_matched: usize) -> Option<f64> {
    let applicable = matched + not_matched;
    (applicable > 0).then(|| (matched as f64 / applicable as f64 * 1000.0).round() / 10.0)
}

/// One row per event type, sorted by type. Match counts only cover events
/// where matching applies.
pub fn by_event_type(rows: &[EventReportRow]) -> Vec<EventTypeReportRow> {
    let mut groups: BTreeMap<&str, EventTypeReportRow> = BTreeMap::new();

    for row in rows {
        let entry = groups
            .entry(row.event_type.as_str())
            .or_insert_with(|| EventTypeReportRow {
                event_type: row.event_type.clone(),
                ..Default::default()
            });
        entry.nb_events += 1;
        entry.is_matched_applicable |= row.is_matched_applicable;

        match row.is_matched {
            Some(true) => {
                entry.is_matched += 1;
                if row.is_player_detected {
                    entry.is_matched_is_player_detected += 1;
                }
            }
            Some(false) => {
                entry.is_not_matched += 1;
                if row.is_player_detected {
                    entry.is_not_matched_is_player_detected += 1;
                }
                if row.has_provider_player_id_attached {
                    entry.is_not_matched_has_provider_player_id_attached += 1;
                }
                if row.frame_tracking_data_available {
                    entry.is_not_matched_frame_tracking_data_available += 1;
                }
            }
            None => {}
        }
    }

    groups
        .into_values()
        .map(|mut row| {
            row.pct_is_matched = match_rate_pct(row.is_matched, row.is_not_matched);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_type: &str, is_matched: Option<bool>, detected: bool) -> EventReportRow {
        EventReportRow {
            event_id: "e".into(),
            event_type: event_type.to_string(),
            period: 1,
            frame: Some(1),
            player_id: None,
            provider_player_id: None,
            player_name: None,
            player_role: None,
            player_number: None,
            starting: false,
            team_id: None,
            provider_team_id: None,
            team_type: None,
            team_name: None,
            is_matched,
            is_player_detected: detected,
            has_provider_player_id_attached: true,
            frame_tracking_data_available: true,
            is_matched_applicable: is_matched.is_some(),
        }
    }

    #[test]
    fn test_rate_excludes_non_applicable() {
        let rows = vec![
            row("pass", Some(true), true),
            row("pass", Some(true), false),
            row("pass", Some(false), true),
            row("pass", None, true),
        ];
        let types = by_event_type(&rows);
        assert_eq!(types.len(), 1);
        let pass = &types[0];
        assert_eq!(pass.nb_events, 4);
        assert_eq!(pass.is_matched, 2);
        assert_eq!(pass.is_not_matched, 1);
        assert_eq!(pass.pct_is_matched, Some(66.7));
        assert_eq!(pass.is_matched_is_player_detected, 1);
        assert_eq!(pass.is_not_matched_is_player_detected, 1);
        assert_eq!(pass.is_not_matched_has_provider_player_id_attached, 1);
        assert_eq!(pass.is_not_matched_frame_tracking_data_available, 1);
        assert!(pass.is_matched_applicable);
    }

    #[test]
    fn test_rate_matches_counts_for_every_type() {
        let rows = vec![
            row("shot", Some(false), false),
            row("pass", Some(true), true),
            row("card", None, false),
            row("shot", Some(true), true),
        ];
        let types = by_event_type(&rows);
        let names: Vec<_> = types.iter().map(|t| t.event_type.as_str()).collect();
        assert_eq!(names, ["card", "pass", "shot"]);

        for t in &types {
            assert_eq!(t.pct_is_matched, match_rate_pct(t.is_matched, t.is_not_matched));
        }
        assert_eq!(types[0].pct_is_matched, None);
        assert!(!types[0].is_matched_applicable);
        assert_eq!(types[2].pct_is_matched, Some(50.0));
    }
}
