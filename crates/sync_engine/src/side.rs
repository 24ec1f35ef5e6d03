//! Attacking side per period and team, and event projection.

use std::collections::HashMap;

use contracts::{AttackingSide, Event, MatchContext, PlayerId, Projected, TeamId};
use tracing::debug;

use crate::index::TrackingIndex;

/// Attacking side of both teams in every tracked period
#[derive(Debug, Clone, Default)]
pub struct SideMap {
    sides: HashMap<(u8, TeamId), AttackingSide>,
}

impl SideMap {
    /// Sides from match metadata when declared, else from mean team x:
    /// the home team attacks left to right when it sits further left.
    pub fn resolve(context: &MatchContext, index: &TrackingIndex) -> Self {
        let (home, away) = (context.home_team.id, context.away_team.id);
        let players_of = |team: TeamId| -> Vec<PlayerId> {
            context
                .active_players()
                .filter(|p| p.team_id == team)
                .map(|p| p.id)
                .collect()
        };
        let (home_players, away_players) = (players_of(home), players_of(away));

        let mut sides = HashMap::new();
        for bounds in index.periods() {
            let home_side = context.declared_side(home, bounds.period).or_else(|| {
                let home_x = index.mean_x(&home_players, bounds)?;
                let away_x = index.mean_x(&away_players, bounds)?;
                Some(if home_x < away_x {
                    AttackingSide::LeftToRight
                } else {
                    AttackingSide::RightToLeft
                })
            });
            let Some(home_side) = home_side else {
                debug!(period = bounds.period, "attacking side unknown");
                continue;
            };
            sides.insert((bounds.period, home), home_side);
            sides.insert((bounds.period, away), home_side.flipped());
        }
        Self { sides }
    }

    pub fn side(&self, period: u8, team: TeamId) -> Option<AttackingSide> {
        self.sides.get(&(period, team)).copied()
    }

    /// Event location in the attacking frame of the event's team.
    pub fn project(&self, event: &Event, team: Option<TeamId>) -> (Projected, Projected) {
        let side = team.and_then(|t| self.side(event.period, t));
        match (event.location, side) {
            (Some(loc), Some(side)) => {
                let sign = match side {
                    AttackingSide::LeftToRight => 1.0,
                    AttackingSide::RightToLeft => -1.0,
                };
                let round2 = |v: f64| (v * 100.0).round() / 100.0;
                (
                    Projected::Value(round2(sign * loc.x)),
                    Projected::Value(round2(sign * loc.y)),
                )
            }
            _ => (Projected::Unknown, Projected::Unknown),
        }
    }
}
