//! Adapter common utility functions

use std::collections::HashMap;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use contracts::{PlayerId, ProviderId, TeamId};
use serde::{Deserialize, Deserializer};

use crate::match_data::MatchData;

/// Periods kept by every adapter (regular time and extra time).
pub const KNOWN_PERIODS: std::ops::RangeInclusive<u8> = 1..=4;

/// Accept a number or a numeric string.
pub fn de_f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(v) => Ok(v),
        Raw::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{s}'"))),
    }
}

/// Same as [`de_f64_lenient`] for optional values; null stays `None`.
pub fn de_opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "de_f64_lenient")] f64);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0))
}

/// Numeric value of a JSON number or numeric string; anything else is `None`.
pub fn number_of(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Seconds since midnight of an `HH:MM:SS[.fff]` clock string.
pub fn clock_seconds(value: &str) -> Option<f64> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f").ok()?;
    Some(f64::from(time.num_seconds_from_midnight()) + f64::from(time.nanosecond()) / 1e9)
}

/// Parse an ISO-8601 timestamp with optional trailing `Z` and fraction.
pub fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Provider ↔ roster cross-reference resolved through shirt numbers.
///
/// Built from a known team correspondence (home ↔ home, away ↔ away) and the
/// provider lineup; a provider player maps to the roster player of the same
/// team wearing the same number.
#[derive(Debug, Clone, Default)]
pub struct ProviderMapping {
    teams: HashMap<ProviderId, TeamId>,
    players: HashMap<ProviderId, PlayerId>,
}

/// One provider lineup entry
#[derive(Debug, Clone)]
pub struct LineupEntry {
    pub player_id: ProviderId,
    pub team_id: ProviderId,
    pub number: Option<u32>,
}

impl ProviderMapping {
    pub fn from_lineup(
        match_data: &MatchData,
        team_pairs: &[(TeamId, ProviderId)],
        lineup: &[LineupEntry],
    ) -> Self {
        let provider_team_of: HashMap<TeamId, &ProviderId> =
            team_pairs.iter().map(|(team, p)| (*team, p)).collect();

        let by_number: HashMap<(&ProviderId, u32), PlayerId> = match_data
            .players
            .iter()
            .filter_map(|p| {
                let team = provider_team_of.get(&p.team_id)?;
                Some(((*team, p.number?), p.id))
            })
            .collect();

        let players = lineup
            .iter()
            .filter_map(|entry| {
                let id = by_number.get(&(&entry.team_id, entry.number?))?;
                Some((entry.player_id.clone(), *id))
            })
            .collect();

        Self {
            teams: team_pairs
                .iter()
                .map(|(team, provider_team)| (provider_team.clone(), *team))
                .collect(),
            players,
        }
    }

    /// Mapping from already-known direct cross-references.
    pub fn from_parts(
        teams: HashMap<ProviderId, TeamId>,
        players: HashMap<ProviderId, PlayerId>,
    ) -> Self {
        Self { teams, players }
    }

    pub fn team(&self, provider_team: &ProviderId) -> Option<TeamId> {
        self.teams.get(provider_team).copied()
    }

    pub fn player(&self, provider_player: &ProviderId) -> Option<PlayerId> {
        self.players.get(provider_player).copied()
    }

    pub fn provider_team(&self, team: TeamId) -> Option<&ProviderId> {
        self.teams
            .iter()
            .find(|(_, t)| **t == team)
            .map(|(provider_team, _)| provider_team)
    }

    pub fn mapped_players(&self) -> usize {
        self.players.len()
    }
}
