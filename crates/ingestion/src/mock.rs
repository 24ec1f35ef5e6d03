//! Synthetic match generator
//!
//! Builds a small match whose ground truth is known: eight static players,
//! a ball passed around them at a fixed cadence, and provider events whose
//! clock is shifted from the tracking clock by a chosen drift per period.
//! Used by tests across the workspace where no real feed is available.

use contracts::{
    AttackingSide, BallSample, Event, EventKind, PitchPoint, PlayerId, PlayerSample, Provider,
    ProviderId, TrackingFrame,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adapter::EventAdapter;
use crate::error::Result;
use crate::match_data::{MatchData, MatchPlayer, MatchTeam};

pub const MOCK_HOME_TEAM: u64 = 100;
pub const MOCK_AWAY_TEAM: u64 = 200;

/// Passing order; consecutive holders are 20 m apart.
const PASS_CYCLE: [PlayerId; 8] = [1, 2, 3, 4, 14, 13, 12, 11];

/// Ball offset from the holder's position while held.
const HOLD_OFFSET_M: f64 = 0.5;

/// One mocked period
#[derive(Debug, Clone)]
pub struct MockPeriod {
    pub period: u8,
    pub first_frame: u32,
    /// Provider clock lag, in frames, relative to the tracking kick-off
    pub drift_frames: i64,
    pub passes: usize,
}

/// Mock match configuration
#[derive(Debug, Clone)]
pub struct MockMatchConfig {
    pub frame_rate: f64,
    pub periods: Vec<MockPeriod>,
    /// Frames between two consecutive passes
    pub pass_interval: u32,
    /// Frames the ball travels between two players
    pub travel_frames: u32,
    /// Uniform noise added to event timestamps, seconds
    pub jitter_s: f64,
    pub seed: u64,
}

impl Default for MockMatchConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            periods: vec![
                MockPeriod {
                    period: 1,
                    first_frame: 100,
                    drift_frames: 12,
                    passes: 15,
                },
                MockPeriod {
                    period: 2,
                    first_frame: 1000,
                    drift_frames: -8,
                    passes: 15,
                },
            ],
            pass_interval: 40,
            travel_frames: 20,
            jitter_s: 0.0,
            seed: 7,
        }
    }
}

/// Generated match with its ground truth
#[derive(Debug, Clone)]
pub struct MockMatch {
    pub match_data: MatchData,
    pub frames: Vec<TrackingFrame>,
    pub events: Vec<Event>,
    /// Tracking frame of every pass kick, in event order
    pub kick_frames: Vec<u32>,
}

/// Fixed player spots: home on y = -10, away on y = +10.
pub fn mock_position(player_id: PlayerId) -> (f64, f64) {
    let column = |i: u64| -30.0 + 20.0 * (i as f64 - 1.0);
    match player_id {
        1..=4 => (column(player_id), -10.0),
        11..=14 => (column(player_id - 10), 10.0),
        _ => (0.0, 0.0),
    }
}

fn mock_team(player_id: PlayerId) -> u64 {
    if player_id < 10 {
        MOCK_HOME_TEAM
    } else {
        MOCK_AWAY_TEAM
    }
}

fn mock_match_data() -> MatchData {
    let team = |id: u64, name: &str, short: &str| MatchTeam {
        id,
        name: Some(name.to_string()),
        short_name: Some(short.to_string()),
    };
    let players = PASS_CYCLE
        .iter()
        .map(|&id| MatchPlayer {
            id,
            team_id: mock_team(id),
            number: Some(id as u32),
            short_name: Some(format!("Player {id}")),
            player_role: None,
            start_time: Some("00:00:00".to_string()),
            wyscout_id: Some(ProviderId::from(format!("p{id}"))),
        })
        .collect();

    MatchData {
        id: Some(1),
        date_time: None,
        home_team: team(MOCK_HOME_TEAM, "Mock Home", "MHO"),
        away_team: team(MOCK_AWAY_TEAM, "Mock Away", "MAW"),
        players,
        pitch_length: 105.0,
        pitch_width: 68.0,
        home_team_side: Some(vec![AttackingSide::LeftToRight, AttackingSide::RightToLeft]),
    }
}

fn held(player_id: PlayerId) -> (f64, f64) {
    let (x, y) = mock_position(player_id);
    (x + HOLD_OFFSET_M, y)
}

fn clock(frame: u32, frame_rate: f64) -> String {
    let total = f64::from(frame) / frame_rate;
    let minutes = (total / 60.0).floor();
    let hours = (minutes / 60.0).floor();
    format!(
        "{:02}:{:02}:{:05.2}",
        hours as u32,
        (minutes - hours * 60.0) as u32,
        total - minutes * 60.0
    )
}

impl MockMatch {
    pub fn generate(config: &MockMatchConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut frames = Vec::new();
        let mut events = Vec::new();
        let mut kick_frames = Vec::new();

        for period in &config.periods {
            let first = period.first_frame;
            let kicks: Vec<u32> = (1..=period.passes as u32)
                .map(|k| first + k * config.pass_interval)
                .collect();
            let last = first + (period.passes as u32 + 1) * config.pass_interval;

            for frame in first..=last {
                let (bx, by) = Self::ball_at(config, &kicks, frame);
                let mut record = TrackingFrame::new(frame, Some(period.period));
                record.timestamp = Some(clock(frame, config.frame_rate));
                record.ball_data = BallSample {
                    x: Some(bx),
                    y: Some(by),
                    z: Some(0.1),
                    is_detected: Some(true),
                };
                record.player_data = PASS_CYCLE
                    .iter()
                    .map(|&id| {
                        let (x, y) = mock_position(id);
                        PlayerSample {
                            player_id: id,
                            x: Some(x),
                            y: Some(y),
                            is_detected: Some(true),
                        }
                    })
                    .collect();
                frames.push(record);
            }

            for (k, &kick) in kicks.iter().enumerate() {
                let passer = PASS_CYCLE[k % PASS_CYCLE.len()];
                let jitter = if config.jitter_s > 0.0 {
                    rng.random_range(-config.jitter_s..=config.jitter_s)
                } else {
                    0.0
                };
                let provider_frames = i64::from(kick) - i64::from(first) - period.drift_frames;
                let timestamp_s = provider_frames as f64 / config.frame_rate + jitter;

                let mut event = Event::new(
                    format!("{}-{}", period.period, k + 1),
                    "pass",
                    period.period,
                    timestamp_s,
                );
                event.kind = EventKind::Pass;
                event.player_id = Some(passer);
                event.provider_player_id = Some(ProviderId::from(format!("p{passer}")));
                event.team_id = Some(mock_team(passer));
                event.provider_team_id = Some(ProviderId::from(format!("t{}", mock_team(passer))));
                let (x, y) = mock_position(passer);
                event.location = Some(PitchPoint::new(x, y));
                event.to_refine = true;
                event.refine_radius = Some(10);
                events.push(event);
                kick_frames.push(kick);
            }

            let mut stoppage = Event::new(
                format!("{}-stop", period.period),
                "game_interruption",
                period.period,
                f64::from(last - first) / 2.0 / config.frame_rate,
            );
            stoppage.matchable = false;
            events.push(stoppage);
        }

        Self {
            match_data: mock_match_data(),
            frames,
            events,
            kick_frames,
        }
    }

    /// Ball position: held by the current holder, or travelling linearly
    /// during the `travel_frames` following a kick.
    fn ball_at(config: &MockMatchConfig, kicks: &[u32], frame: u32) -> (f64, f64) {
        let done = kicks.iter().take_while(|&&k| k <= frame).count();
        if done == 0 {
            return held(PASS_CYCLE[0]);
        }
        let k = done - 1;
        let from = held(PASS_CYCLE[k % PASS_CYCLE.len()]);
        let to = held(PASS_CYCLE[(k + 1) % PASS_CYCLE.len()]);
        let elapsed = frame - kicks[k];
        if elapsed >= config.travel_frames {
            return to;
        }
        let t = f64::from(elapsed) / f64::from(config.travel_frames);
        (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
    }

    /// Tracking stream as JSON lines.
    pub fn tracking_jsonl(&self) -> String {
        self.frames
            .iter()
            .filter_map(|f| serde_json::to_string(f).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Adapter serving pre-built events, used to drive pipelines end to end.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    provider: Provider,
    events: Vec<Event>,
}

impl MockAdapter {
    pub fn new(provider: Provider, events: Vec<Event>) -> Self {
        Self { provider, events }
    }
}

impl EventAdapter for MockAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn non_matchable_types(&self) -> &'static [&'static str] {
        &["game_interruption"]
    }

    fn standardize(&self, _match_data: &MatchData) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }
}
