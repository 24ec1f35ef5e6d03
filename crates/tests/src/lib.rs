//! # Integration Tests
//!
//! End-to-end tests over the synthetic match.
//!
//! Covers:
//! - Contract checks between the config loader and the engine defaults
//! - Mock e2e runs: tracking JSONL -> standardize -> engine -> reports -> sinks
//! - Failure paths that must abort a run

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SyncConfig;

    #[test]
    fn test_default_config_passes_validation() {
        ConfigLoader::validate(&SyncConfig::default()).unwrap();
    }

    #[test]
    fn test_serialized_defaults_reload() {
        let toml = ConfigLoader::to_toml(&SyncConfig::default()).unwrap();
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use contracts::{Event, Provider, SyncArtifacts, SyncConfig, SyncOutcome};
    use dispatcher::{create_dispatcher, DispatcherConfig, MetricsSnapshot};
    use ingestion::{standardize_events, MockAdapter, MockMatch, MockMatchConfig};
    use reporting::ReportGenerator;
    use sync_engine::{SyncEngine, SyncError, TrackingIndex};
    use tokio::sync::mpsc;

    struct Run {
        events: Vec<Event>,
        outcome: SyncOutcome,
        index: TrackingIndex,
    }

    /// Tracking JSONL round trip, standardization and engine run.
    fn synchronize(mock: &MockMatch, provider: Provider, config: SyncConfig) -> Result<Run, SyncError> {
        let frames = ingestion::parse_tracking(&mock.tracking_jsonl()).unwrap();
        let adapter = MockAdapter::new(provider, mock.events.clone());
        let events = standardize_events(&adapter, &mock.match_data).unwrap();
        let context = mock.match_data.to_context(config.frame_rate);

        let engine = SyncEngine::new(config);
        let index = engine.index(frames)?;
        let outcome = engine.run(&context, &index, &events)?;
        Ok(Run {
            events,
            outcome,
            index,
        })
    }

    async fn dispatch(artifacts: SyncArtifacts, dir: &Path) -> Vec<(String, MetricsSnapshot)> {
        let (tx, rx) = mpsc::channel(1);
        let dispatcher = create_dispatcher(DispatcherConfig::new(dir), rx).await.unwrap();
        let handle = dispatcher.spawn();
        tx.send(artifacts).await.unwrap();
        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("dispatcher timed out")
            .unwrap()
            .unwrap()
    }

    fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    /// End-to-end test: MockMatch -> SyncEngine -> ReportGenerator -> Dispatcher
    ///
    /// Verifies the whole data flow:
    /// 1. Tracking JSONL parses back into the generated frames
    /// 2. Offsets recover the injected drift and every pass lands on its kick
    /// 3. Sinks write both CSV reports and the freeze frames
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let run = synchronize(&mock, Provider::Wyscout, SyncConfig::default()).unwrap();

        assert_eq!(run.outcome.period(1).and_then(|p| p.drift()), Some(12));
        assert_eq!(run.outcome.period(2).and_then(|p| p.drift()), Some(-8));

        let pass_frames: Vec<u32> = run
            .events
            .iter()
            .zip(&run.outcome.results)
            .filter(|(e, _)| e.is_pass())
            .filter_map(|(_, r)| r.frame)
            .collect();
        assert_eq!(pass_frames, mock.kick_frames);

        let context = mock.match_data.to_context(10.0);
        let artifacts = ReportGenerator::new(Provider::Wyscout, &context).generate(
            &run.events,
            &run.outcome,
            &run.index,
        );
        let with_frame = run.outcome.results.iter().filter(|r| r.frame.is_some()).count();
        assert_eq!(artifacts.freeze_frames.len(), with_frame);

        let dir = tempfile::tempdir().unwrap();
        let sinks = dispatch(artifacts, dir.path()).await;
        assert!(sinks.iter().all(|(_, s)| s.write_count == 1 && s.failure_count == 0));

        let (headers, rows) = read_csv(&dir.path().join("report_by_event.csv"));
        assert_eq!(headers[0], "wyscout_event_id");
        assert_eq!(headers.len(), 19);
        assert_eq!(rows.len(), mock.events.len());
        let matched_col = headers.iter().position(|h| h == "is_matched").unwrap();
        let matched = rows.iter().filter(|r| r[matched_col] == "True").count();
        assert_eq!(matched, mock.kick_frames.len());

        let (headers, rows) = read_csv(&dir.path().join("report_by_event_type.csv"));
        assert_eq!(headers[3], "%_is_matched");
        let types: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(types, vec!["game_interruption", "pass"]);
        assert_eq!(rows[1][3], "100.0");
        assert_eq!(rows[0][3], "");

        let freeze: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("freeze_frame_format.json")).unwrap(),
        )
        .unwrap();
        let records = freeze.as_array().unwrap();
        assert_eq!(records.len(), with_frame);
        assert!(records[0].get("wyscout_event_id").is_some());
        assert!(records[0].get("projected_wyscout_event_x").is_some());
    }

    #[tokio::test]
    async fn test_e2e_provider_prefix() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let run = synchronize(&mock, Provider::StatsBomb, SyncConfig::default()).unwrap();
        let context = mock.match_data.to_context(10.0);
        let artifacts = ReportGenerator::new(Provider::StatsBomb, &context).generate(
            &run.events,
            &run.outcome,
            &run.index,
        );

        let dir = tempfile::tempdir().unwrap();
        dispatch(artifacts, dir.path()).await;

        let (headers, _) = read_csv(&dir.path().join("report_by_event.csv"));
        assert!(headers.contains(&"statsbomb_player_id".to_string()));
        assert!(headers.contains(&"has_statsbomb_player_id_attached".to_string()));
        let (headers, _) = read_csv(&dir.path().join("report_by_event_type.csv"));
        assert_eq!(headers[0], "statsbomb_event_type");
    }

    #[test]
    fn test_e2e_jittered_clock() {
        let mock = MockMatch::generate(&MockMatchConfig {
            jitter_s: 0.2,
            ..MockMatchConfig::default()
        });
        let run = synchronize(&mock, Provider::Opta, SyncConfig::default()).unwrap();

        let applicable = run.outcome.applicable_count();
        assert_eq!(applicable, mock.kick_frames.len());
        assert!(
            run.outcome.matched_count() * 10 >= applicable * 9,
            "matched {} of {}",
            run.outcome.matched_count(),
            applicable
        );
    }

    #[test]
    fn test_e2e_no_refine_keeps_implied_frames() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let mut config = SyncConfig::default();
        config.refine.enabled = false;
        let run = synchronize(&mock, Provider::Wyscout, config).unwrap();

        assert!(run.outcome.results.iter().all(|r| !r.was_refined()));
        assert_eq!(run.outcome.matched_count(), run.outcome.applicable_count());
    }

    #[test]
    fn test_e2e_quality_warnings_clean_run() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let config = SyncConfig::default();
        let run = synchronize(&mock, Provider::Wyscout, config.clone()).unwrap();

        let warnings = observability::quality_warnings(&config, &run.events, &run.outcome);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_e2e_ball_never_detected_aborts() {
        let mut mock = MockMatch::generate(&MockMatchConfig::default());
        for frame in &mut mock.frames {
            frame.ball_data.is_detected = Some(false);
        }
        let err = synchronize(&mock, Provider::Wyscout, SyncConfig::default())
            .err()
            .expect("run should fail");
        assert!(matches!(err, SyncError::NoEstimablePeriod { .. }), "{err}");
    }
}
