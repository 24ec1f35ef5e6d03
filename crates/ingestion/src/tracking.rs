//! Tracking stream loading
//!
//! Accepts JSON Lines (one frame per line) or a single JSON array of frames.
//! Blank lines are ignored; any other undecodable line aborts the load with
//! its line number.

use std::path::Path;

use contracts::TrackingFrame;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

/// Parse one JSONL record.
pub fn parse_tracking_line(line: &str, line_no: usize) -> Result<TrackingFrame> {
    serde_json::from_str(line).map_err(|e| {
        IngestionError::parse_failed(format!("tracking line {line_no}"), e.to_string())
    })
}

/// Parse a whole tracking document held in memory.
pub fn parse_tracking(content: &str) -> Result<Vec<TrackingFrame>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content)
            .map_err(|e| IngestionError::parse_failed("tracking data", e.to_string()));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_tracking_line(line, idx + 1))
        .collect()
}

/// Stream a tracking file from disk, line by line.
#[instrument(name = "ingestion_load_tracking", skip_all, fields(path = %path.display()))]
pub async fn load_tracking(path: &Path) -> Result<Vec<TrackingFrame>> {
    let file = File::open(path).await.map_err(|source| IngestionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut lines = BufReader::new(file).lines();

    let mut frames = Vec::new();
    let mut line_no = 0;
    let mut array_body: Option<String> = None;

    while let Some(line) = lines.next_line().await.map_err(|source| IngestionError::Io {
        path: path.display().to_string(),
        source,
    })? {
        line_no += 1;
        if let Some(body) = array_body.as_mut() {
            body.push_str(&line);
            body.push('\n');
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if frames.is_empty() && line.trim_start().starts_with('[') {
            array_body = Some(format!("{line}\n"));
            continue;
        }
        frames.push(parse_tracking_line(&line, line_no)?);
    }

    if let Some(body) = array_body {
        frames = parse_tracking(&body)?;
    }

    debug!(frames = frames.len(), "tracking loaded");
    Ok(frames)
}

/// Read a whole text file.
pub async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestionError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Read and decode a JSON document.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_text(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| IngestionError::parse_failed(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LINES: &str = r#"{"frame": 0, "timestamp": null, "period": null, "ball_data": {"x": null, "y": null, "z": null, "is_detected": null}, "player_data": []}
{"frame": 1, "timestamp": "00:00:00.10", "period": 1, "ball_data": {"x": 0.1, "y": 0.0, "z": 0.2, "is_detected": true}, "player_data": [{"x": 1.0, "y": 1.0, "player_id": 3, "is_detected": true}]}

"#;

    #[test]
    fn test_parse_jsonl() {
        let frames = parse_tracking(LINES).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].player_data[0].player_id, 3);
    }

    #[test]
    fn test_parse_array() {
        let frames = parse_tracking(r#"[{"frame": 4, "period": 2, "player_data": []}]"#).unwrap();
        assert_eq!(frames[0].frame, 4);
        assert_eq!(frames[0].period, Some(2));
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let content = format!("{LINES}{{\"frame\": \"x\"}}\n");
        let err = parse_tracking(&content).unwrap_err();
        assert!(err.to_string().contains("tracking line 4"), "{err}");
    }

    #[tokio::test]
    async fn test_load_tracking_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LINES.as_bytes()).unwrap();

        let frames = load_tracking(file.path()).await.unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].ball_data.position(), Some((0.1, 0.0)));
    }

    #[tokio::test]
    async fn test_load_tracking_missing_file() {
        let err = load_tracking(Path::new("/nonexistent/tracking.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::Io { .. }));
    }
}
