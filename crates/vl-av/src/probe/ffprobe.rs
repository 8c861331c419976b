//! FFprobe-based stream inspection.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON output into a [`vl_pipeline::ProbeReport`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vl_core::Error;
use vl_pipeline::{ProbeReport, StreamInfo, StreamKind};

use crate::command::ToolCommand;

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
    timeout: Option<Duration>,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Probe `path` for its format and streams.
    ///
    /// Unreadable files and unparseable output surface as
    /// [`vl_core::Error::Probe`].
    pub async fn probe(&self, path: &Path) -> vl_core::Result<ProbeReport> {
        if !path.is_file() {
            return Err(Error::Probe(format!("{} is not a readable file", path.display())));
        }

        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd
            .execute()
            .await
            .map_err(|e| Error::Probe(format!("ffprobe failed on {}: {e}", path.display())))?;

        parse_ffprobe_json(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse ffprobe's JSON output.
pub fn parse_ffprobe_json(json: &str) -> vl_core::Result<ProbeReport> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let (format, duration_secs) = match output.format {
        Some(f) => (
            f.format_name,
            f.duration.and_then(|s| s.parse::<f64>().ok()),
        ),
        None => (None, None),
    };

    let streams = output
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            kind: map_stream_kind(s.codec_type.as_deref().unwrap_or("")),
            codec: s.codec_name,
            width: s.width,
            height: s.height,
        })
        .collect();

    Ok(ProbeReport {
        format,
        duration_secs,
        streams,
    })
}

fn map_stream_kind(codec_type: &str) -> StreamKind {
    match codec_type {
        "video" => StreamKind::Video,
        "audio" => StreamKind::Audio,
        _ => StreamKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080},
            {"index": 1, "codec_name": "aac", "codec_type": "audio", "channels": 2},
            {"index": 2, "codec_name": "bin_data", "codec_type": "data"}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "12.345000"}
    }"#;

    #[test]
    fn parses_streams_and_format() {
        let report = parse_ffprobe_json(SAMPLE).unwrap();
        assert_eq!(report.format.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
        assert_eq!(report.duration_secs, Some(12.345));
        assert_eq!(report.streams.len(), 3);
        assert_eq!(report.streams[0], StreamInfo {
            kind: StreamKind::Video,
            codec: Some("h264".into()),
            width: Some(1920),
            height: Some(1080),
        });
        assert_eq!(report.streams[1].kind, StreamKind::Audio);
        assert_eq!(report.streams[2].kind, StreamKind::Other);
    }

    #[test]
    fn empty_object_has_no_streams() {
        let report = parse_ffprobe_json("{}").unwrap();
        assert!(report.streams.is_empty());
        assert!(report.format.is_none());
    }

    #[test]
    fn garbage_is_probe_error() {
        let err = parse_ffprobe_json("not json").unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }

    #[tokio::test]
    async fn missing_file_is_probe_error() {
        let prober = FfprobeProber::new(PathBuf::from("ffprobe"), Some(Duration::from_secs(5)));
        let err = prober
            .probe(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }
}
