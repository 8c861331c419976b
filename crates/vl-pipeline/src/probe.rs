//! Source dimension extraction.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vl_core::{Dimensions, Error, Result};

use crate::engine::{EncodingEngine, ProbeReport, StreamKind};

/// Extracts the frame size of a source through the encoding engine.
///
/// Every failure, including an engine timeout, is reported as
/// [`Error::Probe`].
pub struct MediaProbe {
    engine: Arc<dyn EncodingEngine>,
    timeout: Option<Duration>,
}

impl MediaProbe {
    pub fn new(engine: Arc<dyn EncodingEngine>, timeout: Option<Duration>) -> Self {
        Self { engine, timeout }
    }

    /// Probe `source` and return the dimensions of its first video stream.
    pub async fn dimensions(&self, source: &Path) -> Result<Dimensions> {
        let probe = self.engine.probe(source);
        let report = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, probe).await.map_err(|_| {
                Error::Probe(format!(
                    "{} probe of {} timed out after {}s",
                    self.engine.name(),
                    source.display(),
                    limit.as_secs()
                ))
            })?,
            None => probe.await,
        };

        let report = report.map_err(|e| match e {
            Error::Probe(_) => e,
            other => Error::Probe(format!("cannot read {}: {other}", source.display())),
        })?;

        video_dimensions(&report)
            .map_err(|msg| Error::Probe(format!("{}: {msg}", source.display())))
    }
}

/// Pick the first video stream and validate its size.
pub(crate) fn video_dimensions(report: &ProbeReport) -> std::result::Result<Dimensions, String> {
    let stream = report
        .streams
        .iter()
        .find(|s| s.kind == StreamKind::Video)
        .ok_or_else(|| "no video stream".to_string())?;

    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            let width = u32::try_from(w).map_err(|_| format!("width {w} out of range"))?;
            let height = u32::try_from(h).map_err(|_| format!("height {h} out of range"))?;
            Ok(Dimensions::new(width, height))
        }
        (w, h) => Err(format!(
            "invalid video dimensions {}x{}",
            w.map_or("?".to_string(), |v| v.to_string()),
            h.map_or("?".to_string(), |v| v.to_string())
        )),
    }
}
