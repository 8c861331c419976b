//! Rendition catalog and video lifecycle enums.
//!
//! All enums serialize in lowercase and implement `Display` manually for a
//! consistent string representation in the database and on the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both axes are strictly smaller than `other`.
    pub fn fits_strictly_within(&self, other: &Dimensions) -> bool {
        self.width < other.width && self.height < other.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A target rendition from the fixed catalog.
///
/// Variants are declared in descending resolution order and [`Resolution::ALL`]
/// preserves that order; planning and persistence rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "4k")]
    FourK,
    #[serde(rename = "2k")]
    TwoK,
    #[serde(rename = "1080p")]
    Fhd,
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "480p")]
    Sd,
}

impl Resolution {
    /// Every catalog entry, largest first.
    pub const ALL: [Resolution; 5] = [
        Resolution::FourK,
        Resolution::TwoK,
        Resolution::Fhd,
        Resolution::Hd,
        Resolution::Sd,
    ];

    /// Target frame box for this rendition.
    pub const fn dimensions(self) -> Dimensions {
        match self {
            Self::FourK => Dimensions::new(3840, 2160),
            Self::TwoK => Dimensions::new(2560, 1440),
            Self::Fhd => Dimensions::new(1920, 1080),
            Self::Hd => Dimensions::new(1280, 720),
            Self::Sd => Dimensions::new(854, 480),
        }
    }

    /// Target video bitrate in kbps.
    pub const fn bitrate_kbps(self) -> u32 {
        match self {
            Self::FourK => 16_000,
            Self::TwoK => 12_000,
            Self::Fhd => 8_000,
            Self::Hd => 5_000,
            Self::Sd => 2_500,
        }
    }

    /// Short tag used in file names and records.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FourK => "4k",
            Self::TwoK => "2k",
            Self::Fhd => "1080p",
            Self::Hd => "720p",
            Self::Sd => "480p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown resolution tag '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// VideoStatus
// ---------------------------------------------------------------------------

/// Processing lifecycle of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Uploaded,
    Processing,
    Complete,
    Failed,
}

impl VideoStatus {
    /// Statuses a record may be in immediately before entering `self`.
    pub const fn predecessors(self) -> &'static [VideoStatus] {
        match self {
            Self::Uploaded => &[],
            Self::Processing => &[Self::Uploaded],
            Self::Complete | Self::Failed => &[Self::Processing],
        }
    }

    pub fn can_transition_to(self, next: VideoStatus) -> bool {
        next.predecessors().contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            other => Err(Error::Validation(format!("unknown video status '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_descending() {
        let widths: Vec<u32> = Resolution::ALL.iter().map(|r| r.dimensions().width).collect();
        let mut sorted = widths.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(widths, sorted);
    }

    #[test]
    fn catalog_values() {
        assert_eq!(Resolution::FourK.dimensions(), Dimensions::new(3840, 2160));
        assert_eq!(Resolution::TwoK.bitrate_kbps(), 12_000);
        assert_eq!(Resolution::Fhd.dimensions(), Dimensions::new(1920, 1080));
        assert_eq!(Resolution::Hd.bitrate_kbps(), 5_000);
        assert_eq!(Resolution::Sd.dimensions(), Dimensions::new(854, 480));
        assert_eq!(Resolution::Sd.bitrate_kbps(), 2_500);
    }

    #[test]
    fn resolution_tag_roundtrip() {
        for r in Resolution::ALL {
            assert_eq!(r.to_string().parse::<Resolution>().unwrap(), r);
        }
        assert_eq!("1080P".parse::<Resolution>().unwrap(), Resolution::Fhd);
    }

    #[test]
    fn unknown_resolution_is_validation_error() {
        let err = "360p".parse::<Resolution>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn resolution_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&Resolution::Hd).unwrap(), "\"720p\"");
        let r: Resolution = serde_json::from_str("\"4k\"").unwrap();
        assert_eq!(r, Resolution::FourK);
    }

    #[test]
    fn strict_fit_requires_both_axes() {
        let src = Dimensions::new(1920, 1080);
        assert!(Dimensions::new(1280, 720).fits_strictly_within(&src));
        assert!(!Dimensions::new(1920, 720).fits_strictly_within(&src));
        assert!(!Dimensions::new(1280, 1080).fits_strictly_within(&src));
    }

    #[test]
    fn status_transitions() {
        use VideoStatus::*;
        assert!(Uploaded.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Complete));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Uploaded.can_transition_to(Complete));
        assert!(!Uploaded.can_transition_to(Failed));
        assert!(!Complete.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Uploaded));
        assert!(!Complete.can_transition_to(Failed));
    }

    #[test]
    fn status_string_roundtrip() {
        for s in [
            VideoStatus::Uploaded,
            VideoStatus::Processing,
            VideoStatus::Complete,
            VideoStatus::Failed,
        ] {
            assert_eq!(s.as_str().parse::<VideoStatus>().unwrap(), s);
            assert_eq!(serde_json::to_string(&s).unwrap(), format!("\"{s}\""));
        }
        assert!("done".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(VideoStatus::Complete.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
        assert!(!VideoStatus::Processing.is_terminal());
    }
}
