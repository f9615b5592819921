//! PDF quality profiles
//!
//! A profile bundles the image settings handed to the converter's PDF export
//! filter. Resolution of a profile name never fails: anything that is not one
//! of the three known names falls back to [`Quality::High`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named quality level
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    High,
    Medium,
    Low,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::High, Quality::Medium, Quality::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        }
    }

    /// Parse a profile name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Quality> {
        match name.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Quality::High),
            "medium" => Some(Quality::Medium),
            "low" => Some(Quality::Low),
            _ => None,
        }
    }

    pub fn profile(self) -> &'static QualityProfile {
        match self {
            Quality::High => &HIGH,
            Quality::Medium => &MEDIUM,
            Quality::Low => &LOW,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image settings for one quality level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityProfile {
    pub quality: Quality,
    /// Images above this resolution are downsampled (when reduction is on)
    pub max_image_resolution: u32,
    /// JPEG compression quality, 1-100
    pub jpeg_quality: u8,
    pub reduce_image_resolution: bool,
    pub description: &'static str,
}

pub static HIGH: QualityProfile = QualityProfile {
    quality: Quality::High,
    max_image_resolution: 300,
    jpeg_quality: 95,
    reduce_image_resolution: false,
    description: "High quality - ideal for printing",
};

pub static MEDIUM: QualityProfile = QualityProfile {
    quality: Quality::Medium,
    max_image_resolution: 150,
    jpeg_quality: 85,
    reduce_image_resolution: true,
    description: "Medium quality - balanced",
};

pub static LOW: QualityProfile = QualityProfile {
    quality: Quality::Low,
    max_image_resolution: 75,
    jpeg_quality: 70,
    reduce_image_resolution: true,
    description: "Low quality - smallest file size",
};

/// Resolve an optional profile name to a profile.
pub fn resolve(name: Option<&str>) -> &'static QualityProfile {
    let Some(name) = name else {
        return &HIGH;
    };

    match Quality::from_name(name) {
        Some(quality) => quality.profile(),
        None => {
            if !name.trim().is_empty() {
                tracing::warn!("Invalid quality '{name}', falling back to 'high'");
            }
            &HIGH
        }
    }
}
