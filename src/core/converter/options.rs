//! Output format and encoder settings.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality used when none (or 0) is given
pub const DEFAULT_QUALITY: u8 = 85;

/// PNG compression level used by default (zlib scale 0-9)
pub const DEFAULT_PNG_LEVEL: u8 = 6;

/// Formats the converter can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[default]
    Jpeg,
    WebP,
    Avif,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::WebP,
        OutputFormat::Avif,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
    ];

    /// Canonical lowercase name, also the key used in usage statistics
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// File extension for converted files
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            other => other.name(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            _ => Err(ConvertError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Encoder settings for a conversion batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    /// 1-100 for JPEG and AVIF. 0 means [`DEFAULT_QUALITY`]
    pub quality: u8,
    /// AVIF only: encode at maximum quality
    pub lossless: bool,
    /// PNG zlib level, 0-9
    pub png_level: u8,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn with_png_level(mut self, level: u8) -> Self {
        self.png_level = level;
        self
    }

    /// Quality with defaults applied, clamped to 1-100
    pub fn effective_quality(&self) -> u8 {
        if self.lossless {
            return 100;
        }
        match self.quality {
            0 => DEFAULT_QUALITY,
            q => q.min(100),
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            lossless: false,
            png_level: DEFAULT_PNG_LEVEL,
        }
    }
}
