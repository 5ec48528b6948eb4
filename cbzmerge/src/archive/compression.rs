//! Compression schemes for merged containers.
//!
//! | Scheme    | Levels | Notes                                   |
//! |-----------|--------|-----------------------------------------|
//! | `store`   | -      | No compression, level ignored           |
//! | `deflate` | 0-9    |                                         |
//! | `bzip2`   | 1-9    | Level 0 is not valid, raised to 1       |
//! | `lzma`    | -      | Readable in sources, not writable here  |

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use zip::CompressionMethod;

/// Level used by the CLI when none is configured.
pub const DEFAULT_LEVEL: u8 = 5;

/// Container compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionScheme {
    /// Entries stored uncompressed.
    #[default]
    Store,
    /// DEFLATE compression.
    Deflate,
    /// BZIP2 compression.
    Bzip2,
    /// LZMA compression.
    Lzma,
}

impl CompressionScheme {
    /// All schemes, in presentation order.
    pub const ALL: [CompressionScheme; 4] = [
        CompressionScheme::Store,
        CompressionScheme::Deflate,
        CompressionScheme::Bzip2,
        CompressionScheme::Lzma,
    ];

    /// Canonical name used in configuration and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            CompressionScheme::Store => "store",
            CompressionScheme::Deflate => "deflate",
            CompressionScheme::Bzip2 => "bzip2",
            CompressionScheme::Lzma => "lzma",
        }
    }

    /// Whether this build can write containers with the scheme.
    ///
    /// The `zip` crate decodes LZMA entries but has no LZMA encoder.
    pub fn is_available(&self) -> bool {
        !matches!(self, CompressionScheme::Lzma)
    }

    /// Schemes this build can write.
    pub fn available() -> Vec<CompressionScheme> {
        Self::ALL.into_iter().filter(|s| s.is_available()).collect()
    }

    /// Valid level range, or `None` for fixed-ratio schemes.
    pub fn level_range(&self) -> Option<RangeInclusive<u8>> {
        match self {
            CompressionScheme::Deflate => Some(0..=9),
            CompressionScheme::Bzip2 => Some(1..=9),
            CompressionScheme::Store | CompressionScheme::Lzma => None,
        }
    }

    pub fn supports_level(&self) -> bool {
        self.level_range().is_some()
    }

    pub(crate) fn method(&self) -> CompressionMethod {
        match self {
            CompressionScheme::Store => CompressionMethod::Stored,
            CompressionScheme::Deflate => CompressionMethod::Deflated,
            CompressionScheme::Bzip2 => CompressionMethod::Bzip2,
            CompressionScheme::Lzma => CompressionMethod::Lzma,
        }
    }
}

impl fmt::Display for CompressionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown scheme name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScheme(pub String);

impl fmt::Display for UnknownScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown compression scheme '{}' (expected store, deflate, bzip2 or lzma)",
            self.0
        )
    }
}

impl std::error::Error for UnknownScheme {}

impl FromStr for CompressionScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "store" | "stored" => Ok(CompressionScheme::Store),
            "deflate" | "deflated" => Ok(CompressionScheme::Deflate),
            "bzip2" | "bzip" => Ok(CompressionScheme::Bzip2),
            "lzma" => Ok(CompressionScheme::Lzma),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}

/// A scheme together with its effective level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionSettings {
    scheme: CompressionScheme,
    level: Option<u8>,
}

impl CompressionSettings {
    /// Pair a scheme with a requested level, coercing it into range.
    ///
    /// The level is dropped for schemes without levels. A level below the
    /// scheme minimum is raised to the minimum and one above the maximum is
    /// lowered to the maximum.
    pub fn new(scheme: CompressionScheme, requested_level: Option<u8>) -> Self {
        let level = match (scheme.level_range(), requested_level) {
            (Some(range), Some(level)) => Some(level.clamp(*range.start(), *range.end())),
            _ => None,
        };
        Self { scheme, level }
    }

    pub fn scheme(&self) -> CompressionScheme {
        self.scheme
    }

    /// Effective level; `None` means the scheme default.
    pub fn level(&self) -> Option<u8> {
        self.level
    }
}

impl fmt::Display for CompressionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{} (level {})", self.scheme, level),
            None => write!(f, "{}", self.scheme),
        }
    }
}
