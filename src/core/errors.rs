//! WVD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, WvdError>;

/// Top-level error type for the wavedeck control core.
#[derive(Debug, Error)]
pub enum WvdError {
    #[error("[WVD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[WVD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[WVD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[WVD-2001] input line {line} unavailable: {details}")]
    InputLine { line: u32, details: String },

    #[error("[WVD-2002] panel bus initialization failure: {details}")]
    PanelInit { details: String },

    #[error("[WVD-2003] panel transaction failure: {details}")]
    PanelIo { details: String },

    #[error("[WVD-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[WVD-3001] filesystem stats failure for {path}: {details}")]
    FsStats { path: PathBuf, details: String },

    #[error("[WVD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[WVD-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[WVD-3101] capture process spawn failure: {details}")]
    CaptureSpawn { details: String },

    #[error("[WVD-3102] capture process stop failure: {details}")]
    CaptureStop { details: String },

    #[error("[WVD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl WvdError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "WVD-1001",
            Self::MissingConfig { .. } => "WVD-1002",
            Self::ConfigParse { .. } => "WVD-1003",
            Self::InputLine { .. } => "WVD-2001",
            Self::PanelInit { .. } => "WVD-2002",
            Self::PanelIo { .. } => "WVD-2003",
            Self::Serialization { .. } => "WVD-2101",
            Self::FsStats { .. } => "WVD-3001",
            Self::Io { .. } => "WVD-3002",
            Self::ChannelClosed { .. } => "WVD-3003",
            Self::CaptureSpawn { .. } => "WVD-3101",
            Self::CaptureStop { .. } => "WVD-3102",
            Self::Runtime { .. } => "WVD-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// Fatal initialization errors (input lines, panel bring-up, config) are
    /// not retryable; per-cycle transaction and per-file IO failures are.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PanelIo { .. }
                | Self::Io { .. }
                | Self::FsStats { .. }
                | Self::ChannelClosed { .. }
                | Self::CaptureStop { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for WvdError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for WvdError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<WvdError> {
        vec![
            WvdError::InvalidConfig {
                details: String::new(),
            },
            WvdError::MissingConfig {
                path: PathBuf::new(),
            },
            WvdError::ConfigParse {
                context: "",
                details: String::new(),
            },
            WvdError::InputLine {
                line: 0,
                details: String::new(),
            },
            WvdError::PanelInit {
                details: String::new(),
            },
            WvdError::PanelIo {
                details: String::new(),
            },
            WvdError::Serialization {
                context: "",
                details: String::new(),
            },
            WvdError::FsStats {
                path: PathBuf::new(),
                details: String::new(),
            },
            WvdError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            WvdError::ChannelClosed { component: "" },
            WvdError::CaptureSpawn {
                details: String::new(),
            },
            WvdError::CaptureStop {
                details: String::new(),
            },
            WvdError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = sample_errors();
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_wvd_prefix() {
        for err in &sample_errors() {
            assert!(
                err.code().starts_with("WVD-"),
                "code {} must start with WVD-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = WvdError::PanelIo {
            details: "spi write short".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("WVD-2003"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("spi write short"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn retryable_errors_are_correct() {
        // A failed panel transaction is skipped for the frame and retried on
        // the next tick; spawn and line-acquisition failures are not.
        assert!(
            WvdError::PanelIo {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            WvdError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            }
            .is_retryable()
        );
        assert!(
            WvdError::CaptureStop {
                details: String::new()
            }
            .is_retryable()
        );

        assert!(
            !WvdError::InputLine {
                line: 17,
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !WvdError::PanelInit {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !WvdError::CaptureSpawn {
                details: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = WvdError::io(
            "/rec/take_01.wav",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "WVD-3002");
        assert!(err.to_string().contains("/rec/take_01.wav"));
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: WvdError = toml_err.into();
        assert_eq!(err.code(), "WVD-1003");
    }
}
