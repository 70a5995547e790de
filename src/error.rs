#![allow(non_shorthand_field_patterns)]
#![doc = "Errors raised by configuration loading, manifest generation and the CLI."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! `masterror::Error` expands to patterns that trip
//! `non_shorthand_field_patterns`, hence the module-level allow.
//!
//! Icon loading never returns these: [`IconCache`](crate::IconCache) turns
//! fetch failures into empty entries.

use std::path::{Path, PathBuf};

/// Error returned by the fallible parts of the crate.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// A file under `path` could not be read or written.
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        /// File or directory involved.
        path:   PathBuf,
        /// Operating system error.
        source: std::io::Error
    },
    /// A JSON document under `path` did not decode.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        /// Document that failed to decode.
        path:   PathBuf,
        /// Decoder error.
        source: serde_json::Error
    },
    /// A configuration value is missing or out of range.
    #[error("invalid configuration: {message}")]
    Validation {
        /// What is wrong.
        message: String
    },
    /// Output could not be encoded as JSON.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Encoder error.
        source: serde_json::Error
    },
    /// A collaborator (HTTP client, output stream) failed.
    #[error("service error: {message}")]
    Service {
        /// What failed.
        message: String
    },
    /// An SVG file or directory could not be read.
    #[error("failed to process SVG at {path:?}: {source}")]
    SvgIo {
        /// SVG file or directory involved.
        path:   PathBuf,
        /// Operating system error.
        source: std::io::Error
    }
}

impl Error {
    /// Builds [`Error::Validation`].
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Builds [`Error::Service`].
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Message printed by the CLI before exiting.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Wraps an I/O failure on `path` into [`Error::Io`].
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Wraps a JSON decoding failure of the document at `path` into
/// [`Error::Parse`].
pub fn parse_error(path: &Path, source: serde_json::Error) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        source
    }
}

/// Wraps an I/O failure on an SVG file or directory into [`Error::SvgIo`].
pub fn svg_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::SvgIo {
        path: path.to_path_buf(),
        source
    }
}
