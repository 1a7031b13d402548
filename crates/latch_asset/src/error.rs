//! Error types for decoding and registry operations

use crate::{AssetId, AssetKind};
use latch_core::collections::MapError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning file bytes into asset data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file is empty")]
    Empty,

    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { found: i64, expected: i64 },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("file contains no {what}")]
    MissingData { what: &'static str },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl DecodeError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the asset registry and its dispatch path.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("asset {id} has no {kind} slot")]
    UnknownAsset { id: AssetId, kind: AssetKind },

    #[error("asset {id} is a {existing}, cannot reload it as a {requested}")]
    KindMismatch {
        id: AssetId,
        existing: AssetKind,
        requested: AssetKind,
    },

    #[error("{path}: {expected} handler produced a {produced}")]
    HandlerKind {
        path: PathBuf,
        expected: AssetKind,
        produced: AssetKind,
    },

    #[error("asset id space exhausted")]
    IdSpaceExhausted,

    #[error("no handler registered for extension '{extension}' ({path})")]
    UnknownExtension { extension: String, path: PathBuf },

    #[error("path has no usable file name: {path}")]
    InvalidPath { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("failed to start file watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    #[error("failed to spawn watcher thread: {0}")]
    WatcherThread(#[source] std::io::Error),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("internal index error: {0}")]
    Index(#[from] MapError),
}
