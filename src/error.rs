//! Error taxonomy for the conversion pipeline.
//!
//! Two failure tiers:
//! * fatal: [`ConvertError::SourceOpen`] and [`ConvertError::Config`] abort
//!   the whole job before any output is produced;
//! * per-block: [`ConvertError::BlockProbe`] and [`ConvertError::BlockStream`]
//!   are caught by the block loop, logged, and skip exactly one block.
//!
//! The collaborator seams carry their own enums ([`SourceError`],
//! [`SinkError`]) so a test can tell a short read from a refused write.
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`crate::source::ChannelSource`] implementation.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("channel {channel} out of range ({n_channels} channels in source)")]
    ChannelOutOfRange { channel: usize, n_channels: usize },

    #[error("block {block} out of range ({n_blocks} blocks in source)")]
    BlockOutOfRange { block: usize, n_blocks: usize },

    #[error("sample range {start}..{stop} outside block of {len} samples")]
    RangeOutOfBounds {
        start: usize,
        stop: usize,
        len: usize,
    },

    #[error("unsupported tensor dtype {dtype:?} for {name:?} (expected F64)")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("malformed source container: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`crate::sink::SignalSink`] implementation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("header already declared")]
    HeaderAlreadyDeclared,

    #[error("header must be declared before the first chunk")]
    HeaderNotDeclared,

    #[error("chunk carries {got} channels, header declared {expected}")]
    ChannelCountMismatch { got: usize, expected: usize },

    #[error("channels in one chunk must be equal length (got {min}..{max})")]
    RaggedChunk { min: usize, max: usize },

    #[error("sink already finalized")]
    Finalized,

    #[error("edf write failed: {0}")]
    Edf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything that can go wrong while a block is streaming.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("channel {channel} returned {got} samples for a {expected}-sample range")]
    ShortRead {
        channel: usize,
        got: usize,
        expected: usize,
    },
}

/// Top-level error type of the crate.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source recording could not be opened. Fatal.
    #[error("could not open source recording {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },

    /// The job configuration is malformed. Fatal, raised before any I/O.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The probe read of a block failed; the block is skipped.
    #[error("block {block}: probe read failed: {source}")]
    BlockProbe {
        block: usize,
        #[source]
        source: SourceError,
    },

    /// A read, decimate-width check, or write failed mid-block; the block is
    /// skipped and its partial output discarded.
    #[error("block {block}: streaming failed: {source}")]
    BlockStream {
        block: usize,
        #[source]
        source: StreamError,
    },
}

impl ConvertError {
    /// Block index this error is scoped to, if it is a per-block failure.
    pub fn block(&self) -> Option<usize> {
        match self {
            ConvertError::BlockProbe { block, .. } | ConvertError::BlockStream { block, .. } => {
                Some(*block)
            }
            _ => None,
        }
    }
}
