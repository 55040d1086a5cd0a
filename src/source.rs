//! Channel-data providers.
//!
//! The converter never sees the source container's internals; it asks a
//! [`ChannelSource`] for per-block, per-channel sample ranges. Two
//! implementations ship with the crate:
//!
//! - [`MemorySource`] holds blocks as `[C, T]` arrays, for tests and
//!   embedders that already have the data in memory.
//! - [`SafetensorsSource`] reads ranges lazily from a safetensors container
//!   on disk (seek + bounded read), so memory use stays independent of
//!   recording length.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::{ConvertError, SourceError};

/// Per-block, per-channel sample-range reads over one recording.
///
/// Blocks are contiguous recording segments; a source file may hold several.
/// All selected channels within one block are assumed to share the same
/// sample count and a synchronous clock.
pub trait ChannelSource {
    /// Number of channels in the recording.
    fn channel_count(&self) -> usize;

    /// Number of blocks visible on `channel` (the per-block length list).
    fn block_count(&self, channel: usize) -> Result<usize, SourceError>;

    /// Total samples `channel` holds in `block`.
    fn sample_count(&self, channel: usize, block: usize) -> Result<usize, SourceError>;

    /// Read the half-open range `[start, stop)` of `channel` in `block`.
    ///
    /// Returns exactly `stop − start` samples.
    fn read(&self, channel: usize, block: usize, start: usize, stop: usize)
        -> Result<Vec<f64>, SourceError>;
}

fn check_range(start: usize, stop: usize, len: usize) -> Result<(), SourceError> {
    if start > stop || stop > len {
        return Err(SourceError::RangeOutOfBounds { start, stop, len });
    }
    Ok(())
}

// ── In-memory source ─────────────────────────────────────────────────────

/// A recording held fully in memory, one `[C, T]` array per block.
#[derive(Debug, Clone)]
pub struct MemorySource {
    blocks: Vec<Array2<f64>>,
    n_channels: usize,
}

impl MemorySource {
    /// Build from per-block `[C, T]` arrays. Every block must have the same
    /// channel count.
    pub fn new(blocks: Vec<Array2<f64>>) -> Result<Self, SourceError> {
        let n_channels = blocks.first().map(|b| b.nrows()).unwrap_or(0);
        if let Some(odd) = blocks.iter().find(|b| b.nrows() != n_channels) {
            return Err(SourceError::Malformed(format!(
                "blocks disagree on channel count ({} vs {})",
                odd.nrows(),
                n_channels
            )));
        }
        Ok(Self { blocks, n_channels })
    }

    fn block(&self, channel: usize, block: usize) -> Result<&Array2<f64>, SourceError> {
        if channel >= self.n_channels {
            return Err(SourceError::ChannelOutOfRange {
                channel,
                n_channels: self.n_channels,
            });
        }
        self.blocks.get(block).ok_or(SourceError::BlockOutOfRange {
            block,
            n_blocks: self.blocks.len(),
        })
    }
}

impl ChannelSource for MemorySource {
    fn channel_count(&self) -> usize {
        self.n_channels
    }

    fn block_count(&self, channel: usize) -> Result<usize, SourceError> {
        if channel >= self.n_channels {
            return Err(SourceError::ChannelOutOfRange {
                channel,
                n_channels: self.n_channels,
            });
        }
        Ok(self.blocks.len())
    }

    fn sample_count(&self, channel: usize, block: usize) -> Result<usize, SourceError> {
        Ok(self.block(channel, block)?.ncols())
    }

    fn read(
        &self,
        channel: usize,
        block: usize,
        start: usize,
        stop: usize,
    ) -> Result<Vec<f64>, SourceError> {
        let data = self.block(channel, block)?;
        check_range(start, stop, data.ncols())?;
        Ok(data.row(channel).slice(ndarray::s![start..stop]).to_vec())
    }
}

// ── File-backed safetensors source ───────────────────────────────────────

struct BlockEntry {
    /// Absolute file offset of the first byte of this tensor's data.
    offset: u64,
    n_channels: usize,
    n_samples: usize,
}

/// Lazy reader over a safetensors container with one F64 tensor per block,
/// named `block_0`, `block_1`, …, each of shape `[C, T]` in row-major order.
///
/// Only the header is parsed at open time; [`ChannelSource::read`] seeks to
/// the requested range and reads `stop − start` samples, keeping memory use
/// bounded by the chunk size regardless of recording length.
pub struct SafetensorsSource {
    path: PathBuf,
    blocks: Vec<BlockEntry>,
}

impl SafetensorsSource {
    /// Open a container and index its block tensors.
    ///
    /// Fails with [`ConvertError::SourceOpen`] when the file is missing or
    /// its header is malformed; this is fatal to the job.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref().to_path_buf();
        Self::index(&path).map_err(|e| ConvertError::SourceOpen {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    fn index(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut len_buf = [0_u8; 8];
        reader.read_exact(&mut len_buf)?;
        let header_len = u64::from_le_bytes(len_buf) as usize;
        let mut header_bytes = vec![0_u8; header_len];
        reader.read_exact(&mut header_bytes)?;
        let header: HashMap<String, serde_json::Value> = serde_json::from_slice(&header_bytes)
            .map_err(|e| SourceError::Malformed(format!("bad safetensors header: {e}")))?;
        let data_start = 8 + header_len as u64;

        let mut indexed: Vec<(usize, BlockEntry)> = Vec::new();
        for (key, entry) in &header {
            if key == "__metadata__" {
                continue;
            }
            let Some(idx) = key.strip_prefix("block_").and_then(|s| s.parse::<usize>().ok())
            else {
                continue;
            };
            let dtype = entry["dtype"].as_str().unwrap_or("");
            if dtype != "F64" {
                return Err(SourceError::UnsupportedDtype {
                    name: key.clone(),
                    dtype: dtype.to_string(),
                });
            }
            let shape: Vec<usize> = entry["shape"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_u64()).map(|v| v as usize).collect())
                .unwrap_or_default();
            let offsets = entry["data_offsets"].as_array();
            let begin = offsets
                .and_then(|a| a.first())
                .and_then(|v| v.as_u64())
                .ok_or_else(|| SourceError::Malformed(format!("{key}: missing data_offsets")))?;
            if shape.len() != 2 {
                return Err(SourceError::Malformed(format!(
                    "{key}: expected shape [C, T], got {shape:?}"
                )));
            }
            indexed.push((
                idx,
                BlockEntry {
                    offset: data_start + begin,
                    n_channels: shape[0],
                    n_samples: shape[1],
                },
            ));
        }

        indexed.sort_by_key(|(idx, _)| *idx);
        if indexed.is_empty() {
            return Err(SourceError::Malformed("no block_* tensors in container".into()));
        }
        for (expect, (idx, _)) in indexed.iter().enumerate() {
            if *idx != expect {
                return Err(SourceError::Malformed(format!(
                    "block indices not contiguous: missing block_{expect}"
                )));
            }
        }
        let n_channels = indexed[0].1.n_channels;
        if indexed.iter().any(|(_, b)| b.n_channels != n_channels) {
            return Err(SourceError::Malformed(
                "blocks disagree on channel count".into(),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            blocks: indexed.into_iter().map(|(_, b)| b).collect(),
        })
    }

    fn entry(&self, channel: usize, block: usize) -> Result<&BlockEntry, SourceError> {
        if channel >= self.channel_count() {
            return Err(SourceError::ChannelOutOfRange {
                channel,
                n_channels: self.channel_count(),
            });
        }
        self.blocks.get(block).ok_or(SourceError::BlockOutOfRange {
            block,
            n_blocks: self.blocks.len(),
        })
    }
}

impl ChannelSource for SafetensorsSource {
    fn channel_count(&self) -> usize {
        self.blocks.first().map(|b| b.n_channels).unwrap_or(0)
    }

    fn block_count(&self, channel: usize) -> Result<usize, SourceError> {
        if channel >= self.channel_count() {
            return Err(SourceError::ChannelOutOfRange {
                channel,
                n_channels: self.channel_count(),
            });
        }
        Ok(self.blocks.len())
    }

    fn sample_count(&self, channel: usize, block: usize) -> Result<usize, SourceError> {
        Ok(self.entry(channel, block)?.n_samples)
    }

    fn read(
        &self,
        channel: usize,
        block: usize,
        start: usize,
        stop: usize,
    ) -> Result<Vec<f64>, SourceError> {
        let entry = self.entry(channel, block)?;
        check_range(start, stop, entry.n_samples)?;
        if start == stop {
            return Ok(vec![]);
        }

        let sample_offset = (channel * entry.n_samples + start) as u64;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(entry.offset + sample_offset * 8))?;

        let mut raw = vec![0_u8; (stop - start) * 8];
        file.read_exact(&mut raw)?;
        Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes(b.try_into().expect("8-byte chunk")))
            .collect())
    }
}
