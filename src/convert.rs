//! The conversion job: streams every block of one recording into EDF files.
//!
//! One job owns one source recording and one subject's channel subset. Each
//! block is converted independently: probe reads first, then a chunk-planned
//! streaming pass that reads, decimates, and appends one chunk of all
//! channels at a time. A failing block is skipped with a logged reason; the
//! rest of the recording still converts.
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::chunk::{chunk_boundaries, chunk_ranges};
use crate::config::{ChannelSpec, JobConfig};
use crate::decimate::decimate;
use crate::error::{ConvertError, StreamError};
use crate::sink::{EdfSink, SignalSink};
use crate::source::ChannelSource;

/// Samples per probe window; windows are clamped to short blocks.
const PROBE_WINDOW: usize = 1000;

/// Sizes of one successfully converted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Chunks written to the sink.
    pub chunks: usize,
    /// Decimated samples written per channel.
    pub samples_per_channel: usize,
}

/// Result of converting one block.
#[derive(Debug)]
pub enum BlockOutcome {
    Converted {
        block: usize,
        path: PathBuf,
        stats: BlockStats,
    },
    Skipped {
        block: usize,
        error: ConvertError,
    },
}

impl BlockOutcome {
    pub fn block(&self) -> usize {
        match self {
            BlockOutcome::Converted { block, .. } | BlockOutcome::Skipped { block, .. } => *block,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, BlockOutcome::Converted { .. })
    }
}

/// Letter suffix for a block index: `a`, `b`, …, `z`, `aa`, `ab`, ….
pub fn block_suffix(block: usize) -> String {
    let mut i = block;
    let mut s = String::new();
    loop {
        s.insert(0, char::from(b'a' + (i % 26) as u8));
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    s
}

/// A configured conversion of one recording for one subject.
///
/// Constructed once from a validated [`JobConfig`] and an opened
/// [`ChannelSource`]; converts all blocks via [`Self::convert_file`] and is
/// then discarded.
#[derive(Debug)]
pub struct ConversionJob<S: ChannelSource> {
    source: S,
    cfg: JobConfig,
    /// 0-based source channel indices, in output order.
    channels: Vec<usize>,
    specs: Vec<ChannelSpec>,
    factor: usize,
}

impl<S: ChannelSource> ConversionJob<S> {
    /// Validate the configuration against the source and bind them.
    ///
    /// Fails with [`ConvertError::Config`] before any data is read when the
    /// configuration is malformed or selects channels the source does not
    /// have.
    pub fn new(cfg: JobConfig, source: S) -> Result<Self, ConvertError> {
        cfg.validate()?;
        let channels = cfg.selected_channels();
        let available = source.channel_count();
        if let Some(&bad) = channels.iter().find(|&&c| c >= available) {
            return Err(ConvertError::Config(format!(
                "ch_list selects channel {} but the source has {} channels",
                bad + 1,
                available
            )));
        }
        let specs = cfg.channel_specs();
        let factor = cfg.down_factor();
        Ok(Self {
            source,
            cfg,
            channels,
            specs,
            factor,
        })
    }

    /// Per-channel header specs, in output order.
    pub fn channel_specs(&self) -> &[ChannelSpec] {
        &self.specs
    }

    /// Integer decimation factor of this job.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// The channel whose per-block lengths define the block structure.
    fn primary(&self) -> usize {
        self.channels[0]
    }

    /// Output file path for one block:
    /// `<save_path>/<file_name>_<subject><suffix>.edf`.
    pub fn output_path(&self, block: usize) -> PathBuf {
        self.cfg.save_path.join(format!(
            "{}_{}{}.edf",
            self.cfg.file_name,
            self.cfg.subject,
            block_suffix(block)
        ))
    }

    /// Probe a block before committing to an output file.
    ///
    /// Reads three windows of up to [`PROBE_WINDOW`] samples (start, middle,
    /// end) on the primary selected channel. An unreadable window marks the
    /// whole block as corrupt and it is skipped. Windows are clamped to the
    /// block, so short and even empty blocks pass.
    pub fn probe_block(&self, block: usize) -> Result<(), ConvertError> {
        let wrap = |source| ConvertError::BlockProbe { block, source };
        let ch = self.primary();
        let len = self.source.sample_count(ch, block).map_err(wrap)?;
        let w = PROBE_WINDOW.min(len);

        self.source.read(ch, block, 0, w).map_err(wrap)?;
        let mid = len / 2;
        let mid_stop = (mid + w).min(len);
        self.source.read(ch, block, mid_stop - w, mid_stop).map_err(wrap)?;
        self.source.read(ch, block, len - w, len).map_err(wrap)?;
        Ok(())
    }

    /// Stream one block into `sink`.
    ///
    /// Declares one header entry per selected channel, then walks the chunk
    /// plan in ascending order: for each range, every channel's raw samples
    /// are read, decimated, and written as one aligned chunk before the next
    /// range is touched, so at most one chunk of all channels is in memory.
    /// The sink is finalized on every exit path, including failure.
    pub fn convert_block_into<K: SignalSink>(
        &self,
        block: usize,
        sink: &mut K,
    ) -> Result<BlockStats, ConvertError> {
        let result = self.stream_block(block, sink);
        if result.is_err() {
            // Close the sink so a skipped block never leaks an open writer;
            // the original stream error stays the reported one.
            let _ = sink.finalize();
        }
        result.map_err(|source| ConvertError::BlockStream { block, source })
    }

    fn stream_block<K: SignalSink>(
        &self,
        block: usize,
        sink: &mut K,
    ) -> Result<BlockStats, StreamError> {
        let total = self.source.sample_count(self.primary(), block)?;
        let bounds = chunk_boundaries(total, self.cfg.chunksize);

        sink.declare_header(&self.specs)?;

        let mut stats = BlockStats {
            chunks: 0,
            samples_per_channel: 0,
        };
        for (start, stop) in chunk_ranges(&bounds) {
            let mut chunk: Vec<Vec<f64>> = Vec::with_capacity(self.channels.len());
            for &ch in &self.channels {
                let raw = self.source.read(ch, block, start, stop)?;
                if raw.len() != stop - start {
                    return Err(StreamError::ShortRead {
                        channel: ch,
                        got: raw.len(),
                        expected: stop - start,
                    });
                }
                chunk.push(decimate(&raw, self.factor));
            }
            stats.samples_per_channel += chunk[0].len();
            sink.write_chunk(&chunk)?;
            stats.chunks += 1;
            debug!(
                "block {block}: wrote chunk {} ({start}..{stop} -> {} samples/ch)",
                stats.chunks,
                chunk[0].len()
            );
        }

        sink.finalize()?;
        Ok(stats)
    }

    /// Convert one block into its EDF file at [`Self::output_path`].
    ///
    /// On a streaming failure the partial file is removed before the error
    /// is returned, so a skipped block leaves no artifact on disk.
    pub fn convert_block(&self, block: usize) -> Result<(PathBuf, BlockStats), ConvertError> {
        let path = self.output_path(block);
        let mut sink = EdfSink::create(&path).map_err(|e| ConvertError::BlockStream {
            block,
            source: StreamError::Sink(e),
        })?;
        match self.convert_block_into(block, &mut sink) {
            Ok(stats) => Ok((path, stats)),
            Err(err) => {
                let _ = std::fs::remove_file(&path);
                Err(err)
            }
        }
    }

    /// Convert every block of the recording, one EDF file per block.
    ///
    /// Blocks are numbered `0..block_count` from the primary selected
    /// channel's per-block length list. Each block is probed, converted, and
    /// on any per-block failure skipped with a warning; the loop always runs
    /// to the end and returns one [`BlockOutcome`] per block.
    pub fn convert_file(&self) -> Result<Vec<BlockOutcome>, ConvertError> {
        let n_blocks = self
            .source
            .block_count(self.primary())
            .map_err(|e| ConvertError::Config(format!("source rejected primary channel: {e}")))?;

        let mut outcomes = Vec::with_capacity(n_blocks);
        for block in 0..n_blocks {
            info!(
                "converting block {block} of {}, subject {}",
                self.cfg.file_name, self.cfg.subject
            );
            let result = self
                .probe_block(block)
                .and_then(|_| self.convert_block(block));
            outcomes.push(match result {
                Ok((path, stats)) => {
                    info!(
                        "block {block}: {} chunks, {} samples/channel -> {}",
                        stats.chunks,
                        stats.samples_per_channel,
                        path.display()
                    );
                    BlockOutcome::Converted { block, path, stats }
                }
                Err(error) => {
                    warn!("skipped block {block} of {}: {error}", self.cfg.file_name);
                    BlockOutcome::Skipped { block, error }
                }
            });
        }
        Ok(outcomes)
    }
}
