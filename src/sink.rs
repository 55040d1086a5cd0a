//! Output writers.
//!
//! A [`SignalSink`] accepts a declared header followed by equal-length
//! per-channel sample chunks, written strictly in order, then a finalize.
//! [`EdfSink`] adapts the `edfplus` crate's writer (the EDF binary layout
//! itself lives there, not here); [`MemorySink`] records the calls and
//! enforces the contract, for tests and examples.
use std::path::{Path, PathBuf};

use edfplus::{EdfWriter, SignalParam};

use crate::config::ChannelSpec;
use crate::error::SinkError;

/// Ordered sink for one output file.
///
/// Call order contract: [`declare_header`](SignalSink::declare_header)
/// exactly once, then any number of [`write_chunk`](SignalSink::write_chunk)
/// calls (one `Vec<f64>` per declared channel, equal lengths, declaration
/// order), then [`finalize`](SignalSink::finalize). Finalize is safe to call
/// again; later writes are rejected.
pub trait SignalSink {
    fn declare_header(&mut self, specs: &[ChannelSpec]) -> Result<(), SinkError>;
    fn write_chunk(&mut self, chunk: &[Vec<f64>]) -> Result<(), SinkError>;
    fn finalize(&mut self) -> Result<(), SinkError>;
}

fn check_chunk(chunk: &[Vec<f64>], declared: Option<usize>) -> Result<(), SinkError> {
    let expected = declared.ok_or(SinkError::HeaderNotDeclared)?;
    if chunk.len() != expected {
        return Err(SinkError::ChannelCountMismatch {
            got: chunk.len(),
            expected,
        });
    }
    let min = chunk.iter().map(Vec::len).min().unwrap_or(0);
    let max = chunk.iter().map(Vec::len).max().unwrap_or(0);
    if min != max {
        return Err(SinkError::RaggedChunk { min, max });
    }
    Ok(())
}

// ── EDF file sink ────────────────────────────────────────────────────────

/// Writes one EDF file through `edfplus::EdfWriter`.
///
/// `samples_per_record` is the declared target sample rate, so one EDF data
/// record spans one second of decimated signal.
pub struct EdfSink {
    path: PathBuf,
    writer: Option<EdfWriter>,
    n_channels: Option<usize>,
}

impl EdfSink {
    /// Create the output file. The header is written on
    /// [`declare_header`](SignalSink::declare_header).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let writer = EdfWriter::create(path.to_string_lossy().as_ref())
            .map_err(|e| SinkError::Edf(e.to_string()))?;
        Ok(Self {
            path,
            writer: Some(writer),
            n_channels: None,
        })
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SignalSink for EdfSink {
    fn declare_header(&mut self, specs: &[ChannelSpec]) -> Result<(), SinkError> {
        if self.n_channels.is_some() {
            return Err(SinkError::HeaderAlreadyDeclared);
        }
        let writer = self.writer.as_mut().ok_or(SinkError::Finalized)?;
        for spec in specs {
            let param = SignalParam {
                label: spec.label.clone(),
                samples_in_file: 0,
                physical_max: spec.physical_max,
                physical_min: spec.physical_min,
                digital_max: spec.digital_max as _,
                digital_min: spec.digital_min as _,
                samples_per_record: spec.sample_rate.round() as _,
                physical_dimension: spec.dimension.clone(),
                prefilter: spec.prefilter.clone(),
                transducer: spec.transducer.clone(),
            };
            writer
                .add_signal(param)
                .map_err(|e| SinkError::Edf(e.to_string()))?;
        }
        self.n_channels = Some(specs.len());
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[Vec<f64>]) -> Result<(), SinkError> {
        check_chunk(chunk, self.n_channels)?;
        let writer = self.writer.as_mut().ok_or(SinkError::Finalized)?;
        writer
            .write_samples(&chunk.to_vec())
            .map_err(|e| SinkError::Edf(e.to_string()))
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| SinkError::Edf(e.to_string()))?;
        }
        Ok(())
    }
}

// ── In-memory sink ───────────────────────────────────────────────────────

/// Records every call for inspection while enforcing the sink contract.
#[derive(Debug, Default)]
pub struct MemorySink {
    header: Option<Vec<ChannelSpec>>,
    chunks: Vec<Vec<Vec<f64>>>,
    finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared channel specs, in declaration order.
    pub fn header(&self) -> Option<&[ChannelSpec]> {
        self.header.as_deref()
    }

    /// All written chunks, in write order.
    pub fn chunks(&self) -> &[Vec<Vec<f64>>] {
        &self.chunks
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Total samples written for `channel` across all chunks.
    pub fn samples_written(&self, channel: usize) -> usize {
        self.chunks.iter().map(|c| c[channel].len()).sum()
    }
}

impl SignalSink for MemorySink {
    fn declare_header(&mut self, specs: &[ChannelSpec]) -> Result<(), SinkError> {
        if self.header.is_some() {
            return Err(SinkError::HeaderAlreadyDeclared);
        }
        self.header = Some(specs.to_vec());
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[Vec<f64>]) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        check_chunk(chunk, self.header.as_ref().map(Vec::len))?;
        self.chunks.push(chunk.to_vec());
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        self.finalized = true;
        Ok(())
    }
}
