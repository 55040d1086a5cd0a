//! # edfconv — streaming biosignal-to-EDF conversion with decimation
//!
//! `edfconv` turns long multi-channel, multi-block biosignal recordings into
//! EDF files, downsampling every channel to a target rate on the way. One
//! recording may hold several discontinuous blocks and channels for several
//! subjects; each subject's channel subset for one block becomes one
//! self-contained EDF file.
//!
//! The pipeline streams in bounded-memory chunks: at no point is more than
//! one chunk of all selected channels held in memory, so a multi-hour
//! recording converts in the same footprint as a short one.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording (N blocks, C channels)
//!   │
//!   ├─ probe            start/middle/end test reads per block
//!   ├─ chunk plan       boundaries every `chunksize` samples + remainder
//!   │    └─ per chunk, per channel:
//!   │         read [start, stop)        half-open range from the source
//!   │         decimate by F             one stage ≤ 8, else ⌊F/2⌋ then 2
//!   │         append aligned chunk      strictly in range order
//!   └─ finalize         one EDF file per (subject, block): name_subject{a,b,…}.edf
//! ```
//!
//! ## Quick start
//!
//! ```
//! use edfconv::{ConversionJob, JobConfig, MemorySink, MemorySource};
//! use ndarray::Array2;
//!
//! // A one-block recording: 3 channels, 10 s at 4 kHz.
//! let block = Array2::from_shape_fn((3, 40_000), |(c, t)| {
//!     ((t as f64) * 0.01 + c as f64).sin() * 0.05
//! });
//! let source = MemorySource::new(vec![block]).unwrap();
//!
//! let cfg = JobConfig {
//!     load_path: "/data/recordings".into(),
//!     save_path: "/data/edf".into(),
//!     file_name: "031018".into(),
//!     subject: "2".into(),
//!     ch_list: vec![1, 2, 3],
//!     fs: 4000.0,
//!     new_fs: 250.0,
//!     ch_id: vec!["lfp".into(), "eeg".into(), "emg".into()],
//!     dimension: vec!["V".into(); 3],
//!     physical_max: vec![0.1, 0.1, 0.01],
//!     physical_min: vec![-0.1, -0.1, -0.01],
//!     digital_max: vec![32_000; 3],
//!     digital_min: vec![-32_000; 3],
//!     chunksize: 5000,
//!     transducer: vec![],
//!     prefilter: vec![],
//! };
//!
//! let job = ConversionJob::new(cfg, source).unwrap();
//! assert_eq!(job.factor(), 16); // 4000 / 250
//!
//! // Stream block 0 into an in-memory sink (EdfSink writes real files).
//! let mut sink = MemorySink::new();
//! let stats = job.convert_block_into(0, &mut sink).unwrap();
//! assert_eq!(sink.header().unwrap().len(), 3);
//! assert_eq!(stats.chunks, 8);
//! ```
//!
//! Converting a recording on disk end-to-end is one call:
//!
//! ```no_run
//! use edfconv::{run_job, JobConfig};
//!
//! let cfg = JobConfig::from_json_file("config.json").unwrap();
//! let outcomes = run_job(&cfg).unwrap();
//! for o in &outcomes {
//!     println!("block {}: converted = {}", o.block(), o.is_converted());
//! }
//! ```
//!
//! ## Failure model
//!
//! Configuration and source-open failures abort the job before any output
//! exists. Everything after that is per-block: a failed probe or a failed
//! read/write mid-stream skips that one block (partial output deleted,
//! reason logged and returned in the [`BlockOutcome`]) and the remaining
//! blocks still convert.

pub mod chunk;
pub mod config;
pub mod convert;
pub mod decimate;
pub mod error;
pub mod sink;
pub mod source;

// ── Crate-root re-exports ────────────────────────────────────────────────
//
// The types a downstream user needs, without the internal module layout.

pub use chunk::{chunk_boundaries, chunk_ranges};
pub use config::{ChannelSpec, JobConfig};
pub use convert::{block_suffix, BlockOutcome, BlockStats, ConversionJob};
pub use decimate::{decimate, decimation_factor, stage_plan};
pub use error::{ConvertError, SinkError, SourceError, StreamError};
pub use sink::{EdfSink, MemorySink, SignalSink};
pub use source::{ChannelSource, MemorySource, SafetensorsSource};

/// Convert one recording end-to-end: open the source container named by the
/// configuration, stream every block, and write one EDF file per block into
/// `save_path`.
///
/// This is the production path the `edfconv` binary calls; it wires
/// [`SafetensorsSource`] to [`EdfSink`] through a [`ConversionJob`].
///
/// # Errors
///
/// Returns [`ConvertError::Config`] or [`ConvertError::SourceOpen`] before
/// any output is produced. Per-block failures do not surface here; they are
/// reported as [`BlockOutcome::Skipped`] entries.
pub fn run_job(cfg: &JobConfig) -> Result<Vec<BlockOutcome>, ConvertError> {
    cfg.validate()?;
    let source = SafetensorsSource::open(cfg.source_path())?;
    let job = ConversionJob::new(cfg.clone(), source)?;
    job.convert_file()
}
