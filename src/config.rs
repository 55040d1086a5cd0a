//! Job configuration.
//!
//! [`JobConfig`] is the explicit, validated record a conversion job is built
//! from. It deserializes from JSON with unknown keys rejected, so a stale or
//! misspelled field fails loudly at load time instead of being silently
//! absorbed. Per-channel lists are index-aligned with `ch_list`.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::decimate::decimation_factor;
use crate::error::ConvertError;

/// EDF digital values are 16-bit two's complement.
const DIGITAL_FLOOR: i32 = -32768;
const DIGITAL_CEIL: i32 = 32767;

/// Per-channel output metadata, written into the EDF header.
///
/// Created once per job from [`JobConfig::channel_specs`] and immutable
/// thereafter. `sample_rate` is the target (decimated) rate, not the source
/// rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub label: String,
    /// Physical unit, e.g. `"V"` or `"uV"`.
    pub dimension: String,
    /// Declared output sample rate in Hz.
    pub sample_rate: f64,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
    /// Free text, may be empty.
    pub transducer: String,
    /// Free text, may be empty.
    pub prefilter: String,
}

impl ChannelSpec {
    /// Check the header invariants for this channel.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.label.is_empty() {
            return Err(ConvertError::Config("channel label must not be empty".into()));
        }
        if self.physical_min >= self.physical_max {
            return Err(ConvertError::Config(format!(
                "channel {:?}: physical_min {} must be below physical_max {}",
                self.label, self.physical_min, self.physical_max
            )));
        }
        if self.digital_min >= self.digital_max {
            return Err(ConvertError::Config(format!(
                "channel {:?}: digital_min {} must be below digital_max {}",
                self.label, self.digital_min, self.digital_max
            )));
        }
        if self.digital_min < DIGITAL_FLOOR || self.digital_max > DIGITAL_CEIL {
            return Err(ConvertError::Config(format!(
                "channel {:?}: digital range [{}, {}] exceeds the 16-bit EDF range",
                self.label, self.digital_min, self.digital_max
            )));
        }
        Ok(())
    }
}

/// Configuration for one conversion job: one source recording, one subject's
/// channel subset.
///
/// The field vocabulary matches the JSON configuration files the acquisition
/// side produces:
///
/// ```json
/// {
///   "load_path": "/data/recordings",
///   "save_path": "/data/edf",
///   "file_name": "031018",
///   "subject": "2",
///   "ch_list": [6, 8, 7],
///   "fs": 4000.0,
///   "new_fs": 250.0,
///   "ch_id": ["lfp", "eeg", "emg"],
///   "dimension": ["V", "V", "V"],
///   "physical_max": [0.1, 0.1, 0.01],
///   "physical_min": [-0.1, -0.1, -0.01],
///   "digital_max": [32000, 32000, 32000],
///   "digital_min": [-32000, -32000, -32000],
///   "chunksize": 5000000
/// }
/// ```
///
/// `ch_list` uses 1-based channel numbers as labelled on the acquisition
/// hardware; [`JobConfig::selected_channels`] maps them to 0-based indices.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Directory holding the source recording.
    pub load_path: PathBuf,
    /// Directory the EDF files are written into.
    pub save_path: PathBuf,
    /// Source file identity, without extension.
    pub file_name: String,
    /// Subject identity, embedded in output file names.
    pub subject: String,
    /// 1-based channel numbers to convert, in output order.
    pub ch_list: Vec<usize>,
    /// Source sample rate in Hz.
    pub fs: f64,
    /// Target sample rate in Hz.
    pub new_fs: f64,
    /// Channel labels, index-aligned with `ch_list`.
    pub ch_id: Vec<String>,
    /// Physical units, index-aligned with `ch_list`.
    pub dimension: Vec<String>,
    pub physical_max: Vec<f64>,
    pub physical_min: Vec<f64>,
    pub digital_max: Vec<i32>,
    pub digital_min: Vec<i32>,
    /// Maximum samples per channel held in memory at once.
    pub chunksize: usize,
    /// Transducer descriptions; empty strings when absent.
    #[serde(default)]
    pub transducer: Vec<String>,
    /// Prefilter descriptions; empty strings when absent.
    #[serde(default)]
    pub prefilter: Vec<String>,
}

impl JobConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::Config(format!("cannot read {}: {e}", path.display())))?;
        let cfg: JobConfig = serde_json::from_str(&text)
            .map_err(|e| ConvertError::Config(format!("cannot parse {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the whole record. Called by [`crate::ConversionJob::new`]
    /// before any I/O.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.ch_list.is_empty() {
            return Err(ConvertError::Config("ch_list must not be empty".into()));
        }
        if self.ch_list.contains(&0) {
            return Err(ConvertError::Config(
                "ch_list uses 1-based channel numbers; 0 is not a valid entry".into(),
            ));
        }
        let n = self.ch_list.len();
        for (name, len) in [
            ("ch_id", self.ch_id.len()),
            ("dimension", self.dimension.len()),
            ("physical_max", self.physical_max.len()),
            ("physical_min", self.physical_min.len()),
            ("digital_max", self.digital_max.len()),
            ("digital_min", self.digital_min.len()),
        ] {
            if len != n {
                return Err(ConvertError::Config(format!(
                    "{name} has {len} entries for {n} selected channels"
                )));
            }
        }
        for (name, len) in [
            ("transducer", self.transducer.len()),
            ("prefilter", self.prefilter.len()),
        ] {
            if len != 0 && len != n {
                return Err(ConvertError::Config(format!(
                    "{name} has {len} entries for {n} selected channels"
                )));
            }
        }
        if !(self.fs > 0.0) || !(self.new_fs > 0.0) {
            return Err(ConvertError::Config(format!(
                "sample rates must be positive (fs = {}, new_fs = {})",
                self.fs, self.new_fs
            )));
        }
        if self.new_fs > self.fs {
            return Err(ConvertError::Config(format!(
                "new_fs {} exceeds source rate {} (upsampling is not supported)",
                self.new_fs, self.fs
            )));
        }
        if self.chunksize == 0 {
            return Err(ConvertError::Config("chunksize must be positive".into()));
        }
        for spec in self.channel_specs() {
            spec.validate()?;
        }
        Ok(())
    }

    /// Integer decimation factor, `round(fs / new_fs)`.
    pub fn down_factor(&self) -> usize {
        decimation_factor(self.fs, self.new_fs)
    }

    /// Selected channels as 0-based indices, in output order.
    pub fn selected_channels(&self) -> Vec<usize> {
        self.ch_list.iter().map(|&c| c - 1).collect()
    }

    /// Build the per-channel header specs, index-aligned with `ch_list`.
    ///
    /// The declared rate is `new_fs`: the file carries decimated data.
    pub fn channel_specs(&self) -> Vec<ChannelSpec> {
        (0..self.ch_list.len())
            .map(|i| ChannelSpec {
                label: self.ch_id[i].clone(),
                dimension: self.dimension[i].clone(),
                sample_rate: self.new_fs,
                physical_min: self.physical_min[i],
                physical_max: self.physical_max[i],
                digital_min: self.digital_min[i],
                digital_max: self.digital_max[i],
                transducer: self.transducer.get(i).cloned().unwrap_or_default(),
                prefilter: self.prefilter.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Path of the source recording container.
    pub fn source_path(&self) -> PathBuf {
        self.load_path.join(format!("{}.safetensors", self.file_name))
    }
}
