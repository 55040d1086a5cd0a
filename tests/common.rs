/// Shared builders for conversion tests: synthetic recordings, a standard
/// job configuration, and misbehaving source doubles.
use edfconv::{ChannelSource, JobConfig, MemorySource, SourceError};
use ndarray::Array2;
use std::f64::consts::PI;

#[allow(unused)]
/// A block of `n_ch` channels, `n` samples each: channel `c` carries a
/// `freq_hz` sine at `fs` plus a small per-channel DC offset so channels
/// are distinguishable.
pub fn sine_block(n_ch: usize, n: usize, fs: f64, freq_hz: f64) -> Array2<f64> {
    // Stays inside every channel's physical range in `test_config`.
    Array2::from_shape_fn((n_ch, n), |(c, t)| {
        0.005 * (2.0 * PI * freq_hz * t as f64 / fs).sin() + 0.0005 * c as f64
    })
}

#[allow(unused)]
/// The standard test job: 3 channels, 4 kHz source, 250 Hz target (factor
/// 16), 3000-sample chunks.
pub fn test_config() -> JobConfig {
    JobConfig {
        load_path: "/unused".into(),
        save_path: "/unused".into(),
        file_name: "rec".into(),
        subject: "2".into(),
        ch_list: vec![1, 2, 3],
        fs: 4000.0,
        new_fs: 250.0,
        ch_id: vec!["lfp".into(), "eeg".into(), "emg".into()],
        dimension: vec!["V".into(), "V".into(), "V".into()],
        physical_max: vec![0.1, 0.1, 0.01],
        physical_min: vec![-0.1, -0.1, -0.01],
        digital_max: vec![32_000, 32_000, 32_000],
        digital_min: vec![-32_000, -32_000, -32_000],
        chunksize: 3000,
        transducer: vec![],
        prefilter: vec![],
    }
}

#[allow(unused)]
/// Write a safetensors container with one F64 `[C, T]` tensor per block,
/// named `block_0`, `block_1`, …, as `SafetensorsSource` expects.
pub fn write_safetensors(path: &std::path::Path, blocks: &[Array2<f64>]) {
    use std::io::Write;

    let mut header = serde_json::Map::new();
    let mut offset = 0usize;
    let mut payload: Vec<u8> = Vec::new();
    for (i, b) in blocks.iter().enumerate() {
        let bytes: Vec<u8> = b.iter().flat_map(|v| v.to_le_bytes()).collect();
        header.insert(
            format!("block_{i}"),
            serde_json::json!({
                "dtype": "F64",
                "shape": [b.nrows(), b.ncols()],
                "data_offsets": [offset, offset + bytes.len()],
            }),
        );
        offset += bytes.len();
        payload.extend_from_slice(&bytes);
    }
    let header_bytes = serde_json::to_vec(&serde_json::Value::Object(header)).unwrap();

    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&(header_bytes.len() as u64).to_le_bytes()).unwrap();
    f.write_all(&header_bytes).unwrap();
    f.write_all(&payload).unwrap();
}

#[allow(unused)]
/// Wraps a [`MemorySource`] and fails every read touching the listed
/// blocks, simulating unreadable segments of a recording.
pub struct UnreadableBlocks {
    pub inner: MemorySource,
    pub bad_blocks: Vec<usize>,
}

impl ChannelSource for UnreadableBlocks {
    fn channel_count(&self) -> usize {
        self.inner.channel_count()
    }

    fn block_count(&self, channel: usize) -> Result<usize, SourceError> {
        self.inner.block_count(channel)
    }

    fn sample_count(&self, channel: usize, block: usize) -> Result<usize, SourceError> {
        self.inner.sample_count(channel, block)
    }

    fn read(
        &self,
        channel: usize,
        block: usize,
        start: usize,
        stop: usize,
    ) -> Result<Vec<f64>, SourceError> {
        if self.bad_blocks.contains(&block) {
            return Err(SourceError::Malformed(format!(
                "unreadable sector in block {block}"
            )));
        }
        self.inner.read(channel, block, start, stop)
    }
}

#[allow(unused)]
/// Returns one sample fewer than asked on the listed channel, violating the
/// matched-length contract between channels of one block.
pub struct TruncatedChannel {
    pub inner: MemorySource,
    pub channel: usize,
}

impl ChannelSource for TruncatedChannel {
    fn channel_count(&self) -> usize {
        self.inner.channel_count()
    }

    fn block_count(&self, channel: usize) -> Result<usize, SourceError> {
        self.inner.block_count(channel)
    }

    fn sample_count(&self, channel: usize, block: usize) -> Result<usize, SourceError> {
        self.inner.sample_count(channel, block)
    }

    fn read(
        &self,
        channel: usize,
        block: usize,
        start: usize,
        stop: usize,
    ) -> Result<Vec<f64>, SourceError> {
        let mut data = self.inner.read(channel, block, start, stop)?;
        if channel == self.channel {
            data.pop();
        }
        Ok(data)
    }
}
