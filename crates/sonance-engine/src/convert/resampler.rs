//! Sample-rate conversion through rubato's async sinc resampler.

use std::collections::VecDeque;

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Async, FixedAsync, Resampler, SincInterpolationParameters};
use sonance_core::{Error, ReadResult, Reader, Result, Specs};

use crate::config::{
    RESAMPLE_CHUNK_FRAMES, RESAMPLE_CUTOFF, RESAMPLE_INTERPOLATION,
    RESAMPLE_OVERSAMPLING_FACTOR, RESAMPLE_SINC_LEN, RESAMPLE_WINDOW,
};

/// Converts the upstream rate to a target rate.
///
/// Position, length and seeks are expressed in output frames; upstream
/// seeks are translated by the rate ratio. With equal rates the reader is
/// a passthrough.
pub struct ResampleReader {
    reader: Box<dyn Reader>,
    target_rate: u32,
    channels: usize,
    resampler: Option<Async<f32>>,
    pending: VecDeque<f32>,
    chunk: Vec<f32>,
    upstream_done: bool,
    flushed: bool,
    position: u64,
}

impl ResampleReader {
    pub fn new(reader: Box<dyn Reader>, target_rate: u32) -> Result<Self> {
        if target_rate == 0 {
            return Err(Error::specs("target sample rate must be positive"));
        }
        let specs = reader.specs().validate()?;
        let channels = specs.channels();

        let resampler = if specs.rate == target_rate {
            None
        } else {
            Some(build_resampler(specs.rate, target_rate, channels)?)
        };

        Ok(Self {
            reader,
            target_rate,
            channels,
            resampler,
            pending: VecDeque::new(),
            chunk: vec![0.0; RESAMPLE_CHUNK_FRAMES * channels],
            upstream_done: false,
            flushed: false,
            position: 0,
        })
    }

    fn ratio(&self) -> f64 {
        self.target_rate as f64 / self.reader.specs().rate as f64
    }

    /// Converts one upstream chunk into the pending queue. Returns false
    /// once the upstream is exhausted and the tail has been flushed.
    fn pull_chunk(&mut self) -> bool {
        let Some(resampler) = self.resampler.as_mut() else {
            return false;
        };

        let want = self.chunk.len();
        let mut filled = 0;
        while filled < want && !self.upstream_done {
            let result = self.reader.read(&mut self.chunk[filled..want]);
            filled += result.frames * self.channels;
            if result.eos {
                self.upstream_done = true;
            } else if result.frames == 0 {
                break;
            }
        }

        if filled == 0 {
            self.flushed = true;
            return false;
        }
        if filled < want {
            // Final partial chunk: pad with silence so the sinc tail fully
            // drains.
            self.chunk[filled..].fill(0.0);
            self.flushed = true;
        }

        match process_chunk(resampler, &self.chunk, self.channels) {
            Ok(output) => {
                self.pending.extend(output);
                true
            },
            Err(error) => {
                tracing::warn!(%error, "resampling failed, ending stream");
                self.upstream_done = true;
                self.flushed = true;
                false
            },
        }
    }
}

impl Reader for ResampleReader {
    fn specs(&self) -> Specs {
        Specs::new(self.target_rate, self.reader.specs().layout)
    }

    fn length(&self) -> Option<u64> {
        if self.resampler.is_none() {
            return self.reader.length();
        }
        self.reader
            .length()
            .map(|len| (len as f64 * self.ratio()).round() as u64)
    }

    fn position(&self) -> u64 {
        if self.resampler.is_none() {
            return self.reader.position();
        }
        self.position
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        if self.resampler.is_none() {
            return self.reader.seek(frame);
        }
        let upstream = (frame as f64 / self.ratio()).round() as u64;
        if !self.reader.seek(upstream) {
            return false;
        }
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
        self.pending.clear();
        self.upstream_done = false;
        self.flushed = false;
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        if self.resampler.is_none() {
            return self.reader.read(out);
        }

        let want = out.len() / self.channels;
        while self.pending.len() < want * self.channels && !self.flushed {
            self.pull_chunk();
        }

        let frames = want.min(self.pending.len() / self.channels);
        for sample in out.iter_mut().take(frames * self.channels) {
            *sample = self.pending.pop_front().unwrap_or(0.0);
        }
        self.position += frames as u64;
        ReadResult::new(frames, self.flushed && self.pending.len() < self.channels)
    }
}

fn build_resampler(source_rate: u32, target_rate: u32, channels: usize) -> Result<Async<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: RESAMPLE_SINC_LEN,
        f_cutoff: RESAMPLE_CUTOFF,
        oversampling_factor: RESAMPLE_OVERSAMPLING_FACTOR,
        interpolation: RESAMPLE_INTERPOLATION,
        window: RESAMPLE_WINDOW,
    };
    let ratio = target_rate as f64 / source_rate as f64;
    Async::<f32>::new_sinc(
        ratio,
        2.0,
        &params,
        RESAMPLE_CHUNK_FRAMES,
        channels,
        FixedAsync::Input,
    )
    .map_err(|e| Error::specs(format!("failed to create resampler: {e}")))
}

fn process_chunk(
    resampler: &mut Async<f32>,
    chunk_interleaved: &[f32],
    channels: usize,
) -> Result<Vec<f32>> {
    let frames = chunk_interleaved.len() / channels;
    let input = InterleavedSlice::new(chunk_interleaved, channels, frames)
        .map_err(|e| Error::memory(format!("resample input buffer error: {e}")))?;
    let output = resampler
        .process(&input, 0, None)
        .map_err(|e| Error::memory(format!("resample error: {e}")))?;
    Ok(output.take_data())
}
