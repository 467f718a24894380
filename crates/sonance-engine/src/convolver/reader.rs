//! The streaming convolution reader.

use std::collections::VecDeque;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use sonance_core::{Error, ReadResult, Reader, Result, Specs};

use crate::convolver::ImpulseResponse;
use crate::convolver::pool::WorkerPool;

/// Convolves the upstream with a partitioned impulse response using
/// overlap-save blocks.
///
/// Per channel the reader keeps a ring of the transforms of the last `K`
/// input windows; each output block is the inverse transform of
/// `sum_k X[t-k] * H[k]` with the first half discarded. With a thread hint
/// above one, `(channel, partition range)` jobs run on a shared worker
/// pool and the partial spectra are reduced on the reading thread.
pub struct ConvolverReader {
    reader: Box<dyn Reader>,
    ir: Arc<ImpulseResponse>,
    pool: Option<WorkerPool>,
    fft: Arc<dyn RealToComplex<f32>>,
    ifft: Arc<dyn ComplexToReal<f32>>,
    channels: usize,
    /// Per channel sliding time window of the last two blocks.
    window: Vec<Vec<f32>>,
    /// Per channel ring of input spectra, newest first.
    history: Vec<VecDeque<Arc<[Complex<f32>]>>>,
    pending: VecDeque<f32>,
    in_scratch: Vec<f32>,
    time_scratch: Vec<f32>,
    input_frames: u64,
    emitted: u64,
    upstream_done: bool,
    finished: bool,
    position: u64,
}

impl ConvolverReader {
    /// `threads` is the total parallelism hint across channels and
    /// partitions; one means fully inline convolution.
    pub fn new(
        reader: Box<dyn Reader>,
        ir: Arc<ImpulseResponse>,
        threads: usize,
    ) -> Result<Self> {
        let specs = reader.specs().validate()?;
        if ir.specs().rate != specs.rate {
            return Err(Error::specs(format!(
                "impulse response rate {} does not match input rate {}",
                ir.specs().rate,
                specs.rate
            )));
        }
        let channels = specs.channels();
        if ir.channels() != 1 && ir.channels() != channels {
            return Err(Error::specs(format!(
                "impulse response has {} channels, input has {}",
                ir.channels(),
                channels
            )));
        }

        let partition = ir.partition_frames();
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(partition * 2);
        let ifft = planner.plan_fft_inverse(partition * 2);

        let pool = if threads > 1 {
            Some(WorkerPool::new(threads)?)
        } else {
            None
        };

        Ok(Self {
            reader,
            pool,
            fft,
            ifft,
            channels,
            window: vec![vec![0.0; partition * 2]; channels],
            history: vec![VecDeque::new(); channels],
            pending: VecDeque::new(),
            in_scratch: vec![0.0; partition * channels],
            time_scratch: vec![0.0; partition * 2],
            input_frames: 0,
            emitted: 0,
            upstream_done: false,
            finished: false,
            position: 0,
            ir,
        })
    }

    /// Total valid output frames; only meaningful once the upstream ended.
    fn total_output(&self) -> u64 {
        self.input_frames + self.ir.frames() - 1
    }

    /// Feeds one partition-sized block through the convolution, appending
    /// the valid output frames to `pending`.
    fn process_block(&mut self) {
        let partition = self.ir.partition_frames();
        let channels = self.channels;

        let mut got = 0;
        if !self.upstream_done {
            while got < partition {
                let result = self
                    .reader
                    .read(&mut self.in_scratch[got * channels..partition * channels]);
                got += result.frames;
                if result.eos {
                    self.upstream_done = true;
                    break;
                }
                if result.frames == 0 {
                    break;
                }
            }
        }
        if self.upstream_done && got == 0 && self.emitted >= self.total_output() {
            self.finished = true;
            return;
        }
        self.input_frames += got as u64;

        for channel in 0..channels {
            let window = &mut self.window[channel];
            window.copy_within(partition.., 0);
            for (i, slot) in window[partition..].iter_mut().enumerate() {
                *slot = if i < got {
                    self.in_scratch[i * channels + channel]
                } else {
                    0.0
                };
            }

            let mut time = window.clone();
            let mut spectrum = self.fft.make_output_vec();
            if self.fft.process(&mut time, &mut spectrum).is_err() {
                tracing::warn!("forward transform failed, ending convolution");
                self.finished = true;
                return;
            }
            self.history[channel].push_front(Arc::from(spectrum.into_boxed_slice()));
            self.history[channel].truncate(self.ir.partition_count());
        }

        let sums = self.spectral_sums();

        let valid = if self.upstream_done {
            (self.total_output().saturating_sub(self.emitted)).min(partition as u64) as usize
        } else {
            partition
        };

        let scale = 1.0 / (partition as f32 * 2.0);
        let mut outputs = vec![vec![0.0f32; partition]; channels];
        for (channel, mut sum) in sums.into_iter().enumerate() {
            if self
                .ifft
                .process(&mut sum, &mut self.time_scratch)
                .is_err()
            {
                tracing::warn!("inverse transform failed, ending convolution");
                self.finished = true;
                return;
            }
            for (slot, &value) in outputs[channel]
                .iter_mut()
                .zip(self.time_scratch[partition..].iter())
            {
                *slot = value * scale;
            }
        }
        for frame in 0..valid {
            for output in outputs.iter() {
                self.pending.push_back(output[frame]);
            }
        }

        self.emitted += valid as u64;
        if self.upstream_done && self.emitted >= self.total_output() {
            self.finished = true;
        }
    }

    /// `sum_k X[t-k] * H[k]` per channel, fanned out over the worker pool
    /// when one exists.
    fn spectral_sums(&self) -> Vec<Vec<Complex<f32>>> {
        let bins = self.ir.partition_frames() + 1;
        let zero = Complex::new(0.0, 0.0);

        let Some(pool) = &self.pool else {
            return (0..self.channels)
                .map(|channel| {
                    let history: Vec<Arc<[Complex<f32>]>> =
                        self.history[channel].iter().cloned().collect();
                    let parts = self.ir.channel_spectra(channel);
                    let terms = history.len().min(parts.len());
                    accumulate_terms(&history, parts, 0..terms, bins)
                })
                .collect();
        };

        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Vec<Complex<f32>>)>();
        let jobs_per_channel = (pool.threads() / self.channels).max(1);

        for channel in 0..self.channels {
            let history: Vec<Arc<[Complex<f32>]>> =
                self.history[channel].iter().cloned().collect();
            let parts: Vec<Arc<[Complex<f32>]>> = self.ir.channel_spectra(channel).to_vec();
            let terms = history.len().min(parts.len());
            let chunk = terms.div_ceil(jobs_per_channel).max(1);

            let mut start = 0;
            while start < terms {
                let end = (start + chunk).min(terms);
                let job_tx = tx.clone();
                let job_history = history.clone();
                let job_parts = parts.clone();
                let job = Box::new(move || {
                    let acc = accumulate_terms(&job_history, &job_parts, start..end, bins);
                    let _ = job_tx.send((channel, acc));
                });
                if !pool.execute(job) {
                    // Pool is gone; fall back to the calling thread.
                    let acc = accumulate_terms(&history, &parts, start..end, bins);
                    let _ = tx.send((channel, acc));
                }
                start = end;
            }
        }
        drop(tx);

        let mut sums = vec![vec![zero; bins]; self.channels];
        while let Ok((channel, partial)) = rx.recv() {
            for (slot, &value) in sums[channel].iter_mut().zip(partial.iter()) {
                *slot += value;
            }
        }
        sums
    }
}

/// Accumulates `X[k] * H[k]` over `range` into a fresh spectrum.
fn accumulate_terms(
    history: &[Arc<[Complex<f32>]>],
    parts: &[Arc<[Complex<f32>]>],
    range: std::ops::Range<usize>,
    bins: usize,
) -> Vec<Complex<f32>> {
    let mut acc = vec![Complex::new(0.0, 0.0); bins];
    for k in range {
        for (slot, (&x, &h)) in acc.iter_mut().zip(history[k].iter().zip(parts[k].iter())) {
            *slot += x * h;
        }
    }
    acc
}

impl Reader for ConvolverReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        self.reader
            .length()
            .map(|len| len + self.ir.frames() - 1)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        if !self.reader.seek(frame) {
            return false;
        }
        for window in &mut self.window {
            window.fill(0.0);
        }
        for history in &mut self.history {
            history.clear();
        }
        self.pending.clear();
        let upstream = self.reader.position();
        self.input_frames = upstream;
        self.emitted = upstream;
        self.position = upstream;
        self.upstream_done = false;
        self.finished = false;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.channels;
        let want = out.len() / channels;

        while self.pending.len() < want * channels && !self.finished {
            self.process_block();
        }

        let frames = want.min(self.pending.len() / channels);
        for sample in out.iter_mut().take(frames * channels) {
            *sample = self.pending.pop_front().unwrap_or(0.0);
        }
        self.position += frames as u64;
        ReadResult::new(frames, self.finished && self.pending.len() < channels)
    }
}

#[cfg(test)]
mod tests {
    use super::ConvolverReader;
    use crate::convolver::ImpulseResponse;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};
    use std::sync::Arc;

    fn mono(samples: Vec<f32>) -> MemorySound {
        MemorySound::from_frames(samples, Specs::new(48_000, ChannelLayout::Mono))
            .expect("whole frames")
    }

    fn small_ir(samples: Vec<f32>) -> Arc<ImpulseResponse> {
        let sound = mono(samples);
        Arc::new(
            ImpulseResponse::with_partition_frames(sound.create_reader().expect("reader"), 4)
                .expect("finite source"),
        )
    }

    #[test]
    fn unit_impulse_passes_the_input_through() {
        let ir = small_ir(vec![1.0]);
        let input = mono(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let mut reader =
            ConvolverReader::new(input.create_reader().expect("reader"), ir, 1)
                .expect("matching specs");

        let mut out = vec![0.0f32; 8];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 6);
        assert!(result.eos);
        for (i, expected) in [0.1, 0.2, 0.3, 0.4, 0.5, 0.6].iter().enumerate() {
            assert!((out[i] - expected).abs() < 1e-4, "sample {i}");
        }
    }

    #[test]
    fn impulse_input_reproduces_the_response() {
        let ir = small_ir(vec![1.0, 0.5, 0.25]);
        let mut input = vec![0.0f32; 8];
        input[0] = 1.0;
        let mut reader =
            ConvolverReader::new(mono(input).create_reader().expect("reader"), ir, 1)
                .expect("matching specs");

        assert_eq!(reader.length(), Some(10));
        let mut out = vec![0.0f32; 16];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 10);
        assert!(result.eos);

        let expected = [1.0, 0.5, 0.25, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for (i, e) in expected.iter().enumerate() {
            assert!((out[i] - e).abs() < 1e-4, "sample {i}: {}", out[i]);
        }
    }

    #[test]
    fn threaded_and_inline_convolution_agree() {
        // A response spanning several partitions forces the partition ring
        // and the job fan-out to do real work.
        let ir_samples: Vec<f32> = (0..10).map(|i| 1.0 / (i + 1) as f32).collect();
        let input_samples: Vec<f32> = (0..40).map(|i| ((i * 7) % 5) as f32 * 0.2 - 0.4).collect();

        let run = |threads: usize| {
            let ir = small_ir(ir_samples.clone());
            let mut reader = ConvolverReader::new(
                mono(input_samples.clone()).create_reader().expect("reader"),
                ir,
                threads,
            )
            .expect("matching specs");
            let mut out = vec![0.0f32; 64];
            let result = reader.read(&mut out);
            assert_eq!(result.frames, 49);
            out
        };

        let inline = run(1);
        let threaded = run(4);
        for (a, b) in inline.iter().zip(threaded.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn mono_response_broadcasts_to_stereo_input() {
        let ir = small_ir(vec![0.5]);
        let input = MemorySound::from_frames(
            vec![1.0, -1.0, 0.5, -0.5],
            Specs::new(48_000, ChannelLayout::Stereo),
        )
        .expect("whole frames");
        let mut reader =
            ConvolverReader::new(input.create_reader().expect("reader"), ir, 1)
                .expect("matching specs");

        let mut out = vec![0.0f32; 4];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 2);
        for (value, expected) in out.iter().zip([0.5, -0.5, 0.25, -0.25].iter()) {
            assert!((value - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn mismatched_rates_are_rejected() {
        let ir = small_ir(vec![1.0]);
        let input = MemorySound::from_frames(vec![0.0], Specs::new(44_100, ChannelLayout::Mono))
            .expect("whole frames");
        assert!(ConvolverReader::new(input.create_reader().expect("reader"), ir, 1).is_err());
    }

    #[test]
    fn seek_discards_the_tail_state() {
        let ir = small_ir(vec![1.0, 0.5]);
        let samples: Vec<f32> = (0..12).map(|i| i as f32 * 0.05).collect();
        let mut reader = ConvolverReader::new(
            mono(samples.clone()).create_reader().expect("reader"),
            ir,
            1,
        )
        .expect("matching specs");

        let mut out = vec![0.0f32; 8];
        reader.read(&mut out);
        assert!(reader.seek(0));
        assert_eq!(reader.position(), 0);

        let mut again = vec![0.0f32; 8];
        reader.read(&mut again);
        assert_eq!(out, again);
    }
}
