//! Frequency-domain partitioned impulse responses.

use std::sync::Arc;

use realfft::RealFftPlanner;
use realfft::num_complex::Complex;
use sonance_core::{Error, Reader, Result, Specs};

use crate::config::DEFAULT_PARTITION_FRAMES;

/// An impulse response split into equal partitions, each transformed into
/// the frequency domain once. Immutable and freely shared by convolver
/// readers.
pub struct ImpulseResponse {
    specs: Specs,
    frames: u64,
    partition_frames: usize,
    /// `spectra[channel][k]` is the transform of partition `k`, zero-padded
    /// to twice the partition length.
    spectra: Vec<Vec<Arc<[Complex<f32>]>>>,
}

impl ImpulseResponse {
    /// Builds a partitioned response from a finite reader with the default
    /// partition length.
    pub fn new(reader: Box<dyn Reader>) -> Result<Self> {
        Self::with_partition_frames(reader, DEFAULT_PARTITION_FRAMES)
    }

    /// Builds a partitioned response with an explicit partition length,
    /// which must be a power of two.
    pub fn with_partition_frames(mut reader: Box<dyn Reader>, partition_frames: usize) -> Result<Self> {
        if partition_frames == 0 || !partition_frames.is_power_of_two() {
            return Err(Error::specs(format!(
                "partition length must be a power of two, got {partition_frames}"
            )));
        }
        if reader.length().is_none() {
            return Err(Error::specs(
                "impulse responses require a source of known length",
            ));
        }

        let specs = reader.specs().validate()?;
        let channels = specs.channels();

        let mut samples = Vec::new();
        let mut chunk = vec![0.0f32; 4096 * channels];
        loop {
            let result = reader.read(&mut chunk);
            samples.extend_from_slice(&chunk[..result.frames * channels]);
            if result.eos {
                break;
            }
        }
        let frames = samples.len() / channels;
        if frames == 0 {
            return Err(Error::specs("impulse response is empty"));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(partition_frames * 2);
        let partition_count = frames.div_ceil(partition_frames);

        let mut spectra = Vec::with_capacity(channels);
        for channel in 0..channels {
            let mut channel_spectra = Vec::with_capacity(partition_count);
            for k in 0..partition_count {
                let mut time = vec![0.0f32; partition_frames * 2];
                let start = k * partition_frames;
                let len = partition_frames.min(frames - start);
                for (i, slot) in time.iter_mut().take(len).enumerate() {
                    *slot = samples[(start + i) * channels + channel];
                }
                let mut spectrum = fft.make_output_vec();
                fft.process(&mut time, &mut spectrum)
                    .map_err(|e| Error::memory(format!("impulse response transform failed: {e}")))?;
                channel_spectra.push(Arc::from(spectrum.into_boxed_slice()));
            }
            spectra.push(channel_spectra);
        }

        Ok(Self {
            specs,
            frames: frames as u64,
            partition_frames,
            spectra,
        })
    }

    pub fn specs(&self) -> Specs {
        self.specs
    }

    /// Length of the impulse response in frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn partition_frames(&self) -> usize {
        self.partition_frames
    }

    pub fn partition_count(&self) -> usize {
        self.spectra[0].len()
    }

    pub fn channels(&self) -> usize {
        self.spectra.len()
    }

    /// The partition spectra for `channel`; a mono response broadcasts to
    /// every channel.
    pub fn channel_spectra(&self, channel: usize) -> &[Arc<[Complex<f32>]>] {
        if self.spectra.len() == 1 {
            &self.spectra[0]
        } else {
            &self.spectra[channel]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ImpulseResponse;
    use crate::generator::Silence;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Sound, Specs};

    fn clip(samples: Vec<f32>) -> MemorySound {
        MemorySound::from_frames(samples, Specs::new(48_000, ChannelLayout::Mono))
            .expect("whole frames")
    }

    #[test]
    fn partitions_cover_the_whole_response() {
        let sound = clip(vec![0.5; 2500]);
        let ir = ImpulseResponse::with_partition_frames(
            sound.create_reader().expect("reader"),
            1024,
        )
        .expect("finite source");
        assert_eq!(ir.frames(), 2500);
        assert_eq!(ir.partition_count(), 3);
        assert_eq!(ir.channels(), 1);
        // Spectrum bins of a 2048-point real transform.
        assert_eq!(ir.channel_spectra(0)[0].len(), 1025);
    }

    #[test]
    fn non_power_of_two_partitions_are_rejected() {
        let sound = clip(vec![1.0; 8]);
        assert!(
            ImpulseResponse::with_partition_frames(sound.create_reader().expect("reader"), 1000)
                .is_err()
        );
    }

    #[test]
    fn infinite_sources_are_rejected() {
        let reader = Silence::new(48_000).create_reader().expect("reader");
        assert!(ImpulseResponse::new(reader).is_err());
    }
}
