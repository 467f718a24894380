//! Channel rematrixing.

use sonance_core::{ChannelLayout, ReadResult, Reader, SampleBuffer, Specs};
use sonance_mixer::{LfeMode, MixMatrix};

/// Remixes the upstream layout into a target layout through a fixed
/// matrix.
pub struct RechannelReader {
    reader: Box<dyn Reader>,
    matrix: MixMatrix,
    layout: ChannelLayout,
    scratch: SampleBuffer,
}

impl RechannelReader {
    pub fn new(reader: Box<dyn Reader>, layout: ChannelLayout) -> Self {
        Self::with_lfe_mode(reader, layout, LfeMode::default())
    }

    pub fn with_lfe_mode(reader: Box<dyn Reader>, layout: ChannelLayout, lfe: LfeMode) -> Self {
        let matrix = MixMatrix::create(reader.specs().layout, layout, lfe);
        Self {
            reader,
            matrix,
            layout,
            scratch: SampleBuffer::new(),
        }
    }
}

impl Reader for RechannelReader {
    fn specs(&self) -> Specs {
        Specs::new(self.reader.specs().rate, self.layout)
    }

    fn length(&self) -> Option<u64> {
        self.reader.length()
    }

    fn position(&self) -> u64 {
        self.reader.position()
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.reader.seek(frame)
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let in_channels = self.matrix.in_channels();
        let out_channels = self.matrix.out_channels();
        let want = out.len() / out_channels;

        self.scratch.ensure_size(want * in_channels);
        let result = self
            .reader
            .read(&mut self.scratch.as_mut_slice()[..want * in_channels]);
        self.matrix.apply_into(
            &self.scratch.as_slice()[..result.frames * in_channels],
            &mut out[..result.frames * out_channels],
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::RechannelReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    #[test]
    fn stereo_collapses_to_mono() {
        let sound = MemorySound::from_frames(
            vec![1.0, 0.0, 0.0, 1.0, 0.5, 0.5],
            Specs::new(10, ChannelLayout::Stereo),
        )
        .expect("whole frames");
        let mut reader =
            RechannelReader::new(sound.create_reader().expect("reader"), ChannelLayout::Mono);
        assert_eq!(reader.specs().layout, ChannelLayout::Mono);

        let mut out = vec![0.0f32; 3];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 3);
        assert!(result.eos);
        assert_eq!(out, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn mono_fans_out_to_stereo() {
        let sound = MemorySound::from_frames(
            vec![0.25, -0.5],
            Specs::new(10, ChannelLayout::Mono),
        )
        .expect("whole frames");
        let mut reader = RechannelReader::new(
            sound.create_reader().expect("reader"),
            ChannelLayout::Stereo,
        );
        let mut out = vec![0.0f32; 4];
        reader.read(&mut out);
        assert_eq!(out, vec![0.25, 0.25, -0.5, -0.5]);
    }
}
