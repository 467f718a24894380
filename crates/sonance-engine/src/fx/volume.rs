//! Constant gain.

use sonance_core::{ReadResult, Reader, Specs};

/// Scales every sample by a fixed factor.
pub struct VolumeReader {
    reader: Box<dyn Reader>,
    volume: f32,
}

impl VolumeReader {
    pub fn new(reader: Box<dyn Reader>, volume: f32) -> Self {
        Self { reader, volume }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

impl Reader for VolumeReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
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
        let result = self.reader.read(out);
        let produced = result.frames * self.specs().channels();
        for sample in &mut out[..produced] {
            *sample *= self.volume;
        }
        result
    }
}
