//! Attack-decay-sustain-release gain.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Applies an ADSR envelope triggered at stream start.
///
/// The release time is stored but there is no trigger for it; the envelope
/// holds the sustain level until the stream ends.
pub struct AdsrReader {
    reader: Box<dyn Reader>,
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
}

impl AdsrReader {
    pub fn new(
        reader: Box<dyn Reader>,
        attack: f64,
        decay: f64,
        sustain: f64,
        release: f64,
    ) -> Result<Self> {
        if !(attack >= 0.0) || !(decay >= 0.0) || !(release >= 0.0) {
            return Err(Error::specs(
                "adsr attack, decay and release must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&sustain) {
            return Err(Error::specs(format!(
                "adsr sustain level must be within [0, 1], got {sustain}"
            )));
        }
        Ok(Self {
            reader,
            attack,
            decay,
            sustain,
            release,
        })
    }

    pub fn release(&self) -> f64 {
        self.release
    }

    fn gain_at(&self, seconds: f64) -> f32 {
        let gain = if seconds < self.attack {
            seconds / self.attack
        } else if seconds < self.attack + self.decay {
            1.0 + (self.sustain - 1.0) * (seconds - self.attack) / self.decay
        } else {
            self.sustain
        };
        gain as f32
    }
}

impl Reader for AdsrReader {
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
        let channels = self.specs().channels();
        let rate = self.specs().rate as f64;
        let start_frame = self.reader.position();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            let seconds = (start_frame + frame as u64) as f64 / rate;
            let gain = self.gain_at(seconds);
            for sample in &mut out[frame * channels..(frame + 1) * channels] {
                *sample *= gain;
            }
        }
        result
    }
}
