//! Signal generators: periodic oscillators and silence.

mod oscillator;
mod silence;

pub use oscillator::{Oscillator, OscillatorReader, Waveform};
pub use silence::{Silence, SilenceReader};
