//! Streaming readers, effects, the partitioned convolver, the device
//! scheduler and the playback manager of the sonance audio engine.
//!
//! Audio flows from generators and memory sources through effect readers
//! into a converter that matches a device's specs; the device's mixing
//! thread pulls converted frames into per-stream buffer rings and drives
//! transport state on [`Handle`](device::Handle)s.

#![deny(clippy::wildcard_imports)]

pub mod config;
pub mod convert;
pub mod convolver;
pub mod device;
pub mod fx;
pub mod generator;
pub mod manager;
pub mod source;

pub use convert::ConverterReader;
pub use convolver::{ConvolverReader, ConvolverSound, ImpulseResponse};
pub use device::{Device, DistanceModel, Handle, NullSink, Sink, Status};
pub use generator::{Oscillator, OscillatorReader, Silence, SilenceReader, Waveform};
pub use manager::PlaybackManager;
pub use source::{MemoryReader, MemorySound};
