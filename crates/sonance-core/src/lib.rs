//! Core contracts of the sonance audio engine.
//!
//! This crate defines the value types shared by every node of the
//! processing graph (sample specs, formats, buffers), the pull-driven
//! [`Reader`](reader::Reader) contract every node implements, the
//! [`Sound`](sound::Sound) factory contract, and the error taxonomy used
//! across readers and devices.

pub mod buffer;
pub mod error;
pub mod math;
pub mod reader;
pub mod sound;
pub mod specs;

pub use buffer::SampleBuffer;
pub use error::{Error, Result};
pub use math::{Quaternion, Vector3};
pub use reader::{ReadResult, Reader};
pub use sound::Sound;
pub use specs::{ChannelLayout, DeviceSpecs, SampleFormat, Specs};
