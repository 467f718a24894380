//! Sample rate, channel layout and sample format value types.

use crate::error::{Error, Result};

/// Standard channel layouts, ordered by channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// 1 channel (C)
    Mono,
    /// 2 channels (FL, FR)
    Stereo,
    /// 3 channels (FL, FR, LFE)
    StereoLfe,
    /// 4 channels (FL, FR, BL, BR)
    Surround4,
    /// 5 channels (FL, FR, FC, BL, BR)
    Surround5,
    /// 6 channels (FL, FR, FC, LFE, BL, BR)
    Surround51,
    /// 7 channels (FL, FR, FC, LFE, BC, SL, SR)
    Surround61,
    /// 8 channels (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround71,
}

impl ChannelLayout {
    /// Returns the number of interleaved channels in this layout.
    pub const fn channel_count(&self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::StereoLfe => 3,
            Self::Surround4 => 4,
            Self::Surround5 => 5,
            Self::Surround51 => 6,
            Self::Surround61 => 7,
            Self::Surround71 => 8,
        }
    }

    /// Maps a channel count back to its layout.
    pub const fn from_count(n: usize) -> Option<Self> {
        match n {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            3 => Some(Self::StereoLfe),
            4 => Some(Self::Surround4),
            5 => Some(Self::Surround5),
            6 => Some(Self::Surround51),
            7 => Some(Self::Surround61),
            8 => Some(Self::Surround71),
            _ => None,
        }
    }
}

/// Raw sample encodings a device can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8 bit.
    U8,
    /// Signed 16 bit little-endian.
    S16,
    /// Signed 24 bit, packed 3-byte little-endian.
    S24,
    /// Signed 32 bit little-endian.
    S32,
    /// 32 bit IEEE float.
    F32,
    /// 64 bit IEEE float.
    F64,
}

impl SampleFormat {
    /// Size of one sample of this format in bytes.
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S24 => 3,
            Self::S32 => 4,
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Sample rate and channel layout of a reader's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specs {
    /// Samples per second per channel.
    pub rate: u32,
    /// Interleaved channel layout.
    pub layout: ChannelLayout,
}

impl Specs {
    pub const fn new(rate: u32, layout: ChannelLayout) -> Self {
        Self { rate, layout }
    }

    /// Number of samples in one frame.
    pub const fn channels(&self) -> usize {
        self.layout.channel_count()
    }

    /// Rejects zero rates.
    pub fn validate(self) -> Result<Self> {
        if self.rate == 0 {
            return Err(Error::specs("sample rate must be positive"));
        }
        Ok(self)
    }
}

/// [`Specs`] extended with the raw sample format a device consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpecs {
    /// Samples per second per channel.
    pub rate: u32,
    /// Interleaved channel layout.
    pub layout: ChannelLayout,
    /// Raw sample encoding.
    pub format: SampleFormat,
}

impl DeviceSpecs {
    pub const fn new(rate: u32, layout: ChannelLayout, format: SampleFormat) -> Self {
        Self {
            rate,
            layout,
            format,
        }
    }

    /// The rate/layout half of these specs.
    pub const fn specs(&self) -> Specs {
        Specs {
            rate: self.rate,
            layout: self.layout,
        }
    }

    /// Size of one interleaved device frame in bytes.
    pub const fn frame_bytes(&self) -> usize {
        self.layout.channel_count() * self.format.bytes_per_sample()
    }
}
