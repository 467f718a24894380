//! Channel identities and their order within each layout.

use sonance_core::ChannelLayout;

/// Individual audio channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    FrontLeft = 0,
    FrontRight = 1,
    FrontCenter = 2,
    LowFrequency = 3,
    BackLeft = 4,
    BackRight = 5,
    SideLeft = 6,
    SideRight = 7,
    BackCenter = 8,
}

/// Options for LFE routing when the target layout has no LFE channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LfeMode {
    /// LFE is discarded (standard ITU-R BS.775-3 behavior).
    #[default]
    Mute,
    /// LFE is mixed into the front channels at -3dB.
    MixToFront,
}

/// Returns the channels in interleave order for `layout`.
pub fn layout_channels(layout: ChannelLayout) -> &'static [Channel] {
    use Channel::*;
    match layout {
        ChannelLayout::Mono => &[FrontCenter],
        ChannelLayout::Stereo => &[FrontLeft, FrontRight],
        ChannelLayout::StereoLfe => &[FrontLeft, FrontRight, LowFrequency],
        ChannelLayout::Surround4 => &[FrontLeft, FrontRight, BackLeft, BackRight],
        ChannelLayout::Surround5 => &[FrontLeft, FrontRight, FrontCenter, BackLeft, BackRight],
        ChannelLayout::Surround51 => &[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackLeft,
            BackRight,
        ],
        ChannelLayout::Surround61 => &[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackCenter,
            SideLeft,
            SideRight,
        ],
        ChannelLayout::Surround71 => &[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackLeft,
            BackRight,
            SideLeft,
            SideRight,
        ],
    }
}
