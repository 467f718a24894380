//! Mixing matrices for channel rematrixing.
//!
//! Named conversions follow ITU-R BS.775-3 coefficients; every other
//! layout pair is derived from fixed per-channel routing rules, so all
//! pairs have a defined matrix.

use sonance_core::ChannelLayout;

use crate::layout::{Channel, LfeMode, layout_channels};

/// Standard mixing coefficient for the center channel (1/√2 ≈ -3dB).
pub const CENTER_COEFF: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Standard mixing coefficient for surround channels (1/√2 ≈ -3dB).
pub const SURROUND_COEFF: f32 = std::f32::consts::FRAC_1_SQRT_2;

fn lfe_coeff(mode: LfeMode) -> f32 {
    match mode {
        LfeMode::Mute => 0.0,
        LfeMode::MixToFront => CENTER_COEFF,
    }
}

/// A fixed matrix converting between two channel layouts.
///
/// Stored as `coeffs[out_ch][in_ch]`; each output sample is
/// `out[ch] = sum(in[i] * coeffs[ch][i])`.
#[derive(Debug, Clone)]
pub struct MixMatrix {
    coeffs: Vec<Vec<f32>>,
    in_channels: usize,
    out_channels: usize,
}

impl MixMatrix {
    /// Creates the matrix for the given layout conversion.
    pub fn create(from: ChannelLayout, to: ChannelLayout, lfe_mode: LfeMode) -> Self {
        if from == to {
            return Self::identity(from.channel_count());
        }

        match (from, to) {
            (ChannelLayout::Mono, ChannelLayout::Stereo) => Self::upmix_mono_to_stereo(),
            (ChannelLayout::Stereo, ChannelLayout::Mono) => Self::downmix_stereo_to_mono(),
            (ChannelLayout::Surround51, ChannelLayout::Stereo) => {
                Self::downmix_5_1_to_stereo(lfe_mode)
            },
            (ChannelLayout::Surround71, ChannelLayout::Stereo) => {
                Self::downmix_7_1_to_stereo(lfe_mode)
            },
            _ => Self::fold(from, to, lfe_mode),
        }
    }

    /// Identity matrix (passthrough).
    pub fn identity(channels: usize) -> Self {
        let mut coeffs = vec![vec![0.0; channels]; channels];
        for (i, row) in coeffs.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self {
            coeffs,
            in_channels: channels,
            out_channels: channels,
        }
    }

    /// Mono → Stereo: L = R = M
    fn upmix_mono_to_stereo() -> Self {
        Self {
            coeffs: vec![vec![1.0], vec![1.0]],
            in_channels: 1,
            out_channels: 2,
        }
    }

    /// Stereo → Mono: M = (L + R) * 0.5
    fn downmix_stereo_to_mono() -> Self {
        Self {
            coeffs: vec![vec![0.5, 0.5]],
            in_channels: 2,
            out_channels: 1,
        }
    }

    /// 5.1 → Stereo (ITU-R BS.775-3). Order: FL, FR, FC, LFE, BL, BR
    fn downmix_5_1_to_stereo(lfe_mode: LfeMode) -> Self {
        let lfe = lfe_coeff(lfe_mode);
        Self {
            coeffs: vec![
                vec![1.0, 0.0, CENTER_COEFF, lfe, SURROUND_COEFF, 0.0],
                vec![0.0, 1.0, CENTER_COEFF, lfe, 0.0, SURROUND_COEFF],
            ],
            in_channels: 6,
            out_channels: 2,
        }
    }

    /// 7.1 → Stereo. Order: FL, FR, FC, LFE, BL, BR, SL, SR
    fn downmix_7_1_to_stereo(lfe_mode: LfeMode) -> Self {
        let lfe = lfe_coeff(lfe_mode);
        Self {
            coeffs: vec![
                vec![
                    1.0,
                    0.0,
                    CENTER_COEFF,
                    lfe,
                    SURROUND_COEFF,
                    0.0,
                    SURROUND_COEFF,
                    0.0,
                ],
                vec![
                    0.0,
                    1.0,
                    CENTER_COEFF,
                    lfe,
                    0.0,
                    SURROUND_COEFF,
                    0.0,
                    SURROUND_COEFF,
                ],
            ],
            in_channels: 8,
            out_channels: 2,
        }
    }

    /// Derives a matrix from per-channel routing rules. Mono targets go
    /// through stereo first so every source fold stays defined.
    fn fold(from: ChannelLayout, to: ChannelLayout, lfe_mode: LfeMode) -> Self {
        if to == ChannelLayout::Mono {
            let to_stereo = Self::create(from, ChannelLayout::Stereo, lfe_mode);
            return Self::downmix_stereo_to_mono().compose(&to_stereo);
        }

        let ins = layout_channels(from);
        let outs = layout_channels(to);
        let mut coeffs = vec![vec![0.0; ins.len()]; outs.len()];

        for (in_idx, &channel) in ins.iter().enumerate() {
            for (weight, target) in route(channel, outs, lfe_mode) {
                if let Some(out_idx) = outs.iter().position(|&c| c == target) {
                    coeffs[out_idx][in_idx] += weight;
                }
            }
        }

        Self {
            coeffs,
            in_channels: ins.len(),
            out_channels: outs.len(),
        }
    }

    /// Matrix product: applying the result equals applying `other` first,
    /// then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        assert_eq!(self.in_channels, other.out_channels);
        let mut coeffs = vec![vec![0.0; other.in_channels]; self.out_channels];
        for (out_idx, row) in coeffs.iter_mut().enumerate() {
            for (mid_idx, &a) in self.coeffs[out_idx].iter().enumerate() {
                for (in_idx, &b) in other.coeffs[mid_idx].iter().enumerate() {
                    row[in_idx] += a * b;
                }
            }
        }
        Self {
            coeffs,
            in_channels: other.in_channels,
            out_channels: self.out_channels,
        }
    }

    /// Applies the matrix to interleaved input samples, writing into `out`.
    /// `out` must hold `frames * out_channels` samples.
    pub fn apply_into(&self, input: &[f32], out: &mut [f32]) {
        let frames = input.len() / self.in_channels;
        debug_assert!(out.len() >= frames * self.out_channels);

        for frame in 0..frames {
            let in_offset = frame * self.in_channels;
            let out_offset = frame * self.out_channels;
            for (out_ch, coeff_row) in self.coeffs.iter().enumerate() {
                let mut sum = 0.0;
                for (in_ch, &coeff) in coeff_row.iter().enumerate() {
                    sum += input[in_offset + in_ch] * coeff;
                }
                out[out_offset + out_ch] = sum;
            }
        }
    }

    /// Applies the matrix to interleaved input samples.
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let frames = input.len() / self.in_channels;
        let mut output = vec![0.0; frames * self.out_channels];
        self.apply_into(input, &mut output);
        output
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }
}

/// Fixed routing for an input channel absent from the target layout.
fn route(channel: Channel, outs: &[Channel], lfe_mode: LfeMode) -> Vec<(f32, Channel)> {
    use Channel::*;

    if outs.contains(&channel) {
        return vec![(1.0, channel)];
    }

    let has = |c: Channel| outs.contains(&c);
    match channel {
        FrontCenter => vec![(CENTER_COEFF, FrontLeft), (CENTER_COEFF, FrontRight)],
        LowFrequency => match lfe_mode {
            LfeMode::Mute => vec![],
            LfeMode::MixToFront => vec![
                (lfe_coeff(lfe_mode), FrontLeft),
                (lfe_coeff(lfe_mode), FrontRight),
            ],
        },
        BackLeft if has(SideLeft) => vec![(1.0, SideLeft)],
        BackLeft => vec![(SURROUND_COEFF, FrontLeft)],
        BackRight if has(SideRight) => vec![(1.0, SideRight)],
        BackRight => vec![(SURROUND_COEFF, FrontRight)],
        SideLeft if has(BackLeft) => vec![(1.0, BackLeft)],
        SideLeft => vec![(SURROUND_COEFF, FrontLeft)],
        SideRight if has(BackRight) => vec![(1.0, BackRight)],
        SideRight => vec![(SURROUND_COEFF, FrontRight)],
        BackCenter if has(BackLeft) && has(BackRight) => {
            vec![(SURROUND_COEFF, BackLeft), (SURROUND_COEFF, BackRight)]
        },
        BackCenter if has(SideLeft) && has(SideRight) => {
            vec![(SURROUND_COEFF, SideLeft), (SURROUND_COEFF, SideRight)]
        },
        BackCenter => vec![(0.5, FrontLeft), (0.5, FrontRight)],
        // Front left/right exist in every non-mono layout; mono targets
        // never reach this function.
        FrontLeft | FrontRight => vec![(1.0, channel)],
    }
}
