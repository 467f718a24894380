//! Saturating sample-format conversion at the device boundary.

use sonance_core::SampleFormat;

/// Packs `f32` samples into `format`, appending to `out`. Values clamp to
/// the representable range.
pub fn pack_samples(format: SampleFormat, input: &[f32], out: &mut Vec<u8>) {
    out.reserve(input.len() * format.bytes_per_sample());
    match format {
        SampleFormat::U8 => {
            for &sample in input {
                let value = (sample.clamp(-1.0, 1.0) * 127.0).round() + 128.0;
                out.push(value as u8);
            }
        },
        SampleFormat::S16 => {
            for &sample in input {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                out.extend_from_slice(&value.to_le_bytes());
            }
        },
        SampleFormat::S24 => {
            for &sample in input {
                let value = (sample.clamp(-1.0, 1.0) * 8_388_607.0).round() as i32;
                out.extend_from_slice(&value.to_le_bytes()[..3]);
            }
        },
        SampleFormat::S32 => {
            for &sample in input {
                let value = (sample.clamp(-1.0, 1.0) as f64 * i32::MAX as f64).round() as i32;
                out.extend_from_slice(&value.to_le_bytes());
            }
        },
        SampleFormat::F32 => {
            for &sample in input {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        },
        SampleFormat::F64 => {
            for &sample in input {
                out.extend_from_slice(&(sample as f64).to_le_bytes());
            }
        },
    }
}

/// Unpacks `format` bytes back into `f32` samples, appending to `out`.
pub fn unpack_samples(format: SampleFormat, input: &[u8], out: &mut Vec<f32>) {
    let stride = format.bytes_per_sample();
    for bytes in input.chunks_exact(stride) {
        let sample = match format {
            SampleFormat::U8 => (bytes[0] as f32 - 128.0) / 127.0,
            SampleFormat::S16 => {
                i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / i16::MAX as f32
            },
            SampleFormat::S24 => {
                let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
                // Sign-extend the packed 24 bits.
                let value = (raw << 8) >> 8;
                value as f32 / 8_388_607.0
            },
            SampleFormat::S32 => {
                let value = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                (value as f64 / i32::MAX as f64) as f32
            },
            SampleFormat::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            SampleFormat::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                f64::from_le_bytes(raw) as f32
            },
        };
        out.push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::{pack_samples, unpack_samples};
    use sonance_core::SampleFormat;

    const FORMATS: [SampleFormat; 6] = [
        SampleFormat::U8,
        SampleFormat::S16,
        SampleFormat::S24,
        SampleFormat::S32,
        SampleFormat::F32,
        SampleFormat::F64,
    ];

    #[test]
    fn full_scale_and_silence_survive_every_format() {
        for format in FORMATS {
            let input = [1.0f32, 0.0, -1.0];
            let mut bytes = Vec::new();
            pack_samples(format, &input, &mut bytes);
            assert_eq!(bytes.len(), 3 * format.bytes_per_sample());

            let mut decoded = Vec::new();
            unpack_samples(format, &bytes, &mut decoded);
            assert!((decoded[0] - 1.0).abs() < 0.02, "{format:?}");
            assert!(decoded[1].abs() < 0.01, "{format:?}");
            assert!((decoded[2] + 1.0).abs() < 0.02, "{format:?}");
        }
    }

    #[test]
    fn out_of_range_values_saturate() {
        for format in FORMATS {
            let mut bytes = Vec::new();
            pack_samples(format, &[2.0, -2.0], &mut bytes);
            let mut decoded = Vec::new();
            unpack_samples(format, &bytes, &mut decoded);
            if matches!(format, SampleFormat::F32 | SampleFormat::F64) {
                // Float formats carry the value through untouched.
                assert_eq!(decoded[0], 2.0);
            } else {
                assert!(decoded[0] <= 1.01, "{format:?}");
                assert!(decoded[1] >= -1.01, "{format:?}");
            }
        }
    }

    #[test]
    fn s24_sign_extension() {
        let mut bytes = Vec::new();
        pack_samples(SampleFormat::S24, &[-0.5], &mut bytes);
        let mut decoded = Vec::new();
        unpack_samples(SampleFormat::S24, &bytes, &mut decoded);
        assert!((decoded[0] + 0.5).abs() < 1e-4);
    }
}
