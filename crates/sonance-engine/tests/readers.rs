//! Cross-cutting reader contract tests over composed graphs.

use sonance_core::{ChannelLayout, Reader, Sound, Specs};
use sonance_engine::fx::{DelayReader, FadeReader, JoinReader, LimitReader, VolumeReader};
use sonance_engine::generator::Oscillator;
use sonance_engine::source::MemorySound;

fn clip(frames: usize) -> MemorySound {
    let samples: Vec<f32> = (0..frames).map(|i| (i as f32 * 0.37).sin()).collect();
    MemorySound::from_frames(samples, Specs::new(100, ChannelLayout::Mono))
        .expect("whole frames")
}

fn collect(reader: &mut dyn Reader, chunk_frames: usize) -> Vec<f32> {
    let channels = reader.specs().channels();
    let mut out = Vec::new();
    let mut buffer = vec![0.0f32; chunk_frames * channels];
    loop {
        let result = reader.read(&mut buffer);
        out.extend_from_slice(&buffer[..result.frames * channels]);
        if result.eos {
            return out;
        }
    }
}

#[test]
fn splitting_with_limit_and_rejoining_is_the_identity() {
    let sound = clip(100);
    let head = LimitReader::new(sound.create_reader().expect("reader"), 0.0, 0.4)
        .expect("valid window");
    let tail = LimitReader::new(sound.create_reader().expect("reader"), 0.4, 1.0)
        .expect("valid window");
    let mut joined =
        JoinReader::new(Box::new(head), Box::new(tail)).expect("equal specs");

    let mut direct = sound.create_reader().expect("reader");
    let expected = collect(&mut direct, 32);
    let actual = collect(&mut joined, 32);
    assert_eq!(actual, expected);
}

#[test]
fn produced_frames_match_wants_until_eos() {
    // A composed chain must hand out exactly what is asked for while data
    // remains, and its position must advance by the produced total.
    let sound = Oscillator::sine(440.0, 48_000);
    let chain = DelayReader::new(sound.create_reader().expect("reader"), 0.01)
        .expect("valid delay");
    let chain = FadeReader::fade_in(Box::new(chain), 0.0, 0.1).expect("valid fade");
    let mut chain = VolumeReader::new(Box::new(chain), 0.8);

    let mut total = 0u64;
    let mut buffer = vec![0.0f32; 160];
    for want in [160usize, 1, 7, 33, 160, 64] {
        let result = chain.read(&mut buffer[..want]);
        assert_eq!(result.frames, want);
        assert!(!result.eos);
        total += want as u64;
    }
    assert_eq!(chain.position(), total);
}

#[test]
fn seek_is_observable_on_the_next_position_read() {
    let sound = clip(50);
    let mut reader = LimitReader::new(sound.create_reader().expect("reader"), 0.1, 0.4)
        .expect("valid window");

    assert!(reader.seek(7));
    assert_eq!(reader.position(), 7);
    assert!(reader.seek(10_000));
    assert_eq!(reader.position(), 30);

    let mut buffer = vec![0.0f32; 8];
    let result = reader.read(&mut buffer);
    assert_eq!(result.frames, 0);
    assert!(result.eos);
}

#[test]
fn zero_frame_reads_do_not_disturb_the_stream() {
    let sound = clip(10);
    let mut reader = sound.create_reader().expect("reader");
    let result = reader.read(&mut []);
    assert_eq!(result.frames, 0);
    assert!(!result.eos);
    assert_eq!(reader.position(), 0);

    let mut buffer = vec![0.0f32; 16];
    let result = reader.read(&mut buffer);
    assert_eq!(result.frames, 10);
    assert!(result.eos);
}
