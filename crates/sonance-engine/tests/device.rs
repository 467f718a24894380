//! End-to-end device scheduling tests over the null sink.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use sonance_core::{ChannelLayout, DeviceSpecs, SampleFormat, Sound};
use sonance_engine::convert::format::unpack_samples;
use sonance_engine::device::{Device, NullSink, Status};
use sonance_engine::fx::LimitReader;
use sonance_engine::generator::Oscillator;

fn specs() -> DeviceSpecs {
    DeviceSpecs::new(48_000, ChannelLayout::Mono, SampleFormat::F32)
}

/// Polls until `predicate` holds or the timeout elapses.
fn wait_for(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

fn one_second_sine() -> Box<dyn sonance_core::Reader> {
    let sound = Oscillator::sine(440.0, 48_000);
    Box::new(
        LimitReader::new(sound.create_reader().expect("reader"), 0.0, 1.0)
            .expect("valid window"),
    )
}

#[test]
fn sine_through_a_null_device_has_unit_peak_and_zero_mean() {
    let capture = Arc::new(Mutex::new(Vec::new()));
    let sink = NullSink::immediate(specs()).with_capture(Arc::clone(&capture));
    let device = Device::open(Box::new(sink), 1024).expect("device");

    let handle = device.play(one_second_sine(), false).expect("playable");
    assert!(
        wait_for(Duration::from_secs(10), || handle.status() == Status::Invalid),
        "stream should finish and invalidate"
    );

    let bytes = capture.lock().expect("capture");
    let mut samples = Vec::new();
    unpack_samples(SampleFormat::F32, &bytes, &mut samples);
    assert_eq!(samples.len(), 48_000);

    let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    assert!((0.99..=1.0).contains(&peak), "peak {peak}");
    assert!(mean.abs() <= 0.01, "mean {mean}");
}

#[test]
fn keep_parks_in_stopped_and_seek_revives() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let fired = Arc::new(AtomicUsize::new(0));

    let sound = Oscillator::sine(440.0, 48_000);
    let reader = Box::new(
        LimitReader::new(sound.create_reader().expect("reader"), 0.0, 0.25)
            .expect("valid window"),
    );
    let handle = device.play(reader, true).expect("playable");
    let fired_in_callback = Arc::clone(&fired);
    assert!(handle.set_stop_callback(move || {
        fired_in_callback.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(handle.status(), Status::Playing);
    assert!(
        wait_for(Duration::from_secs(3), || handle.status() == Status::Stopped),
        "keep handle should park in STOPPED at eos"
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert!(handle.seek(0.0));
    assert_eq!(handle.status(), Status::Paused);
    assert!(handle.resume());
    assert_eq!(handle.status(), Status::Playing);

    assert!(
        wait_for(Duration::from_secs(3), || handle.status() == Status::Stopped),
        "revived handle should play to eos again"
    );
    // The callback was consumed by the first eos.
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn pause_freezes_the_audible_position() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let sound = Oscillator::sine(440.0, 48_000);
    let handle = device
        .play(sound.create_reader().expect("reader"), false)
        .expect("playable");

    std::thread::sleep(Duration::from_millis(150));
    assert!(handle.pause());
    assert_eq!(handle.status(), Status::Paused);
    let parked = handle.position();

    std::thread::sleep(Duration::from_millis(100));
    let still_parked = handle.position();
    assert!((parked - still_parked).abs() < 1e-6);

    assert!(handle.resume());
    let resumed = handle.position();
    // Within one refill buffer of the pre-pause position.
    assert!((resumed - parked).abs() <= 512.0 / 48_000.0 + 0.05);

    assert!(handle.stop());
    assert_eq!(handle.status(), Status::Invalid);
}

#[test]
fn volume_round_trips_exactly_and_invalid_handles_read_nan() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let sound = Oscillator::sine(440.0, 48_000);
    let handle = device
        .play(sound.create_reader().expect("reader"), false)
        .expect("playable");

    assert!(handle.set_volume(0.35));
    assert_eq!(handle.volume(), 0.35);

    assert!(handle.stop());
    assert!(handle.volume().is_nan());
    assert!(!handle.set_volume(1.0));
    assert!(!handle.pause());
    assert!(!handle.resume());
    assert!(!handle.seek(0.0));
}

#[test]
fn invalid_operations_are_idempotent() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let sound = Oscillator::sine(440.0, 48_000);
    let handle = device
        .play(sound.create_reader().expect("reader"), false)
        .expect("playable");

    assert!(handle.stop());
    assert!(!handle.stop());
    assert_eq!(handle.status(), Status::Invalid);
}

#[test]
fn dropping_the_device_joins_the_mixer_and_silences_callbacks() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let fired = Arc::new(AtomicUsize::new(0));

    let sound = Oscillator::sine(440.0, 48_000);
    let handle = device
        .play(sound.create_reader().expect("reader"), false)
        .expect("playable");
    let fired_in_callback = Arc::clone(&fired);
    handle.set_stop_callback(move || {
        fired_in_callback.fetch_add(1, Ordering::SeqCst);
    });

    let started = Instant::now();
    drop(device);
    assert!(started.elapsed() < Duration::from_millis(100));

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(handle.status(), Status::Invalid);
}

#[test]
fn device_controls_write_through() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");

    device.set_volume(0.5);
    assert_eq!(device.volume(), 0.5);

    use sonance_engine::device::DistanceModel;
    device.set_distance_model(DistanceModel::LinearClamped);
    assert_eq!(device.distance_model(), DistanceModel::LinearClamped);

    let mut listener = device.listener();
    listener.speed_of_sound = 340.0;
    listener.doppler_factor = 0.5;
    device.set_listener(listener);
    assert_eq!(device.listener().speed_of_sound, 340.0);
    assert_eq!(device.listener().doppler_factor, 0.5);
}

#[test]
fn spatial_attributes_round_trip() {
    let device = Device::open(Box::new(NullSink::new(specs())), 512).expect("device");
    let sound = Oscillator::sine(440.0, 48_000);
    let handle = device
        .play(sound.create_reader().expect("reader"), false)
        .expect("playable");

    let location = sonance_core::Vector3::new(1.0, 2.0, 3.0);
    assert!(handle.set_location(location));
    assert_eq!(handle.location(), location);

    assert!(handle.set_relative(false));
    assert!(!handle.relative());

    assert!(handle.set_attenuation(2.0));
    assert_eq!(handle.attenuation(), 2.0);

    assert!(handle.set_cone_angle_outer(90.0));
    assert_eq!(handle.cone_angle_outer(), 90.0);

    handle.stop();
    assert!(handle.attenuation().is_nan());
    assert_eq!(handle.location(), sonance_core::Vector3::default());
}
