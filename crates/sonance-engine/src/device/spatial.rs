//! Spatial parameters and distance attenuation models.

use sonance_core::{Quaternion, Vector3};

/// Per-voice 3-D attributes written through to the backend.
#[derive(Debug, Clone, Copy)]
pub struct SpatialParams {
    pub location: Vector3,
    pub velocity: Vector3,
    pub orientation: Quaternion,
    /// Positions are relative to the listener when set.
    pub relative: bool,
    pub volume_minimum: f32,
    pub volume_maximum: f32,
    pub distance_reference: f32,
    pub distance_maximum: f32,
    /// Rolloff factor of the distance model.
    pub attenuation: f32,
    pub cone_angle_inner: f32,
    pub cone_angle_outer: f32,
    pub cone_volume_outer: f32,
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self {
            location: Vector3::default(),
            velocity: Vector3::default(),
            orientation: Quaternion::default(),
            relative: true,
            volume_minimum: 0.0,
            volume_maximum: 1.0,
            distance_reference: 1.0,
            distance_maximum: f32::MAX,
            attenuation: 1.0,
            cone_angle_inner: 360.0,
            cone_angle_outer: 360.0,
            cone_volume_outer: 0.0,
        }
    }
}

/// Listener state shared by every voice of a device.
#[derive(Debug, Clone, Copy)]
pub struct ListenerParams {
    pub location: Vector3,
    pub velocity: Vector3,
    pub orientation: Quaternion,
    pub speed_of_sound: f32,
    pub doppler_factor: f32,
}

impl Default for ListenerParams {
    fn default() -> Self {
        Self {
            location: Vector3::default(),
            velocity: Vector3::default(),
            orientation: Quaternion::default(),
            speed_of_sound: 343.3,
            doppler_factor: 1.0,
        }
    }
}

/// Distance attenuation curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceModel {
    Inverse,
    #[default]
    InverseClamped,
    Linear,
    LinearClamped,
    Exponent,
    ExponentClamped,
    /// No distance attenuation.
    None,
}

impl DistanceModel {
    /// Gain for a source at `distance`, following the standard hardware
    /// curves so software sinks attenuate identically.
    pub fn gain(
        &self,
        distance: f32,
        reference: f32,
        rolloff: f32,
        max_distance: f32,
    ) -> f32 {
        let clamped = distance.clamp(reference, max_distance.max(reference));
        match self {
            Self::None => 1.0,
            Self::Inverse => inverse_gain(distance, reference, rolloff),
            Self::InverseClamped => inverse_gain(clamped, reference, rolloff),
            Self::Linear => linear_gain(distance, reference, rolloff, max_distance),
            Self::LinearClamped => linear_gain(clamped, reference, rolloff, max_distance),
            Self::Exponent => exponent_gain(distance, reference, rolloff),
            Self::ExponentClamped => exponent_gain(clamped, reference, rolloff),
        }
    }
}

fn inverse_gain(distance: f32, reference: f32, rolloff: f32) -> f32 {
    let denominator = reference + rolloff * (distance - reference);
    if denominator <= 0.0 {
        return 1.0;
    }
    reference / denominator
}

fn linear_gain(distance: f32, reference: f32, rolloff: f32, max_distance: f32) -> f32 {
    if max_distance <= reference {
        return 1.0;
    }
    (1.0 - rolloff * (distance - reference) / (max_distance - reference)).clamp(0.0, 1.0)
}

fn exponent_gain(distance: f32, reference: f32, rolloff: f32) -> f32 {
    if reference <= 0.0 || distance <= 0.0 {
        return 1.0;
    }
    (distance / reference).powf(-rolloff)
}

#[cfg(test)]
mod tests {
    use super::DistanceModel;

    #[test]
    fn none_never_attenuates() {
        assert_eq!(DistanceModel::None.gain(1000.0, 1.0, 1.0, 100.0), 1.0);
    }

    #[test]
    fn inverse_halves_at_double_reference_distance() {
        let gain = DistanceModel::Inverse.gain(2.0, 1.0, 1.0, 100.0);
        assert!((gain - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clamped_variants_freeze_outside_the_range() {
        let at_max = DistanceModel::InverseClamped.gain(100.0, 1.0, 1.0, 100.0);
        let beyond = DistanceModel::InverseClamped.gain(1_000.0, 1.0, 1.0, 100.0);
        assert_eq!(at_max, beyond);

        let near = DistanceModel::InverseClamped.gain(0.5, 1.0, 1.0, 100.0);
        assert_eq!(near, 1.0);
    }

    #[test]
    fn linear_reaches_zero_at_max_distance() {
        let gain = DistanceModel::Linear.gain(100.0, 1.0, 1.0, 100.0);
        assert!(gain.abs() < 1e-6);
        let mid = DistanceModel::Linear.gain(50.5, 1.0, 1.0, 100.0);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn exponent_follows_a_power_law() {
        let gain = DistanceModel::Exponent.gain(4.0, 1.0, 2.0, 100.0);
        assert!((gain - 0.0625).abs() < 1e-6);
    }
}
