use crate::config::SystemConfig;
use crate::math::vector::{self, Vec3};

/// Fallback boresight when neither a beam direction nor a usable platform
/// position is available.
pub const DEFAULT_BORESIGHT: Vec3 = [0.0, 0.0, -1.0];

/// Fallback along-track axis when the platform velocity is zero.
pub const DEFAULT_ALONG_TRACK: Vec3 = [0.0, 1.0, 0.0];

/// Pointing state of the antenna for one pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamGeometry {
    /// Unit boresight vector.
    pub boresight: Vec3,
    pub platform_position: Vec3,
    pub platform_velocity: Vec3,
}

impl BeamGeometry {
    /// Resolves the boresight for a pulse.
    ///
    /// An explicit beam direction is normalised; a missing or zero-length one
    /// falls back to nadir (`-position`), and a zero position falls back to
    /// [`DEFAULT_BORESIGHT`].
    pub fn resolve(position: &Vec3, velocity: &Vec3, beam_direction: Option<&Vec3>) -> Self {
        let boresight = beam_direction
            .and_then(vector::normalize)
            .or_else(|| vector::normalize(&vector::scale(position, -1.0)))
            .unwrap_or(DEFAULT_BORESIGHT);
        Self {
            boresight,
            platform_position: *position,
            platform_velocity: *velocity,
        }
    }
}

/// Two-way-independent antenna power pattern evaluated toward a target.
pub trait BeamGainModel: Send + Sync + std::fmt::Debug {
    /// Gain toward the unit vector `target_direction` (linear, peak `max_gain`).
    fn gain(&self, target_direction: &Vec3, geometry: &BeamGeometry) -> f64;
}

fn gaussian(angle: f64, beamwidth_rad: f64) -> f64 {
    let half = beamwidth_rad / 2.0;
    (-2.0 * angle * angle / (half * half)).exp()
}

/// Gaussian beam that narrows only with the elevation beamwidth.
///
/// This is a one-axis approximation: the total off-boresight angle is weighted
/// by the elevation beamwidth regardless of its direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationGaussianBeam {
    pub beamwidth_el_rad: f64,
    pub max_gain: f64,
}

impl ElevationGaussianBeam {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            beamwidth_el_rad: config.beamwidth_el_deg().to_radians(),
            max_gain: 1.0,
        }
    }
}

impl BeamGainModel for ElevationGaussianBeam {
    fn gain(&self, target_direction: &Vec3, geometry: &BeamGeometry) -> f64 {
        let angle = vector::angle_between(target_direction, &geometry.boresight);
        self.max_gain * gaussian(angle, self.beamwidth_el_rad)
    }
}

/// Separable Gaussian beam: azimuth pattern along track times elevation pattern across it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoAxisGaussianBeam {
    pub beamwidth_az_rad: f64,
    pub beamwidth_el_rad: f64,
    pub max_gain: f64,
}

impl TwoAxisGaussianBeam {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            beamwidth_az_rad: config.beamwidth_az_deg().to_radians(),
            beamwidth_el_rad: config.beamwidth_el_deg().to_radians(),
            max_gain: 1.0,
        }
    }

    /// Along-track axis orthogonal to the boresight.
    ///
    /// Zero velocity uses [`DEFAULT_ALONG_TRACK`]; a velocity parallel to the
    /// boresight uses whichever Cartesian axis is least aligned with it.
    fn along_track_axis(geometry: &BeamGeometry) -> Vec3 {
        let b = geometry.boresight;
        let velocity =
            vector::normalize(&geometry.platform_velocity).unwrap_or(DEFAULT_ALONG_TRACK);
        let projected = vector::sub(&velocity, &vector::scale(&b, vector::dot(&velocity, &b)));
        vector::normalize(&projected).unwrap_or_else(|| {
            let axis = if b[0].abs() <= b[1].abs() && b[0].abs() <= b[2].abs() {
                [1.0, 0.0, 0.0]
            } else if b[1].abs() <= b[2].abs() {
                [0.0, 1.0, 0.0]
            } else {
                [0.0, 0.0, 1.0]
            };
            let projected = vector::sub(&axis, &vector::scale(&b, vector::dot(&axis, &b)));
            vector::normalize(&projected).unwrap_or(DEFAULT_ALONG_TRACK)
        })
    }
}

impl BeamGainModel for TwoAxisGaussianBeam {
    fn gain(&self, target_direction: &Vec3, geometry: &BeamGeometry) -> f64 {
        let boresight = geometry.boresight;
        let along = Self::along_track_axis(geometry);
        let across = vector::cross(&boresight, &along);

        let forward = vector::dot(target_direction, &boresight);
        let azimuth = vector::dot(target_direction, &along).atan2(forward);
        let elevation = vector::dot(target_direction, &across).atan2(forward);
        self.max_gain
            * gaussian(azimuth, self.beamwidth_az_rad)
            * gaussian(elevation, self.beamwidth_el_rad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn geometry() -> BeamGeometry {
        BeamGeometry::resolve(&[7.0e6, 0.0, 0.0], &[0.0, 7.5e3, 0.0], None)
    }

    #[test]
    fn nadir_is_default_boresight() {
        assert_eq!(geometry().boresight, [-1.0, 0.0, 0.0]);
        let degenerate = BeamGeometry::resolve(&[0.0; 3], &[0.0; 3], Some(&[0.0; 3]));
        assert_eq!(degenerate.boresight, DEFAULT_BORESIGHT);
    }

    #[test]
    fn elevation_beam_peaks_on_boresight_and_rolls_off() {
        let beam = ElevationGaussianBeam {
            beamwidth_el_rad: 0.1,
            max_gain: 1.0,
        };
        let geometry = geometry();
        assert_abs_diff_eq!(beam.gain(&[-1.0, 0.0, 0.0], &geometry), 1.0, epsilon = 1e-12);

        let angle: f64 = 0.05;
        let off_axis = [-angle.cos(), 0.0, angle.sin()];
        assert_abs_diff_eq!(beam.gain(&off_axis, &geometry), (-2.0f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn two_axis_beam_separates_azimuth_and_elevation() {
        let beam = TwoAxisGaussianBeam {
            beamwidth_az_rad: 0.02,
            beamwidth_el_rad: 0.2,
            max_gain: 1.0,
        };
        let geometry = geometry();
        let angle: f64 = 0.01;
        // Along track (velocity is +Y) the narrow azimuth beamwidth applies.
        let along = [-angle.cos(), angle.sin(), 0.0];
        let across = [-angle.cos(), 0.0, angle.sin()];
        assert_abs_diff_eq!(beam.gain(&along, &geometry), (-2.0f64).exp(), epsilon = 1e-9);
        assert!(beam.gain(&across, &geometry) > 0.98);
    }
}
