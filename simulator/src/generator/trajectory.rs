use anyhow::ensure;
use sarcore::config::constants::{EARTH_GM, EARTH_RADIUS};
use sarcore::interface::PulseRecord;
use sarcore::math::vector::Vec3;
use sarcore::SystemConfig;
use serde::{Deserialize, Serialize};

/// Platform track on a circular equatorial orbit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub num_pulses: usize,
    /// Overrides the system orbit height when set (m).
    pub orbit_height: Option<f64>,
    /// Orbital angle of the first pulse, measured from +X about +Z (deg).
    pub start_angle_deg: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            num_pulses: 64,
            orbit_height: None,
            start_angle_deg: 0.0,
        }
    }
}

/// One position/velocity sample per pulse.
#[derive(Debug, Clone, Default)]
pub struct PlatformTrack {
    pub times: Vec<f64>,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl PlatformTrack {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// State at the middle pulse; the scene is laid out around it.
    pub fn centre(&self) -> Option<(Vec3, Vec3)> {
        let mid = self.len().checked_sub(1)? / 2;
        Some((self.positions[mid], self.velocities[mid]))
    }

    pub fn pulse_records(&self) -> Vec<PulseRecord> {
        self.times
            .iter()
            .zip(self.positions.iter().zip(self.velocities.iter()))
            .map(|(&t, (&p, &v))| PulseRecord::new(t, p, v))
            .collect()
    }
}

/// Samples the orbit once per PRI, rotating about Z at the circular-orbit rate.
pub fn build_track(config: &TrajectoryConfig, system: &SystemConfig) -> anyhow::Result<PlatformTrack> {
    let height = config.orbit_height.unwrap_or_else(|| system.orbit_height());
    ensure!(
        height.is_finite() && height > 0.0,
        "orbit height must be positive, got {}",
        height
    );
    let radius = EARTH_RADIUS + height;
    let speed = (EARTH_GM / radius).sqrt();
    let angular_rate = speed / radius;
    let start = config.start_angle_deg.to_radians();

    let mut track = PlatformTrack::default();
    for pulse in 0..config.num_pulses {
        let t = pulse as f64 * system.pri();
        let angle = start + angular_rate * t;
        let (sin, cos) = angle.sin_cos();
        track.times.push(t);
        track.positions.push([radius * cos, radius * sin, 0.0]);
        track.velocities.push([-speed * sin, speed * cos, 0.0]);
    }
    log::debug!(
        "built {} pulse track at {:.1} km, {:.1} m/s",
        track.len(),
        height / 1e3,
        speed
    );
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sarcore::math::vector;
    use sarcore::SystemParams;

    #[test]
    fn track_stays_on_circular_orbit() {
        let system = SystemConfig::new(SystemParams::default()).unwrap();
        let track = build_track(&TrajectoryConfig::default(), &system).unwrap();
        assert_eq!(track.len(), 64);

        let radius = EARTH_RADIUS + system.orbit_height();
        for (p, v) in track.positions.iter().zip(track.velocities.iter()) {
            assert_relative_eq!(vector::norm(p), radius, max_relative = 1e-12);
            assert_relative_eq!(vector::norm(v), system.circular_orbit_speed(), max_relative = 1e-12);
            assert!(vector::dot(p, v).abs() < 1e-3 * radius);
        }
        // Consecutive pulses are one PRI of flight apart.
        let step = vector::norm(&vector::sub(&track.positions[1], &track.positions[0]));
        assert_relative_eq!(step, system.circular_orbit_speed() * system.pri(), max_relative = 1e-6);
    }

    #[test]
    fn pulse_records_follow_track() {
        let system = SystemConfig::new(SystemParams::default()).unwrap();
        let config = TrajectoryConfig {
            num_pulses: 3,
            ..Default::default()
        };
        let track = build_track(&config, &system).unwrap();
        let records = track.pulse_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].time, 2.0 * system.pri());
        assert_eq!(track.centre().unwrap().0, track.positions[1]);
    }

    #[test]
    fn non_positive_height_override_is_rejected() {
        let system = SystemConfig::new(SystemParams::default()).unwrap();
        let config = TrajectoryConfig {
            orbit_height: Some(-1.0),
            ..Default::default()
        };
        assert!(build_track(&config, &system).is_err());
    }
}
