use crate::config::SystemConfig;
use crate::math::vector::Vec3;
use crate::prelude::SarComplex;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Scalar metadata that travels with a raw echo matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataAncillary {
    pub beam_id: String,
    pub wavelength: f64,
    pub prf: f64,
    pub sampling_rate: f64,
    pub chirp_length: f64,
    pub chirp_rate: f64,
    pub window_length: f64,
    pub orbit_height: f64,
}

impl RawDataAncillary {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            beam_id: config.beam_id().to_string(),
            wavelength: config.wavelength(),
            prf: config.prf(),
            sampling_rate: config.fs(),
            chirp_length: config.taup(),
            chirp_rate: config.chirp_rate(),
            window_length: config.swl(),
            orbit_height: config.orbit_height(),
        }
    }
}

/// Platform state recorded for one transmitted pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseRecord {
    /// Transmit time relative to the first pulse (s).
    pub time: f64,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl PulseRecord {
    pub fn new(time: f64, position: Vec3, velocity: Vec3) -> Self {
        Self {
            time,
            position,
            velocity,
        }
    }

    /// Flat row `[t, x, y, z, vx, vy, vz]`.
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.time,
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2],
        ]
    }
}

/// Interleaves a complex matrix into `[re, im, re, im, ...]` single-precision
/// floats in row-major order.
pub fn to_interleaved_f32(samples: &Array2<SarComplex>) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for value in samples.iter() {
        out.push(value.re as f32);
        out.push(value.im as f32);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemParams;

    #[test]
    fn ancillary_mirrors_config() {
        let config = SystemConfig::new(SystemParams::default()).unwrap();
        let ancillary = RawDataAncillary::from_config(&config);
        assert_eq!(ancillary.beam_id, "Beam0000");
        assert_eq!(ancillary.prf, 5000.0);
        assert_eq!(ancillary.chirp_rate, config.chirp_rate());
    }

    #[test]
    fn interleaving_is_row_major() {
        let samples = Array2::from_shape_vec(
            (2, 2),
            vec![
                SarComplex::new(1.0, -1.0),
                SarComplex::new(2.0, -2.0),
                SarComplex::new(3.0, -3.0),
                SarComplex::new(4.0, -4.0),
            ],
        )
        .unwrap();
        assert_eq!(
            to_interleaved_f32(&samples),
            vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0, -4.0]
        );
    }

    #[test]
    fn pulse_record_flattens_to_row() {
        let record = PulseRecord::new(2e-4, [7.0e6, 0.0, 0.0], [0.0, 7.6e3, 0.0]);
        assert_eq!(record.to_row()[0], 2e-4);
        assert_eq!(record.to_row()[5], 7.6e3);
    }
}
