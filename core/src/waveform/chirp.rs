use crate::config::SystemConfig;
use crate::prelude::{SarComplex, SarError, SarResult};
use ndarray::ArrayView2;
use std::f64::consts::PI;

/// Number of sub-sample offsets cached for fractional-delay interpolation.
pub const DEFAULT_CHIRP_SET_SIZE: usize = 64;

/// A family of baseband LFM chirps sampled at evenly spaced sub-sample offsets.
///
/// Member `k` of `count` samples the chirp at `t = (m − L/2)/fs + k/(fs·count)`,
/// so member 0 is the plain chirp centred on zero and the aggregate spacing
/// across the family is `1/(fs·count)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChirpSet {
    samples: Vec<SarComplex>,
    count: usize,
    samples_per_chirp: usize,
}

impl ChirpSet {
    /// Number of waveforms in the set.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn samples_per_chirp(&self) -> usize {
        self.samples_per_chirp
    }

    /// Waveform `index`, or `IndexOutOfRange` past the end of the set.
    pub fn waveform(&self, index: usize) -> SarResult<&[SarComplex]> {
        if index >= self.count {
            return Err(SarError::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        let start = index * self.samples_per_chirp;
        Ok(&self.samples[start..start + self.samples_per_chirp])
    }

    /// The whole set as a `count × samples_per_chirp` matrix.
    pub fn as_array(&self) -> SarResult<ArrayView2<'_, SarComplex>> {
        ArrayView2::from_shape((self.count, self.samples_per_chirp), &self.samples)
            .map_err(|err| SarError::InvalidInput(format!("chirp set shape: {}", err)))
    }
}

/// Builds LFM chirps and caches one chirp set for indexed retrieval.
#[derive(Debug, Clone, Default)]
pub struct ChirpGenerator {
    chirp_set: Option<ChirpSet>,
}

impl ChirpGenerator {
    pub fn new() -> Self {
        Self { chirp_set: None }
    }

    /// Generates `count` chirps of `floor(taup·fs)` samples each with phase `π·(bw/taup)·t²`.
    pub fn generate(bw: f64, taup: f64, fs: f64, count: usize) -> SarResult<ChirpSet> {
        for (name, value) in [("bw", bw), ("taup", taup), ("fs", fs)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SarError::InvalidInput(format!(
                    "chirp {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if count == 0 {
            return Err(SarError::InvalidInput(
                "chirp count must be at least one".into(),
            ));
        }

        let chirp_rate = bw / taup;
        let samples_per_chirp = (taup * fs).floor() as usize;
        let total = samples_per_chirp * count;
        let dt = 1.0 / fs / count as f64;
        let half = total as f64 / 2.0;

        let mut samples = Vec::with_capacity(total);
        for k in 0..count {
            for m in 0..samples_per_chirp {
                let t = ((m * count + k) as f64 - half) * dt;
                let phase = PI * chirp_rate * t * t;
                samples.push(SarComplex::from_polar(1.0, phase));
            }
        }

        Ok(ChirpSet {
            samples,
            count,
            samples_per_chirp,
        })
    }

    /// Single zero-offset chirp for a configured system.
    pub fn generate_for(config: &SystemConfig) -> SarResult<Vec<SarComplex>> {
        let set = Self::generate(config.bw(), config.taup(), config.fs(), 1)?;
        Ok(set.samples)
    }

    /// Generates and caches a chirp set of `set_size` members.
    pub fn generate_set(
        &mut self,
        bw: f64,
        taup: f64,
        fs: f64,
        set_size: usize,
    ) -> SarResult<&ChirpSet> {
        let set = Self::generate(bw, taup, fs, set_size)?;
        Ok(self.chirp_set.insert(set))
    }

    pub fn chirp_set(&self) -> Option<&ChirpSet> {
        self.chirp_set.as_ref()
    }

    /// Member `index` of the cached set.
    pub fn get_chirp(&self, index: usize) -> SarResult<&[SarComplex]> {
        self.chirp_set
            .as_ref()
            .ok_or_else(|| {
                SarError::Uninitialized("chirp set not generated; call generate_set first".into())
            })?
            .waveform(index)
    }

    /// Discards the cached set.
    pub fn reset(&mut self) {
        self.chirp_set = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn chirp_has_unit_magnitude_and_expected_length() {
        let set = ChirpGenerator::generate(150e6, 10e-6, 350e6, 1).unwrap();
        let chirp = set.waveform(0).unwrap();
        assert_eq!(chirp.len(), (10e-6f64 * 350e6).floor() as usize);
        for sample in chirp {
            assert_abs_diff_eq!(sample.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn chirp_phase_is_quadratic_about_centre() {
        let (bw, taup, fs) = (20e6, 2e-6, 50e6);
        let set = ChirpGenerator::generate(bw, taup, fs, 1).unwrap();
        let chirp = set.waveform(0).unwrap();
        let n = chirp.len();
        let kr = bw / taup;
        // Centre sample sits at t = 0; its neighbours are symmetric.
        assert_abs_diff_eq!(chirp[n / 2].arg(), 0.0, epsilon = 1e-12);
        for offset in [1usize, 7, 20] {
            let t = offset as f64 / fs;
            let expected = SarComplex::from_polar(1.0, PI * kr * t * t);
            let ahead = chirp[n / 2 + offset];
            let behind = chirp[n / 2 - offset];
            assert_abs_diff_eq!(ahead.re, expected.re, epsilon = 1e-9);
            assert_abs_diff_eq!(ahead.im, expected.im, epsilon = 1e-9);
            assert_abs_diff_eq!(behind.re, ahead.re, epsilon = 1e-9);
            assert_abs_diff_eq!(behind.im, ahead.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn set_members_are_sub_sample_shifts() {
        let (bw, taup, fs, count) = (20e6, 2e-6, 50e6, 4);
        let set = ChirpGenerator::generate(bw, taup, fs, count).unwrap();
        assert_eq!(set.as_array().unwrap().dim(), (count, 100));
        let base = ChirpGenerator::generate(bw, taup, fs, 1).unwrap();
        assert_eq!(set.waveform(0).unwrap(), base.waveform(0).unwrap());

        let kr = bw / taup;
        let member = set.waveform(3).unwrap();
        let t = (10.0 - 50.0) / fs + 3.0 / (fs * count as f64);
        let expected = SarComplex::from_polar(1.0, PI * kr * t * t);
        assert_abs_diff_eq!(member[10].re, expected.re, epsilon = 1e-9);
        assert_abs_diff_eq!(member[10].im, expected.im, epsilon = 1e-9);
    }

    #[test]
    fn cached_set_lifecycle() {
        let mut generator = ChirpGenerator::new();
        assert!(matches!(
            generator.get_chirp(0),
            Err(SarError::Uninitialized(_))
        ));

        generator.generate_set(20e6, 2e-6, 50e6, 8).unwrap();
        assert_eq!(generator.get_chirp(7).unwrap().len(), 100);
        assert_eq!(
            generator.get_chirp(8).unwrap_err(),
            SarError::IndexOutOfRange { index: 8, len: 8 }
        );

        generator.reset();
        assert!(generator.chirp_set().is_none());
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(ChirpGenerator::generate(20e6, 2e-6, 50e6, 0).is_err());
    }
}
