use crate::config::SystemConfig;
use crate::math::fft::fft_frequencies;
use crate::math::interp::UniformCubicSpline;
use crate::prelude::{
    ProcessingStage, SarComplex, SarError, SarResult, StageConfig, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use rustfft::num_traits::Zero;
use std::sync::Arc;

/// Range cell migration correction in the range-Doppler domain.
///
/// Every Doppler row is resampled so that energy spread along the
/// migration curve `r / sqrt(1 - (fd·λ / 2V)²)` lands back on `r`.
pub struct RcmcStage {
    system: Arc<SystemConfig>,
    config: Option<StageConfig>,
    logger: LogManager,
}

impl RcmcStage {
    pub fn new(system: Arc<SystemConfig>) -> Self {
        Self {
            system,
            config: None,
            logger: LogManager::new("RcmcStage"),
        }
    }

    /// Migration scale `1 / sqrt(1 - (fd·λ / 2V)²)`, or `None` past the physical limit.
    pub fn migration_factor(&self, doppler: f64, velocity: f64) -> Option<f64> {
        let x = doppler * self.system.wavelength() / (2.0 * velocity);
        let radicand = 1.0 - x * x;
        (radicand > 0.0).then(|| 1.0 / radicand.sqrt())
    }

    fn correct(
        &self,
        samples: &Array2<SarComplex>,
        range_axis: &[f64],
        velocity: f64,
    ) -> (Array2<SarComplex>, usize) {
        let (num_bins, num_ranges) = samples.dim();
        let spline = UniformCubicSpline::new(range_axis[0], range_axis[num_ranges - 1], num_ranges);
        let doppler = fft_frequencies(num_bins, self.system.prf());

        let mut corrected = Array2::<SarComplex>::zeros((num_bins, num_ranges));
        let skipped: usize = corrected
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(samples.axis_iter(Axis(0)).into_par_iter())
            .zip(doppler.par_iter())
            .map(|((mut out, row), &fd)| {
                let factor = match self.migration_factor(fd, velocity) {
                    Some(factor) => factor,
                    None => return 1usize,
                };
                let y = row.to_vec();
                let targets: Vec<f64> = range_axis.iter().map(|r| r * factor).collect();
                let mut buffer = vec![SarComplex::zero(); num_ranges];
                spline.evaluate_into(&y, &targets, &mut buffer);
                for (slot, value) in out.iter_mut().zip(buffer) {
                    *slot = value;
                }
                0usize
            })
            .sum();
        (corrected, skipped)
    }
}

impl ProcessingStage for RcmcStage {
    fn initialize(&mut self, config: &StageConfig) -> SarResult<()> {
        if !(config.velocity.is_finite() && config.velocity > 0.0) {
            return Err(SarError::InvalidConfig {
                field: "velocity",
                reason: format!("must be positive, got {}", config.velocity),
            });
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> SarResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| SarError::Uninitialized("RCMC stage not initialized".into()))?;
        if input.samples.is_empty() || input.range_axis.len() != input.samples.ncols() {
            return Err(SarError::InvalidInput(format!(
                "range-Doppler data {:?} does not match range axis of {}",
                input.samples.dim(),
                input.range_axis.len()
            )));
        }

        let (corrected, skipped) = self.correct(&input.samples, &input.range_axis, config.velocity);
        let mut metadata = StageMetadata::default();
        if skipped > 0 {
            self.logger.record(&format!(
                "{} Doppler bins beyond 2V/λ zero-filled during RCMC",
                skipped
            ));
            metadata
                .notes
                .push(format!("{} Doppler bins zero-filled", skipped));
        }
        Ok(StageOutput {
            samples: corrected,
            range_axis: input.range_axis,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemParams;
    use crate::processing::range::RangeCompressionStage;
    use approx::assert_abs_diff_eq;

    fn stage(velocity: f64) -> RcmcStage {
        let mut stage =
            RcmcStage::new(Arc::new(SystemConfig::new(SystemParams::default()).unwrap()));
        stage
            .initialize(&StageConfig {
                velocity,
                full_swath: true,
                mid_range_index: None,
            })
            .unwrap();
        stage
    }

    #[test]
    fn zero_doppler_row_is_unchanged() {
        let mut stage = stage(7.6e3);
        let range_axis: Vec<f64> = (0..16).map(|i| 1000.0 + i as f64 * 0.5).collect();
        let samples = Array2::from_shape_fn((4, 16), |(_, j)| SarComplex::new(j as f64, 1.0));
        let output = stage
            .execute(StageInput {
                samples: samples.clone(),
                range_axis,
            })
            .unwrap();
        for j in 0..16 {
            assert_abs_diff_eq!(output.samples[[0, j]].re, samples[[0, j]].re, epsilon = 1e-9);
            assert_abs_diff_eq!(output.samples[[0, j]].im, samples[[0, j]].im, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_doppler_row_keeps_last_range_sample() {
        let system = Arc::new(SystemConfig::new(SystemParams::default()).unwrap());
        let range_axis = RangeCompressionStage::new(system).range_axis(32768);
        let mut stage = stage(7.6e3);
        let samples = Array2::from_elem((2, range_axis.len()), SarComplex::new(1.0, 0.0));
        let output = stage
            .execute(StageInput {
                samples,
                range_axis,
            })
            .unwrap();
        let row = output.samples.row(0);
        assert!(row.iter().all(|v| v.norm() > 0.5));
        assert_abs_diff_eq!(row[row.len() - 1].re, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn migration_factor_grows_with_doppler() {
        let stage = stage(7.6e3);
        assert_eq!(stage.migration_factor(0.0, 7.6e3), Some(1.0));
        let low = stage.migration_factor(500.0, 7.6e3).unwrap();
        let high = stage.migration_factor(2000.0, 7.6e3).unwrap();
        assert!(1.0 < low && low < high);
        // fd·λ / 2V ≥ 1 has no real migration curve.
        assert_eq!(stage.migration_factor(1e6, 7.6e3), None);
    }

    #[test]
    fn bins_past_physical_limit_are_zero_filled() {
        // A very slow platform pushes the outer Doppler bins past 2V/λ.
        let mut stage = stage(10.0);
        let range_axis: Vec<f64> = (0..8).map(|i| 500.0 + i as f64).collect();
        let samples = Array2::from_elem((8, 8), SarComplex::new(1.0, 0.0));
        let output = stage
            .execute(StageInput {
                samples,
                range_axis,
            })
            .unwrap();
        // Bin 4 is -prf/2 = -2500 Hz, far beyond 2V/λ ≈ 360 Hz.
        assert!(output.samples.row(4).iter().all(|v| *v == SarComplex::zero()));
        assert_eq!(output.metadata.notes.len(), 1);
    }
}
