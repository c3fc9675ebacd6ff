use crate::config::SystemConfig;
use crate::math::fft::{fft_frequencies, fftshift, FftHelper};
use crate::prelude::{
    ProcessingStage, SarComplex, SarError, SarResult, StageConfig, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;
use ndarray::{aview1, Array2, Axis};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::sync::Arc;

/// Azimuth matched filtering per range column, back to slow time.
pub struct AzimuthCompressionStage {
    system: Arc<SystemConfig>,
    config: Option<StageConfig>,
    logger: LogManager,
}

impl AzimuthCompressionStage {
    pub fn new(system: Arc<SystemConfig>) -> Self {
        Self {
            system,
            config: None,
            logger: LogManager::new("AzimuthCompressionStage"),
        }
    }

    /// Azimuth FM rate `2V² / (r·λ)` at slant range `r`.
    pub fn fm_rate(&self, range: f64, velocity: f64) -> f64 {
        2.0 * velocity * velocity / (range * self.system.wavelength())
    }

    /// Frequency-domain azimuth reference `exp(-jπ fd² / Ka)` for one range.
    ///
    /// Non-positive ranges have no defined FM rate; their reference is all ones.
    pub fn reference(&self, doppler: &[f64], range: f64, velocity: f64) -> Vec<SarComplex> {
        if !(range > 0.0) {
            return vec![SarComplex::new(1.0, 0.0); doppler.len()];
        }
        let ka = self.fm_rate(range, velocity);
        doppler
            .iter()
            .map(|fd| SarComplex::from_polar(1.0, -PI * fd * fd / ka))
            .collect()
    }

    fn compress(
        &self,
        samples: &Array2<SarComplex>,
        range_axis: &[f64],
        velocity: f64,
    ) -> Array2<SarComplex> {
        let num_bins = samples.nrows();
        let fft = FftHelper::new(num_bins);
        let doppler = fft_frequencies(num_bins, self.system.prf());

        let mut image = Array2::<SarComplex>::zeros(samples.dim());
        image
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(samples.axis_iter(Axis(1)).into_par_iter())
            .zip(range_axis.par_iter())
            .for_each(|((mut out, column), &range)| {
                let reference = self.reference(&doppler, range, velocity);
                let mut buffer: Vec<SarComplex> = column
                    .iter()
                    .zip(reference.iter())
                    .map(|(sample, filter)| sample * filter)
                    .collect();
                fft.inverse_inplace(&mut buffer);
                fftshift(&mut buffer);
                out.assign(&aview1(&buffer));
            });
        image
    }
}

impl ProcessingStage for AzimuthCompressionStage {
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
        let config = self.config.as_ref().ok_or_else(|| {
            SarError::Uninitialized("azimuth compression stage not initialized".into())
        })?;
        if input.samples.is_empty() || input.range_axis.len() != input.samples.ncols() {
            return Err(SarError::InvalidInput(format!(
                "range-Doppler data {:?} does not match range axis of {}",
                input.samples.dim(),
                input.range_axis.len()
            )));
        }

        let image = self.compress(&input.samples, &input.range_axis, config.velocity);
        self.logger.trace_step(&format!(
            "azimuth compression over {} range columns",
            image.ncols()
        ));
        Ok(StageOutput {
            samples: image,
            range_axis: input.range_axis,
            metadata: StageMetadata::default(),
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
    use approx::assert_abs_diff_eq;

    fn stage() -> AzimuthCompressionStage {
        AzimuthCompressionStage::new(Arc::new(SystemConfig::new(SystemParams::default()).unwrap()))
    }

    #[test]
    fn reference_has_unit_magnitude_and_zero_phase_at_dc() {
        let stage = stage();
        let doppler = fft_frequencies(8, 5000.0);
        let reference = stage.reference(&doppler, 900e3, 7.6e3);
        assert_eq!(reference[0], SarComplex::new(1.0, 0.0));
        for value in &reference {
            assert_abs_diff_eq!(value.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn non_positive_range_leaves_spectrum_unfiltered() {
        let stage = stage();
        let reference = stage.reference(&[0.0, 100.0, -100.0], 0.0, 7.6e3);
        assert!(reference.iter().all(|v| *v == SarComplex::new(1.0, 0.0)));
    }

    #[test]
    fn focused_point_lands_in_centre_after_shift() {
        let mut stage = stage();
        stage
            .initialize(&StageConfig {
                velocity: 7.6e3,
                full_swath: true,
                mid_range_index: None,
            })
            .unwrap();
        // Flat spectrum at non-positive range: inverse FFT gives an impulse at t = 0.
        let samples = Array2::from_elem((16, 2), SarComplex::new(1.0, 0.0));
        let output = stage
            .execute(StageInput {
                samples,
                range_axis: vec![-1.0, 0.0],
            })
            .unwrap();
        for col in 0..2 {
            assert_abs_diff_eq!(output.samples[[8, col]].re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(output.samples[[0, col]].norm(), 0.0, epsilon = 1e-12);
        }
    }
}
