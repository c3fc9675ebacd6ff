use crate::config::SystemConfig;
use crate::math::fft::{next_pow2, FftHelper};
use crate::prelude::{
    ProcessingStage, SarComplex, SarError, SarResult, StageConfig, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;
use ndarray::{aview1, Array2, Axis};
use rayon::prelude::*;
use rustfft::num_traits::Zero;
use std::sync::Arc;

/// Moves range-compressed data into the range-Doppler domain.
///
/// Each range column is zero-padded along slow time to a power of two long
/// enough for the full azimuth correlation and transformed independently.
pub struct AzimuthFftStage {
    system: Arc<SystemConfig>,
    config: Option<StageConfig>,
    logger: LogManager,
}

impl AzimuthFftStage {
    pub fn new(system: Arc<SystemConfig>) -> Self {
        Self {
            system,
            config: None,
            logger: LogManager::new("AzimuthFftStage"),
        }
    }

    /// Synthetic aperture length in pulses for a target at `max_range`.
    pub fn aperture_pulses(&self, max_range: f64, velocity: f64) -> usize {
        let aperture = max_range * self.system.beamwidth_az_deg().to_radians().sin();
        let pulses = aperture / velocity * self.system.prf();
        if pulses.is_finite() && pulses > 0.0 {
            pulses.floor() as usize
        } else {
            0
        }
    }

    /// Slow-time FFT length for `num_pulses` pulses observed up to `max_range`.
    pub fn fft_len(&self, num_pulses: usize, max_range: f64, velocity: f64) -> usize {
        next_pow2(self.aperture_pulses(max_range, velocity) + num_pulses - 1)
    }

    fn transform(&self, samples: &Array2<SarComplex>, fft: &FftHelper) -> Array2<SarComplex> {
        let mut spectrum = Array2::<SarComplex>::zeros((fft.size(), samples.ncols()));
        spectrum
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(samples.axis_iter(Axis(1)).into_par_iter())
            .for_each(|(mut out, column)| {
                let mut buffer = vec![SarComplex::zero(); fft.size()];
                for (slot, &sample) in buffer.iter_mut().zip(column.iter()) {
                    *slot = sample;
                }
                fft.forward_inplace(&mut buffer);
                out.assign(&aview1(&buffer));
            });
        spectrum
    }
}

impl ProcessingStage for AzimuthFftStage {
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
            .ok_or_else(|| SarError::Uninitialized("azimuth FFT stage not initialized".into()))?;
        if input.samples.is_empty() || input.range_axis.len() != input.samples.ncols() {
            return Err(SarError::InvalidInput(format!(
                "range-compressed data {:?} does not match range axis of {}",
                input.samples.dim(),
                input.range_axis.len()
            )));
        }

        let max_range = input
            .range_axis
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let fft = FftHelper::new(self.fft_len(input.samples.nrows(), max_range, config.velocity));
        let spectrum = self.transform(&input.samples, &fft);

        self.logger.trace_step(&format!(
            "azimuth FFT {} pulses -> {} Doppler bins",
            input.samples.nrows(),
            fft.size()
        ));
        Ok(StageOutput {
            samples: spectrum,
            range_axis: input.range_axis,
            metadata: StageMetadata {
                fft_len: Some(fft.size()),
                notes: vec![format!("max slant range {:.1} m", max_range)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
