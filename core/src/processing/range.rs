use crate::config::constants::LIGHT_SPEED;
use crate::config::SystemConfig;
use crate::math::fft::{next_pow2, FftHelper};
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, SarComplex, SarError, SarResult, StageConfig, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;
use ndarray::{aview1, s, Array2, Axis};
use rayon::prelude::*;
use rustfft::num_traits::Zero;
use std::f64::consts::PI;
use std::sync::Arc;

/// Half-width of the range crop around the brightest return, in samples.
pub const RANGE_CROP_HALF_WIDTH: usize = 256;

/// Pulse used to locate the brightest return when no crop centre is given.
pub const PEAK_SEARCH_PULSE: usize = 20;

/// Range stage: matched-filter pulse compression followed by optional cropping.
pub struct RangeCompressionStage {
    system: Arc<SystemConfig>,
    config: Option<StageConfig>,
    logger: LogManager,
}

impl RangeCompressionStage {
    pub fn new(system: Arc<SystemConfig>) -> Self {
        Self {
            system,
            config: None,
            logger: LogManager::new("RangeCompressionStage"),
        }
    }

    /// Replica chirp sampled on `[-taup/2, taup/2)` at `1/fs`.
    pub fn reference_chirp(&self) -> Vec<SarComplex> {
        let dt = self.system.sample_interval();
        let start = -self.system.taup() / 2.0;
        let stop = self.system.taup() / 2.0;
        let len = ((stop - start) / dt).ceil().max(0.0) as usize;
        let kr = self.system.chirp_rate();
        (0..len)
            .map(|i| {
                let t = start + i as f64 * dt;
                SarComplex::from_polar(1.0, PI * kr * t * t)
            })
            .collect()
    }

    /// Correlates every pulse with the replica in the frequency domain.
    ///
    /// Output rows are `fft_len` long, the smallest power of two that holds the
    /// full linear correlation.
    pub fn compress(&self, echo: &Array2<SarComplex>) -> Array2<SarComplex> {
        let (num_pulses, num_samples) = echo.dim();
        let reference = self.reference_chirp();
        let fft = FftHelper::new(next_pow2(reference.len() + num_samples - 1));
        let matched: Vec<SarComplex> = fft.forward(&reference).iter().map(|v| v.conj()).collect();

        let mut compressed = Array2::<SarComplex>::zeros((num_pulses, fft.size()));
        compressed
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(echo.axis_iter(Axis(0)).into_par_iter())
            .for_each(|(mut out, pulse)| {
                let mut buffer = vec![SarComplex::zero(); fft.size()];
                for (slot, &sample) in buffer.iter_mut().zip(pulse.iter()) {
                    *slot = sample;
                }
                fft.forward_inplace(&mut buffer);
                for (value, filter) in buffer.iter_mut().zip(matched.iter()) {
                    *value *= filter;
                }
                fft.inverse_inplace(&mut buffer);
                out.assign(&aview1(&buffer));
            });
        compressed
    }

    /// Slant range of each compressed sample, starting at the window opening.
    pub fn range_axis(&self, len: usize) -> Vec<f64> {
        let r0 = LIGHT_SPEED * self.system.swst() / 2.0;
        let dr = LIGHT_SPEED * self.system.sample_interval() / 2.0;
        (0..len).map(|i| r0 + i as f64 * dr).collect()
    }

    /// Centre and half-width of the crop window on a range axis of `len` samples.
    fn crop_window(&self, compressed: &Array2<SarComplex>, requested: Option<usize>) -> (usize, usize) {
        let len = compressed.ncols();
        let half = RANGE_CROP_HALF_WIDTH.min(len / 2);
        let centre = requested.unwrap_or_else(|| {
            let pulse = PEAK_SEARCH_PULSE.min(compressed.nrows() - 1);
            let row = compressed.row(pulse).to_vec();
            StatsHelper::argmax_magnitude(&row)
                .map(|(idx, _)| idx)
                .unwrap_or(len / 2)
        });
        (centre.clamp(half, len - half), half)
    }
}

impl ProcessingStage for RangeCompressionStage {
    fn initialize(&mut self, config: &StageConfig) -> SarResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> SarResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| SarError::Uninitialized("range stage not initialized".into()))?;

        let (num_pulses, num_samples) = input.samples.dim();
        if num_pulses == 0 || num_samples == 0 {
            return Err(SarError::InvalidInput(format!(
                "echo matrix must be non-empty, got {} x {}",
                num_pulses, num_samples
            )));
        }

        let compressed = self.compress(&input.samples);
        let fft_len = compressed.ncols();
        if fft_len < 2 {
            return Err(SarError::InvalidInput(format!(
                "compressed range axis needs at least 2 samples, got {}",
                fft_len
            )));
        }
        let range_axis = self.range_axis(fft_len);

        let mut metadata = StageMetadata {
            fft_len: Some(fft_len),
            ..Default::default()
        };

        let output = if config.full_swath {
            metadata.notes.push(format!("full swath, {} range samples", fft_len));
            StageOutput {
                samples: compressed,
                range_axis,
                metadata,
            }
        } else {
            let (centre, half) = self.crop_window(&compressed, config.mid_range_index);
            let (lo, hi) = (centre - half, centre + half);
            metadata.peak_index = Some(centre);
            metadata.notes.push(format!("cropped range samples [{}, {})", lo, hi));
            StageOutput {
                samples: compressed.slice(s![.., lo..hi]).to_owned(),
                range_axis: range_axis[lo..hi].to_vec(),
                metadata,
            }
        };

        self.logger.trace_step(&format!(
            "pulse compression {} x {} -> fft {}",
            num_pulses, num_samples, fft_len
        ));
        Ok(output)
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemParams;
    use crate::waveform::ChirpGenerator;

    fn system(bw: f64) -> Arc<SystemConfig> {
        Arc::new(
            SystemConfig::new(SystemParams {
                bw,
                fs: 200e6,
                taup: 2e-6,
                swst: 10e-6,
                swl: 10e-6,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    /// Echo matrix holding one chirp starting at `start` on every pulse.
    fn echo_with_chirp(system: &SystemConfig, pulses: usize, start: usize) -> Array2<SarComplex> {
        let chirp = ChirpGenerator::generate_for(system).unwrap();
        let mut echo = Array2::zeros((pulses, system.samples_per_window()));
        for mut row in echo.axis_iter_mut(Axis(0)) {
            for (i, &c) in chirp.iter().enumerate() {
                row[start + i] = c;
            }
        }
        echo
    }

    fn mainlobe_width(profile: &[f64], peak: usize) -> usize {
        let threshold = profile[peak] / 2f64.sqrt();
        let mut lo = peak;
        while lo > 0 && profile[lo - 1] >= threshold {
            lo -= 1;
        }
        let mut hi = peak;
        while hi + 1 < profile.len() && profile[hi + 1] >= threshold {
            hi += 1;
        }
        hi - lo + 1
    }

    #[test]
    fn compression_peaks_at_chirp_start() {
        let system = system(60e6);
        let stage = RangeCompressionStage::new(system.clone());
        let echo = echo_with_chirp(&system, 2, 700);
        let compressed = stage.compress(&echo);
        assert!(compressed.ncols().is_power_of_two());
        let row = compressed.row(1).to_vec();
        let (peak, _) = StatsHelper::argmax_magnitude(&row).unwrap();
        assert!((peak as i64 - 700).abs() <= 1);
    }

    #[test]
    fn mainlobe_narrows_with_bandwidth() {
        let mut widths = Vec::new();
        for bw in [20e6, 80e6] {
            let system = system(bw);
            let stage = RangeCompressionStage::new(system.clone());
            let compressed = stage.compress(&echo_with_chirp(&system, 1, 500));
            let profile: Vec<f64> = compressed.row(0).iter().map(|v| v.norm()).collect();
            let (peak, _) = StatsHelper::argmax_magnitude(&compressed.row(0).to_vec()).unwrap();
            widths.push(mainlobe_width(&profile, peak));
        }
        assert!(widths[1] < widths[0], "widths {:?}", widths);
    }

    #[test]
    fn crop_keeps_window_around_peak() {
        let system = system(60e6);
        let mut stage = RangeCompressionStage::new(system.clone());
        stage
            .initialize(&StageConfig {
                velocity: 7.5e3,
                full_swath: false,
                mid_range_index: None,
            })
            .unwrap();
        let output = stage
            .execute(StageInput {
                samples: echo_with_chirp(&system, 3, 900),
                range_axis: Vec::new(),
            })
            .unwrap();
        assert_eq!(output.samples.ncols(), 2 * RANGE_CROP_HALF_WIDTH);
        assert_eq!(output.range_axis.len(), 2 * RANGE_CROP_HALF_WIDTH);
        let centre = output.metadata.peak_index.unwrap();
        assert!((centre as i64 - 900).abs() <= 1);
        stage.cleanup();
    }

    #[test]
    fn empty_echo_is_rejected() {
        let mut stage = RangeCompressionStage::new(system(60e6));
        stage
            .initialize(&StageConfig {
                velocity: 7.5e3,
                full_swath: true,
                mid_range_index: None,
            })
            .unwrap();
        let result = stage.execute(StageInput {
            samples: Array2::zeros((0, 16)),
            range_axis: Vec::new(),
        });
        assert!(matches!(result, Err(SarError::InvalidInput(_))));
    }

    #[test]
    fn single_sample_range_axis_is_rejected() {
        // A replica shorter than one sample interval compresses to a single bin.
        let system = Arc::new(
            SystemConfig::new(SystemParams {
                bw: 20e6,
                fs: 60e6,
                taup: 1e-8,
                ..Default::default()
            })
            .unwrap(),
        );
        let mut stage = RangeCompressionStage::new(system);
        assert_eq!(stage.reference_chirp().len(), 1);
        stage
            .initialize(&StageConfig {
                velocity: 7.5e3,
                full_swath: false,
                mid_range_index: None,
            })
            .unwrap();
        let result = stage.execute(StageInput {
            samples: Array2::from_elem((3, 1), SarComplex::new(1.0, 0.0)),
            range_axis: Vec::new(),
        });
        match result {
            Err(SarError::InvalidInput(message)) => assert!(message.contains("at least 2")),
            other => panic!("expected InvalidInput, got {:?}", other.map(|o| o.samples.dim())),
        }
    }

    #[test]
    fn uninitialized_stage_refuses_to_run() {
        let mut stage = RangeCompressionStage::new(system(60e6));
        let result = stage.execute(StageInput {
            samples: Array2::zeros((1, 16)),
            range_axis: Vec::new(),
        });
        assert!(matches!(result, Err(SarError::Uninitialized(_))));
    }
}
