use crate::config::constants::LIGHT_SPEED;
use crate::config::SystemConfig;
use crate::interface::image::SarImage;
use crate::math::stats::StatsHelper;
use crate::math::vector::{self, Vec3};
use crate::prelude::{
    ProcessingStage, SarComplex, SarError, SarResult, StageConfig, StageInput, StageOutput,
};
use crate::processing::azimuth::AzimuthCompressionStage;
use crate::processing::doppler::AzimuthFftStage;
use crate::processing::range::RangeCompressionStage;
use crate::processing::rcmc::RcmcStage;
use crate::telemetry::log::LogManager;
use ndarray::Array2;
use std::sync::Arc;

/// Amplitude (not power) dB scale.
const DB_SCALE: f64 = 20.0;

/// Range-Doppler image formation over a raw echo matrix (pulses × samples).
///
/// The processor holds only read-only state; each call builds fresh stages,
/// so repeated calls on the same input are bit-identical.
#[derive(Debug, Clone)]
pub struct RdaProcessor {
    config: Arc<SystemConfig>,
    velocity: f64,
    range_spacing: f64,
    beamwidth_az_rad: f64,
    normalize: bool,
    logger: LogManager,
}

impl RdaProcessor {
    /// Uses the magnitude of `platform_velocity`; a missing or zero vector
    /// falls back to the circular-orbit speed at the configured height.
    pub fn new(config: Arc<SystemConfig>, platform_velocity: Option<&Vec3>) -> Self {
        let logger = LogManager::new("RdaProcessor");
        let velocity = platform_velocity
            .map(vector::norm)
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .unwrap_or_else(|| {
                let speed = config.circular_orbit_speed();
                logger.record(&format!(
                    "no usable platform velocity, using circular orbit speed {:.1} m/s",
                    speed
                ));
                speed
            });
        Self {
            range_spacing: LIGHT_SPEED * config.sample_interval() / 2.0,
            beamwidth_az_rad: config.beamwidth_az_deg().to_radians(),
            config,
            velocity,
            normalize: false,
            logger,
        }
    }

    /// Shifts output images so the peak sits at 0 dB.
    pub fn with_normalized_output(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn chirp_rate(&self) -> f64 {
        self.config.chirp_rate()
    }

    /// Slant-range sample spacing c/(2·fs) (m).
    pub fn range_spacing(&self) -> f64 {
        self.range_spacing
    }

    pub fn beamwidth_az_rad(&self) -> f64 {
        self.beamwidth_az_rad
    }

    /// Along-track position of every azimuth bin, zero at the centre bin.
    pub fn azimuth_axis(&self, len: usize) -> Vec<f64> {
        let pri = self.config.pri();
        let centre = len as f64 / 2.0;
        (0..len)
            .map(|i| (i as f64 - centre) * pri * self.velocity)
            .collect()
    }

    fn stage_config(&self, mid_range_index: Option<usize>, full_swath: bool) -> StageConfig {
        StageConfig {
            velocity: self.velocity,
            full_swath,
            mid_range_index,
        }
    }

    /// Forms a dB image from `echo`.
    ///
    /// `dynamic_range` (dB) clips everything further than that below the peak;
    /// zero or negative disables clipping. Without `full_swath` the range axis
    /// is cropped around `mid_range_index`, or around the brightest return when
    /// no index is given.
    pub fn process(
        &self,
        echo: &Array2<SarComplex>,
        dynamic_range: f64,
        mid_range_index: Option<usize>,
        full_swath: bool,
    ) -> SarResult<SarImage> {
        let (num_pulses, num_samples) = echo.dim();
        if num_pulses == 0 {
            return Err(SarError::InvalidInput(
                "echo matrix has no pulses for the azimuth transform".into(),
            ));
        }
        if num_samples == 0 {
            return Err(SarError::InvalidInput("echo matrix has no range samples".into()));
        }

        let config = self.stage_config(mid_range_index, full_swath);
        let mut range = RangeCompressionStage::new(self.config.clone());
        let mut doppler = AzimuthFftStage::new(self.config.clone());
        let mut rcmc = RcmcStage::new(self.config.clone());
        let mut azimuth = AzimuthCompressionStage::new(self.config.clone());

        let input = StageInput {
            samples: echo.to_owned(),
            range_axis: Vec::new(),
        };
        let compressed = run_stage(&mut range, &config, input)?;
        let spectrum = run_stage(&mut doppler, &config, compressed.into_input())?;
        let azimuth_len = spectrum.samples.nrows();
        let corrected = run_stage(&mut rcmc, &config, spectrum.into_input())?;
        let focused = run_stage(&mut azimuth, &config, corrected.into_input())?;

        let magnitude = focused.samples.mapv(|v| v.norm());
        let data = StatsHelper::to_db(magnitude.view(), DB_SCALE, dynamic_range, self.normalize);

        let range_axis = &focused.range_axis;
        let range_extent = (range_axis[0], range_axis[range_axis.len() - 1]);
        let azimuth_axis = self.azimuth_axis(azimuth_len);
        let azimuth_extent = (azimuth_axis[0], azimuth_axis[azimuth_len - 1]);

        let image = SarImage::new(data, range_extent, azimuth_extent);
        self.logger.record(&format!(
            "formed {} x {} image ({}), peak {:.2} dB at {:?}",
            image.dim().0,
            image.dim().1,
            if full_swath { "full swath" } else { "cropped" },
            image.max_value(),
            image.peak_index()
        ));
        Ok(image)
    }

    /// Runs the cropped and the full-swath chains on the same echo.
    pub fn process_both(
        &self,
        echo: &Array2<SarComplex>,
        dynamic_range: f64,
    ) -> SarResult<(SarImage, SarImage)> {
        let cropped = self.process(echo, dynamic_range, None, false)?;
        let full = self.process(echo, dynamic_range, None, true)?;
        Ok((cropped, full))
    }
}

fn run_stage<S: ProcessingStage>(
    stage: &mut S,
    config: &StageConfig,
    input: StageInput,
) -> SarResult<StageOutput> {
    stage.initialize(config)?;
    let output = stage.execute(input);
    stage.cleanup();
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemParams;
    use crate::echo::{EchoSimulator, Target, TargetList};
    use approx::assert_abs_diff_eq;

    const SPEED: f64 = 1000.0;
    const PULSES: usize = 64;

    fn config() -> Arc<SystemConfig> {
        Arc::new(
            SystemConfig::new(SystemParams {
                bw: 30e6,
                fs: 60e6,
                taup: 2e-6,
                swst: 25e-6,
                swl: 12e-6,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    /// Side-looking pass over one point target at closest range ~4.5 km.
    fn echo(config: &Arc<SystemConfig>) -> Array2<SarComplex> {
        let x0 = 7.0e6;
        let range = 30.0013e-6 * LIGHT_SPEED / 2.0;
        let targets = TargetList::new(vec![Target::new([x0 - range, 0.0, 0.0], 100.0, 0.0).unwrap()]);
        let step = SPEED * config.pri();
        let positions: Vec<Vec3> = (0..PULSES)
            .map(|i| [x0, (i as f64 - PULSES as f64 / 2.0) * step, 0.0])
            .collect();
        let velocities = vec![[0.0, SPEED, 0.0]; PULSES];
        EchoSimulator::new(config.clone())
            .unwrap()
            .simulate_multiple_pulses(&targets, &positions, &velocities, None)
            .unwrap()
    }

    fn processor(config: &Arc<SystemConfig>) -> RdaProcessor {
        RdaProcessor::new(config.clone(), Some(&[0.0, SPEED, 0.0]))
    }

    #[test]
    fn velocity_falls_back_to_circular_orbit() {
        let config = config();
        let expected = config.circular_orbit_speed();
        assert_eq!(RdaProcessor::new(config.clone(), None).velocity(), expected);
        assert_eq!(
            RdaProcessor::new(config.clone(), Some(&[0.0; 3])).velocity(),
            expected
        );
        assert_abs_diff_eq!(processor(&config).velocity(), SPEED);
        assert_abs_diff_eq!(processor(&config).range_spacing(), LIGHT_SPEED / 120e6);
    }

    #[test]
    fn empty_echo_is_a_precondition_violation() {
        let processor = processor(&config());
        assert!(matches!(
            processor.process(&Array2::zeros((0, 32)), 40.0, None, true),
            Err(SarError::InvalidInput(_))
        ));
        assert!(matches!(
            processor.process(&Array2::zeros((4, 0)), 40.0, None, true),
            Err(SarError::InvalidInput(_))
        ));
    }

    #[test]
    fn cropped_and_full_swath_agree_on_target_range() {
        let config = config();
        let processor = processor(&config);
        let (cropped, full) = processor.process_both(&echo(&config), 60.0).unwrap();

        assert_eq!(cropped.dim().1, 512);
        assert!(full.dim().1 > cropped.dim().1);
        let cropped_range = cropped.range_at(cropped.peak_index().1);
        let full_range = full.range_at(full.peak_index().1);
        assert!(
            (cropped_range - full_range).abs() <= processor.range_spacing() * 1.01,
            "cropped {} vs full {}",
            cropped_range,
            full_range
        );
        let expected = 30.0013e-6 * LIGHT_SPEED / 2.0;
        assert!((full_range - expected).abs() < 3.0 * processor.range_spacing());
    }

    #[test]
    fn repeated_processing_is_bit_identical() {
        let config = config();
        let processor = processor(&config);
        let echo = echo(&config);
        let first = processor.process(&echo, 50.0, None, false).unwrap();
        let second = processor.process(&echo, 50.0, None, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn dynamic_range_and_normalisation_bound_pixels() {
        let config = config();
        let echo = echo(&config);
        let image = processor(&config)
            .with_normalized_output(true)
            .process(&echo, 40.0, None, false)
            .unwrap();
        assert_abs_diff_eq!(image.max_value(), 0.0);
        assert!(image.min_value() >= -40.0 - 1e-9);
    }

    #[test]
    fn azimuth_extent_spans_fft_length() {
        let config = config();
        let processor = processor(&config);
        let image = processor.process(&echo(&config), 40.0, None, false).unwrap();
        let rows = image.dim().0;
        assert!(rows.is_power_of_two() && rows >= PULSES);
        let step = config.pri() * SPEED;
        let (start, end) = image.azimuth_extent();
        assert_abs_diff_eq!(start, -(rows as f64) / 2.0 * step, epsilon = 1e-9);
        assert_abs_diff_eq!(end, (rows as f64 / 2.0 - 1.0) * step, epsilon = 1e-9);
    }

    #[test]
    fn explicit_crop_centre_is_clamped_to_axis() {
        let config = config();
        let image = processor(&config)
            .process(&echo(&config), 40.0, Some(0), false)
            .unwrap();
        let r0 = LIGHT_SPEED * config.swst() / 2.0;
        assert_abs_diff_eq!(image.range_extent().0, r0, epsilon = 1e-9);
    }
}
