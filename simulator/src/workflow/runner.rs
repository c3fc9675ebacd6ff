use crate::generator::scene::build_scene;
use crate::generator::trajectory::{build_track, PlatformTrack};
use crate::workflow::config::{ProcessingMode, WorkflowConfig};
use anyhow::{ensure, Context};
use sarcore::interface::{ImageSummary, RawDataAncillary, SarImage};
use sarcore::math::stats::StatsHelper;
use sarcore::{EchoSimulator, RdaProcessor};

/// Everything a run produced, minus the raw arrays.
pub struct WorkflowResult {
    pub ancillary: RawDataAncillary,
    pub track: PlatformTrack,
    pub target_count: usize,
    pub echo_shape: (usize, usize),
    pub echo_rms: f64,
    pub echo_nonzero: usize,
    pub platform_speed: f64,
    pub cropped: Option<SarImage>,
    pub full_swath: Option<SarImage>,
}

impl WorkflowResult {
    pub fn cropped_summary(&self) -> Option<ImageSummary> {
        self.cropped.as_ref().map(SarImage::summary)
    }

    pub fn full_swath_summary(&self) -> Option<ImageSummary> {
        self.full_swath.as_ref().map(SarImage::summary)
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let system = self.config.system_config()?;
        let track = build_track(&self.config.trajectory, &system).context("building platform track")?;
        ensure!(!track.is_empty(), "trajectory must contain at least one pulse");
        let (centre_position, centre_velocity) = track
            .centre()
            .context("locating the track centre")?;
        let targets = build_scene(&self.config.scene, &system, &centre_position, &centre_velocity)
            .context("building target scene")?;

        let simulator = EchoSimulator::new(system.clone()).context("caching chirp set")?;
        let echo = simulator
            .simulate_multiple_pulses(&targets, &track.positions, &track.velocities, None)
            .context("simulating raw echo")?;
        let flat: Vec<_> = echo.iter().copied().collect();
        let echo_rms = StatsHelper::rms(&flat);
        let echo_nonzero = StatsHelper::nonzero_count(&flat);
        log::info!(
            "echo {} x {}: rms {:.3e}, {} non-zero samples",
            echo.nrows(),
            echo.ncols(),
            echo_rms,
            echo_nonzero
        );

        let processing = &self.config.processing;
        let processor = RdaProcessor::new(system.clone(), Some(&centre_velocity))
            .with_normalized_output(processing.normalize);
        let (cropped, full_swath) = match processing.mode {
            ProcessingMode::Cropped => (
                Some(
                    processor
                        .process(&echo, processing.dynamic_range, processing.mid_range_index, false)
                        .context("forming cropped image")?,
                ),
                None,
            ),
            ProcessingMode::FullSwath => (
                None,
                Some(
                    processor
                        .process(&echo, processing.dynamic_range, None, true)
                        .context("forming full-swath image")?,
                ),
            ),
            ProcessingMode::Both => {
                let cropped = processor
                    .process(&echo, processing.dynamic_range, processing.mid_range_index, false)
                    .context("forming cropped image")?;
                let full = processor
                    .process(&echo, processing.dynamic_range, None, true)
                    .context("forming full-swath image")?;
                (Some(cropped), Some(full))
            }
        };

        Ok(WorkflowResult {
            ancillary: RawDataAncillary::from_config(&system),
            target_count: targets.len(),
            echo_shape: echo.dim(),
            echo_rms,
            echo_nonzero,
            platform_speed: processor.velocity(),
            track,
            cropped,
            full_swath,
        })
    }
}
