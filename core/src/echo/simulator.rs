use crate::config::SystemConfig;
use crate::echo::generator::{DelayInterpolation, EchoGenerator};
use crate::echo::target::TargetList;
use crate::math::vector::Vec3;
use crate::prelude::{SarComplex, SarError, SarResult};
use crate::telemetry::log::LogManager;
use crate::waveform::{ChirpGenerator, DEFAULT_CHIRP_SET_SIZE};
use ndarray::{aview1, Array2, Axis};
use rayon::prelude::*;
use std::sync::Arc;

/// Drives chirp generation and the echo model over one or many pulses.
#[derive(Debug, Clone)]
pub struct EchoSimulator {
    config: Arc<SystemConfig>,
    chirps: ChirpGenerator,
    generator: EchoGenerator,
    logger: LogManager,
}

impl EchoSimulator {
    /// Builds the simulator and caches the default chirp set.
    pub fn new(config: Arc<SystemConfig>) -> SarResult<Self> {
        let mut chirps = ChirpGenerator::new();
        chirps.generate_set(config.bw(), config.taup(), config.fs(), DEFAULT_CHIRP_SET_SIZE)?;
        Ok(Self {
            generator: EchoGenerator::new(config.clone()),
            config,
            chirps,
            logger: LogManager::new("EchoSimulator"),
        })
    }

    /// Replaces the echo model, e.g. to plug in other beam or atmosphere strategies.
    pub fn with_generator(mut self, generator: EchoGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Switches the echo model to fractional-delay placement using the cached chirp set.
    pub fn with_chirp_set_interpolation(mut self) -> SarResult<Self> {
        let set = self
            .chirps
            .chirp_set()
            .cloned()
            .ok_or_else(|| SarError::Uninitialized("chirp set not generated".into()))?;
        self.generator = self
            .generator
            .with_delay_interpolation(DelayInterpolation::ChirpSet(Arc::new(set)));
        Ok(self)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn generator(&self) -> &EchoGenerator {
        &self.generator
    }

    /// The zero-offset transmit chirp.
    pub fn chirp(&self) -> SarResult<&[SarComplex]> {
        self.chirps.get_chirp(0)
    }

    /// Echo of a single pulse; the cached chirp is used when none is supplied.
    pub fn simulate_echo(
        &self,
        targets: &TargetList,
        position: &Vec3,
        velocity: &Vec3,
        beam_direction: Option<&Vec3>,
        chirp: Option<&[SarComplex]>,
    ) -> SarResult<Vec<SarComplex>> {
        let chirp = match chirp {
            Some(chirp) => chirp,
            None => self.chirp()?,
        };
        self.generator
            .generate(chirp, targets, position, velocity, beam_direction)
    }

    /// Raw echo matrix (pulses × samples_per_window), one row per platform state.
    ///
    /// Rows are independent and computed in parallel with a single shared chirp.
    pub fn simulate_multiple_pulses(
        &self,
        targets: &TargetList,
        positions: &[Vec3],
        velocities: &[Vec3],
        beam_directions: Option<&[Vec3]>,
    ) -> SarResult<Array2<SarComplex>> {
        let num_pulses = positions.len();
        if velocities.len() != num_pulses {
            return Err(SarError::InvalidInput(format!(
                "{} positions but {} velocities",
                num_pulses,
                velocities.len()
            )));
        }
        if let Some(beams) = beam_directions {
            if beams.len() != num_pulses {
                return Err(SarError::InvalidInput(format!(
                    "{} positions but {} beam directions",
                    num_pulses,
                    beams.len()
                )));
            }
        }

        let chirp = self.chirp()?;
        let mut echoes = Array2::<SarComplex>::zeros((num_pulses, self.config.samples_per_window()));
        echoes
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(pulse, mut row)| -> SarResult<()> {
                let beam = beam_directions.map(|beams| &beams[pulse]);
                let echo = self.generator.generate(
                    chirp,
                    targets,
                    &positions[pulse],
                    &velocities[pulse],
                    beam,
                )?;
                row.assign(&aview1(&echo));
                Ok(())
            })?;

        self.logger.record(&format!(
            "simulated {} pulses x {} samples for {} targets",
            num_pulses,
            self.config.samples_per_window(),
            targets.len()
        ));
        Ok(echoes)
    }
}
