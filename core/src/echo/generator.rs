use crate::config::constants::LIGHT_SPEED;
use crate::config::SystemConfig;
use crate::echo::antenna::{BeamGainModel, BeamGeometry, ElevationGaussianBeam};
use crate::echo::propagation::{AtmosphericLossModel, NoAtmosphericLoss};
use crate::echo::target::{Target, TargetList};
use crate::math::vector::{self, Vec3};
use crate::prelude::{SarComplex, SarError, SarResult};
use crate::telemetry::log::LogManager;
use crate::waveform::ChirpSet;
use rayon::prelude::*;
use rustfft::num_traits::Zero;
use std::f64::consts::PI;
use std::sync::Arc;

/// Targets handled by one worker before its partial buffer is merged.
const TARGET_CHUNK: usize = 64;

/// How a return's fractional sample delay is realised.
#[derive(Debug, Clone, Default)]
pub enum DelayInterpolation {
    /// Round the start of the return up to the next whole sample.
    #[default]
    NearestSample,
    /// Use the chirp-set member whose sub-sample offset best matches the
    /// fractional delay.
    ChirpSet(Arc<ChirpSet>),
}

/// One target's clipped contribution to a pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Contribution {
    /// First echo sample written.
    start: usize,
    /// First chirp sample used.
    chirp_offset: usize,
    len: usize,
    coeff: SarComplex,
    /// Chirp-set member, or `None` for the caller's chirp.
    member: Option<usize>,
}

/// Per-pulse terms shared by every target.
struct PulseTerms {
    geometry: BeamGeometry,
    /// `Pt·λ² / ((4π)³·loss·atm)`; the target's gain² is applied later.
    power_term: f64,
    noise_threshold: f64,
    rx_amplitude: f64,
}

/// Forward radar model producing one pulse of raw echo from point targets.
#[derive(Debug, Clone)]
pub struct EchoGenerator {
    config: Arc<SystemConfig>,
    beam: Arc<dyn BeamGainModel>,
    atmosphere: Arc<dyn AtmosphericLossModel>,
    delay: DelayInterpolation,
    averaged_pulses: usize,
    logger: LogManager,
}

impl EchoGenerator {
    /// Generator with the elevation-only Gaussian beam, a lossless atmosphere
    /// and nearest-sample delays.
    pub fn new(config: Arc<SystemConfig>) -> Self {
        let beam = Arc::new(ElevationGaussianBeam::from_config(&config));
        Self {
            config,
            beam,
            atmosphere: Arc::new(NoAtmosphericLoss),
            delay: DelayInterpolation::NearestSample,
            averaged_pulses: 1,
            logger: LogManager::new("EchoGenerator"),
        }
    }

    pub fn with_beam_model(mut self, beam: Arc<dyn BeamGainModel>) -> Self {
        self.beam = beam;
        self
    }

    pub fn with_atmosphere(mut self, atmosphere: Arc<dyn AtmosphericLossModel>) -> Self {
        self.atmosphere = atmosphere;
        self
    }

    pub fn with_delay_interpolation(mut self, delay: DelayInterpolation) -> Self {
        self.delay = delay;
        self
    }

    /// Number of pulses the noise threshold is averaged over (default 1).
    pub fn with_averaged_pulses(mut self, pulses: usize) -> Self {
        self.averaged_pulses = pulses.max(1);
        self
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Synthesises one pulse of echo, `samples_per_window` long.
    ///
    /// Targets whose amplitude does not exceed the thermal-noise threshold, or
    /// whose return lies wholly outside the sampling window, add nothing; an
    /// empty target list yields an all-zero pulse.
    pub fn generate(
        &self,
        chirp: &[SarComplex],
        targets: &TargetList,
        position: &Vec3,
        velocity: &Vec3,
        beam_direction: Option<&Vec3>,
    ) -> SarResult<Vec<SarComplex>> {
        let num_samples = self.config.samples_per_window();
        let mut echo = vec![SarComplex::zero(); num_samples];
        if targets.is_empty() {
            return Ok(echo);
        }
        self.check_inputs(chirp, position, velocity)?;

        let terms = self.pulse_terms(position, velocity, beam_direction);
        let plans = |chunk: &[Target]| -> Vec<Contribution> {
            chunk
                .iter()
                .filter_map(|target| self.plan(target, chirp.len(), &terms))
                .collect()
        };

        let slice = targets.as_slice();
        let surviving = if slice.len() <= TARGET_CHUNK {
            let contributions = plans(slice);
            for contribution in &contributions {
                self.apply(contribution, chirp, &mut echo);
            }
            contributions.len()
        } else {
            // Each chunk fills a private buffer; buffers merge in chunk order so
            // the result does not depend on scheduling.
            let partials: Vec<(usize, Vec<SarComplex>)> = slice
                .par_chunks(TARGET_CHUNK)
                .map(|chunk| {
                    let contributions = plans(chunk);
                    let mut partial = vec![SarComplex::zero(); num_samples];
                    for contribution in &contributions {
                        self.apply(contribution, chirp, &mut partial);
                    }
                    (contributions.len(), partial)
                })
                .collect();
            let mut surviving = 0;
            for (count, partial) in partials {
                surviving += count;
                for (acc, value) in echo.iter_mut().zip(partial) {
                    *acc += value;
                }
            }
            surviving
        };

        self.logger.trace_step(&format!(
            "{} of {} targets above noise threshold and inside window",
            surviving,
            targets.len()
        ));
        Ok(echo)
    }

    fn check_inputs(&self, chirp: &[SarComplex], position: &Vec3, velocity: &Vec3) -> SarResult<()> {
        if chirp.is_empty() {
            return Err(SarError::InvalidInput("chirp waveform is empty".into()));
        }
        if let DelayInterpolation::ChirpSet(set) = &self.delay {
            if set.samples_per_chirp() != chirp.len() {
                return Err(SarError::InvalidInput(format!(
                    "chirp length {} does not match chirp set length {}",
                    chirp.len(),
                    set.samples_per_chirp()
                )));
            }
        }
        if !position.iter().chain(velocity.iter()).all(|v| v.is_finite()) {
            return Err(SarError::InvalidInput(
                "platform position and velocity must be finite".into(),
            ));
        }
        Ok(())
    }

    fn pulse_terms(&self, position: &Vec3, velocity: &Vec3, beam: Option<&Vec3>) -> PulseTerms {
        let geometry = BeamGeometry::resolve(position, velocity, beam);
        let params = self.config.params();
        let atmospheric_loss = self.atmosphere.loss(&geometry.boresight, position);
        let wavelength = self.config.wavelength();
        let power_term = params.tx_power * wavelength * wavelength
            / ((4.0 * PI).powi(3) * self.config.loss_linear() * atmospheric_loss);
        PulseTerms {
            geometry,
            power_term,
            noise_threshold: self.config.noise_threshold(self.averaged_pulses),
            rx_amplitude: params.rx_gain.sqrt(),
        }
    }

    /// Amplitude, phase and placement of one target's return, or `None` when it
    /// contributes nothing.
    fn plan(&self, target: &Target, chirp_len: usize, terms: &PulseTerms) -> Option<Contribution> {
        let line_of_sight = vector::sub(&target.position, &terms.geometry.platform_position);
        let slant_range = vector::norm(&line_of_sight);
        // A target at the antenna phase centre has no finite amplitude.
        let direction = vector::normalize(&line_of_sight)?;

        let two_way_range = 2.0 * slant_range;
        let td = two_way_range / LIGHT_SPEED;
        let td_amb = td.rem_euclid(self.config.pri());

        let gain = self.beam.gain(&direction, &terms.geometry);
        let c1 = terms.power_term * gain * gain;
        let amplitude = (c1 * target.reflectivity / slant_range.powi(4)).sqrt();
        if !(amplitude > terms.noise_threshold) {
            return None;
        }

        let carrier_cycles = (self.config.fc() * td).rem_euclid(1.0);
        let phase = -2.0 * PI * carrier_cycles + target.phase_deg.to_radians();
        let coeff = SarComplex::from_polar(amplitude * terms.rx_amplitude, phase);

        let sample_pos = (td_amb - self.config.swst()) * self.config.fs();
        let mut idx0 = sample_pos.ceil() as i64;
        let member = match &self.delay {
            DelayInterpolation::NearestSample => None,
            DelayInterpolation::ChirpSet(set) => {
                let count = set.len();
                let fraction = idx0 as f64 - sample_pos;
                let mut k = (fraction * count as f64).round() as usize;
                if k >= count {
                    // A full-sample offset is member 0 one sample earlier.
                    k = 0;
                    idx0 -= 1;
                }
                Some(k)
            }
        };

        let num_samples = self.config.samples_per_window() as i64;
        let idx1 = idx0 + chirp_len as i64;
        if idx1 <= 0 || idx0 >= num_samples {
            return None;
        }
        let start = idx0.max(0);
        let end = idx1.min(num_samples);
        Some(Contribution {
            start: start as usize,
            chirp_offset: (start - idx0) as usize,
            len: (end - start) as usize,
            coeff,
            member,
        })
    }

    fn apply(&self, contribution: &Contribution, chirp: &[SarComplex], echo: &mut [SarComplex]) {
        let waveform = match (&self.delay, contribution.member) {
            (DelayInterpolation::ChirpSet(set), Some(k)) => set.waveform(k).unwrap_or(chirp),
            _ => chirp,
        };
        let source = &waveform[contribution.chirp_offset..contribution.chirp_offset + contribution.len];
        let target = &mut echo[contribution.start..contribution.start + contribution.len];
        for (out, &sample) in target.iter_mut().zip(source) {
            *out += sample * contribution.coeff;
        }
    }
}
