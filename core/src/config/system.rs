use crate::config::constants::{BOLTZMANN, EARTH_GM, EARTH_RADIUS, LIGHT_SPEED};
use crate::prelude::{SarError, SarResult};
use serde::{Deserialize, Serialize};

/// Physical inputs of a SAR system, as supplied by a caller or a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParams {
    /// Carrier frequency (Hz).
    pub fc: f64,
    /// Chirp bandwidth (Hz).
    pub bw: f64,
    /// Complex sampling rate (Hz).
    pub fs: f64,
    /// Pulse width (s).
    pub taup: f64,
    /// Pulse repetition frequency (Hz).
    pub prf: f64,
    /// Sampling window start time (s).
    pub swst: f64,
    /// Sampling window length (s).
    pub swl: f64,
    /// Platform orbit height (m).
    pub orbit_height: f64,
    pub antenna_width: f64,
    pub antenna_height: f64,
    pub antenna_roll_deg: f64,
    pub antenna_pitch_deg: f64,
    pub antenna_yaw_deg: f64,
    /// Transmit power (W).
    pub tx_power: f64,
    /// Linear receive gain.
    pub rx_gain: f64,
    pub noise_figure_db: f64,
    pub system_loss_db: f64,
    /// System noise temperature (K).
    pub system_temperature: f64,
    pub adc_bits: u32,
    pub beam_id: String,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            fc: 5.4e9,
            bw: 150e6,
            fs: 350e6,
            taup: 10e-6,
            prf: 5000.0,
            swst: 10e-6,
            swl: 50e-6,
            orbit_height: 517e3,
            antenna_width: 4.0,
            antenna_height: 0.5,
            antenna_roll_deg: 0.0,
            antenna_pitch_deg: 0.0,
            antenna_yaw_deg: 0.0,
            tx_power: 1000.0,
            rx_gain: 1.0,
            noise_figure_db: 3.0,
            system_loss_db: 2.0,
            system_temperature: 290.0,
            adc_bits: 12,
            beam_id: "Beam0000".to_string(),
        }
    }
}

/// Validated SAR system configuration with its derived timing and frequency terms.
///
/// Construction is the only place validation happens; every downstream component
/// shares one instance read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemConfig {
    params: SystemParams,
    wavelength: f64,
    pri: f64,
    chirp_rate: f64,
    sample_interval: f64,
    samples_per_chirp: usize,
    samples_per_window: usize,
    window_end: f64,
    beamwidth_az_deg: f64,
    beamwidth_el_deg: f64,
}

fn require_positive(field: &'static str, value: f64) -> SarResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SarError::InvalidConfig {
            field,
            reason: format!("must be a finite value greater than zero, got {}", value),
        })
    }
}

impl SystemConfig {
    pub fn new(params: SystemParams) -> SarResult<Self> {
        require_positive("fc", params.fc)?;
        require_positive("bw", params.bw)?;
        require_positive("fs", params.fs)?;
        require_positive("taup", params.taup)?;
        require_positive("prf", params.prf)?;
        require_positive("swl", params.swl)?;
        require_positive("orbit_height", params.orbit_height)?;
        require_positive("antenna_width", params.antenna_width)?;
        require_positive("antenna_height", params.antenna_height)?;

        let required = 2.0 * params.bw;
        if params.fs < required {
            return Err(SarError::NyquistViolation {
                fs: params.fs,
                required,
            });
        }

        let wavelength = LIGHT_SPEED / params.fc;
        let chirp_rate = params.bw / params.taup;
        Ok(Self {
            wavelength,
            pri: 1.0 / params.prf,
            chirp_rate,
            sample_interval: 1.0 / params.fs,
            samples_per_chirp: (params.taup * params.fs).floor() as usize,
            samples_per_window: (params.swl * params.fs).floor() as usize,
            window_end: params.swst + params.swl,
            beamwidth_az_deg: (wavelength / params.antenna_width).to_degrees(),
            beamwidth_el_deg: (wavelength / params.antenna_height).to_degrees(),
            params,
        })
    }

    pub fn params(&self) -> &SystemParams {
        &self.params
    }

    pub fn fc(&self) -> f64 {
        self.params.fc
    }

    pub fn bw(&self) -> f64 {
        self.params.bw
    }

    pub fn fs(&self) -> f64 {
        self.params.fs
    }

    pub fn taup(&self) -> f64 {
        self.params.taup
    }

    pub fn prf(&self) -> f64 {
        self.params.prf
    }

    pub fn swst(&self) -> f64 {
        self.params.swst
    }

    pub fn swl(&self) -> f64 {
        self.params.swl
    }

    pub fn orbit_height(&self) -> f64 {
        self.params.orbit_height
    }

    pub fn beam_id(&self) -> &str {
        &self.params.beam_id
    }

    /// Carrier wavelength c/fc (m).
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// Pulse repetition interval 1/prf (s).
    pub fn pri(&self) -> f64 {
        self.pri
    }

    /// LFM chirp rate bw/taup (Hz/s).
    pub fn chirp_rate(&self) -> f64 {
        self.chirp_rate
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn samples_per_chirp(&self) -> usize {
        self.samples_per_chirp
    }

    pub fn samples_per_window(&self) -> usize {
        self.samples_per_window
    }

    /// Sampling window end time swst + swl (s).
    pub fn window_end(&self) -> f64 {
        self.window_end
    }

    pub fn beamwidth_az_deg(&self) -> f64 {
        self.beamwidth_az_deg
    }

    pub fn beamwidth_el_deg(&self) -> f64 {
        self.beamwidth_el_deg
    }

    /// Noise figure plus system loss as a linear factor.
    pub fn loss_linear(&self) -> f64 {
        10f64.powf((self.params.noise_figure_db + self.params.system_loss_db) / 10.0)
    }

    /// Thermal-noise amplitude below which a target return is discarded.
    pub fn noise_threshold(&self, num_pulses: usize) -> f64 {
        let samples = self.samples_per_window.max(1) as f64;
        let pulses = num_pulses.max(1) as f64;
        (BOLTZMANN * self.params.system_temperature / samples / pulses).sqrt()
    }

    /// Slant-range resolution c/(2·bw) (m).
    pub fn range_resolution(&self) -> f64 {
        LIGHT_SPEED / (2.0 * self.params.bw)
    }

    /// Speed of a circular orbit at the configured height (m/s).
    pub fn circular_orbit_speed(&self) -> f64 {
        (EARTH_GM / (EARTH_RADIUS + self.params.orbit_height)).sqrt()
    }
}
