use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Complex baseband sample (I + jQ) used for waveforms, echoes and images.
pub type SarComplex = Complex64;

/// Shared configuration for each image-formation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Platform speed used by the azimuth stages (m/s).
    pub velocity: f64,
    /// Keep the whole range axis instead of cropping around the brightest return.
    pub full_swath: bool,
    /// Caller-supplied centre of the range crop, in compressed range samples.
    pub mid_range_index: Option<usize>,
}

/// Input payload for a processing stage: a 2-D matrix plus its range axis.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub samples: Array2<SarComplex>,
    /// Slant range (m) of every column of `samples`.
    pub range_axis: Vec<f64>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub samples: Array2<SarComplex>,
    pub range_axis: Vec<f64>,
    pub metadata: StageMetadata,
}

impl StageOutput {
    /// Hands this output to the next stage.
    pub fn into_input(self) -> StageInput {
        StageInput {
            samples: self.samples,
            range_axis: self.range_axis,
        }
    }
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub fft_len: Option<usize>,
    pub peak_index: Option<usize>,
    pub notes: Vec<String>,
}

/// Common error type for configuration, waveform, echo and processing failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SarError {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("sampling rate {fs} Hz violates Nyquist, at least {required} Hz required")]
    NyquistViolation { fs: f64, required: f64 },
    #[error("index {index} out of range [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("uninitialized state: {0}")]
    Uninitialized(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type SarResult<T> = Result<T, SarError>;

/// Trait describing the stages of the image-formation chain.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StageConfig) -> SarResult<()>;
    fn execute(&mut self, input: StageInput) -> SarResult<StageOutput>;
    fn cleanup(&mut self);
}
