//! Point-target SAR echo simulation and Range-Doppler image formation.
//!
//! A validated [`SystemConfig`] is shared read-only by the chirp generator,
//! the echo model and the image-formation stages. Raw echoes flow from
//! [`EchoSimulator`] into [`RdaProcessor`], which returns a dB [`SarImage`].

pub mod config;
pub mod echo;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod waveform;

pub use config::{SystemConfig, SystemParams};
pub use echo::{EchoGenerator, EchoSimulator, Target, TargetList};
pub use interface::SarImage;
pub use prelude::{ProcessingStage, SarComplex, SarError, SarResult, StageInput, StageOutput};
pub use processing::RdaProcessor;
pub use waveform::ChirpGenerator;
