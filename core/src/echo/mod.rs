pub mod antenna;
pub mod generator;
pub mod propagation;
pub mod simulator;
pub mod target;

pub use antenna::{BeamGainModel, BeamGeometry, ElevationGaussianBeam, TwoAxisGaussianBeam};
pub use generator::{DelayInterpolation, EchoGenerator};
pub use propagation::{AtmosphericLossModel, NoAtmosphericLoss};
pub use simulator::EchoSimulator;
pub use target::{Target, TargetList};
