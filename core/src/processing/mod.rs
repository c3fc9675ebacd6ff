pub mod azimuth;
pub mod doppler;
pub mod range;
pub mod rcmc;
pub mod rda;

pub use azimuth::AzimuthCompressionStage;
pub use doppler::AzimuthFftStage;
pub use range::RangeCompressionStage;
pub use rcmc::RcmcStage;
pub use rda::RdaProcessor;
