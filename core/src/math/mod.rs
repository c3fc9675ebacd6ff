pub mod fft;
pub mod interp;
pub mod stats;
pub mod vector;

pub use fft::FftHelper;
pub use interp::UniformCubicSpline;
pub use stats::StatsHelper;
