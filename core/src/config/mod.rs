pub mod constants;
pub mod system;

pub use system::{SystemConfig, SystemParams};
