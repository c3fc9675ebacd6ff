//! Data shapes exchanged with the surrounding archive, transport and display layers.

pub mod image;
pub mod raw_data;

pub use image::{ImageSummary, SarImage};
pub use raw_data::{to_interleaved_f32, PulseRecord, RawDataAncillary};
