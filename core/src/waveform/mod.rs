pub mod chirp;

pub use chirp::{ChirpGenerator, ChirpSet, DEFAULT_CHIRP_SET_SIZE};
