//! Physical constants shared by the echo model and the processor.

/// Speed of light in vacuum (m/s).
pub const LIGHT_SPEED: f64 = 299_792_458.0;

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Earth gravitational parameter GM (m^3/s^2).
pub const EARTH_GM: f64 = 3.986004418e14;

/// WGS84 semi-major axis (m).
pub const EARTH_RADIUS: f64 = 6_378_137.0;
