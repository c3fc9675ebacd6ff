use crate::math::vector::Vec3;

/// Strategy for the two-way atmospheric attenuation applied to a pulse.
pub trait AtmosphericLossModel: Send + Sync + std::fmt::Debug {
    /// Linear loss factor (≥ 1 attenuates) for the given boresight and platform position.
    fn loss(&self, boresight: &Vec3, platform_position: &Vec3) -> f64;
}

/// Lossless atmosphere; a placeholder until a physical model is plugged in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoAtmosphericLoss;

impl AtmosphericLossModel for NoAtmosphericLoss {
    fn loss(&self, _boresight: &Vec3, _platform_position: &Vec3) -> f64 {
        1.0
    }
}
