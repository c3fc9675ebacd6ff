use crate::math::vector::Vec3;
use crate::prelude::{SarError, SarResult};
use serde::{Deserialize, Serialize};

/// A point scatterer in the Earth-centred frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Position (m).
    pub position: Vec3,
    /// Radar cross-section (m²).
    pub reflectivity: f64,
    /// Phase offset (deg).
    #[serde(default)]
    pub phase_deg: f64,
}

impl Target {
    pub fn new(position: Vec3, reflectivity: f64, phase_deg: f64) -> SarResult<Self> {
        if !(reflectivity.is_finite() && reflectivity >= 0.0) {
            return Err(SarError::InvalidInput(format!(
                "target reflectivity must be finite and non-negative, got {}",
                reflectivity
            )));
        }
        if !position.iter().all(|v| v.is_finite()) || !phase_deg.is_finite() {
            return Err(SarError::InvalidInput(
                "target position and phase must be finite".into(),
            ));
        }
        Ok(Self {
            position,
            reflectivity,
            phase_deg,
        })
    }

    /// Flat `[x, y, z, reflectivity, phase_deg]` row.
    pub fn to_row(&self) -> [f64; 5] {
        [
            self.position[0],
            self.position[1],
            self.position[2],
            self.reflectivity,
            self.phase_deg,
        ]
    }
}

/// Ordered collection of targets; empty lists are valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetList {
    targets: Vec<Target>,
}

impl TargetList {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    pub fn push(&mut self, target: Target) {
        self.targets.push(target);
    }

    pub fn extend<I: IntoIterator<Item = Target>>(&mut self, targets: I) {
        self.targets.extend(targets);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }

    pub fn to_rows(&self) -> Vec<[f64; 5]> {
        self.targets.iter().map(Target::to_row).collect()
    }

    /// Builds a list from `[x, y, z, reflectivity, phase_deg]` rows, validating each.
    pub fn from_rows(rows: &[[f64; 5]]) -> SarResult<Self> {
        rows.iter()
            .map(|row| Target::new([row[0], row[1], row[2]], row[3], row[4]))
            .collect::<SarResult<Vec<_>>>()
            .map(Self::new)
    }
}

impl FromIterator<Target> for TargetList {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TargetList {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
