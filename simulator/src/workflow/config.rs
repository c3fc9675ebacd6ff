use crate::generator::scene::SceneConfig;
use crate::generator::trajectory::TrajectoryConfig;
use anyhow::Context;
use sarcore::{SystemConfig, SystemParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Which images the runner forms from the simulated echo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    Cropped,
    FullSwath,
    #[default]
    Both,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub mode: ProcessingMode,
    /// Span kept below the image peak (dB).
    pub dynamic_range: f64,
    pub normalize: bool,
    /// Crop centre in compressed range samples; the brightest return when unset.
    pub mid_range_index: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Both,
            dynamic_range: 50.0,
            normalize: false,
            mid_range_index: None,
        }
    }
}

/// Complete description of one simulation run, as read from YAML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub system: SystemParams,
    pub trajectory: TrajectoryConfig,
    pub scene: SceneConfig,
    pub processing: ProcessingConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Default scenario with the command-line knobs applied.
    pub fn from_args(num_pulses: usize, grid_size: usize, random_targets: usize, seed: u64) -> Self {
        let mut config = Self::default();
        config.trajectory.num_pulses = num_pulses;
        config.scene.grid.rows = grid_size;
        config.scene.grid.cols = grid_size;
        config.scene.random.count = random_targets;
        config.scene.random.seed = seed;
        config
    }

    pub fn system_config(&self) -> anyhow::Result<Arc<SystemConfig>> {
        let system = SystemConfig::new(self.system.clone()).context("validating system parameters")?;
        Ok(Arc::new(system))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_track_and_scene() {
        let cfg = WorkflowConfig::from_args(32, 3, 5, 11);
        assert_eq!(cfg.trajectory.num_pulses, 32);
        assert_eq!(cfg.scene.grid.rows * cfg.scene.grid.cols, 9);
        assert_eq!(cfg.scene.random.seed, 11);
        assert_eq!(cfg.processing.mode, ProcessingMode::Both);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"system:\n  bw: 60.0e6\n  fs: 150.0e6\n  beam_id: Beam0042\n\
trajectory:\n  num_pulses: 16\n\
scene:\n  targets:\n    - position: [6895137.0, 0.0, 0.0]\n      reflectivity: 10.0\n\
processing:\n  mode: full_swath\n  dynamic_range: 30.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.system.bw, 60e6);
        assert_eq!(cfg.system.fc, 5.4e9);
        assert_eq!(cfg.system.beam_id, "Beam0042");
        assert_eq!(cfg.trajectory.num_pulses, 16);
        assert_eq!(cfg.scene.targets.len(), 1);
        assert_eq!(cfg.scene.targets[0].phase_deg, 0.0);
        assert_eq!(cfg.processing.mode, ProcessingMode::FullSwath);
        assert!(cfg.system_config().is_ok());
    }

    #[test]
    fn empty_yaml_is_default_scenario() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{}\n").unwrap();
        let cfg = WorkflowConfig::load(temp.path()).unwrap();
        assert_eq!(cfg, WorkflowConfig::default());
    }

    #[test]
    fn nyquist_violation_surfaces_as_error() {
        let mut cfg = WorkflowConfig::default();
        cfg.system.fs = cfg.system.bw;
        let err = cfg.system_config().unwrap_err();
        assert!(format!("{:#}", err).contains("Nyquist"));
    }
}
