use crate::workflow::runner::WorkflowResult;
use anyhow::Context;
use sarcore::interface::{ImageSummary, PulseRecord, RawDataAncillary};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON summary written at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub ancillary: RawDataAncillary,
    pub pulses: usize,
    pub samples_per_pulse: usize,
    pub target_count: usize,
    pub platform_speed: f64,
    pub echo_rms: f64,
    pub echo_nonzero: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_pulse: Option<PulseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pulse: Option<PulseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cropped: Option<ImageSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_swath: Option<ImageSummary>,
}

impl SimulationReport {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let records = result.track.pulse_records();
        Self {
            ancillary: result.ancillary.clone(),
            pulses: result.echo_shape.0,
            samples_per_pulse: result.echo_shape.1,
            target_count: result.target_count,
            platform_speed: result.platform_speed,
            echo_rms: result.echo_rms,
            echo_nonzero: result.echo_nonzero,
            first_pulse: records.first().copied(),
            last_pulse: records.last().copied(),
            cropped: result.cropped_summary(),
            full_swath: result.full_swath_summary(),
        }
    }

    /// One-line digest for the console.
    pub fn headline(&self) -> String {
        let peak = |summary: &Option<ImageSummary>| {
            summary
                .as_ref()
                .map(|s| format!("{:.1} dB @ {:.1} m", s.max_db, s.peak_range))
                .unwrap_or_else(|| "-".to_string())
        };
        format!(
            "{} targets, echo {}x{} ({} non-zero), cropped peak {}, full peak {}",
            self.target_count,
            self.pulses,
            self.samples_per_pulse,
            self.echo_nonzero,
            peak(&self.cropped),
            peak(&self.full_swath)
        )
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("writing report {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing report {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::{ProcessingMode, WorkflowConfig};
    use crate::workflow::runner::Runner;
    use sarcore::SystemParams;

    fn report() -> SimulationReport {
        let mut cfg = WorkflowConfig::from_args(8, 1, 0, 0);
        cfg.system = SystemParams {
            bw: 30e6,
            fs: 60e6,
            taup: 2e-6,
            swl: 20e-6,
            ..Default::default()
        };
        cfg.trajectory.orbit_height = Some(5e3);
        cfg.processing.mode = ProcessingMode::Cropped;
        SimulationReport::from_result(&Runner::new(cfg).execute().unwrap())
    }

    #[test]
    fn report_summarises_run() {
        let report = report();
        assert_eq!(report.pulses, 8);
        assert_eq!(report.target_count, 1);
        assert!(report.cropped.is_some());
        assert!(report.full_swath.is_none());
        assert!(report.headline().contains("full peak -"));
        assert_eq!(report.first_pulse.unwrap().time, 0.0);
    }

    #[test]
    fn report_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        report().write_json(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pulses"], 8);
        assert_eq!(value["ancillary"]["beam_id"], "Beam0000");
        assert!(value.get("full_swath").is_none());
    }
}
