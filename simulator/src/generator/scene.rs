use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sarcore::config::constants::{EARTH_RADIUS, LIGHT_SPEED};
use sarcore::math::vector::{self, Vec3};
use sarcore::{SystemConfig, Target, TargetList};
use serde::{Deserialize, Serialize};

/// Regular grid of targets centred on the nadir point at mid-window range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Targets along track.
    pub rows: usize,
    /// Targets across track.
    pub cols: usize,
    /// Spacing between neighbouring targets (m).
    pub spacing: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            spacing: 50.0,
        }
    }
}

/// Uniformly scattered targets drawn from a seeded generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomScatterers {
    pub count: usize,
    pub seed: u64,
    /// Side of the square patch around the scene centre (m).
    pub extent: f64,
    pub max_reflectivity: f64,
}

impl Default for RandomScatterers {
    fn default() -> Self {
        Self {
            count: 0,
            seed: 0,
            extent: 500.0,
            max_reflectivity: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub grid: GridConfig,
    pub random: RandomScatterers,
    /// Extra targets given explicitly in Earth-centred coordinates.
    pub targets: Vec<Target>,
}

/// Local frame at the scene centre: nadir, along-track and across-track axes.
#[derive(Debug, Clone, Copy)]
struct SceneFrame {
    centre: Vec3,
    along: Vec3,
    across: Vec3,
}

impl SceneFrame {
    fn point(&self, along: f64, across: f64) -> Vec3 {
        let offset = vector::add(
            &vector::scale(&self.along, along),
            &vector::scale(&self.across, across),
        );
        vector::add(&self.centre, &offset)
    }
}

/// Slant range whose ambiguous delay falls in the middle of the sampling window,
/// choosing the ambiguity closest to the true orbit height.
pub fn mid_window_range(system: &SystemConfig, height: f64) -> f64 {
    let mid = system.swst() + system.swl() / 2.0;
    let nadir_delay = 2.0 * height / LIGHT_SPEED;
    let order = ((nadir_delay - mid) / system.pri()).round().max(0.0);
    LIGHT_SPEED * (order * system.pri() + mid) / 2.0
}

fn frame(system: &SystemConfig, position: &Vec3, velocity: &Vec3) -> anyhow::Result<SceneFrame> {
    let nadir = vector::normalize(&vector::scale(position, -1.0))
        .context("platform position must be non-zero to place the scene")?;
    let along = vector::normalize(velocity).context("platform velocity must be non-zero")?;
    let across = vector::normalize(&vector::cross(&nadir, &along))
        .context("platform velocity must not be radial")?;
    let height = vector::norm(position) - EARTH_RADIUS;
    let range = mid_window_range(system, height);
    Ok(SceneFrame {
        centre: vector::add(position, &vector::scale(&nadir, range)),
        along,
        across,
    })
}

fn grid_targets(grid: &GridConfig, frame: &SceneFrame) -> anyhow::Result<Vec<Target>> {
    let total = grid.rows * grid.cols;
    let mut targets = Vec::with_capacity(total);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let index = row * grid.cols + col;
            let reflectivity = if total > 1 {
                1.0 + 99.0 * index as f64 / (total - 1) as f64
            } else {
                100.0
            };
            let along = (row as f64 - (grid.rows as f64 - 1.0) / 2.0) * grid.spacing;
            let across = (col as f64 - (grid.cols as f64 - 1.0) / 2.0) * grid.spacing;
            targets.push(Target::new(frame.point(along, across), reflectivity, 0.0)?);
        }
    }
    Ok(targets)
}

fn random_targets(random: &RandomScatterers, frame: &SceneFrame) -> anyhow::Result<Vec<Target>> {
    ensure!(
        random.extent >= 0.0 && random.max_reflectivity >= 1.0,
        "random scatterers need a non-negative extent and max reflectivity >= 1"
    );
    let mut rng = StdRng::seed_from_u64(random.seed);
    let half = random.extent / 2.0;
    (0..random.count)
        .map(|_| {
            let along = if half > 0.0 { rng.gen_range(-half..half) } else { 0.0 };
            let across = if half > 0.0 { rng.gen_range(-half..half) } else { 0.0 };
            let reflectivity = rng.gen_range(1.0..=random.max_reflectivity);
            let phase = rng.gen_range(0.0..360.0);
            Target::new(frame.point(along, across), reflectivity, phase).map_err(Into::into)
        })
        .collect()
}

/// Builds the target list for one run around the platform state `(position, velocity)`.
pub fn build_scene(
    config: &SceneConfig,
    system: &SystemConfig,
    position: &Vec3,
    velocity: &Vec3,
) -> anyhow::Result<TargetList> {
    let mut scene = TargetList::default();
    let needs_frame = config.grid.rows * config.grid.cols > 0 || config.random.count > 0;
    if needs_frame {
        let frame = frame(system, position, velocity)?;
        scene.extend(grid_targets(&config.grid, &frame).context("building target grid")?);
        scene.extend(random_targets(&config.random, &frame).context("drawing random scatterers")?);
    }
    for target in &config.targets {
        let checked = Target::new(target.position, target.reflectivity, target.phase_deg)
            .context("validating explicit target")?;
        scene.push(checked);
    }
    log::info!("scene holds {} targets", scene.len());
    Ok(scene)
}
