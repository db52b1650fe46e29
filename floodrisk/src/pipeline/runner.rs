//! Job execution.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{LayerRole, PipelineError, Stage};
use crate::config::{JobConfig, JobDescriptor};
use crate::crs::{reproject, CrsError};
use crate::layer::{load_layer, write_layer, VectorFormat};
use crate::map::{MapLayers, MapRenderer, RenderSummary};
use crate::overlay::{intersect, CollisionPolicy};
use crate::report::print_report;

/// Which configured jobs to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSelection {
    /// Only the last configured job.
    #[default]
    Last,
    /// Every job in order, stopping at the first failure.
    All,
}

/// Options for [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub selection: JobSelection,
    /// Draw basemap tiles (still subject to the config's `map.basemap`).
    pub basemap: bool,
    /// Overrides the config's `collision` policy when set.
    pub policy: Option<CollisionPolicy>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            selection: JobSelection::default(),
            basemap: true,
            policy: None,
        }
    }
}

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Number of at-risk features written and reported.
    pub at_risk_count: usize,
    pub vector_path: PathBuf,
    pub image_path: PathBuf,
    pub render: RenderSummary,
}

/// Pick the jobs to run from the configured list.
pub fn select_jobs(
    jobs: &[JobDescriptor],
    selection: JobSelection,
) -> Result<&[JobDescriptor], PipelineError> {
    if jobs.is_empty() {
        return Err(PipelineError::NoJobs);
    }
    match selection {
        JobSelection::Last => Ok(&jobs[jobs.len() - 1..]),
        JobSelection::All => Ok(jobs),
    }
}

/// Load the configuration at `config_path` and run the selected jobs,
/// writing report lines to `out`.
pub fn run<W: Write>(
    config_path: &Path,
    options: &RunOptions,
    out: &mut W,
) -> Result<Vec<JobOutcome>, PipelineError> {
    info!(stage = %Stage::Init, config = %config_path.display(), "Starting");

    let mut config = JobConfig::load(config_path)?;
    let jobs = select_jobs(&config.inputs, options.selection)?.to_vec();
    info!(
        stage = %Stage::ConfigLoaded,
        configured = config.inputs.len(),
        selected = jobs.len(),
        "Configuration loaded"
    );

    if !options.basemap {
        config.map.basemap = false;
    }
    let renderer = MapRenderer::from_settings(&config.map)?;
    let policy = options.policy.unwrap_or(config.collision);
    debug!(?policy, "Attribute collision policy");
    let runner = JobRunner::new(renderer).with_policy(policy);

    jobs.iter().map(|job| runner.run(job, out)).collect()
}

/// Runs jobs against one map renderer.
pub struct JobRunner {
    renderer: MapRenderer,
    policy: CollisionPolicy,
}

impl JobRunner {
    pub fn new(renderer: MapRenderer) -> Self {
        Self {
            renderer,
            policy: CollisionPolicy::default(),
        }
    }

    /// Set how attribute name collisions are resolved in the overlay.
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one job from loading its layers to rendering its map.
    ///
    /// The report line goes to `out`. Output files are written relative to
    /// the working directory unless the job's title is an absolute path.
    pub fn run<W: Write>(
        &self,
        job: &JobDescriptor,
        out: &mut W,
    ) -> Result<JobOutcome, PipelineError> {
        let title = job.plot_title.as_str();

        let risk = load_layer(Path::new(&job.risk_layer_path)).map_err(|source| {
            PipelineError::Load {
                role: LayerRole::Risk,
                source,
            }
        })?;
        let assets = load_layer(Path::new(&job.asset_layer_path)).map_err(|source| {
            PipelineError::Load {
                role: LayerRole::Assets,
                source,
            }
        })?;
        info!(
            stage = %Stage::LayersLoaded,
            title,
            risk_features = risk.len(),
            asset_features = assets.len(),
            "Layers loaded"
        );

        // The risk layer's CRS is the target for the asset layer
        let target = risk.crs.ok_or(PipelineError::Crs {
            role: LayerRole::Risk,
            source: CrsError::UndefinedTarget,
        })?;
        let assets = reproject(&assets, target).map_err(|source| PipelineError::Crs {
            role: LayerRole::Assets,
            source,
        })?;
        info!(
            stage = %Stage::Normalized,
            title,
            crs = %target,
            "Asset layer normalized"
        );

        let at_risk = intersect(&assets, &risk, self.policy)?;
        let count = at_risk.len();
        info!(stage = %Stage::Overlaid, title, at_risk = count, "Overlay complete");

        let vector_path = job.vector_output_path();
        write_layer(&at_risk, &vector_path, VectorFormat::GeoJson)
            .map_err(PipelineError::Write)?;
        info!(
            stage = %Stage::Written,
            title,
            path = %vector_path.display(),
            "At-risk layer written"
        );

        print_report(out, &job.command_read_out, count).map_err(PipelineError::Report)?;
        debug!(stage = %Stage::Reported, title, count, "Report printed");

        let image_path = job.image_output_path();
        let render = self.renderer.render(
            &MapLayers {
                risk: &risk,
                assets: &assets,
                at_risk: &at_risk,
                title,
            },
            &image_path,
        )?;
        info!(
            stage = %Stage::Rendered,
            title,
            path = %image_path.display(),
            "Map rendered"
        );

        info!(stage = %Stage::Done, title, at_risk = count, "Job complete");
        Ok(JobOutcome {
            at_risk_count: count,
            vector_path,
            image_path,
            render,
        })
    }
}
