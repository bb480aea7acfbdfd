use crate::config::GeneratorConfig;
use crate::discover::find_manifest_files;
use crate::emit::{plan_emission, EmissionPlan, RenderedArtifact, Renderer};
use crate::render::IncludeRenderer;
use crate::validate::ValidatedCollection;
use crate::writer::{ArtifactWriter, WrittenArtifact};
use crate::CoreError;
use boxgen_schema::{parse_manifest_file, Partition, PartitionName};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Batch pipeline: discover, parse, validate, plan, render, write.
///
/// Each stage consumes the complete output of the previous one. Nothing is
/// written until every manifest parsed, the collection validated and every
/// artifact rendered.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

/// Outcome of a successful [`Generator::generate`] run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub manifests: Vec<PathBuf>,
    pub main_partition: Option<PartitionName>,
    pub region_pairs: usize,
    pub artifacts: Vec<WrittenArtifact>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Manifest files under `workspace`, in discovery order.
    pub fn discover(&self, workspace: &Path) -> Result<Vec<PathBuf>, CoreError> {
        Ok(find_manifest_files(workspace, &self.config.manifest_pattern)?)
    }

    /// Parse every manifest; the first malformed one aborts the run.
    pub fn load(&self, manifests: &[PathBuf]) -> Result<Vec<Partition>, CoreError> {
        manifests
            .iter()
            .map(|path| parse_manifest_file(path).map_err(CoreError::from))
            .collect()
    }

    /// Discover, parse and validate the manifests of a workspace.
    pub fn check(&self, workspace: &Path) -> Result<ValidatedCollection, CoreError> {
        info!("scanning {} for partition manifests", workspace.display());
        let manifests = self.discover(workspace)?;
        if manifests.is_empty() {
            warn!(
                "no manifests matching '{}' under {}",
                self.config.manifest_pattern,
                workspace.display()
            );
        }
        let partitions = self.load(&manifests)?;
        let collection = ValidatedCollection::new(partitions)?;
        info!("validated {} partition manifest(s)", collection.len());
        Ok(collection)
    }

    pub fn plan<'a>(&self, collection: &'a ValidatedCollection) -> Result<EmissionPlan<'a>, CoreError> {
        Ok(plan_emission(collection, &self.config)?)
    }

    /// Render every artifact of a validated collection in memory.
    pub fn render(
        &self,
        collection: &ValidatedCollection,
        renderer: &dyn Renderer,
    ) -> Result<Vec<RenderedArtifact>, CoreError> {
        Ok(self.plan(collection)?.render(renderer)?)
    }

    /// Validate `workspace` and write the generated fragments to `output_dir`.
    pub fn generate(&self, workspace: &Path, output_dir: &Path) -> Result<GenerateReport, CoreError> {
        self.generate_with(workspace, output_dir, &IncludeRenderer)
    }

    pub fn generate_with(
        &self,
        workspace: &Path,
        output_dir: &Path,
        renderer: &dyn Renderer,
    ) -> Result<GenerateReport, CoreError> {
        let collection = self.check(workspace)?;
        let plan = self.plan(&collection)?;
        let rendered = plan.render(renderer)?;

        info!(
            "writing {} artifact(s) to {}",
            rendered.len(),
            output_dir.display()
        );
        let artifacts = ArtifactWriter::new(output_dir).write_all(&rendered)?;

        Ok(GenerateReport {
            manifests: collection
                .partitions()
                .iter()
                .map(|p| p.source_path.clone())
                .collect(),
            main_partition: plan.main_partition().map(|ctx| ctx.partition.name.clone()),
            region_pairs: plan.common.region_pairs.len(),
            artifacts,
        })
    }
}
