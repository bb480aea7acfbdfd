//! Data handed from the validated model to the rendering stage.
//!
//! A plan holds one common context (the pooled region pairs) and one context
//! per partition in discovery order. Rendering is behind [`Renderer`]: the built-in
//! [`IncludeRenderer`](crate::render::IncludeRenderer) and the file-backed
//! [`TemplateRenderer`](crate::template::TemplateRenderer) consume the same
//! serializable contexts.

use crate::config::GeneratorConfig;
use crate::regions::{region_pairs, RegionPair};
use crate::validate::ValidatedCollection;
use boxgen_schema::Partition;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("render error: {0}")]
    Render(#[from] std::fmt::Error),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("failed to read template '{}': {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact name '{0}' is not a plain file name")]
    InvalidArtifactName(String),
    #[error("artifact name '{0}' is produced more than once")]
    ArtifactNameClash(String),
    #[error("failed to create output directory '{}': {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write artifact '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Input of the common artifact. Independent of any single partition.
#[derive(Debug, Clone, Serialize)]
pub struct CommonContext<'a> {
    pub region_pairs: Vec<RegionPair<'a>>,
    pub partition_count: usize,
}

/// Input of one per-partition artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionContext<'a> {
    /// Selects the main-box template; derived from the manifest file name once.
    pub is_main: bool,
    pub artifact_name: String,
    #[serde(flatten)]
    pub partition: &'a Partition,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmissionPlan<'a> {
    pub common_artifact: String,
    pub common: CommonContext<'a>,
    pub partitions: Vec<PartitionContext<'a>>,
}

/// Rendered text of one artifact, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub contents: String,
}

/// Turns emission contexts into artifact text.
pub trait Renderer {
    fn render_common(&self, ctx: &CommonContext<'_>) -> Result<String, EmitError>;
    fn render_main(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError>;
    fn render_partition(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError>;
}

/// Build the emission plan for a validated collection.
pub fn plan_emission<'a>(
    collection: &'a ValidatedCollection,
    config: &GeneratorConfig,
) -> Result<EmissionPlan<'a>, EmitError> {
    check_artifact_name(&config.common_artifact)?;
    let mut names: HashSet<String> = HashSet::new();
    names.insert(config.common_artifact.clone());

    let mut partitions = Vec::with_capacity(collection.len());
    for partition in collection.partitions() {
        let artifact_name = config.partition_artifact_name(&partition.name);
        check_artifact_name(&artifact_name)?;
        if !names.insert(artifact_name.clone()) {
            return Err(EmitError::ArtifactNameClash(artifact_name));
        }
        partitions.push(PartitionContext {
            is_main: config.is_main_manifest(partition),
            artifact_name,
            partition,
        });
    }

    let main_count = partitions.iter().filter(|ctx| ctx.is_main).count();
    if main_count == 0 && !partitions.is_empty() {
        warn!("no {} found among the manifests", config.main_manifest);
    } else if main_count > 1 {
        warn!(
            "{main_count} manifests are named {}; each is rendered as a main box",
            config.main_manifest
        );
    }

    Ok(EmissionPlan {
        common_artifact: config.common_artifact.clone(),
        common: CommonContext {
            region_pairs: region_pairs(collection.partitions()),
            partition_count: collection.len(),
        },
        partitions,
    })
}

impl EmissionPlan<'_> {
    /// Render every artifact in memory: the common one first, then one per
    /// partition in plan order.
    pub fn render(&self, renderer: &dyn Renderer) -> Result<Vec<RenderedArtifact>, EmitError> {
        let mut artifacts = Vec::with_capacity(self.partitions.len() + 1);
        artifacts.push(RenderedArtifact {
            file_name: self.common_artifact.clone(),
            contents: renderer.render_common(&self.common)?,
        });
        for ctx in &self.partitions {
            let contents = if ctx.is_main {
                renderer.render_main(ctx)?
            } else {
                renderer.render_partition(ctx)?
            };
            artifacts.push(RenderedArtifact {
                file_name: ctx.artifact_name.clone(),
                contents,
            });
        }
        Ok(artifacts)
    }

    pub fn main_partition(&self) -> Option<&PartitionContext<'_>> {
        self.partitions.iter().find(|ctx| ctx.is_main)
    }
}

fn check_artifact_name(name: &str) -> Result<(), EmitError> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control);
    if plain {
        Ok(())
    } else {
        Err(EmitError::InvalidArtifactName(name.to_owned()))
    }
}
