//! Collection validation and code emission for boxgen.
//!
//! This crate takes the partitions parsed by `boxgen-schema` and runs the
//! cross-manifest checks (unique names, SFIDs and IRQs; resolvable extern
//! SFIDs), enumerates the MMIO region pairs the generated code must check for
//! overlap, and renders and writes the common and per-partition fragments.
//! `Generator` is the entry point tying discovery, parsing, validation and
//! emission into one run that either writes every artifact or none.

pub mod config;
pub mod discover;
pub mod emit;
pub mod engine;
pub mod regions;
pub mod render;
pub mod template;
pub mod validate;
pub mod writer;

pub use config::{ConfigError, GeneratorConfig, CONFIG_FILE_NAME};
pub use discover::{find_manifest_files, DiscoveryError};
pub use emit::{
    plan_emission, CommonContext, EmissionPlan, EmitError, PartitionContext, RenderedArtifact,
    Renderer,
};
pub use engine::{GenerateReport, Generator};
pub use regions::{pool_regions, region_pairs, unordered_pairs, PooledRegion, RegionPair};
pub use render::IncludeRenderer;
pub use template::{TemplateRenderer, BOX_TEMPLATE, COMMON_TEMPLATE, MAIN_BOX_TEMPLATE};
pub use validate::{
    validate_collection, Collision, UnresolvedExtern, ValidatedCollection, ValidationError,
};
pub use writer::{ArtifactWriter, WrittenArtifact};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] boxgen_schema::ManifestError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}
