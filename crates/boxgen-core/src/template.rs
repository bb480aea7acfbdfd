//! Renderer backed by editable Jinja templates.
//!
//! A template directory holds `common_configuration.tpl`,
//! `main_box_configuration.tpl` and `box_configuration.tpl`. Each is rendered
//! with the serialized emission context: the common template sees
//! `region_pairs` and `partition_count`, the partition templates see the
//! partition fields plus `is_main` and `artifact_name`. Blocks are trimmed the
//! way Jinja's `trim_blocks` / `lstrip_blocks` do, and an undefined variable is
//! an error rather than an empty string.
//!
//! Two filters are registered: `hex` (`4096` becomes `0x1000`) and `c_string`
//! (quotes and escapes a value as a C string literal).

use crate::emit::{CommonContext, EmitError, PartitionContext, Renderer};
use crate::render::c_string;
use minijinja::{Environment, UndefinedBehavior};
use std::path::Path;
use tracing::debug;

pub const COMMON_TEMPLATE: &str = "common_configuration.tpl";
pub const MAIN_BOX_TEMPLATE: &str = "main_box_configuration.tpl";
pub const BOX_TEMPLATE: &str = "box_configuration.tpl";

/// Renders artifacts through the three partition templates.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Load the three templates from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, EmitError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| EmitError::TemplateRead { path, source })
        };
        let renderer = Self::from_sources(
            read(COMMON_TEMPLATE)?,
            read(MAIN_BOX_TEMPLATE)?,
            read(BOX_TEMPLATE)?,
        )?;
        debug!("loaded partition templates from {}", dir.display());
        Ok(renderer)
    }

    /// Compile templates given as text. Syntax errors surface here, not at render time.
    pub fn from_sources(common: String, main_box: String, partition: String) -> Result<Self, EmitError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_filter("hex", hex);
        env.add_filter("c_string", |value: String| c_string(&value));
        env.add_template_owned(COMMON_TEMPLATE, common)?;
        env.add_template_owned(MAIN_BOX_TEMPLATE, main_box)?;
        env.add_template_owned(BOX_TEMPLATE, partition)?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: impl serde::Serialize) -> Result<String, EmitError> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

impl Renderer for TemplateRenderer {
    fn render_common(&self, ctx: &CommonContext<'_>) -> Result<String, EmitError> {
        self.render(COMMON_TEMPLATE, ctx)
    }

    fn render_main(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError> {
        self.render(MAIN_BOX_TEMPLATE, ctx)
    }

    fn render_partition(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError> {
        self.render(BOX_TEMPLATE, ctx)
    }
}

fn hex(value: u64) -> String {
    format!("{value:#x}")
}
