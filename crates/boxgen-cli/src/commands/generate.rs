use super::{
    check_output_dir, finish_spinner, json_pretty, load_generator, resolve_workspace, spinner,
    EXIT_SUCCESS,
};
use boxgen_core::{CoreError, IncludeRenderer, Renderer, TemplateRenderer};
use std::path::Path;

pub fn run(
    config: Option<&Path>,
    workspace: &Path,
    output_dir: &Path,
    templates: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let workspace = resolve_workspace(workspace)?;
    check_output_dir(output_dir)?;
    let generator = load_generator(config, &workspace)?;
    let renderer: Box<dyn Renderer> = match templates {
        Some(dir) => Box::new(
            TemplateRenderer::from_dir(dir).map_err(|e| CoreError::from(e).to_string())?,
        ),
        None => Box::new(IncludeRenderer),
    };

    let pb = if json {
        None
    } else {
        Some(spinner(&format!("generating partition code from {}", workspace.display())))
    };
    let report = match generator.generate_with(&workspace, output_dir, renderer.as_ref()) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                finish_spinner(pb, true, &format!("{} artifact(s) rendered", r.artifacts.len()));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                finish_spinner(pb, false, "nothing written");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "status": "generated",
            "manifests": report.manifests,
            "main_partition": report.main_partition,
            "region_pairs": report.region_pairs,
            "artifacts": report.artifacts,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "generated {} artifact(s) from {} manifest(s) into {}",
            report.artifacts.len(),
            report.manifests.len(),
            output_dir.display()
        );
        match &report.main_partition {
            Some(name) => println!("main box:     {name}"),
            None => println!("main box:     (none)"),
        }
        println!("region pairs: {}", report.region_pairs);
        for artifact in &report.artifacts {
            let short = artifact.digest.get(..12).unwrap_or(&artifact.digest);
            println!(
                "  {:<40} {:>8} B  {short}",
                artifact.path.display(),
                artifact.bytes
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
