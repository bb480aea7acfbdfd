use super::{json_pretty, load_generator, resolve_workspace, EXIT_SUCCESS};
use std::path::Path;

pub fn run(config: Option<&Path>, workspace: &Path) -> Result<u8, String> {
    let workspace = resolve_workspace(workspace)?;
    let generator = load_generator(config, &workspace)?;
    let collection = generator.check(&workspace).map_err(|e| e.to_string())?;
    let plan = generator.plan(&collection).map_err(|e| e.to_string())?;
    println!("{}", json_pretty(&plan)?);
    Ok(EXIT_SUCCESS)
}
