use super::{colorize_role, json_pretty, load_generator, resolve_workspace, EXIT_SUCCESS};
use std::path::Path;

pub fn run(config: Option<&Path>, workspace: &Path, json: bool) -> Result<u8, String> {
    let workspace = resolve_workspace(workspace)?;
    let generator = load_generator(config, &workspace)?;
    let collection = generator.check(&workspace).map_err(|e| e.to_string())?;
    let cfg = generator.config();

    if json {
        let partitions: Vec<_> = collection
            .partitions()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "manifest": p.source_path,
                    "main": cfg.is_main_manifest(p),
                    "mmio_regions": p.mmio_regions.len(),
                    "sfids": p.sfids,
                    "extern_sfids": p.extern_sfids,
                    "irqs": p.irqs,
                })
            })
            .collect();
        let payload = serde_json::json!({
            "status": "ok",
            "partitions": partitions,
        });
        println!("{}", json_pretty(&payload)?);
    } else if collection.is_empty() {
        println!("no partition manifests found");
    } else {
        println!("{:<20} {:<6} {:>6} {:>6} MANIFEST", "NAME", "ROLE", "MMIO", "IRQS");
        for p in collection.partitions() {
            let role = colorize_role(cfg.is_main_manifest(p));
            println!(
                "{:<20} {:<6} {:>6} {:>6} {}",
                p.name,
                role,
                p.mmio_regions.len(),
                p.irqs.len(),
                p.source_path.display()
            );
        }
        println!("{} partition(s) valid", collection.len());
    }
    Ok(EXIT_SUCCESS)
}
