use super::EXIT_SUCCESS;
use clap::{Command, CommandFactory};
use std::path::{Path, PathBuf};

/// Render `boxgen.1` plus one `boxgen-<command>.1` page per subcommand.
pub fn run<C: CommandFactory>(dir: &Path) -> Result<u8, String> {
    let written = write_pages(&C::command(), dir)?;
    println!(
        "{} man page(s) for {} written to {}",
        written.len(),
        C::command().get_name(),
        dir.display()
    );
    Ok(EXIT_SUCCESS)
}

fn write_pages(cmd: &Command, dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("dir: '{}' cannot be created: {e}", dir.display()))?;
    let root = cmd.get_name().to_owned();
    let mut pages = vec![(root.clone(), cmd.clone())];
    pages.extend(
        cmd.get_subcommands()
            .filter(|sub| sub.get_name() != "help")
            .map(|sub| (format!("{root}-{}", sub.get_name()), sub.clone())),
    );

    let mut written = Vec::with_capacity(pages.len());
    for (page, command) in pages {
        let mut buf = Vec::new();
        clap_mangen::Man::new(command)
            .render(&mut buf)
            .map_err(|e| format!("man page '{page}' could not be rendered: {e}"))?;
        let path = dir.join(format!("{page}.1"));
        std::fs::write(&path, &buf)
            .map_err(|e| format!("man page '{}' could not be written: {e}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
