use globset::Glob;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid manifest pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to scan workspace: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Find every manifest below `start_dir` whose file name matches `pattern`.
///
/// Directory entries are visited sorted by file name, so the returned order is
/// stable across runs and machines.
pub fn find_manifest_files(start_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let matcher = Glob::new(pattern)
        .map_err(|source| DiscoveryError::Pattern {
            pattern: pattern.to_owned(),
            source,
        })?
        .compile_matcher();

    let mut manifests = Vec::new();
    for entry in WalkDir::new(start_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            trace!("found manifest {}", entry.path().display());
            manifests.push(entry.into_path());
        }
    }
    debug!(
        "discovered {} manifest(s) under {}",
        manifests.len(),
        start_dir.display()
    );
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_matching_files_recursively_in_stable_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("box_main.xml"));
        touch(&dir.path().join("led/box_led2.xml"));
        touch(&dir.path().join("led/box_led1.xml"));
        touch(&dir.path().join("led/led1.cpp"));
        touch(&dir.path().join("notes/box_notes.txt"));
        touch(&dir.path().join("notes/mybox_x.xml"));

        let found = find_manifest_files(dir.path(), "box_*.xml").unwrap();
        let relative: Vec<PathBuf> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("box_main.xml"),
                PathBuf::from("led/box_led1.xml"),
                PathBuf::from("led/box_led2.xml"),
            ]
        );

        assert_eq!(found, find_manifest_files(dir.path(), "box_*.xml").unwrap());
    }

    #[test]
    fn directories_matching_the_pattern_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("box_dir.xml")).unwrap();
        assert!(find_manifest_files(dir.path(), "box_*.xml").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_manifest_files(dir.path(), "box_[.xml").unwrap_err();
        assert!(matches!(err, DiscoveryError::Pattern { .. }));
    }

    #[test]
    fn missing_start_dir_is_a_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_manifest_files(&dir.path().join("absent"), "box_*.xml").unwrap_err();
        assert!(matches!(err, DiscoveryError::Walk(_)));
    }
}
