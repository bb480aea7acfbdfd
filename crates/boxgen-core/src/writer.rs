use crate::emit::{EmitError, RenderedArtifact};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Mode of generated fragments before the process umask applies.
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// An artifact persisted to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub bytes: usize,
    /// Blake3 hex digest of the contents, for reproducibility checks.
    pub digest: String,
}

/// Writes rendered artifacts into one output directory.
///
/// Writing happens in two phases. Every artifact is first staged in a temp
/// file next to its destination and synced. Only then are the temp files
/// renamed into place. If a rename fails, the artifacts already committed by
/// the same call are rolled back, so the directory holds the complete new set
/// or what it held before.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

struct Staged<'a> {
    artifact: &'a RenderedArtifact,
    dest: PathBuf,
    tmp: NamedTempFile,
}

/// A committed destination and what it held before this run.
struct Committed {
    dest: PathBuf,
    previous: Option<Vec<u8>>,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if needed, then write every artifact or none.
    pub fn write_all(&self, artifacts: &[RenderedArtifact]) -> Result<Vec<WrittenArtifact>, EmitError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| EmitError::CreateOutputDir {
            path: self.dir.clone(),
            source,
        })?;
        let staged = artifacts
            .iter()
            .map(|a| self.stage(a))
            .collect::<Result<Vec<_>, _>>()?;
        self.commit(staged)
    }

    fn stage<'a>(&self, artifact: &'a RenderedArtifact) -> Result<Staged<'a>, EmitError> {
        let dest = self.dir.join(&artifact.file_name);
        let write_err = |source: std::io::Error| EmitError::Write {
            path: dest.clone(),
            source,
        };

        let mut tmp = staging_builder()
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        tmp.write_all(artifact.contents.as_bytes())
            .map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        Ok(Staged {
            artifact,
            dest,
            tmp,
        })
    }

    fn commit(&self, staged: Vec<Staged<'_>>) -> Result<Vec<WrittenArtifact>, EmitError> {
        let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
        let mut written = Vec::with_capacity(staged.len());
        for Staged {
            artifact,
            dest,
            tmp,
        } in staged
        {
            let previous = if dest.is_file() {
                match std::fs::read(&dest) {
                    Ok(bytes) => Some(bytes),
                    Err(source) => {
                        rollback(&committed);
                        return Err(EmitError::Write { path: dest, source });
                    }
                }
            } else {
                None
            };
            if let Err(e) = tmp.persist(&dest) {
                rollback(&committed);
                return Err(EmitError::Write {
                    path: dest,
                    source: e.error,
                });
            }
            debug!("wrote {} ({} bytes)", dest.display(), artifact.contents.len());
            committed.push(Committed {
                dest: dest.clone(),
                previous,
            });
            written.push(WrittenArtifact {
                path: dest,
                bytes: artifact.contents.len(),
                digest: blake3::hash(artifact.contents.as_bytes())
                    .to_hex()
                    .to_string(),
            });
        }
        Ok(written)
    }
}

/// Undo committed artifacts, newest first. Failures are logged; the original
/// write error is what the caller reports.
fn rollback(committed: &[Committed]) {
    for entry in committed.iter().rev() {
        let restored = match &entry.previous {
            Some(bytes) => std::fs::write(&entry.dest, bytes),
            None => std::fs::remove_file(&entry.dest),
        };
        match restored {
            Ok(()) => debug!("rolled back {}", entry.dest.display()),
            Err(e) => warn!("failed to roll back {}: {e}", entry.dest.display()),
        }
    }
}

fn staging_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".boxgen-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(ARTIFACT_MODE));
    }
    builder
}
