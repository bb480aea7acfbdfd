use crate::number::{parse_number, parse_number_u32, NumberError};
use crate::partition::{GlobalHeap, MmioRegion, Partition};
use crate::types::{PartitionName, Sfid};
use roxmltree::{Document, Node, ParsingOptions};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the root element of every partition manifest.
pub const ROOT_ELEMENT: &str = "partition";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest '{}': {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("manifest '{}' does not follow the partition schema: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },
    #[error("{field} in '{}' must be a number, '{raw}' given ({source})", path.display())]
    InvalidNumber {
        field: &'static str,
        path: PathBuf,
        raw: String,
        #[source]
        source: NumberError,
    },
    #[error("the source file '{}' mentioned in '{}' doesn't exist", file.display(), manifest.display())]
    MissingSourceFile { file: PathBuf, manifest: PathBuf },
}

impl ManifestError {
    /// Manifest the error originated from.
    pub fn manifest_path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Xml { path, .. }
            | Self::Schema { path, .. }
            | Self::InvalidNumber { path, .. } => path,
            Self::MissingSourceFile { manifest, .. } => manifest,
        }
    }
}

/// Read and parse the manifest at `path`.
pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Partition, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest_str(&content, path)
}

/// Parse manifest text. `path` names the document in diagnostics, and its
/// parent directory is the base for the `<src>` file existence checks.
pub fn parse_manifest_str(input: &str, path: &Path) -> Result<Partition, ManifestError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(input, options).map_err(|source| ManifestError::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    let partition = ManifestReader { path }.read(doc.root_element())?;
    debug!(
        "parsed partition '{}' from {} ({} regions, {} sfids, {} irqs)",
        partition.name,
        path.display(),
        partition.mmio_regions.len(),
        partition.sfids.len(),
        partition.irqs.len()
    );
    Ok(partition)
}

struct ManifestReader<'p> {
    path: &'p Path,
}

impl ManifestReader<'_> {
    fn read(&self, root: Node<'_, '_>) -> Result<Partition, ManifestError> {
        let root_tag = root.tag_name().name();
        if root_tag != ROOT_ELEMENT {
            return Err(self.schema(format!(
                "root element must be <{ROOT_ELEMENT}>, found <{root_tag}>"
            )));
        }
        let name = self.required_attr(root, "name")?;
        let priority = self.required_attr(root, "priority")?;

        let mut entry_point = None;
        let mut stack_size = None;
        let mut heap_size = None;
        let mut context_structure_name = None;
        let mut mmio_regions = None;
        let mut src_files = None;
        let mut spm_status = None;
        let mut global_heap = None;
        let mut sfids = Vec::new();
        let mut extern_sfids = Vec::new();
        let mut irqs = Vec::new();

        for child in root.children().filter(Node::is_element) {
            let tag = child.tag_name().name();
            match tag {
                "code" => {
                    let entry = self.required_attr(child, "entry_point")?.trim().to_owned();
                    self.set_once(&mut entry_point, entry, tag)?;
                }
                "stack" => {
                    let size = self.number_attr(child, "size", "Stack size")?;
                    self.set_once(&mut stack_size, size, tag)?;
                }
                "heap" => {
                    let size = self.number_attr(child, "size", "Heap size")?;
                    self.set_once(&mut heap_size, size, tag)?;
                }
                "context_structure_name" => {
                    let text = self.text(child)?;
                    self.set_once(&mut context_structure_name, text, tag)?;
                }
                "mmio" => {
                    let regions = self.read_mmio(child)?;
                    self.set_once(&mut mmio_regions, regions, tag)?;
                }
                "sfid" => sfids.push(Sfid::new(self.text(child)?)),
                "extern_sfid" => extern_sfids.push(Sfid::new(self.text(child)?)),
                "irq_num" => irqs.push(self.irq(child)?),
                "src" => {
                    let files = self.read_src(child)?;
                    self.set_once(&mut src_files, files, tag)?;
                }
                "spm_status" => {
                    let text = self.text(child)?;
                    self.set_once(&mut spm_status, text, tag)?;
                }
                "global_heap" => {
                    let heap = self.read_global_heap(child)?;
                    self.set_once(&mut global_heap, heap, tag)?;
                }
                other => return Err(self.schema(format!("unexpected element <{other}>"))),
            }
        }

        Ok(Partition {
            source_path: self.path.to_path_buf(),
            name: PartitionName::new(name.trim()),
            priority: priority.trim().to_owned(),
            entry_point: entry_point.ok_or_else(|| self.missing("code"))?,
            stack_size: stack_size.ok_or_else(|| self.missing("stack"))?,
            heap_size: heap_size.ok_or_else(|| self.missing("heap"))?,
            context_structure_name: context_structure_name
                .ok_or_else(|| self.missing("context_structure_name"))?,
            mmio_regions: mmio_regions.unwrap_or_default(),
            sfids,
            extern_sfids,
            src_files: src_files.ok_or_else(|| self.missing("src"))?,
            irqs,
            spm_status,
            global_heap: global_heap.flatten(),
        })
    }

    /// Regions keep document order; a `size` attribute makes a region numeric.
    fn read_mmio(&self, mmio: Node<'_, '_>) -> Result<Vec<MmioRegion>, ManifestError> {
        let mut regions = Vec::new();
        for region in mmio.children().filter(Node::is_element) {
            let tag = region.tag_name().name();
            if tag != "mmioregion" && tag != "mmioregion_named" {
                return Err(self.schema(format!("unexpected element <{tag}> inside <mmio>")));
            }
            let base = self.required_attr(region, "base")?;
            let permissions = self.required_attr(region, "permissions")?.trim().to_owned();
            let parsed = match region.attribute("size") {
                Some(size) => MmioRegion::Numeric {
                    base: self.number(base, "MMIO region base")?,
                    size: self.number(size, "MMIO region size")?,
                    permissions,
                },
                None => MmioRegion::Named {
                    base: base.trim().to_owned(),
                    permissions,
                },
            };
            regions.push(parsed);
        }
        Ok(regions)
    }

    fn read_src(&self, src: Node<'_, '_>) -> Result<Vec<PathBuf>, ManifestError> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut files = Vec::new();
        for entry in src.children().filter(Node::is_element) {
            let tag = entry.tag_name().name();
            if tag != "filename" {
                return Err(self.schema(format!("unexpected element <{tag}> inside <src>")));
            }
            let file = PathBuf::from(self.text(entry)?);
            if !dir.join(&file).is_file() {
                return Err(ManifestError::MissingSourceFile {
                    file,
                    manifest: self.path.to_path_buf(),
                });
            }
            files.push(file);
        }
        Ok(files)
    }

    /// Half-declared pairs are dropped with a warning rather than failing the run.
    fn read_global_heap(&self, node: Node<'_, '_>) -> Result<Option<GlobalHeap>, ManifestError> {
        let page_size = node
            .attribute("page_size")
            .map(|raw| self.number(raw, "Global heap page size"))
            .transpose()?;
        let minimal_page_number = node
            .attribute("minimal_page_number")
            .map(|raw| self.number(raw, "Global heap minimal page number"))
            .transpose()?;
        match (page_size, minimal_page_number) {
            (Some(page_size), Some(minimal_page_number)) => Ok(Some(GlobalHeap {
                page_size,
                minimal_page_number,
            })),
            _ => {
                warn!(
                    "ignoring <global_heap> in {}: page_size and minimal_page_number must be declared together",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    fn irq(&self, node: Node<'_, '_>) -> Result<u32, ManifestError> {
        let raw = node.text().unwrap_or_default();
        parse_number_u32(raw).map_err(|source| self.invalid_number("IRQ", raw, source))
    }

    fn number(&self, raw: &str, field: &'static str) -> Result<u64, ManifestError> {
        parse_number(raw).map_err(|source| self.invalid_number(field, raw, source))
    }

    fn number_attr(
        &self,
        node: Node<'_, '_>,
        attr: &str,
        field: &'static str,
    ) -> Result<u64, ManifestError> {
        let raw = self.required_attr(node, attr)?;
        self.number(raw, field)
    }

    fn required_attr<'a>(&self, node: Node<'a, '_>, attr: &str) -> Result<&'a str, ManifestError> {
        node.attribute(attr).ok_or_else(|| {
            self.schema(format!(
                "element <{}> is missing the '{attr}' attribute",
                node.tag_name().name()
            ))
        })
    }

    fn text(&self, node: Node<'_, '_>) -> Result<String, ManifestError> {
        node.text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                self.schema(format!(
                    "element <{}> must not be empty",
                    node.tag_name().name()
                ))
            })
    }

    fn set_once<T>(&self, slot: &mut Option<T>, value: T, element: &str) -> Result<(), ManifestError> {
        if slot.is_some() {
            return Err(self.schema(format!("element <{element}> declared more than once")));
        }
        *slot = Some(value);
        Ok(())
    }

    fn missing(&self, element: &str) -> ManifestError {
        self.schema(format!("required element <{element}> is missing"))
    }

    fn invalid_number(&self, field: &'static str, raw: &str, source: NumberError) -> ManifestError {
        ManifestError::InvalidNumber {
            field,
            path: self.path.to_path_buf(),
            raw: raw.to_owned(),
            source,
        }
    }

    fn schema(&self, reason: String) -> ManifestError {
        ManifestError::Schema {
            path: self.path.to_path_buf(),
            reason,
        }
    }
}
