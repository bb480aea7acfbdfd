use crate::types::{PartitionName, Sfid};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One isolated partition, as declared by a single manifest document.
///
/// Built once by the manifest parser and never mutated afterwards. Field order
/// inside every list follows document order so generated output is
/// reproducible.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Partition {
    /// Manifest the record was parsed from. Diagnostics and main-box detection only.
    pub source_path: PathBuf,
    pub name: PartitionName,
    pub priority: String,
    pub entry_point: String,
    pub stack_size: u64,
    pub heap_size: u64,
    pub context_structure_name: String,
    pub mmio_regions: Vec<MmioRegion>,
    /// Service function identifiers exported by this partition.
    pub sfids: Vec<Sfid>,
    /// Service function identifiers this partition calls into.
    pub extern_sfids: Vec<Sfid>,
    /// Source files, relative to the manifest directory.
    pub src_files: Vec<PathBuf>,
    pub irqs: Vec<u32>,
    pub spm_status: Option<String>,
    pub global_heap: Option<GlobalHeap>,
}

impl Partition {
    /// File name of the originating manifest, e.g. `box_main.xml`.
    pub fn manifest_file_name(&self) -> Option<&str> {
        self.source_path.file_name().and_then(|n| n.to_str())
    }

    /// Directory the manifest lives in; `src_files` are relative to it.
    pub fn manifest_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(Path::new("."))
    }
}

/// A memory-mapped I/O range a partition is granted access to.
///
/// `Named` regions carry a symbolic base (a peripheral name the downstream
/// compiler resolves) and cannot be compared numerically here. `Numeric`
/// regions carry an address and a size.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MmioRegion {
    Named {
        base: String,
        permissions: String,
    },
    Numeric {
        base: u64,
        size: u64,
        permissions: String,
    },
}

impl MmioRegion {
    pub fn permissions(&self) -> &str {
        match self {
            Self::Named { permissions, .. } | Self::Numeric { permissions, .. } => permissions,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }
}

/// Page-allocator sizing. Either both values are declared or neither is.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GlobalHeap {
    pub page_size: u64,
    pub minimal_page_number: u64,
}
