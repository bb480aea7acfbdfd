//! Partition manifest data model and parser for boxgen.
//!
//! This crate defines the schema layer: the `Partition` record produced from a
//! single `box_*.xml` manifest, the tagged `MmioRegion` union, identifier
//! newtypes (`PartitionName`, `Sfid`), the `0x`-prefix radix rule used by every
//! numeric field (`parse_number`), and the XML manifest parser itself
//! (`parse_manifest_file`). Nothing in here knows about other manifests; the
//! cross-manifest checks live in `boxgen-core`.

pub mod manifest;
pub mod number;
pub mod partition;
pub mod types;

pub use manifest::{parse_manifest_file, parse_manifest_str, ManifestError, ROOT_ELEMENT};
pub use number::{parse_number, parse_number_u32, NumberError};
pub use partition::{GlobalHeap, MmioRegion, Partition};
pub use types::{PartitionName, Sfid};
