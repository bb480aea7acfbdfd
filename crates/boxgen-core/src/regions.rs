//! Enumeration of MMIO region pairs for downstream overlap checks.
//!
//! No overlap arithmetic happens here. Every pair is handed to the generated
//! code, which decides what it can check numerically.

use boxgen_schema::{MmioRegion, Partition, PartitionName};
use serde::Serialize;

/// A region in the pooled, manifest-ordered list of all regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PooledRegion<'a> {
    /// Position in the pooled list.
    pub position: usize,
    pub partition: &'a PartitionName,
    /// Position inside the owning partition's region list.
    pub index: usize,
    pub region: &'a MmioRegion,
}

/// Unordered pair of pooled regions; `first.position < second.position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionPair<'a> {
    pub first: PooledRegion<'a>,
    pub second: PooledRegion<'a>,
}

impl RegionPair<'_> {
    /// Both sides carry a numeric base and size.
    pub fn is_numeric(&self) -> bool {
        self.first.region.is_numeric() && self.second.region.is_numeric()
    }
}

/// Pool the regions of every partition, in partition order then document order.
pub fn pool_regions(partitions: &[Partition]) -> Vec<PooledRegion<'_>> {
    partitions
        .iter()
        .flat_map(|p| {
            p.mmio_regions
                .iter()
                .enumerate()
                .map(move |(index, region)| (&p.name, index, region))
        })
        .enumerate()
        .map(|(position, (partition, index, region))| PooledRegion {
            position,
            partition,
            index,
            region,
        })
        .collect()
}

/// Every unordered pair of pooled regions, `n * (n - 1) / 2` in total.
pub fn region_pairs(partitions: &[Partition]) -> Vec<RegionPair<'_>> {
    let pooled = pool_regions(partitions);
    unordered_pairs(&pooled)
        .map(|(first, second)| RegionPair {
            first: *first,
            second: *second,
        })
        .collect()
}

/// All `(items[i], items[j])` with `i < j`.
pub fn unordered_pairs<T>(items: &[T]) -> impl Iterator<Item = (&T, &T)> {
    items
        .iter()
        .enumerate()
        .flat_map(move |(i, first)| items[i + 1..].iter().map(move |second| (first, second)))
}
