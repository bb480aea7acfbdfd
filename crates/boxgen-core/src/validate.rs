//! Cross-manifest validation.
//!
//! Checks run in a fixed order (names, SFIDs, IRQs, extern SFIDs) and the
//! first failing class aborts validation. Within that class every conflict is
//! collected so one run reports all of them.

use boxgen_schema::{Partition, PartitionName, Sfid};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// One pair of manifests declaring the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision<T> {
    pub value: T,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// Extern SFIDs of one partition that no manifest declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedExtern {
    pub partition: PartitionName,
    pub source_path: PathBuf,
    pub missing: Vec<Sfid>,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{}", describe_names(.0))]
    DuplicateNames(Vec<Collision<PartitionName>>),
    #[error("{}", describe_sfids(.0))]
    DuplicateSfids(Vec<Collision<Sfid>>),
    #[error("{}", describe_irqs(.0))]
    DuplicateIrqs(Vec<Collision<u32>>),
    #[error("{}", UnresolvedReport(.0))]
    UnresolvedExterns(Vec<UnresolvedExtern>),
}

impl ValidationError {
    /// Number of individual conflicts carried by this error.
    pub fn conflict_count(&self) -> usize {
        match self {
            Self::DuplicateNames(c) => c.len(),
            Self::DuplicateSfids(c) => c.len(),
            Self::DuplicateIrqs(c) => c.len(),
            Self::UnresolvedExterns(u) => u.len(),
        }
    }
}

/// Validate the collection-wide invariants over every parsed partition.
pub fn validate_collection(partitions: &[Partition]) -> Result<(), ValidationError> {
    let names = find_collisions(
        partitions
            .iter()
            .map(|p| (&p.name, p.source_path.as_path())),
    );
    if !names.is_empty() {
        return Err(ValidationError::DuplicateNames(names));
    }

    let sfids = find_collisions(partitions.iter().flat_map(|p| {
        p.sfids
            .iter()
            .map(move |sfid| (sfid, p.source_path.as_path()))
    }));
    if !sfids.is_empty() {
        return Err(ValidationError::DuplicateSfids(sfids));
    }

    let irqs = find_collisions(partitions.iter().flat_map(|p| {
        p.irqs
            .iter()
            .map(move |irq| (irq, p.source_path.as_path()))
    }));
    if !irqs.is_empty() {
        return Err(ValidationError::DuplicateIrqs(irqs));
    }

    let unresolved = find_unresolved_externs(partitions);
    if !unresolved.is_empty() {
        return Err(ValidationError::UnresolvedExterns(unresolved));
    }

    debug!("validated {} partition manifests", partitions.len());
    Ok(())
}

/// Report every pair of declarations sharing a value.
///
/// Owners are remembered per value in first-seen order, then expanded into all
/// `i < j` owner pairs, which is the same set a full pairwise scan would find.
fn find_collisions<'a, T, I>(entries: I) -> Vec<Collision<T>>
where
    T: Eq + Hash + Clone + 'a,
    I: IntoIterator<Item = (&'a T, &'a Path)>,
{
    let mut owners: HashMap<&'a T, Vec<&'a Path>> = HashMap::new();
    let mut first_seen: Vec<&'a T> = Vec::new();
    for (value, path) in entries {
        let paths = owners.entry(value).or_default();
        if paths.is_empty() {
            first_seen.push(value);
        }
        paths.push(path);
    }

    let mut collisions = Vec::new();
    for value in first_seen {
        let paths = &owners[value];
        for (i, first) in paths.iter().enumerate() {
            for second in &paths[i + 1..] {
                collisions.push(Collision {
                    value: value.clone(),
                    first: first.to_path_buf(),
                    second: second.to_path_buf(),
                });
            }
        }
    }
    collisions
}

fn find_unresolved_externs(partitions: &[Partition]) -> Vec<UnresolvedExtern> {
    let declared: HashSet<&Sfid> = partitions.iter().flat_map(|p| &p.sfids).collect();

    partitions
        .iter()
        .filter_map(|p| {
            let mut missing: Vec<Sfid> = Vec::new();
            for sfid in &p.extern_sfids {
                if !declared.contains(sfid) && !missing.contains(sfid) {
                    missing.push(sfid.clone());
                }
            }
            (!missing.is_empty()).then(|| UnresolvedExtern {
                partition: p.name.clone(),
                source_path: p.source_path.clone(),
                missing,
            })
        })
        .collect()
}

/// A partition collection that passed [`validate_collection`].
///
/// Emission only accepts this type, so nothing can be generated from a
/// collection known to be inconsistent.
#[derive(Debug, Clone)]
pub struct ValidatedCollection {
    partitions: Vec<Partition>,
}

impl ValidatedCollection {
    pub fn new(partitions: Vec<Partition>) -> Result<Self, ValidationError> {
        validate_collection(&partitions)?;
        Ok(Self { partitions })
    }

    #[inline]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn into_inner(self) -> Vec<Partition> {
        self.partitions
    }
}

/// Multi-line report over collisions of one kind: a summary line, then one
/// indented line per colliding pair.
struct CollisionReport<'a, T> {
    summary: &'static str,
    collisions: &'a [Collision<T>],
    line: fn(&Collision<T>, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl<T> fmt::Display for CollisionReport<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:", self.collisions.len(), self.summary)?;
        for collision in self.collisions {
            f.write_str("\n  ")?;
            (self.line)(collision, f)?;
        }
        Ok(())
    }
}

fn describe_names(collisions: &[Collision<PartitionName>]) -> CollisionReport<'_, PartitionName> {
    CollisionReport {
        summary: "duplicate partition name(s)",
        collisions,
        line: |c, f| {
            write!(
                f,
                "partition name '{}' is not unique, found in both '{}' and '{}'",
                c.value,
                c.first.display(),
                c.second.display()
            )
        },
    }
}

fn describe_sfids(collisions: &[Collision<Sfid>]) -> CollisionReport<'_, Sfid> {
    CollisionReport {
        summary: "duplicate SFID declaration(s)",
        collisions,
        line: |c, f| {
            write!(
                f,
                "SFID '{}' is declared in both '{}' and '{}'",
                c.value,
                c.first.display(),
                c.second.display()
            )
        },
    }
}

fn describe_irqs(collisions: &[Collision<u32>]) -> CollisionReport<'_, u32> {
    CollisionReport {
        summary: "IRQ conflict(s)",
        collisions,
        line: |c, f| {
            write!(
                f,
                "IRQ {} ({:#x}) is required by both '{}' and '{}'",
                c.value,
                c.value,
                c.first.display(),
                c.second.display()
            )
        },
    }
}

struct UnresolvedReport<'a>(&'a [UnresolvedExtern]);

impl fmt::Display for UnresolvedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} partition(s) with unresolved extern SFIDs:", self.0.len())?;
        for entry in self.0 {
            write!(
                f,
                "\n  external SFID(s) {} required by partition '{}' ('{}') can't be found in any partition manifest",
                QuotedList(&entry.missing),
                entry.partition,
                entry.source_path.display()
            )?;
        }
        Ok(())
    }
}

struct QuotedList<'a>(&'a [Sfid]);

impl fmt::Display for QuotedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sfid) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{sfid}'")?;
        }
        Ok(())
    }
}
