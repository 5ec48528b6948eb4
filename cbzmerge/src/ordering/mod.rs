//! Deterministic ordering and positional prefixes for merge sources.
//!
//! Every directory processed by the merge engine is listed once and split
//! into two [`OrderedSet`]s: regular files and subdirectories. Each member of
//! a set gets a [`PositionPrefix`] whose width depends only on the set size,
//! so prefixed names sort in exactly the same order as the set itself.
//!
//! ```text
//! [a.cbz, b.cbz, ..., l.cbz]   (12 members, width 2)
//!    │      │           │
//!   "00_"  "01_"  ...  "11_"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::merge::{MergeError, MergeResult};

/// Separator placed between a prefix and the name it is applied to.
pub const PREFIX_SEPARATOR: char = '_';

/// Classification of a discovered path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A regular file (possibly reached through a symlink).
    File,
    /// A directory (possibly reached through a symlink).
    Directory,
}

/// A path classified as a file or directory at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    path: PathBuf,
    kind: SourceKind,
}

impl SourcePath {
    /// Classify a path by querying the filesystem.
    ///
    /// Symlinks are followed. Returns `None` for paths that are neither
    /// files nor directories, or that cannot be stat'ed.
    pub fn classify(path: PathBuf) -> Option<Self> {
        let metadata = fs::metadata(&path).ok()?;
        let kind = if metadata.is_file() {
            SourceKind::File
        } else if metadata.is_dir() {
            SourceKind::Directory
        } else {
            return None;
        };
        Some(Self { path, kind })
    }

    /// Create an already-classified source path.
    pub fn new(path: PathBuf, kind: SourceKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Final path component, lossily converted to UTF-8.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Fixed-width, zero-padded ordinal encoding a sort position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionPrefix {
    digits: String,
}

impl PositionPrefix {
    /// Build the prefix for `index` within a set of `set_len` members.
    pub fn new(index: usize, set_len: usize) -> Self {
        let width = prefix_width(set_len);
        Self {
            digits: format!("{:0width$}", index, width = width),
        }
    }

    /// The zero-padded digits, without separator.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Prepend this prefix to a name: `<digits>_<name>`.
    pub fn apply(&self, name: &str) -> String {
        format!("{}{}{}", self.digits, PREFIX_SEPARATOR, name)
    }
}

impl fmt::Display for PositionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.digits, PREFIX_SEPARATOR)
    }
}

/// Number of decimal digits needed for prefixes of a set with `len` members.
///
/// Matches the digit count of `len` itself, so a set of 10 gets width 2 even
/// though its highest index is 9.
pub fn prefix_width(len: usize) -> usize {
    len.to_string().len()
}

/// Sorted sequence of source paths of a single kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSet {
    kind: SourceKind,
    members: Vec<SourcePath>,
}

impl OrderedSet {
    /// Sort `members` into an ordered set.
    ///
    /// Members whose kind differs from `kind` are dropped. Ordering is by
    /// path string; within one directory that is the file-name order.
    pub fn new(kind: SourceKind, members: Vec<SourcePath>) -> Self {
        let mut members: Vec<SourcePath> =
            members.into_iter().filter(|m| m.kind == kind).collect();
        members.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        Self { kind, members }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourcePath> {
        self.members.iter()
    }

    pub fn members(&self) -> &[SourcePath] {
        &self.members
    }

    /// Members paired with their position prefix, in set order.
    pub fn prefixed(&self) -> Vec<(&SourcePath, PositionPrefix)> {
        let len = self.members.len();
        self.members
            .iter()
            .enumerate()
            .map(|(index, member)| (member, PositionPrefix::new(index, len)))
            .collect()
    }
}

/// Map every member of an ordered set to its position prefix.
///
/// An empty set yields an empty map. The result depends only on the set,
/// so repeated calls are identical.
pub fn assign_prefixes(set: &OrderedSet) -> BTreeMap<PathBuf, PositionPrefix> {
    set.prefixed()
        .into_iter()
        .map(|(member, prefix)| (member.path.clone(), prefix))
        .collect()
}

/// The direct children of one directory, classified and ordered.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    /// The directory that was listed.
    pub directory: PathBuf,

    /// Regular files, in order.
    pub files: OrderedSet,

    /// Subdirectories, in order.
    pub directories: OrderedSet,
}

impl DirectoryListing {
    /// List and classify the direct children of `directory`.
    pub fn scan(directory: &Path) -> MergeResult<Self> {
        let entries = fs::read_dir(directory).map_err(|e| MergeError::ReadFailed {
            path: directory.to_path_buf(),
            source: e,
        })?;

        let mut classified = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MergeError::ReadFailed {
                path: directory.to_path_buf(),
                source: e,
            })?;
            match SourcePath::classify(entry.path()) {
                Some(source) => classified.push(source),
                None => debug!(path = %entry.path().display(), "Ignoring special file"),
            }
        }

        let (files, directories): (Vec<_>, Vec<_>) = classified
            .into_iter()
            .partition(|s| s.kind == SourceKind::File);

        Ok(Self {
            directory: directory.to_path_buf(),
            files: OrderedSet::new(SourceKind::File, files),
            directories: OrderedSet::new(SourceKind::Directory, directories),
        })
    }

    /// Basename of the listed directory.
    pub fn name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn files(names: &[&str]) -> OrderedSet {
        let members = names
            .iter()
            .map(|n| SourcePath::new(PathBuf::from("/src").join(n), SourceKind::File))
            .collect();
        OrderedSet::new(SourceKind::File, members)
    }

    #[test]
    fn test_prefix_width() {
        assert_eq!(prefix_width(0), 1);
        assert_eq!(prefix_width(1), 1);
        assert_eq!(prefix_width(9), 1);
        assert_eq!(prefix_width(10), 2);
        assert_eq!(prefix_width(12), 2);
        assert_eq!(prefix_width(100), 3);
    }

    #[test]
    fn test_prefix_apply_and_display() {
        let prefix = PositionPrefix::new(3, 12);
        assert_eq!(prefix.digits(), "03");
        assert_eq!(prefix.to_string(), "03_");
        assert_eq!(prefix.apply("page.jpg"), "03_page.jpg");
    }

    #[test]
    fn test_ordered_set_sorts_by_name() {
        let set = files(&["b.cbz", "a.cbz", "c.cbz"]);
        let names: Vec<String> = set.iter().map(|m| m.basename()).collect();
        assert_eq!(names, vec!["a.cbz", "b.cbz", "c.cbz"]);
    }

    #[test]
    fn test_ordered_set_drops_other_kind() {
        let members = vec![
            SourcePath::new(PathBuf::from("/src/a.cbz"), SourceKind::File),
            SourcePath::new(PathBuf::from("/src/ch1"), SourceKind::Directory),
        ];
        let set = OrderedSet::new(SourceKind::File, members);
        assert_eq!(set.len(), 1);
        assert_eq!(set.kind(), SourceKind::File);
    }

    #[test]
    fn test_assign_prefixes_two_members() {
        let set = files(&["b.cbz", "a.cbz"]);
        let prefixes = assign_prefixes(&set);
        assert_eq!(prefixes[Path::new("/src/a.cbz")].to_string(), "0_");
        assert_eq!(prefixes[Path::new("/src/b.cbz")].to_string(), "1_");
    }

    #[test]
    fn test_assign_prefixes_empty() {
        let set = files(&[]);
        assert!(assign_prefixes(&set).is_empty());
    }

    #[test]
    fn test_assign_prefixes_ten_members_is_two_wide() {
        let names: Vec<String> = (0..10).map(|i| format!("{}.cbz", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let prefixes = assign_prefixes(&files(&refs));
        assert_eq!(prefixes[Path::new("/src/0.cbz")].digits(), "00");
        assert_eq!(prefixes[Path::new("/src/9.cbz")].digits(), "09");
    }

    #[test]
    fn test_scan_classifies_children() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("02.cbz"), b"x").unwrap();
        fs::write(temp.path().join("01.cbz"), b"x").unwrap();
        fs::create_dir(temp.path().join("ch2")).unwrap();
        fs::create_dir(temp.path().join("ch1")).unwrap();

        let listing = DirectoryListing::scan(temp.path()).unwrap();

        let files: Vec<String> = listing.files.iter().map(|f| f.basename()).collect();
        let dirs: Vec<String> = listing.directories.iter().map(|d| d.basename()).collect();
        assert_eq!(files, vec!["01.cbz", "02.cbz"]);
        assert_eq!(dirs, vec!["ch1", "ch2"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let result = DirectoryListing::scan(Path::new("/nonexistent/cbzmerge/dir"));
        assert!(matches!(result, Err(MergeError::ReadFailed { .. })));
    }

    proptest! {
        #[test]
        fn prop_prefixes_fixed_width_and_order_preserving(
            names in proptest::collection::btree_set("[a-z0-9]{1,8}", 0..150)
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let set = files(&refs);
            let prefixed = set.prefixed();
            let width = prefix_width(set.len());

            for (_, prefix) in &prefixed {
                prop_assert_eq!(prefix.digits().len(), width);
            }

            let digits: Vec<&str> = prefixed.iter().map(|(_, p)| p.digits()).collect();
            let mut sorted = digits.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted, digits);

            for (index, (_, prefix)) in prefixed.iter().enumerate() {
                prop_assert_eq!(prefix.digits().parse::<usize>().unwrap(), index);
            }
        }

        #[test]
        fn prop_assign_prefixes_is_deterministic(
            names in proptest::collection::btree_set("[a-z]{1,6}", 0..40)
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let set = files(&refs);
            prop_assert_eq!(assign_prefixes(&set), assign_prefixes(&set));
        }
    }
}
