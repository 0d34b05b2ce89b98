//! Indexing of a password store.
//!
//! A store is a directory tree of `.gpg` files. [`scan`] turns it into an
//! [`Index`]: one [`Entry`] per file, named the way `pass` names it
//! (`email/gmail` for `email/gmail.gpg`). The flat list and the per-folder
//! listings are always derived from the index, never stored next to it.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::consts::ENTRY_SUFFIX;
use crate::error::{PassviewError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Canonical name: `/`-separated, store-relative, without the suffix.
    pub name: String,
    /// The encrypted file backing this entry.
    pub path: PathBuf,
}

/// Children of one folder of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub directories: BTreeSet<String>,
    pub files: BTreeSet<String>,
}

impl FolderListing {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    /// Directories first, then files, each ascending. The flag is `true` for
    /// directories.
    pub fn items(&self) -> impl Iterator<Item = (&str, bool)> {
        self.directories
            .iter()
            .map(|dir| (dir.as_str(), true))
            .chain(self.files.iter().map(|file| (file.as_str(), false)))
    }
}

/// Every entry of a store, sorted case-insensitively by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    root: PathBuf,
    entries: Vec<Entry>,
}

impl Index {
    pub fn empty<P>(root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Index {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    fn from_entries(root: PathBuf, mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        Index { root, entries }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The flat projection.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Lists the folder reached by following `prefix` from the store root.
    pub fn list_folder<S>(&self, prefix: &[S]) -> FolderListing
    where
        S: AsRef<str>,
    {
        let prefix = prefix
            .iter()
            .map(|segment| segment.as_ref())
            .collect::<Vec<_>>()
            .join("/");
        let mut listing = FolderListing::default();

        for entry in &self.entries {
            let rest = if prefix.is_empty() {
                entry.name.as_str()
            } else {
                match entry
                    .name
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };

            match rest.split_once('/') {
                Some((dir, _)) => {
                    listing.directories.insert(dir.to_owned());
                }
                None => {
                    listing.files.insert(rest.to_owned());
                }
            }
        }

        listing
    }
}

/// Walks `root` and indexes every entry file below it.
///
/// Hidden directories (`.git`, ...) are pruned and hidden or non-`.gpg`
/// files are skipped. Two files whose names match ignoring case are an error.
pub fn scan<P>(root: P) -> Result<Index>
where
    P: AsRef<Path>,
{
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(PassviewError::StoreDoesntExist(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|source| PassviewError::StoreUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    // Keyed on the case-folded name; `Bank` and `bank` are one file on a
    // case-insensitive filesystem.
    let mut seen: BTreeMap<String, Entry> = BTreeMap::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(PassviewError::StoreUnreadable {
                    path: root.to_path_buf(),
                    source: err.into(),
                })
            }
            Err(err) => {
                warn!(%err, "skipping unreadable path in store");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let name = match canonical_name(relative) {
            Some(name) => name,
            None => {
                if relative.to_string_lossy().ends_with(ENTRY_SUFFIX) {
                    warn!(path = %entry.path().display(), "entry file has an empty name");
                }
                continue;
            }
        };

        match seen.entry(name.to_lowercase()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(Entry {
                    name,
                    path: entry.into_path(),
                });
            }
            btree_map::Entry::Occupied(slot) => {
                let first = slot.get();
                return Err(PassviewError::DuplicateEntry {
                    name: first.name.clone(),
                    first: first.path.clone(),
                    second: entry.into_path(),
                });
            }
        }
    }

    let entries = seen.into_values().collect::<Vec<_>>();
    debug!(root = %root.display(), entries = entries.len(), "scanned store");

    Ok(Index::from_entries(root.to_path_buf(), entries))
}

// A bare `.gpg` file is not hidden: it is the entry named after its folder.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| {
            let bare_entry = entry.file_type().is_file() && name == ENTRY_SUFFIX;
            name.starts_with('.') && !bare_entry
        })
        .unwrap_or(false)
}

/// Store-relative path to canonical entry name, or `None` when the path is not
/// an entry file.
pub fn canonical_name<P>(relative: P) -> Option<String>
where
    P: AsRef<Path>,
{
    let joined = relative
        .as_ref()
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    let name = joined.strip_suffix(ENTRY_SUFFIX)?.trim_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(
            canonical_name("email/gmail.gpg").as_deref(),
            Some("email/gmail")
        );
        assert_eq!(canonical_name("bank.gpg").as_deref(), Some("bank"));
        assert_eq!(canonical_name("x/.gpg").as_deref(), Some("x"));
        assert_eq!(canonical_name("a\\b.gpg").as_deref(), Some("a/b"));
        assert_eq!(canonical_name(".gpg"), None);
        assert_eq!(canonical_name("notes.txt"), None);
        assert_eq!(canonical_name("archive.gpg.bak"), None);
    }

    fn index(names: &[&str]) -> Index {
        Index::from_entries(
            PathBuf::from("/store"),
            names
                .iter()
                .map(|name| Entry {
                    name: (*name).to_owned(),
                    path: PathBuf::from(format!("/store/{}.gpg", name)),
                })
                .collect(),
        )
    }

    #[test]
    fn flat_order_ignores_case() {
        let index = index(&["b", "A", "a", "C/d"]);
        assert_eq!(index.names().collect::<Vec<_>>(), ["A", "a", "b", "C/d"]);
    }

    #[test]
    fn folder_prefix_must_match_whole_segments() {
        let index = index(&["mail/x", "mailbox/y"]);
        let listing = index.list_folder(&["mail"]);

        assert!(listing.directories.is_empty());
        assert_eq!(listing.files.iter().collect::<Vec<_>>(), ["x"]);
    }

    #[test]
    fn entry_and_folder_may_share_a_name() {
        let index = index(&["site", "site/user"]);
        let listing = index.list_folder::<&str>(&[]);

        assert!(listing.directories.contains("site"));
        assert!(listing.files.contains("site"));
        assert_eq!(
            listing.items().collect::<Vec<_>>(),
            [("site", true), ("site", false)]
        );
    }
}
