//! Read-only projections over the tag store
//!
//! Everything here serves presentation views and never mutates. Results
//! reflect the store's committed state at call time; nothing is cached
//! beyond a single call.

use crate::error::LibraryResult;
use crate::ident;
use crate::library::TagUsage;
use crate::storage::TagStore;
use std::collections::{BTreeMap, BTreeSet};

/// A scanned document tree: folder name to filenames
pub type DocumentTree = BTreeMap<String, Vec<String>>;

/// Query façade over a tag store
pub struct LibraryQueries<'a> {
    store: &'a dyn TagStore,
}

impl<'a> LibraryQueries<'a> {
    pub fn new(store: &'a dyn TagStore) -> Self {
        Self { store }
    }

    /// Map each identifier to its tag set, omitting untagged documents
    pub fn tags_by_document(
        &self,
        identifiers: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> LibraryResult<BTreeMap<String, BTreeSet<String>>> {
        let mut map = BTreeMap::new();
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            let tags = self.store.tags_of(identifier)?;
            if !tags.is_empty() {
                map.insert(identifier.to_string(), tags);
            }
        }
        Ok(map)
    }

    /// Tag sets for every document in a scanned tree, untagged ones omitted
    pub fn tags_for_tree(
        &self,
        tree: &DocumentTree,
    ) -> LibraryResult<BTreeMap<String, BTreeSet<String>>> {
        let identifiers = tree.iter().flat_map(|(folder, files)| {
            files
                .iter()
                .map(move |filename| ident::normalize(folder, filename))
        });
        self.tags_by_document(identifiers)
    }

    /// Identifiers of documents carrying a tag
    pub fn documents_for_tag(&self, tag_name: &str) -> LibraryResult<BTreeSet<String>> {
        self.store.documents_with_tag(tag_name)
    }

    /// Prune a scanned tree to documents carrying a tag
    ///
    /// Folders left with no matching files are dropped entirely.
    pub fn filter_tree(&self, tree: &DocumentTree, tag_name: &str) -> LibraryResult<DocumentTree> {
        let tagged = self.store.documents_with_tag(tag_name)?;

        let mut filtered = DocumentTree::new();
        for (folder, files) in tree {
            let matching: Vec<String> = files
                .iter()
                .filter(|filename| tagged.contains(&ident::normalize(folder, filename)))
                .cloned()
                .collect();
            if !matching.is_empty() {
                filtered.insert(folder.clone(), matching);
            }
        }
        Ok(filtered)
    }

    /// Per-tag usage counts and descriptions, zero-count tags included
    pub fn stats(&self) -> LibraryResult<BTreeMap<String, TagUsage>> {
        self.store.usage_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};

    fn tree() -> DocumentTree {
        DocumentTree::from([
            (
                ident::ROOT.to_string(),
                vec!["intro.pdf".to_string(), "notes.pdf".to_string()],
            ),
            (
                "fiction".to_string(),
                vec!["dune.pdf".to_string(), "solaris.pdf".to_string()],
            ),
            ("empty".to_string(), vec![]),
        ])
    }

    #[test]
    fn tags_for_tree_omits_untagged_documents() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.attach("intro.pdf", "finished").unwrap();
        store.attach("fiction/dune.pdf", "backlog").unwrap();

        let queries = LibraryQueries::new(&store);
        let map = queries.tags_for_tree(&tree()).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(
            map["intro.pdf"],
            BTreeSet::from(["finished".to_string()])
        );
        assert_eq!(
            map["fiction/dune.pdf"],
            BTreeSet::from(["backlog".to_string()])
        );
        assert!(!map.contains_key("notes.pdf"));
    }

    #[test]
    fn filter_tree_keeps_only_tagged_files_and_drops_empty_folders() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.attach("fiction/dune.pdf", "in_progress").unwrap();

        let queries = LibraryQueries::new(&store);
        let filtered = queries.filter_tree(&tree(), "in_progress").unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["fiction"], vec!["dune.pdf".to_string()]);
    }

    #[test]
    fn filter_tree_with_unknown_tag_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let queries = LibraryQueries::new(&store);
        assert!(queries.filter_tree(&tree(), "no-such-tag").unwrap().is_empty());
    }
}
