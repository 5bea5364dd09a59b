//! End-to-end scenarios through the public API.

use folio::{ident, LibraryApi, LibraryError, LibraryQueries, OpenStore, SqliteStore, TagStore};
use std::collections::BTreeSet;
use std::sync::Arc;

fn open_api() -> LibraryApi {
    LibraryApi::new(Arc::new(SqliteStore::open_in_memory().unwrap()))
}

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(|s| s.as_str()).collect()
}

#[test]
fn reading_status_overwrites_previous_status() {
    let api = open_api();
    api.attach_tag("chapter1.pdf", "backlog").unwrap();
    api.attach_tag("chapter1.pdf", "in_progress").unwrap();

    let tags = api.tags_for_document("chapter1.pdf").unwrap();
    assert_eq!(names(&tags), vec!["in_progress"]);
}

#[test]
fn custom_tags_coexist_with_reading_status() {
    let api = open_api();
    api.create_tag("favorite", "liked books").unwrap();
    api.attach_tag("notes/x.pdf", "favorite").unwrap();
    api.attach_tag("notes/x.pdf", "backlog").unwrap();

    let tags = api.tags_for_document("notes/x.pdf").unwrap();
    assert_eq!(names(&tags), vec!["backlog", "favorite"]);
}

#[test]
fn detach_on_unknown_document_is_a_silent_no_op() {
    let api = open_api();
    let removed = api.detach_tag("missing.pdf", "finished").unwrap();
    assert!(!removed);
    assert!(api.store().document("missing.pdf").unwrap().is_none());
}

#[test]
fn deleting_a_reading_status_tag_is_refused() {
    let api = open_api();
    api.attach_tag("a.pdf", "finished").unwrap();

    let finished = api
        .list_tags()
        .unwrap()
        .into_iter()
        .find(|t| t.name == "finished")
        .unwrap();
    let err = api.delete_tag(finished.id).unwrap_err();
    assert!(matches!(err, LibraryError::ProtectedTag(_)));

    // Store state unchanged.
    let tags = api.tags_for_document("a.pdf").unwrap();
    assert_eq!(names(&tags), vec!["finished"]);
    assert_eq!(api.tag_statistics().unwrap()["finished"].count, 1);
}

#[test]
fn attach_is_idempotent() {
    let api = open_api();
    api.attach_tag("a.pdf", "finished").unwrap();
    let doc = api.attach_tag("a.pdf", "finished").unwrap();

    assert_eq!(names(&doc.tags), vec!["finished"]);
    assert_eq!(api.tag_statistics().unwrap()["finished"].count, 1);
}

#[test]
fn status_attach_sequences_keep_at_most_one_status() {
    let api = open_api();
    let sequence = ["finished", "backlog", "backlog", "in_progress", "finished"];
    for (i, status) in sequence.iter().enumerate() {
        api.attach_tag("seq.pdf", status).unwrap();
        let statuses: Vec<String> = api
            .tags_for_document("seq.pdf")
            .unwrap()
            .into_iter()
            .filter(|t| folio::ReadingStatus::is_status_name(t))
            .collect();
        assert_eq!(
            statuses,
            vec![status.to_string()],
            "after prefix of length {}",
            i + 1
        );
    }
}

#[test]
fn cascade_delete_clears_every_holder() {
    let api = open_api();
    api.create_tag("signed", "signed copies").unwrap();
    for identifier in ["a.pdf", "shelf/b.pdf", "shelf/deep/c.pdf"] {
        api.attach_tag(identifier, "signed").unwrap();
    }
    assert_eq!(api.documents_for_tag("signed").unwrap().len(), 3);

    let signed = api
        .list_tags()
        .unwrap()
        .into_iter()
        .find(|t| t.name == "signed")
        .unwrap();
    api.delete_tag(signed.id).unwrap();

    assert!(api.documents_for_tag("signed").unwrap().is_empty());
    assert!(!api.tag_statistics().unwrap().contains_key("signed"));
    for identifier in ["a.pdf", "shelf/b.pdf", "shelf/deep/c.pdf"] {
        assert!(api.tags_for_document(identifier).unwrap().is_empty());
    }
}

#[test]
fn scanned_tree_flows_into_views() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("fiction")).unwrap();
    std::fs::write(dir.path().join("intro.pdf"), b"").unwrap();
    std::fs::write(dir.path().join("fiction/dune.pdf"), b"").unwrap();
    std::fs::write(dir.path().join("fiction/solaris.pdf"), b"").unwrap();

    let api = open_api();
    let tree = folio::scan_tree(dir.path()).unwrap();
    assert_eq!(tree[ident::ROOT], vec!["intro.pdf".to_string()]);

    api.attach_tag("fiction/dune.pdf", "in_progress").unwrap();

    let queries = LibraryQueries::new(api.store());
    let tagged = queries.tags_for_tree(&tree).unwrap();
    assert_eq!(tagged.len(), 1);
    assert!(tagged.contains_key("fiction/dune.pdf"));

    let filtered = queries.filter_tree(&tree, "in_progress").unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered["fiction"], vec!["dune.pdf".to_string()]);
}

#[test]
fn persisted_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("library.db");

    {
        let api = LibraryApi::new(Arc::new(SqliteStore::open(&db_path).unwrap()));
        api.create_tag("favorite", "liked books").unwrap();
        api.attach_tag("a.pdf", "favorite").unwrap();
        api.attach_tag("a.pdf", "backlog").unwrap();
    }

    let api = LibraryApi::new(Arc::new(SqliteStore::open(&db_path).unwrap()));
    let tags = api.tags_for_document("a.pdf").unwrap();
    assert_eq!(names(&tags), vec!["backlog", "favorite"]);
    // Reopen re-runs the seeding without duplicating anything.
    assert_eq!(api.list_tags().unwrap().len(), 4);
}
