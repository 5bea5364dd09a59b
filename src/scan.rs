//! Document tree scanner
//!
//! Walks a root directory and reports its PDF files grouped by folder,
//! using the same folder keys the identifier normalizer expects: paths
//! relative to the root, with [`ident::ROOT`] for the top level. The core
//! never scans storage on its own; callers pass the resulting tree to the
//! query façade.

use crate::ident;
use crate::query::DocumentTree;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Scan a directory tree for PDF files
///
/// Every directory appears as a key, including ones with no PDFs; filenames
/// are sorted within each folder. Unreadable entries are skipped with a
/// warning rather than failing the whole scan.
pub fn scan_tree(root: impl AsRef<Path>) -> std::io::Result<DocumentTree> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        ));
    }

    let mut tree = DocumentTree::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            let folder = folder_key(root, entry.path());
            tree.entry(folder).or_default();
            continue;
        }

        if !is_pdf(entry.path()) {
            continue;
        }
        let Some(parent) = entry.path().parent() else {
            continue;
        };
        let folder = folder_key(root, parent);
        let filename = entry.file_name().to_string_lossy().into_owned();
        tree.entry(folder).or_default().push(filename);
    }

    for files in tree.values_mut() {
        files.sort();
    }
    Ok(tree)
}

/// Folder key for a directory under the scan root
fn folder_key(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ident::ROOT.to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => ident::ROOT.to_string(),
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn scans_pdfs_grouped_by_folder() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("intro.pdf"));
        touch(&dir.path().join("README.md"));
        fs::create_dir(dir.path().join("fiction")).unwrap();
        touch(&dir.path().join("fiction/solaris.pdf"));
        touch(&dir.path().join("fiction/dune.PDF"));
        fs::create_dir_all(dir.path().join("papers/2024")).unwrap();
        touch(&dir.path().join("papers/2024/paper.pdf"));

        let tree = scan_tree(dir.path()).unwrap();

        assert_eq!(tree[ident::ROOT], vec!["intro.pdf".to_string()]);
        // Extension match is case-insensitive, and filenames come sorted.
        assert_eq!(
            tree["fiction"],
            vec!["dune.PDF".to_string(), "solaris.pdf".to_string()]
        );
        assert_eq!(tree["papers/2024"], vec!["paper.pdf".to_string()]);
        // Intermediate directory with no PDFs is still listed.
        assert!(tree["papers"].is_empty());
    }

    #[test]
    fn empty_root_yields_single_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let tree = scan_tree(dir.path()).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree[ident::ROOT].is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_tree(dir.path().join("nope")).is_err());
    }
}
