//! Document identifier normalization
//!
//! A document is addressed by a single identifier string derived from its
//! folder and filename. Files at the top of the tree use the `ROOT` folder
//! sentinel and their identifier is just the filename; everything else is
//! `folder/filename`.

/// Folder sentinel for files at the top of the document tree.
pub const ROOT: &str = "root";

/// Derive the canonical identifier for a `(folder, filename)` pair.
///
/// Pure and total: there are no error conditions.
pub fn normalize(folder: &str, filename: &str) -> String {
    if folder == ROOT {
        filename.to_string()
    } else {
        format!("{}/{}", folder, filename)
    }
}

/// Split an identifier back into its `(folder, filename)` components.
///
/// The split happens at the last `/`, so nested folders stay intact.
/// An identifier without a separator belongs to the [`ROOT`] folder.
///
/// For any filename that contains no `/`,
/// `split(&normalize(folder, filename)) == (folder, filename)`.
pub fn split(identifier: &str) -> (&str, &str) {
    match identifier.rsplit_once('/') {
        Some((folder, filename)) => (folder, filename),
        None => (ROOT, identifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_identifier_is_bare_filename() {
        assert_eq!(normalize(ROOT, "intro.pdf"), "intro.pdf");
    }

    #[test]
    fn nested_identifier_joins_with_slash() {
        assert_eq!(normalize("fiction", "dune.pdf"), "fiction/dune.pdf");
        assert_eq!(
            normalize("fiction/classics", "dune.pdf"),
            "fiction/classics/dune.pdf"
        );
    }

    #[test]
    fn split_without_separator_yields_root() {
        assert_eq!(split("intro.pdf"), (ROOT, "intro.pdf"));
    }

    #[test]
    fn split_uses_last_separator() {
        assert_eq!(split("fiction/dune.pdf"), ("fiction", "dune.pdf"));
        assert_eq!(
            split("fiction/classics/dune.pdf"),
            ("fiction/classics", "dune.pdf")
        );
    }

    #[test]
    fn round_trip_law() {
        let pairs = [
            (ROOT, "a.pdf"),
            ("papers", "b.pdf"),
            ("papers/2024", "c d.pdf"),
            ("deep/ly/nest/ed", "file.with.dots.pdf"),
        ];
        for (folder, filename) in pairs {
            let id = normalize(folder, filename);
            assert_eq!(split(&id), (folder, filename), "identifier {:?}", id);
        }
    }
}
