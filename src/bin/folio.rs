//! Folio CLI — document library tagger.
//!
//! Usage:
//!   folio scan <dir> [--filter tag] [--db path]
//!   folio attach <identifier> <tag> [--db path]
//!   folio detach <identifier> <tag> [--db path]
//!   folio doc <identifier> [--db path]
//!   folio tag <subcommand> [--db path]

use clap::{Parser, Subcommand};
use folio::{LibraryApi, LibraryQueries, OpenStore, SqliteStore, TagId};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Tag and reading-status engine for a folder-based document library"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree and print its documents with their tags
    Scan {
        /// Root of the document tree
        dir: PathBuf,
        /// Only show documents carrying this tag
        #[arg(long)]
        filter: Option<String>,
    },
    /// Attach a tag to a document
    Attach {
        /// Document identifier (folder/filename)
        identifier: String,
        /// Tag name (must exist in the catalog)
        tag: String,
    },
    /// Detach a tag from a document
    Detach {
        /// Document identifier (folder/filename)
        identifier: String,
        /// Tag name
        tag: String,
    },
    /// Show a document's tags
    Doc {
        /// Document identifier (folder/filename)
        identifier: String,
    },
    /// Manage the tag catalog
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
}

#[derive(Subcommand)]
enum TagAction {
    /// List all tags
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-tag usage statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new tag
    Create {
        /// Name for the new tag
        name: String,
        /// Description for the new tag
        #[arg(default_value = "")]
        description: String,
    },
    /// Rename a tag
    Rename {
        /// Current tag name
        old: String,
        /// New tag name
        new: String,
    },
    /// Update a tag's description
    Describe {
        /// Tag name
        name: String,
        /// New description
        description: String,
    },
    /// Delete a tag (removes it from every document)
    Delete {
        /// Tag name
        name: String,
    },
}

/// Get the default database path (~/.local/share/folio/folio.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("folio").join("folio.db")
}

fn open_api(db: Option<PathBuf>) -> Result<LibraryApi, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path)
        .map_err(|e| format!("Failed to open database at {}: {}", db_path.display(), e))?;
    Ok(LibraryApi::new(Arc::new(store)))
}

/// Find a tag by name, returning its id
fn find_tag_by_name(api: &LibraryApi, name: &str) -> Result<TagId, String> {
    match api.list_tags() {
        Ok(tags) => tags
            .into_iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| format!("tag '{}' not found", name)),
        Err(e) => Err(e.to_string()),
    }
}

fn cmd_scan(api: &LibraryApi, dir: &PathBuf, filter: Option<&str>) -> i32 {
    let tree = match folio::scan_tree(dir) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: cannot scan '{}': {}", dir.display(), e);
            return 1;
        }
    };

    let queries = LibraryQueries::new(api.store());
    let tree = match filter {
        Some(tag) => match queries.filter_tree(&tree, tag) {
            Ok(filtered) => filtered,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => tree,
    };
    let tags = match queries.tags_for_tree(&tree) {
        Ok(tags) => tags,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    for (folder, files) in &tree {
        if files.is_empty() && filter.is_some() {
            continue;
        }
        println!("{}/", folder);
        for filename in files {
            let identifier = folio::ident::normalize(folder, filename);
            match tags.get(&identifier) {
                Some(names) => {
                    let joined: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
                    println!("  {}  [{}]", filename, joined.join(", "));
                }
                None => println!("  {}", filename),
            }
        }
    }
    0
}

fn cmd_attach(api: &LibraryApi, identifier: &str, tag: &str) -> i32 {
    match api.attach_tag(identifier, tag) {
        Ok(doc) => {
            let joined: Vec<&str> = doc.tags.iter().map(|s| s.as_str()).collect();
            println!("{}  [{}]", doc.identifier, joined.join(", "));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_detach(api: &LibraryApi, identifier: &str, tag: &str) -> i32 {
    match api.detach_tag(identifier, tag) {
        Ok(true) => {
            println!("Removed '{}' from {}", tag, identifier);
            0
        }
        Ok(false) => {
            println!("Nothing to remove: {} does not carry '{}'", identifier, tag);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_doc(api: &LibraryApi, identifier: &str) -> i32 {
    match api.tags_for_document(identifier) {
        Ok(tags) if tags.is_empty() => {
            println!("{}: no tags", identifier);
            0
        }
        Ok(tags) => {
            let joined: Vec<&str> = tags.iter().map(|s| s.as_str()).collect();
            println!("{}: {}", identifier, joined.join(", "));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_tag_list(api: &LibraryApi, json: bool) -> i32 {
    let tags = match api.list_tags() {
        Ok(tags) => tags,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        match serde_json::to_string_pretty(&tags) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }
    println!("{:<20}  {:>9}  DESCRIPTION", "NAME", "PROTECTED");
    println!("{}", "-".repeat(60));
    for tag in tags {
        println!(
            "{:<20}  {:>9}  {}",
            tag.name,
            if tag.is_protected() { "yes" } else { "no" },
            tag.description.as_deref().unwrap_or("")
        );
    }
    0
}

fn cmd_tag_stats(api: &LibraryApi, json: bool) -> i32 {
    let stats = match api.tag_statistics() {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }
    println!("{:<20}  {:>6}  DESCRIPTION", "NAME", "COUNT");
    println!("{}", "-".repeat(60));
    for (name, usage) in stats {
        println!(
            "{:<20}  {:>6}  {}",
            name,
            usage.count,
            usage.description.as_deref().unwrap_or("")
        );
    }
    0
}

fn cmd_tag_create(api: &LibraryApi, name: &str, description: &str) -> i32 {
    match api.create_tag(name, description) {
        Ok(tag) => {
            println!("Created tag '{}'", tag.name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_tag_rename(api: &LibraryApi, old: &str, new: &str) -> i32 {
    let id = match find_tag_by_name(api, old) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match api.rename_tag(id, new) {
        Ok(tag) => {
            println!("Renamed '{}' to '{}'", old, tag.name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_tag_describe(api: &LibraryApi, name: &str, description: &str) -> i32 {
    let id = match find_tag_by_name(api, name) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match api.update_tag_description(id, description) {
        Ok(tag) => {
            println!("Updated description of '{}'", tag.name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_tag_delete(api: &LibraryApi, name: &str) -> i32 {
    let id = match find_tag_by_name(api, name) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match api.delete_tag(id) {
        Ok(()) => {
            println!("Deleted tag '{}'", name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = match open_api(cli.db) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Scan { dir, filter } => cmd_scan(&api, &dir, filter.as_deref()),
        Commands::Attach { identifier, tag } => cmd_attach(&api, &identifier, &tag),
        Commands::Detach { identifier, tag } => cmd_detach(&api, &identifier, &tag),
        Commands::Doc { identifier } => cmd_doc(&api, &identifier),
        Commands::Tag { action } => match action {
            TagAction::List { json } => cmd_tag_list(&api, json),
            TagAction::Stats { json } => cmd_tag_stats(&api, json),
            TagAction::Create { name, description } => cmd_tag_create(&api, &name, &description),
            TagAction::Rename { old, new } => cmd_tag_rename(&api, &old, &new),
            TagAction::Describe { name, description } => cmd_tag_describe(&api, &name, &description),
            TagAction::Delete { name } => cmd_tag_delete(&api, &name),
        },
    };
    std::process::exit(code);
}
