use bookdb::cli as prog_cli;
use bookdb::{Database, logger};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AppConfig {
    default_collection: Option<String>,
    data_file: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

fn load_config(cli_cfg: Option<PathBuf>) -> AppConfig {
    // Precedence: CLI > env > config files > defaults
    let mut cfg = AppConfig::default();
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = &cli_cfg {
        paths.push(p.clone());
    }
    if let Ok(p) = std::env::var("BOOKDB_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("bookdb.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("bookdb.toml"));
    }
    for p in paths {
        if p.exists()
            && let Ok(s) = std::fs::read_to_string(&p)
            && let Ok(file_cfg) = toml::from_str::<AppConfig>(&s)
        {
            if cfg.default_collection.is_none() {
                cfg.default_collection = file_cfg.default_collection;
            }
            if cfg.data_file.is_none() {
                cfg.data_file = file_cfg.data_file;
            }
            if cfg.log_dir.is_none() {
                cfg.log_dir = file_cfg.log_dir;
            }
            if cfg.log_level.is_none() {
                cfg.log_level = file_cfg.log_level;
            }
        }
    }
    if cfg.default_collection.is_none()
        && let Ok(s) = std::env::var("BOOKDB_COLLECTION")
    {
        cfg.default_collection = Some(s);
    }
    if cfg.data_file.is_none()
        && let Ok(s) = std::env::var("BOOKDB_DATA")
    {
        cfg.data_file = Some(PathBuf::from(s));
    }
    if cfg.log_dir.is_none()
        && let Ok(s) = std::env::var("BOOKDB_LOG_DIR")
    {
        cfg.log_dir = Some(PathBuf::from(s));
    }
    if cfg.log_level.is_none()
        && let Ok(s) = std::env::var("BOOKDB_LOG_LEVEL")
    {
        cfg.log_level = Some(s);
    }
    cfg
}

#[derive(Parser)]
#[command(name = "bookdb", about = "Run canonical queries against a books collection")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Collection to operate on (default: books)
    #[arg(long, global = true)]
    collection: Option<String>,
    /// NDJSON file to load instead of the built-in fixtures
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run all seventeen catalog statements in order
    Catalog,
    /// Find documents matching a JSON filter
    Find {
        filter: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        skip: Option<usize>,
    },
    /// Count documents matching a JSON filter
    Count { filter: String },
    /// Update the first matching document
    UpdateOne { filter: String, update: String },
    /// Update every matching document
    UpdateMany { filter: String, update: String },
    /// Delete the first matching document
    DeleteOne { filter: String },
    /// Delete every matching document
    DeleteMany { filter: String },
    /// Run an aggregation pipeline (JSON array of stages)
    Aggregate { pipeline: String },
    /// Explain a find with execution statistics
    Explain { filter: String },
    /// Create an index ("title:1" or "author:1,published_year:-1")
    IndexCreate { fields: String },
    /// Drop an index by name
    IndexDrop { name: String },
    /// List indexes on the collection
    IndexList,
}

fn main() {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.clone());
    let _ = logger::configure_logging(cfg.log_dir.as_deref(), cfg.log_level.as_deref());

    let collection = cli
        .collection
        .or(cfg.default_collection)
        .unwrap_or_else(|| "books".to_string());
    let data_file = cli.data.or(cfg.data_file);

    let db = Database::new();
    let col = db.create_collection(&collection);
    // The store is per-invocation; every run starts from fixtures or the
    // provided data file.
    let load_result = match &data_file {
        Some(path) => prog_cli::load_ndjson(&col, path).map(|_| ()),
        None => {
            bookdb::fixtures::seed(&col);
            Ok(())
        }
    };
    if let Err(e) = load_result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let cmd = match cli.cmd {
        Cmd::Catalog => prog_cli::Command::Catalog { collection },
        Cmd::Find { filter, project, sort, limit, skip } => prog_cli::Command::Find {
            collection,
            filter_json: filter,
            project,
            sort,
            limit,
            skip,
        },
        Cmd::Count { filter } => prog_cli::Command::Count { collection, filter_json: filter },
        Cmd::UpdateOne { filter, update } => prog_cli::Command::UpdateOne {
            collection,
            filter_json: filter,
            update_json: update,
        },
        Cmd::UpdateMany { filter, update } => prog_cli::Command::UpdateMany {
            collection,
            filter_json: filter,
            update_json: update,
        },
        Cmd::DeleteOne { filter } => prog_cli::Command::DeleteOne { collection, filter_json: filter },
        Cmd::DeleteMany { filter } => {
            prog_cli::Command::DeleteMany { collection, filter_json: filter }
        }
        Cmd::Aggregate { pipeline } => {
            prog_cli::Command::Aggregate { collection, pipeline_json: pipeline }
        }
        Cmd::Explain { filter } => prog_cli::Command::Explain { collection, filter_json: filter },
        Cmd::IndexCreate { fields } => prog_cli::Command::IndexCreate { collection, fields },
        Cmd::IndexDrop { name } => prog_cli::Command::IndexDrop { collection, name },
        Cmd::IndexList => prog_cli::Command::IndexList { collection },
    };

    if let Err(e) = prog_cli::run(&db, cmd) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
