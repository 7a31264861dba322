/// Programmatic command surface; the binary maps its clap subcommands onto
/// these.
pub enum Command {
    // The full catalog, in order
    Catalog { collection: String },
    // Individual query operations (JSON arguments in the shell shape)
    Find {
        collection: String,
        filter_json: String,
        project: Option<String>,
        sort: Option<String>,
        limit: Option<usize>,
        skip: Option<usize>,
    },
    Count { collection: String, filter_json: String },
    UpdateOne { collection: String, filter_json: String, update_json: String },
    UpdateMany { collection: String, filter_json: String, update_json: String },
    DeleteOne { collection: String, filter_json: String },
    DeleteMany { collection: String, filter_json: String },
    Aggregate { collection: String, pipeline_json: String },
    Explain { collection: String, filter_json: String },
    // Index admin ("field:1" / "author:1,published_year:-1" specs)
    IndexCreate { collection: String, fields: String },
    IndexDrop { collection: String, name: String },
    IndexList { collection: String },
}
