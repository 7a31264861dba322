mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::run;
pub use util::{
    bson_doc_to_json, doc_to_json, load_ndjson, parse_field_orders, parse_fields, parse_sort,
};
