// Submodules for separation of concerns
mod cursor;
mod eval;
mod exec;
mod explain;
mod parse;
mod types;

// Public API re-exports (preserve original paths)
pub use cursor::Cursor;
pub use eval::{compare_bson, compare_docs, eval_filter, project_fields};
pub use exec::{
    apply_update, count_docs, delete_many, delete_one, find_docs, update_many, update_one,
};
pub use explain::{ExecutionStats, ExplainReport, WinningPlan, explain_find};
pub use parse::{FilterSerde, UpdateDocSerde, parse_filter_json, parse_update_json};
pub use types::{
    CmpOp, DeleteReport, Filter, FindOptions, Order, SortSpec, UpdateDoc, UpdateReport,
};
