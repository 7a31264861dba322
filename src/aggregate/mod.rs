// Submodules for separation of concerns
mod eval;
mod exec;
mod parse;
mod types;

// Public API re-exports
pub use eval::eval_expr;
pub use exec::run_pipeline;
pub use parse::parse_pipeline_json;
pub use types::{Accumulator, Expr, Stage, SumInput};
