use crate::collection::Collection;
use crate::document::Document;
use serde::Serialize;
use std::sync::Arc;

use super::eval::{compare_docs, eval_filter};
use super::exec::plan_index_candidates;
use super::types::{Filter, FindOptions, MAX_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage")]
pub enum WinningPlan {
    #[serde(rename = "COLLSCAN")]
    CollScan,
    #[serde(rename = "IXSCAN")]
    IndexScan { index_name: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStats {
    pub n_returned: usize,
    pub docs_examined: usize,
    pub keys_examined: usize,
    pub execution_time_ms: u64,
}

/// Execution-statistics view of a find, the `explain("executionStats")`
/// analogue.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainReport {
    pub collection: String,
    pub winning_plan: WinningPlan,
    pub execution_stats: ExecutionStats,
}

impl ExplainReport {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Runs the query for real, counting the documents and index keys examined.
/// Index hit/miss stats are recorded exactly as a normal find would record
/// them; the collection itself is not mutated.
pub fn explain_find(col: &Arc<Collection>, filter: &Filter, opts: &FindOptions) -> ExplainReport {
    let start = std::time::Instant::now();
    let (winning_plan, candidates, keys_examined) = match plan_index_candidates(col, filter) {
        Some(plan) => {
            let keys = plan.ids.len();
            (WinningPlan::IndexScan { index_name: plan.index }, plan.ids, keys)
        }
        None => (WinningPlan::CollScan, col.list_ids(), 0),
    };

    let docs_examined = candidates.len();
    let mut matched: Vec<Document> = candidates
        .into_iter()
        .filter_map(|id| col.find_document(&id))
        .filter(|d| eval_filter(&d.data, filter))
        .collect();

    if let Some(sort) = &opts.sort {
        matched.sort_by(|a, b| compare_docs(&a.data, &b.data, sort));
    }
    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    let n_returned = matched.len().saturating_sub(skip).min(limit);

    let report = ExplainReport {
        collection: col.name_str(),
        winning_plan,
        execution_stats: ExecutionStats {
            n_returned,
            docs_examined,
            keys_examined,
            execution_time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        },
    };
    log::debug!(
        target: "bookdb::query",
        "explain collection={} plan={:?} returned={}",
        report.collection,
        report.winning_plan,
        report.execution_stats.n_returned
    );
    report
}
