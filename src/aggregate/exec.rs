use crate::collection::Collection;
use crate::errors::DbError;
use crate::query::compare_docs;
use bson::{Bson, Document as BsonDocument};
use std::sync::Arc;

use super::eval::{eval_expr, numeric_value};
use super::types::{Accumulator, Stage, SumInput};

/// Runs a pipeline over the collection and returns materialized result
/// documents. An empty pipeline yields the documents unchanged.
pub fn run_pipeline(
    col: &Arc<Collection>,
    stages: &[Stage],
) -> Result<Vec<BsonDocument>, DbError> {
    let start = std::time::Instant::now();
    let mut docs: Vec<BsonDocument> =
        col.get_all_documents().into_iter().map(|d| d.data).collect();
    for stage in stages {
        docs = apply_stage(docs, stage)?;
    }
    log::debug!(
        target: "bookdb::query",
        "aggregate collection={} stages={} duration_ms={} result_count={}",
        col.name_str(),
        stages.len(),
        start.elapsed().as_millis(),
        docs.len()
    );
    Ok(docs)
}

fn apply_stage(docs: Vec<BsonDocument>, stage: &Stage) -> Result<Vec<BsonDocument>, DbError> {
    match stage {
        Stage::Group { key, accumulators } => {
            // Group order is first appearance of each key; later Sort stages
            // impose any required ordering.
            let mut groups: Vec<(Bson, Vec<AccState>)> = Vec::new();
            for doc in &docs {
                let k = eval_expr(doc, key);
                let slot = match groups.iter().position(|(gk, _)| *gk == k) {
                    Some(i) => i,
                    None => {
                        groups.push((
                            k,
                            accumulators.iter().map(|(_, a)| AccState::new(a)).collect(),
                        ));
                        groups.len() - 1
                    }
                };
                for state in groups[slot].1.iter_mut() {
                    state.observe(doc);
                }
            }
            Ok(groups
                .into_iter()
                .map(|(k, states)| {
                    let mut out = BsonDocument::new();
                    out.insert("_id", k);
                    for ((name, _), state) in accumulators.iter().zip(states) {
                        out.insert(name.clone(), state.finish());
                    }
                    out
                })
                .collect())
        }
        Stage::Sort(spec) => {
            if spec.is_empty() {
                return Err(DbError::AggregationError("$sort requires at least one key".into()));
            }
            let mut docs = docs;
            docs.sort_by(|a, b| compare_docs(a, b, spec));
            Ok(docs)
        }
        Stage::Limit(n) => {
            let mut docs = docs;
            docs.truncate(*n);
            Ok(docs)
        }
    }
}

enum AccState {
    Avg { field: String, sum: f64, count: u64 },
    SumValue { value: i64, total: i64 },
    SumField { field: String, total: f64 },
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Avg { field } => {
                Self::Avg { field: field.clone(), sum: 0.0, count: 0 }
            }
            Accumulator::Sum { input: SumInput::Value(v) } => {
                Self::SumValue { value: *v, total: 0 }
            }
            Accumulator::Sum { input: SumInput::Field(field) } => {
                Self::SumField { field: field.clone(), total: 0.0 }
            }
        }
    }

    fn observe(&mut self, doc: &BsonDocument) {
        match self {
            // Non-numeric and missing values are ignored, as $avg does.
            Self::Avg { field, sum, count } => {
                if let Some(v) = numeric_value(doc, field) {
                    *sum += v;
                    *count += 1;
                }
            }
            Self::SumValue { value, total } => *total += *value,
            Self::SumField { field, total } => {
                if let Some(v) = numeric_value(doc, field) {
                    *total += v;
                }
            }
        }
    }

    fn finish(self) -> Bson {
        match self {
            Self::Avg { sum, count, .. } => {
                if count == 0 {
                    Bson::Null
                } else {
                    Bson::Double(sum / count as f64)
                }
            }
            Self::SumValue { total, .. } => Bson::Int64(total),
            Self::SumField { total, .. } => Bson::Double(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::aggregate::Expr;
    use crate::query::{Order, SortSpec};
    use bson::doc;

    fn seeded() -> Arc<Collection> {
        let col = Arc::new(Collection::new("books".to_string()));
        for (genre, price) in [
            ("Programming", 45.0),
            ("Programming", 55.0),
            ("Fantasy", 15.0),
        ] {
            col.insert_document(Document::new(doc! {"genre": genre, "price": price}));
        }
        col
    }

    #[test]
    fn group_avg_by_field() {
        let col = seeded();
        let stages = [Stage::Group {
            key: Expr::field("genre"),
            accumulators: vec![(
                "avgPrice".to_string(),
                Accumulator::Avg { field: "price".to_string() },
            )],
        }];
        let out = run_pipeline(&col, &stages).unwrap();
        assert_eq!(out.len(), 2);
        // First-appearance order: Programming first.
        assert_eq!(out[0].get_str("_id").unwrap(), "Programming");
        assert!((out[0].get_f64("avgPrice").unwrap() - 50.0).abs() < f64::EPSILON);
        assert!((out[1].get_f64("avgPrice").unwrap() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn group_count_sort_limit_selects_top_group() {
        let col = seeded();
        let stages = [
            Stage::Group {
                key: Expr::field("genre"),
                accumulators: vec![(
                    "count".to_string(),
                    Accumulator::Sum { input: SumInput::Value(1) },
                )],
            },
            Stage::Sort(vec![SortSpec { field: "count".to_string(), order: Order::Desc }]),
            Stage::Limit(1),
        ];
        let out = run_pipeline(&col, &stages).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_str("_id").unwrap(), "Programming");
        assert_eq!(out[0].get_i64("count").unwrap(), 2);
    }

    #[test]
    fn empty_collection_yields_empty_result() {
        let col = Arc::new(Collection::new("empty".to_string()));
        let stages = [Stage::Group {
            key: Expr::field("genre"),
            accumulators: vec![(
                "count".to_string(),
                Accumulator::Sum { input: SumInput::Value(1) },
            )],
        }];
        assert!(run_pipeline(&col, &stages).unwrap().is_empty());
    }
}
