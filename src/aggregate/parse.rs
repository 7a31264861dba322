use crate::errors::DbError;
use crate::query::{Order, SortSpec};
use serde_json::Value;

use super::types::{Accumulator, Expr, Stage, SumInput};

/// Parses a pipeline in the shell's JSON shape:
/// `[{"$group": {...}}, {"$sort": {...}}, {"$limit": n}]`.
///
/// # Errors
/// Returns `AggregationError` for unknown stages/operators or malformed
/// stage bodies, `Json` for invalid JSON.
pub fn parse_pipeline_json(json: &str) -> Result<Vec<Stage>, DbError> {
    let v: Value = serde_json::from_str(json)?;
    let Value::Array(stages) = v else {
        return Err(DbError::AggregationError("pipeline must be a JSON array".into()));
    };
    stages.iter().map(parse_stage).collect()
}

fn parse_stage(v: &Value) -> Result<Stage, DbError> {
    let Value::Object(obj) = v else {
        return Err(DbError::AggregationError("each stage must be an object".into()));
    };
    if obj.len() != 1 {
        return Err(DbError::AggregationError("each stage must have exactly one operator".into()));
    }
    let (op, body) = obj.iter().next().map(|(k, v)| (k.as_str(), v)).unwrap_or(("", &Value::Null));
    match op {
        "$group" => parse_group(body),
        "$sort" => parse_sort(body),
        "$limit" => body
            .as_u64()
            .map(|n| Stage::Limit(n as usize))
            .ok_or_else(|| DbError::AggregationError("$limit requires a non-negative integer".into())),
        other => Err(DbError::AggregationError(format!("unsupported stage: {other}"))),
    }
}

fn parse_group(body: &Value) -> Result<Stage, DbError> {
    let Value::Object(obj) = body else {
        return Err(DbError::AggregationError("$group requires an object".into()));
    };
    let key = obj
        .get("_id")
        .ok_or_else(|| DbError::AggregationError("$group requires an _id key".into()))
        .and_then(parse_expr)?;
    let mut accumulators = Vec::new();
    for (name, spec) in obj {
        if name == "_id" {
            continue;
        }
        accumulators.push((name.clone(), parse_accumulator(spec)?));
    }
    Ok(Stage::Group { key, accumulators })
}

fn parse_accumulator(v: &Value) -> Result<Accumulator, DbError> {
    let Value::Object(obj) = v else {
        return Err(DbError::AggregationError("accumulator must be an object".into()));
    };
    if obj.len() != 1 {
        return Err(DbError::AggregationError("accumulator must have exactly one operator".into()));
    }
    let (op, arg) = obj.iter().next().map(|(k, v)| (k.as_str(), v)).unwrap_or(("", &Value::Null));
    match (op, arg) {
        ("$avg", Value::String(s)) if s.starts_with('$') => {
            Ok(Accumulator::Avg { field: s[1..].to_string() })
        }
        ("$sum", Value::Number(n)) => n
            .as_i64()
            .map(|v| Accumulator::Sum { input: SumInput::Value(v) })
            .ok_or_else(|| DbError::AggregationError("$sum literal must be an integer".into())),
        ("$sum", Value::String(s)) if s.starts_with('$') => {
            Ok(Accumulator::Sum { input: SumInput::Field(s[1..].to_string()) })
        }
        (other, _) => Err(DbError::AggregationError(format!("unsupported accumulator: {other}"))),
    }
}

fn parse_sort(body: &Value) -> Result<Stage, DbError> {
    let Value::Object(obj) = body else {
        return Err(DbError::AggregationError("$sort requires an object".into()));
    };
    let mut spec = Vec::new();
    for (field, dir) in obj {
        let order = match dir.as_i64() {
            Some(1) => Order::Asc,
            Some(-1) => Order::Desc,
            _ => {
                return Err(DbError::AggregationError(format!(
                    "sort direction for {field} must be 1 or -1"
                )));
            }
        };
        spec.push(SortSpec { field: field.clone(), order });
    }
    if spec.is_empty() {
        return Err(DbError::AggregationError("$sort requires at least one key".into()));
    }
    Ok(Stage::Sort(spec))
}

fn parse_expr(v: &Value) -> Result<Expr, DbError> {
    match v {
        Value::String(s) if s.starts_with('$') => Ok(Expr::Field(s[1..].to_string())),
        Value::String(s) => Ok(Expr::Literal(bson::Bson::String(s.clone()))),
        Value::Bool(b) => Ok(Expr::Literal(bson::Bson::Boolean(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Expr::Literal(bson::Bson::Int64(i)))
            } else {
                Ok(Expr::Literal(bson::Bson::Double(n.as_f64().unwrap_or(f64::NAN))))
            }
        }
        Value::Object(obj) if obj.len() == 1 => {
            let (op, arg) =
                obj.iter().next().map(|(k, v)| (k.as_str(), v)).unwrap_or(("", &Value::Null));
            match op {
                "$subtract" => parse_binop(arg, Expr::Subtract),
                "$mod" => parse_binop(arg, Expr::Mod),
                "$toString" => Ok(Expr::ToString(Box::new(parse_expr(arg)?))),
                "$concat" => {
                    let Value::Array(parts) = arg else {
                        return Err(DbError::AggregationError("$concat requires an array".into()));
                    };
                    Ok(Expr::Concat(parts.iter().map(parse_expr).collect::<Result<_, _>>()?))
                }
                other => Err(DbError::AggregationError(format!("unsupported operator: {other}"))),
            }
        }
        _ => Err(DbError::AggregationError("unsupported expression".into())),
    }
}

fn parse_binop(arg: &Value, ctor: fn(Box<Expr>, Box<Expr>) -> Expr) -> Result<Expr, DbError> {
    let Value::Array(args) = arg else {
        return Err(DbError::AggregationError("arithmetic operator requires an array".into()));
    };
    if args.len() != 2 {
        return Err(DbError::AggregationError("arithmetic operator takes two operands".into()));
    }
    Ok(ctor(Box::new(parse_expr(&args[0])?), Box::new(parse_expr(&args[1])?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_decade_pipeline() {
        let json = r#"[
          {"$group": {
            "_id": {"$concat": [
              {"$toString": {"$subtract": ["$published_year", {"$mod": ["$published_year", 10]}]}},
              "s"
            ]},
            "count": {"$sum": 1}
          }},
          {"$sort": {"_id": 1}}
        ]"#;
        let stages = parse_pipeline_json(json).unwrap();
        assert_eq!(stages.len(), 2);
        match &stages[0] {
            Stage::Group { key: Expr::Concat(parts), accumulators } => {
                assert_eq!(parts.len(), 2);
                assert_eq!(accumulators.len(), 1);
                assert!(matches!(
                    accumulators[0].1,
                    Accumulator::Sum { input: SumInput::Value(1) }
                ));
            }
            other => panic!("expected group stage, got {other:?}"),
        }
        assert!(matches!(&stages[1], Stage::Sort(s) if s.len() == 1));
    }

    #[test]
    fn parses_avg_and_limit() {
        let stages = parse_pipeline_json(
            r#"[{"$group": {"_id": "$genre", "avgPrice": {"$avg": "$price"}}}, {"$limit": 1}]"#,
        )
        .unwrap();
        assert!(matches!(
            &stages[0],
            Stage::Group { key: Expr::Field(f), .. } if f == "genre"
        ));
        assert!(matches!(stages[1], Stage::Limit(1)));
    }

    #[test]
    fn rejects_unknown_stage() {
        assert!(matches!(
            parse_pipeline_json(r#"[{"$lookup": {}}]"#),
            Err(DbError::AggregationError(_))
        ));
    }

    #[test]
    fn rejects_bad_sort_direction() {
        assert!(parse_pipeline_json(r#"[{"$sort": {"price": 2}}]"#).is_err());
    }
}
