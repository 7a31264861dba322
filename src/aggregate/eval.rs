use bson::{Bson, Document as BsonDocument};

use super::types::Expr;

fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut cur = doc.get(first)?;
    for p in parts {
        match cur {
            Bson::Document(d) => cur = d.get(p)?,
            _ => return None,
        }
    }
    Some(cur)
}

fn as_i64(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

/// Evaluates an expression against one document. Missing fields and type
/// mismatches yield `Bson::Null`, matching the aggregation operators'
/// null-propagation.
pub fn eval_expr(doc: &BsonDocument, expr: &Expr) -> Bson {
    match expr {
        Expr::Field(path) => get_path(doc, path).cloned().unwrap_or(Bson::Null),
        Expr::Literal(v) => v.clone(),
        Expr::Subtract(a, b) => numeric_binop(doc, a, b, i64::wrapping_sub, |x, y| x - y),
        Expr::Mod(a, b) => {
            // Truncating remainder, like the shell's $mod.
            let rhs = eval_expr(doc, b);
            if as_i64(&rhs) == Some(0) || as_f64(&rhs) == Some(0.0) {
                return Bson::Null;
            }
            numeric_binop(doc, a, b, i64::wrapping_rem, |x, y| x % y)
        }
        Expr::ToString(inner) => match eval_expr(doc, inner) {
            Bson::String(s) => Bson::String(s),
            Bson::Int32(i) => Bson::String(i.to_string()),
            Bson::Int64(i) => Bson::String(i.to_string()),
            Bson::Double(f) => Bson::String(f.to_string()),
            Bson::Boolean(b) => Bson::String(b.to_string()),
            _ => Bson::Null,
        },
        Expr::Concat(parts) => {
            let mut out = String::new();
            for p in parts {
                match eval_expr(doc, p) {
                    Bson::String(s) => out.push_str(&s),
                    _ => return Bson::Null,
                }
            }
            Bson::String(out)
        }
    }
}

fn numeric_binop(
    doc: &BsonDocument,
    a: &Expr,
    b: &Expr,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Bson {
    let va = eval_expr(doc, a);
    let vb = eval_expr(doc, b);
    if let (Some(x), Some(y)) = (as_i64(&va), as_i64(&vb)) {
        return Bson::Int64(int_op(x, y));
    }
    match (as_f64(&va), as_f64(&vb)) {
        (Some(x), Some(y)) => Bson::Double(float_op(x, y)),
        _ => Bson::Null,
    }
}

pub(crate) fn numeric_value(doc: &BsonDocument, path: &str) -> Option<f64> {
    get_path(doc, path).and_then(as_f64)
}
