use crate::query::SortSpec;
use bson::Bson;

/// Expression over a single document, the derived-grouping-key subset:
/// field references, literals, integer arithmetic, string conversion and
/// concatenation.
#[derive(Debug, Clone)]
pub enum Expr {
    Field(String),
    Literal(Bson),
    Subtract(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
    ToString(Box<Expr>),
    Concat(Vec<Expr>),
}

impl Expr {
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    #[must_use]
    pub fn literal(v: impl Into<Bson>) -> Self {
        Self::Literal(v.into())
    }
}

#[derive(Debug, Clone)]
pub enum SumInput {
    /// `$sum: 1`, the counting idiom.
    Value(i64),
    Field(String),
}

#[derive(Debug, Clone)]
pub enum Accumulator {
    Avg { field: String },
    Sum { input: SumInput },
}

#[derive(Debug, Clone)]
pub enum Stage {
    Group { key: Expr, accumulators: Vec<(String, Accumulator)> },
    Sort(Vec<SortSpec>),
    Limit(usize),
}
