//! The canonical query catalog for the `books` collection: seventeen
//! statements, numbered and ordered as a walk through the engine's surface
//! (CRUD, advanced filtering/sorting/pagination, aggregation, indexing).
//! Each function is one statement, a direct call into the query, aggregate
//! or index layer.

use crate::aggregate::{Accumulator, Expr, Stage, SumInput, run_pipeline};
use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::query::{
    DeleteReport, ExplainReport, Filter, FindOptions, Order, SortSpec, UpdateDoc, UpdateReport,
    delete_one, explain_find, find_docs, update_one,
};
use bson::Document as BsonDocument;
use std::sync::Arc;

/// 1. Find all books in a specific genre.
#[must_use]
pub fn find_by_genre(col: &Arc<Collection>, genre: &str) -> Vec<Document> {
    find_docs(col, &Filter::eq("genre", genre), &FindOptions::default()).to_vec()
}

/// 2. Find books published after a certain year.
#[must_use]
pub fn find_published_after(col: &Arc<Collection>, year: i32) -> Vec<Document> {
    find_docs(col, &Filter::gt("published_year", year), &FindOptions::default()).to_vec()
}

/// 3. Find books by a specific author.
#[must_use]
pub fn find_by_author(col: &Arc<Collection>, author: &str) -> Vec<Document> {
    find_docs(col, &Filter::eq("author", author), &FindOptions::default()).to_vec()
}

/// 4. Update the price of a specific book, keyed by title.
#[must_use]
pub fn set_price(col: &Arc<Collection>, title: &str, price: f64) -> UpdateReport {
    update_one(col, &Filter::eq("title", title), &UpdateDoc::set("price", price))
}

/// 5. Delete a book by its title.
#[must_use]
pub fn delete_by_title(col: &Arc<Collection>, title: &str) -> DeleteReport {
    delete_one(col, &Filter::eq("title", title))
}

/// 6. Find books that are in stock and published after the given year.
#[must_use]
pub fn find_in_stock_published_after(col: &Arc<Collection>, year: i32) -> Vec<Document> {
    let filter = Filter::and(vec![
        Filter::eq("in_stock", true),
        Filter::gt("published_year", year),
    ]);
    find_docs(col, &filter, &FindOptions::default()).to_vec()
}

/// 7. Projection: return only title, author and price of every book.
#[must_use]
pub fn titles_authors_prices(col: &Arc<Collection>) -> Vec<Document> {
    let opts = FindOptions {
        projection: Some(vec!["title".into(), "author".into(), "price".into()]),
        ..FindOptions::default()
    };
    find_docs(col, &Filter::True, &opts).to_vec()
}

/// 8. Sort books by price, ascending.
#[must_use]
pub fn sort_by_price_asc(col: &Arc<Collection>) -> Vec<Document> {
    sort_by_price(col, Order::Asc)
}

/// 9. Sort books by price, descending.
#[must_use]
pub fn sort_by_price_desc(col: &Arc<Collection>) -> Vec<Document> {
    sort_by_price(col, Order::Desc)
}

fn sort_by_price(col: &Arc<Collection>, order: Order) -> Vec<Document> {
    let opts = FindOptions {
        sort: Some(vec![SortSpec { field: "price".into(), order }]),
        ..FindOptions::default()
    };
    find_docs(col, &Filter::True, &opts).to_vec()
}

/// 10/11. Pagination: page `page_no` (zero-based) of `page_size` books in the
/// collection's stable order. Page 0 and page 1 with size 5 are the
/// catalog's statements 10 and 11.
#[must_use]
pub fn page(col: &Arc<Collection>, page_no: usize, page_size: usize) -> Vec<Document> {
    let opts = FindOptions {
        skip: Some(page_no * page_size),
        limit: Some(page_size),
        ..FindOptions::default()
    };
    find_docs(col, &Filter::True, &opts).to_vec()
}

/// 12. Average price of books per genre.
///
/// # Errors
/// Propagates pipeline failures from the aggregation layer.
pub fn average_price_by_genre(col: &Arc<Collection>) -> Result<Vec<BsonDocument>, DbError> {
    run_pipeline(
        col,
        &[Stage::Group {
            key: Expr::field("genre"),
            accumulators: vec![(
                "avgPrice".to_string(),
                Accumulator::Avg { field: "price".to_string() },
            )],
        }],
    )
}

/// 13. The author with the most books in the collection.
///
/// # Errors
/// Propagates pipeline failures from the aggregation layer.
pub fn most_prolific_author(col: &Arc<Collection>) -> Result<Option<BsonDocument>, DbError> {
    let mut out = run_pipeline(
        col,
        &[
            Stage::Group {
                key: Expr::field("author"),
                accumulators: vec![(
                    "count".to_string(),
                    Accumulator::Sum { input: SumInput::Value(1) },
                )],
            },
            Stage::Sort(vec![SortSpec { field: "count".into(), order: Order::Desc }]),
            Stage::Limit(1),
        ],
    )?;
    Ok(out.pop())
}

/// The derived grouping key for statement 14:
/// `concat(toString(year - year mod 10), "s")`, mapping 2015 to "2010s".
#[must_use]
pub fn decade_key(year_field: &str) -> Expr {
    Expr::Concat(vec![
        Expr::ToString(Box::new(Expr::Subtract(
            Box::new(Expr::field(year_field)),
            Box::new(Expr::Mod(
                Box::new(Expr::field(year_field)),
                Box::new(Expr::literal(10)),
            )),
        ))),
        Expr::literal("s"),
    ])
}

/// 14. Book counts per publication decade, bucket labels ascending.
///
/// # Errors
/// Propagates pipeline failures from the aggregation layer.
pub fn count_by_decade(col: &Arc<Collection>) -> Result<Vec<BsonDocument>, DbError> {
    run_pipeline(
        col,
        &[
            Stage::Group {
                key: decade_key("published_year"),
                accumulators: vec![(
                    "count".to_string(),
                    Accumulator::Sum { input: SumInput::Value(1) },
                )],
            },
            Stage::Sort(vec![SortSpec { field: "_id".into(), order: Order::Asc }]),
        ],
    )
}

/// 15. Single-field ascending index on title.
///
/// # Errors
/// `IndexExists` if the index was already created.
pub fn index_on_title(col: &Arc<Collection>) -> Result<String, DbError> {
    col.create_index("title", Order::Asc)
}

/// 16. Compound index on author (ascending) and published_year (descending).
///
/// # Errors
/// `IndexExists` if the index was already created.
pub fn index_on_author_year(col: &Arc<Collection>) -> Result<String, DbError> {
    col.create_compound_index(vec![
        ("author".to_string(), Order::Asc),
        ("published_year".to_string(), Order::Desc),
    ])
}

/// 17. Execution-statistics explanation of the find-by-author query, for
/// comparing plans before and after indexing.
#[must_use]
pub fn explain_find_by_author(col: &Arc<Collection>, author: &str) -> ExplainReport {
    explain_find(col, &Filter::eq("author", author), &FindOptions::default())
}
