use crate::Database;
use crate::catalog;
use crate::errors::DbError;
use crate::query::{FindOptions, parse_filter_json, parse_update_json};

use super::command::Command;
use super::util::{bson_doc_to_json, doc_to_json, parse_field_orders, parse_fields, parse_sort};

fn print_docs(docs: &[crate::document::Document], include_id: bool) {
    for d in docs {
        println!("{:#}", doc_to_json(d, include_id));
    }
}

/// Executes one command against the database, printing results as pretty
/// JSON.
///
/// # Errors
/// Propagates parse and engine errors; missing collections are
/// `NoSuchCollection`.
pub fn run(db: &Database, cmd: Command) -> Result<(), DbError> {
    match cmd {
        Command::Catalog { collection } => run_catalog(db, &collection),
        Command::Find { collection, filter_json, project, sort, limit, skip } => {
            let filter = parse_filter_json(&filter_json)?;
            let opts = FindOptions {
                projection: project.as_deref().map(parse_fields),
                sort: sort.as_deref().map(parse_sort).transpose()?,
                limit,
                skip,
            };
            let include_id = opts.projection.is_none();
            let docs = db.find(&collection, &filter, &opts)?.to_vec();
            print_docs(&docs, include_id);
            Ok(())
        }
        Command::Count { collection, filter_json } => {
            let filter = parse_filter_json(&filter_json)?;
            println!("{}", db.count(&collection, &filter)?);
            Ok(())
        }
        Command::UpdateOne { collection, filter_json, update_json } => {
            let rep = db.update_one(
                &collection,
                &parse_filter_json(&filter_json)?,
                &parse_update_json(&update_json)?,
            )?;
            println!("matched={} modified={}", rep.matched, rep.modified);
            Ok(())
        }
        Command::UpdateMany { collection, filter_json, update_json } => {
            let rep = db.update_many(
                &collection,
                &parse_filter_json(&filter_json)?,
                &parse_update_json(&update_json)?,
            )?;
            println!("matched={} modified={}", rep.matched, rep.modified);
            Ok(())
        }
        Command::DeleteOne { collection, filter_json } => {
            let rep = db.delete_one(&collection, &parse_filter_json(&filter_json)?)?;
            println!("deleted={}", rep.deleted);
            Ok(())
        }
        Command::DeleteMany { collection, filter_json } => {
            let rep = db.delete_many(&collection, &parse_filter_json(&filter_json)?)?;
            println!("deleted={}", rep.deleted);
            Ok(())
        }
        Command::Aggregate { collection, pipeline_json } => {
            let stages = crate::aggregate::parse_pipeline_json(&pipeline_json)?;
            for doc in db.aggregate(&collection, &stages)? {
                println!("{:#}", bson_doc_to_json(&doc));
            }
            Ok(())
        }
        Command::Explain { collection, filter_json } => {
            let report =
                db.explain(&collection, &parse_filter_json(&filter_json)?, &FindOptions::default())?;
            println!("{:#}", report.to_json());
            Ok(())
        }
        Command::IndexCreate { collection, fields } => {
            let fields = parse_field_orders(&fields)?;
            let name = if let [(field, order)] = fields.as_slice() {
                db.create_index(&collection, field, *order)?
            } else {
                db.create_compound_index(&collection, fields)?
            };
            println!("created index={name}");
            Ok(())
        }
        Command::IndexDrop { collection, name } => {
            db.drop_index(&collection, &name)?;
            println!("dropped index={name}");
            Ok(())
        }
        Command::IndexList { collection } => {
            for d in db.list_indexes(&collection)? {
                let spec = d
                    .fields
                    .iter()
                    .map(|(f, o)| {
                        format!("{f}:{}", if *o == crate::query::Order::Asc { "1" } else { "-1" })
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                println!("{} ({spec})", d.name);
            }
            Ok(())
        }
    }
}

/// Runs the seventeen catalog statements in order, printing each result.
fn run_catalog(db: &Database, collection: &str) -> Result<(), DbError> {
    let col = db.create_collection(collection);
    if col.is_empty() {
        crate::fixtures::seed(&col);
    }

    println!("-- 1. books in genre \"Programming\"");
    print_docs(&catalog::find_by_genre(&col, "Programming"), true);

    println!("-- 2. books published after 2010");
    print_docs(&catalog::find_published_after(&col, 2010), true);

    println!("-- 3. books by George Orwell");
    print_docs(&catalog::find_by_author(&col, "George Orwell"), true);

    println!("-- 4. update \"Clean Code\" price to 55");
    let rep = catalog::set_price(&col, "Clean Code", 55.0);
    println!("matched={} modified={}", rep.matched, rep.modified);

    println!("-- 5. delete \"The Hobbit\"");
    let rep = catalog::delete_by_title(&col, "The Hobbit");
    println!("deleted={}", rep.deleted);

    println!("-- 6. in stock and published after 2010");
    print_docs(&catalog::find_in_stock_published_after(&col, 2010), true);

    println!("-- 7. projection: title, author, price");
    print_docs(&catalog::titles_authors_prices(&col), false);

    println!("-- 8. sorted by price ascending");
    print_docs(&catalog::sort_by_price_asc(&col), true);

    println!("-- 9. sorted by price descending");
    print_docs(&catalog::sort_by_price_desc(&col), true);

    println!("-- 10. page 1 (first 5)");
    print_docs(&catalog::page(&col, 0, 5), true);

    println!("-- 11. page 2 (next 5)");
    print_docs(&catalog::page(&col, 1, 5), true);

    println!("-- 12. average price by genre");
    for doc in catalog::average_price_by_genre(&col)? {
        println!("{:#}", bson_doc_to_json(&doc));
    }

    println!("-- 13. most prolific author");
    if let Some(doc) = catalog::most_prolific_author(&col)? {
        println!("{:#}", bson_doc_to_json(&doc));
    }

    println!("-- 14. book counts by decade");
    for doc in catalog::count_by_decade(&col)? {
        println!("{:#}", bson_doc_to_json(&doc));
    }

    println!("-- 15. create index on title");
    println!("created index={}", catalog::index_on_title(&col)?);

    println!("-- 16. create compound index on author, published_year");
    println!("created index={}", catalog::index_on_author_year(&col)?);

    println!("-- 17. explain find by author");
    println!("{:#}", catalog::explain_find_by_author(&col, "George Orwell").to_json());

    Ok(())
}
