use bookdb::Database;
use bookdb::document::Document;
use bookdb::errors::DbError;
use bookdb::fixtures;
use bookdb::query::{Filter, FindOptions, Order};
use bson::doc;
use std::collections::HashSet;

fn seeded_db() -> Database {
    let db = Database::new();
    let col = db.create_collection("books");
    fixtures::seed(&col);
    db
}

#[test]
fn index_names_follow_field_and_direction() {
    let db = seeded_db();
    assert_eq!(db.create_index("books", "title", Order::Asc).unwrap(), "title_1");
    assert_eq!(db.create_index("books", "price", Order::Desc).unwrap(), "price_-1");
    let compound = db
        .create_compound_index(
            "books",
            vec![("author".to_string(), Order::Asc), ("published_year".to_string(), Order::Desc)],
        )
        .unwrap();
    assert_eq!(compound, "author_1_published_year_-1");
}

#[test]
fn duplicate_index_creation_is_rejected() {
    let db = seeded_db();
    db.create_index("books", "title", Order::Asc).unwrap();
    let err = db.create_index("books", "title", Order::Asc).unwrap_err();
    assert!(matches!(err, DbError::IndexExists(name) if name == "title_1"));
}

#[test]
fn drop_index_removes_it_and_errors_on_unknown_names() {
    let db = seeded_db();
    db.create_index("books", "title", Order::Asc).unwrap();
    db.drop_index("books", "title_1").unwrap();
    assert!(db.list_indexes("books").unwrap().is_empty());
    let err = db.drop_index("books", "title_1").unwrap_err();
    assert!(matches!(err, DbError::NoSuchIndex(_)));
}

#[test]
fn descriptors_carry_fields_and_directions() {
    let db = seeded_db();
    db.create_compound_index(
        "books",
        vec![("author".to_string(), Order::Asc), ("published_year".to_string(), Order::Desc)],
    )
    .unwrap();
    let descriptors = db.list_indexes("books").unwrap();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(
        descriptors[0].fields,
        vec![("author".to_string(), Order::Asc), ("published_year".to_string(), Order::Desc)]
    );
}

#[test]
fn compound_index_requires_at_least_two_fields() {
    let db = seeded_db();
    let err = db
        .create_compound_index("books", vec![("author".to_string(), Order::Asc)])
        .unwrap_err();
    assert!(matches!(err, DbError::QueryError(_)));
}

#[test]
fn indexed_and_unindexed_equality_agree() {
    let db = seeded_db();
    let filter = Filter::eq("author", "J.R.R. Tolkien");
    let before: HashSet<String> = db
        .find("books", &filter, &FindOptions::default())
        .unwrap()
        .to_vec()
        .iter()
        .map(|d| d.data.get_str("title").unwrap().to_string())
        .collect();
    db.create_index("books", "author", Order::Asc).unwrap();
    let after: HashSet<String> = db
        .find("books", &filter, &FindOptions::default())
        .unwrap()
        .to_vec()
        .iter()
        .map(|d| d.data.get_str("title").unwrap().to_string())
        .collect();
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
}

#[test]
fn indexed_and_unindexed_range_agree() {
    let db = seeded_db();
    let filter = Filter::gt("published_year", 2010);
    let find = |db: &Database| {
        db.find("books", &filter, &FindOptions::default()).unwrap().to_vec().len()
    };
    assert_eq!(find(&db), 5);
    db.create_index("books", "published_year", Order::Asc).unwrap();
    assert_eq!(find(&db), 5);
}

#[test]
fn index_stays_current_through_insert_update_delete() {
    let db = seeded_db();
    db.create_index("books", "author", Order::Asc).unwrap();
    let by_author = |author: &str| {
        db.find("books", &Filter::eq("author", author), &FindOptions::default())
            .unwrap()
            .to_vec()
            .len()
    };
    assert_eq!(by_author("Ursula K. Le Guin"), 0);

    let id = db
        .insert_document(
            "books",
            Document::new(doc! {
                "title": "A Wizard of Earthsea",
                "author": "Ursula K. Le Guin",
                "genre": "Fantasy",
                "published_year": 1968,
                "price": 13.0,
                "in_stock": true,
            }),
        )
        .unwrap();
    assert_eq!(by_author("Ursula K. Le Guin"), 1);

    let col = db.get_collection("books").unwrap();
    let mut doc = col.find_document(&id).unwrap();
    doc.data.insert("author", "U.K. Le Guin");
    col.update_document(&id, doc);
    assert_eq!(by_author("Ursula K. Le Guin"), 0);
    assert_eq!(by_author("U.K. Le Guin"), 1);

    col.delete_document(&id);
    assert_eq!(by_author("U.K. Le Guin"), 0);
}

#[test]
fn index_stats_record_build_and_lookups() {
    let db = seeded_db();
    db.create_index("books", "author", Order::Asc).unwrap();
    let col = db.get_collection("books").unwrap();
    let stats = col.index_stats("author_1").unwrap();
    assert_eq!(stats.entries, 13);
    assert_eq!(stats.keys, 9);

    let hit = db
        .find("books", &Filter::eq("author", "George Orwell"), &FindOptions::default())
        .unwrap()
        .to_vec();
    let miss = db
        .find("books", &Filter::eq("author", "Nobody"), &FindOptions::default())
        .unwrap()
        .to_vec();
    assert_eq!(hit.len(), 3);
    assert!(miss.is_empty());
    let stats = col.index_stats("author_1").unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}
