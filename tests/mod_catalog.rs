use bookdb::catalog;
use bookdb::collection::Collection;
use bookdb::fixtures;
use std::collections::HashSet;
use std::sync::Arc;

fn seeded() -> Arc<Collection> {
    let col = Arc::new(Collection::new("books".to_string()));
    fixtures::seed(&col);
    col
}

#[test]
fn genre_filter_returns_exactly_the_programming_books() {
    let col = seeded();
    let docs = catalog::find_by_genre(&col, "Programming");
    let titles: HashSet<&str> =
        docs.iter().map(|d| d.data.get_str("title").unwrap()).collect();
    assert_eq!(
        titles,
        HashSet::from([
            "Clean Code",
            "The Pragmatic Programmer",
            "Refactoring",
            "The Rust Programming Language",
        ])
    );
}

#[test]
fn published_after_is_strictly_greater() {
    let col = seeded();
    let docs = catalog::find_published_after(&col, 2010);
    assert_eq!(docs.len(), 5);
    for d in &docs {
        assert!(d.data.get_i32("published_year").unwrap() > 2010);
    }
    // 2011 is in, a book published exactly in 2010 would not be.
    assert!(docs.iter().any(|d| d.data.get_str("title").unwrap() == "The Martian"));
}

#[test]
fn author_filter_finds_all_three_orwell_books() {
    let col = seeded();
    let docs = catalog::find_by_author(&col, "George Orwell");
    assert_eq!(docs.len(), 3);
}

#[test]
fn price_update_touches_exactly_one_document() {
    let col = seeded();
    let rep = catalog::set_price(&col, "Clean Code", 55.0);
    assert_eq!(rep.matched, 1);
    assert_eq!(rep.modified, 1);
    let priced: Vec<f64> = catalog::find_by_genre(&col, "Programming")
        .iter()
        .filter(|d| d.data.get_str("title").unwrap() == "Clean Code")
        .map(|d| d.data.get_f64("price").unwrap())
        .collect();
    assert_eq!(priced, vec![55.0]);
    // Everything else is untouched.
    assert_eq!(col.len(), 13);
}

#[test]
fn delete_by_title_removes_one_and_leaves_the_rest() {
    let col = seeded();
    let rep = catalog::delete_by_title(&col, "The Hobbit");
    assert_eq!(rep.deleted, 1);
    assert_eq!(col.len(), 12);
    assert!(catalog::find_by_author(&col, "J.R.R. Tolkien")
        .iter()
        .all(|d| d.data.get_str("title").unwrap() != "The Hobbit"));
    // Deleting again is a no-op.
    assert_eq!(catalog::delete_by_title(&col, "The Hobbit").deleted, 0);
}

#[test]
fn conjunction_requires_both_stock_and_year() {
    let col = seeded();
    let docs = catalog::find_in_stock_published_after(&col, 2010);
    assert_eq!(docs.len(), 4);
    for d in &docs {
        assert!(d.data.get_bool("in_stock").unwrap());
        assert!(d.data.get_i32("published_year").unwrap() > 2010);
    }
    // "The Martian" (2011) is out of stock and must not appear.
    assert!(docs.iter().all(|d| d.data.get_str("title").unwrap() != "The Martian"));
}

#[test]
fn projection_returns_only_the_three_fields() {
    let col = seeded();
    let docs = catalog::titles_authors_prices(&col);
    assert_eq!(docs.len(), 13);
    for d in &docs {
        assert_eq!(d.data.len(), 3);
        assert!(d.data.get_str("title").is_ok());
        assert!(d.data.get_str("author").is_ok());
        assert!(d.data.get_f64("price").is_ok());
        assert!(d.data.get("genre").is_none());
    }
}

#[test]
fn price_sorts_run_both_directions() {
    let col = seeded();
    let asc = catalog::sort_by_price_asc(&col);
    assert_eq!(asc.first().unwrap().data.get_str("title").unwrap(), "Animal Farm");
    for w in asc.windows(2) {
        assert!(w[0].data.get_f64("price").unwrap() <= w[1].data.get_f64("price").unwrap());
    }
    let desc = catalog::sort_by_price_desc(&col);
    assert_eq!(desc.first().unwrap().data.get_str("title").unwrap(), "Refactoring");
    for w in desc.windows(2) {
        assert!(w[0].data.get_f64("price").unwrap() >= w[1].data.get_f64("price").unwrap());
    }
}

#[test]
fn pages_are_disjoint_and_contiguous() {
    let col = seeded();
    let page1 = catalog::page(&col, 0, 5);
    let page2 = catalog::page(&col, 1, 5);
    assert_eq!(page1.len(), 5);
    assert_eq!(page2.len(), 5);
    let ids1: HashSet<_> = page1.iter().map(|d| d.id.clone()).collect();
    let ids2: HashSet<_> = page2.iter().map(|d| d.id.clone()).collect();
    assert!(ids1.is_disjoint(&ids2));
    // Contiguity: both pages together are the first ten documents in order.
    let all = col.get_all_documents();
    let expected: Vec<_> = all.iter().take(10).map(|d| d.id.clone()).collect();
    let got: Vec<_> = page1.iter().chain(page2.iter()).map(|d| d.id.clone()).collect();
    assert_eq!(got, expected);
}

#[test]
fn average_price_by_genre_matches_fixture_math() {
    let col = seeded();
    let out = catalog::average_price_by_genre(&col).unwrap();
    let programming = out
        .iter()
        .find(|d| d.get_str("_id").unwrap() == "Programming")
        .expect("Programming group");
    let expected = (45.0 + 50.0 + 55.5 + 39.99) / 4.0;
    assert!((programming.get_f64("avgPrice").unwrap() - expected).abs() < 1e-9);
    let dystopian = out
        .iter()
        .find(|d| d.get_str("_id").unwrap() == "Dystopian")
        .expect("Dystopian group");
    assert!((dystopian.get_f64("avgPrice").unwrap() - (12.5 + 9.99) / 2.0).abs() < 1e-9);
}

#[test]
fn most_prolific_author_is_orwell_with_three() {
    let col = seeded();
    let top = catalog::most_prolific_author(&col).unwrap().expect("non-empty collection");
    assert_eq!(top.get_str("_id").unwrap(), "George Orwell");
    assert_eq!(top.get_i64("count").unwrap(), 3);
}

#[test]
fn decade_buckets_count_correctly_and_sort_ascending() {
    let col = seeded();
    let out = catalog::count_by_decade(&col).unwrap();
    let buckets: Vec<(String, i64)> = out
        .iter()
        .map(|d| (d.get_str("_id").unwrap().to_string(), d.get_i64("count").unwrap()))
        .collect();
    assert_eq!(
        buckets,
        vec![
            ("1930s".to_string(), 2),
            ("1940s".to_string(), 2),
            ("1950s".to_string(), 1),
            ("1960s".to_string(), 1),
            ("1990s".to_string(), 1),
            ("2000s".to_string(), 1),
            ("2010s".to_string(), 4),
            ("2020s".to_string(), 1),
        ]
    );
    // 2015 ("The Fifth Season") lands in the 2010s bucket.
    let total: i64 = buckets.iter().map(|(_, c)| c).sum();
    assert_eq!(total, 13);
}

#[test]
fn index_statements_register_mongo_style_names() {
    let col = seeded();
    assert_eq!(catalog::index_on_title(&col).unwrap(), "title_1");
    assert_eq!(catalog::index_on_author_year(&col).unwrap(), "author_1_published_year_-1");
    let names: Vec<String> =
        col.index_descriptors().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["author_1_published_year_-1".to_string(), "title_1".to_string()]);
}

#[test]
fn explain_reports_collscan_then_ixscan() {
    let col = seeded();
    let before = catalog::explain_find_by_author(&col, "George Orwell");
    assert_eq!(before.winning_plan, bookdb::query::WinningPlan::CollScan);
    assert_eq!(before.execution_stats.docs_examined, 13);
    assert_eq!(before.execution_stats.n_returned, 3);

    catalog::index_on_author_year(&col).unwrap();
    let after = catalog::explain_find_by_author(&col, "George Orwell");
    assert_eq!(
        after.winning_plan,
        bookdb::query::WinningPlan::IndexScan {
            index_name: "author_1_published_year_-1".to_string()
        }
    );
    assert_eq!(after.execution_stats.docs_examined, 3);
    assert!(after.execution_stats.docs_examined <= col.len());
    assert_eq!(after.execution_stats.n_returned, 3);
}
