use bookdb::collection::Collection;
use bookdb::document::Document;
use bookdb::query::{Filter, FindOptions, Order, SortSpec, find_docs};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn sorted_page(col: &Arc<Collection>, page_no: usize, page_size: usize) -> Vec<Document> {
    let opts = FindOptions {
        sort: Some(vec![SortSpec { field: "n".into(), order: Order::Asc }]),
        skip: Some(page_no * page_size),
        limit: Some(page_size),
        ..FindOptions::default()
    };
    find_docs(col, &Filter::True, &opts).to_vec()
}

proptest! {
    #[test]
    fn prop_pages_partition_the_collection(
        values in proptest::collection::vec(any::<i32>(), 0..60),
        page_size in 1usize..10,
    ) {
        let col = Arc::new(Collection::new("pages".to_string()));
        for v in &values {
            col.insert_document(Document::new(bson::doc! {"n": *v}));
        }
        let mut seen: HashSet<_> = HashSet::new();
        let mut collected = 0usize;
        let mut page_no = 0usize;
        loop {
            let page = sorted_page(&col, page_no, page_size);
            if page.is_empty() {
                break;
            }
            // Every page except the last is full.
            if collected + page.len() < values.len() {
                prop_assert_eq!(page.len(), page_size);
            }
            for d in &page {
                prop_assert!(seen.insert(d.id.clone()), "pages overlap");
            }
            collected += page.len();
            page_no += 1;
        }
        prop_assert_eq!(collected, values.len());
    }

    #[test]
    fn prop_adjacent_pages_respect_the_sort(
        values in proptest::collection::vec(any::<i32>(), 2..60),
        page_size in 1usize..10,
    ) {
        let col = Arc::new(Collection::new("pages".to_string()));
        for v in &values {
            col.insert_document(Document::new(bson::doc! {"n": *v}));
        }
        let first = sorted_page(&col, 0, page_size);
        let second = sorted_page(&col, 1, page_size);
        for w in first.windows(2) {
            prop_assert!(w[0].data.get_i32("n").unwrap() <= w[1].data.get_i32("n").unwrap());
        }
        if let (Some(last), Some(head)) = (first.last(), second.first()) {
            prop_assert!(last.data.get_i32("n").unwrap() <= head.data.get_i32("n").unwrap());
        }
    }
}
