use bson::{Document as BsonDocument, doc};

/// Seed set shared by the CLI demo and the integration tests. Thirteen books
/// spanning genres, decades and stock states; the titles the catalog mutates
/// ("Clean Code", "The Hobbit") and the repeated author ("George Orwell") are
/// all present.
#[must_use]
pub fn sample_books() -> Vec<BsonDocument> {
    vec![
        doc! {"title": "Clean Code", "author": "Robert C. Martin", "genre": "Programming", "published_year": 2008, "price": 45.0, "in_stock": true},
        doc! {"title": "The Pragmatic Programmer", "author": "Andrew Hunt", "genre": "Programming", "published_year": 1999, "price": 50.0, "in_stock": true},
        doc! {"title": "Refactoring", "author": "Martin Fowler", "genre": "Programming", "published_year": 2018, "price": 55.5, "in_stock": true},
        doc! {"title": "The Rust Programming Language", "author": "Steve Klabnik", "genre": "Programming", "published_year": 2019, "price": 39.99, "in_stock": true},
        doc! {"title": "1984", "author": "George Orwell", "genre": "Dystopian", "published_year": 1949, "price": 12.5, "in_stock": true},
        doc! {"title": "Animal Farm", "author": "George Orwell", "genre": "Dystopian", "published_year": 1945, "price": 9.99, "in_stock": false},
        doc! {"title": "Homage to Catalonia", "author": "George Orwell", "genre": "Memoir", "published_year": 1938, "price": 14.0, "in_stock": false},
        doc! {"title": "The Hobbit", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1937, "price": 15.0, "in_stock": true},
        doc! {"title": "The Fellowship of the Ring", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1954, "price": 18.0, "in_stock": true},
        doc! {"title": "The Fifth Season", "author": "N.K. Jemisin", "genre": "Fantasy", "published_year": 2015, "price": 16.99, "in_stock": true},
        doc! {"title": "Project Hail Mary", "author": "Andy Weir", "genre": "Science Fiction", "published_year": 2021, "price": 24.0, "in_stock": true},
        doc! {"title": "The Martian", "author": "Andy Weir", "genre": "Science Fiction", "published_year": 2011, "price": 19.5, "in_stock": false},
        doc! {"title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction", "published_year": 1965, "price": 21.0, "in_stock": true},
    ]
}

/// Inserts the sample books into the collection, in catalog order.
pub fn seed(col: &std::sync::Arc<crate::collection::Collection>) {
    for data in sample_books() {
        col.insert_document(crate::document::Document::new(data));
    }
}
