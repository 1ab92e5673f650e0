#![allow(missing_docs)]

use std::fs;

use shelfmate::{
    ingest::{load_books, load_ratings, BooksImportConfig, IngestError, RatingsImportConfig},
    BuildOptions, DuplicatePolicy, MatrixError, OverrideTable, RatingMatrix, UserId,
};
use tempfile::TempDir;

#[test]
fn custom_columns_and_duplicate_policies() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ratings.csv");
    fs::write(
        &path,
        "who,book,score\n7,Dune,4\n7,Dune,8\n9,Dune,5\n9,Emma,6\n",
    )
    .expect("write");

    let mut cfg = RatingsImportConfig::new(&path);
    cfg.title_column = "book".into();
    cfg.user_column = "who".into();
    cfg.rating_column = "score".into();
    let import = load_ratings(&cfg).expect("load");
    assert_eq!(import.observations.len(), 4);

    let last = RatingMatrix::build(import.observations.clone()).expect("last wins");
    assert_eq!(last.get("Dune", &UserId::from(7)), Some(8.0));

    let mean = RatingMatrix::build_with(
        import.observations.clone(),
        &BuildOptions {
            duplicates: DuplicatePolicy::Mean,
        },
    )
    .expect("mean");
    assert_eq!(mean.get("Dune", &UserId::from(7)), Some(6.0));

    let err = RatingMatrix::build_with(
        import.observations,
        &BuildOptions {
            duplicates: DuplicatePolicy::Reject,
        },
    )
    .unwrap_err();
    assert!(matches!(err, MatrixError::DuplicateRating { ref title, .. } if title == "Dune"));
}

#[test]
fn missing_user_value_reports_line() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ratings.csv");
    fs::write(&path, "title,userId,rating\nDune,1,5\nEmma,,5\n").expect("write");

    let err = load_ratings(&RatingsImportConfig::new(&path)).unwrap_err();
    match err {
        IngestError::MissingValue { line, column } => {
            assert_eq!(line, 3);
            assert_eq!(column, "userId");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn books_without_overrides_keep_source_urls() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("books.csv");
    fs::write(
        &path,
        "Book-Title,Book-Author,Year-Of-Publication,Image-URL-L\n\
         Jacob Have I Loved,Katherine Paterson,1980,http://source/jacob.jpg\n\
         \"Title, With Comma\",Someone,DK Publishing Inc,http://source/comma.jpg\n",
    )
    .expect("write");

    let import = load_books(&BooksImportConfig::new(&path), &OverrideTable::default()).expect("load");
    assert_eq!(import.overrides_applied, 0);
    let jacob = import.catalog.get("Jacob Have I Loved").expect("jacob");
    assert_eq!(jacob.image_url.as_deref(), Some("http://source/jacob.jpg"));

    let comma = import.catalog.get("Title, With Comma").expect("quoted title");
    assert_eq!(comma.year, None);
    assert_eq!(comma.author.as_deref(), Some("Someone"));
}
