#![allow(missing_docs)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use shelfmate::{
    ingest::{load_books, load_ratings, BooksImportConfig, RatingsImportConfig},
    BuildOptions, DataIntegrityWarning, OverrideTable, RecommendError, Recommender,
    SharedRecommender,
};
use tempfile::TempDir;

const RATINGS: &str = "\
title,userId,rating
The Kitchen God's Wife,1,9
Needful Things,1,4
The Joy Luck Club,1,9
The Kitchen God's Wife,2,8
The Joy Luck Club,2,8
Needful Things,3,10
It,3,9
Unrated Oddity,4,0
";

const BOOKS: &str = "\
Book-Title,Book-Author,Year-Of-Publication,Image-URL-L
The Kitchen God's Wife,Amy Tan,1991,http://broken.example/kgw.jpg
The Joy Luck Club,Amy Tan,1989,http://img.example/jlc.jpg
Needful Things,Stephen King,1992,http://broken.example/nt.jpg
It,Stephen King,1986,http://img.example/it.jpg
";

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

fn build(dir: &TempDir) -> Recommender {
    let ratings_path = write(dir.path(), "ratings.csv", RATINGS);
    let books_path = write(dir.path(), "books.csv", BOOKS);
    let ratings = load_ratings(&RatingsImportConfig::new(ratings_path)).expect("ratings");
    let books = load_books(
        &BooksImportConfig::new(books_path),
        &OverrideTable::default_corrections(),
    )
    .expect("books");
    Recommender::from_observations(ratings.observations, books.catalog, &BuildOptions::default())
        .expect("build")
}

#[test]
fn recommends_co_rated_titles_first() {
    let dir = TempDir::new().expect("tempdir");
    let rec = build(&dir);

    let out = rec.recommend("The Kitchen God's Wife", 3).expect("recommend");
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].title, "The Joy Luck Club");
    assert_eq!(out[0].author.as_deref(), Some("Amy Tan"));
    assert_eq!(out[0].year, Some(1989));
    assert!(out[0].score > out[1].score);
    assert_eq!(
        out.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(out.iter().all(|r| r.title != "The Kitchen God's Wife"));
}

#[test]
fn overrides_reach_recommendations() {
    let dir = TempDir::new().expect("tempdir");
    let rec = build(&dir);

    let out = rec.recommend("It", 1).expect("recommend");
    assert_eq!(out[0].title, "Needful Things");
    assert_eq!(
        out[0].image_url.as_deref(),
        Some("http://images.amazon.com/images/P/0451172817.01.LZZZZZZZ.jpg")
    );
}

#[test]
fn unrated_title_scores_zero_and_lacks_metadata() {
    let dir = TempDir::new().expect("tempdir");
    let rec = build(&dir);

    let out = rec.recommend("Unrated Oddity", 10).expect("recommend");
    assert_eq!(out.len(), rec.titles().len() - 1);
    assert!(out.iter().all(|r| r.score == 0.0));
    assert_eq!(
        rec.warnings(),
        [DataIntegrityWarning::MissingMetadata {
            title: "Unrated Oddity".into()
        }]
    );
    assert_eq!(rec.stats().zero_vector_titles, ["Unrated Oddity"]);
}

#[test]
fn missing_title_and_bad_count_are_typed() {
    let dir = TempDir::new().expect("tempdir");
    let rec = build(&dir);

    assert_eq!(
        rec.recommend("Moby Dick", 5),
        Err(RecommendError::NotFound {
            title: "Moby Dick".into()
        })
    );
    assert_eq!(
        rec.recommend("It", -1),
        Err(RecommendError::InvalidCount { count: -1 })
    );
}

#[test]
fn autocomplete_ignores_case() {
    let dir = TempDir::new().expect("tempdir");
    let rec = build(&dir);
    assert_eq!(rec.autocomplete("kitchen"), ["The Kitchen God's Wife"]);
    assert_eq!(rec.autocomplete("THE"), ["The Kitchen God's Wife", "The Joy Luck Club"]);
}

#[test]
fn shared_recommender_is_read_concurrently() {
    let dir = TempDir::new().expect("tempdir");
    let shared = Arc::new(SharedRecommender::new());
    let rec = shared.get_or_build(|| build(&dir));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let rec = shared.get().expect("built before spawn");
                rec.recommend("It", 2).expect("recommend")
            })
        })
        .collect();

    let expected = rec.recommend("It", 2).expect("recommend");
    for handle in handles {
        assert_eq!(handle.join().expect("thread"), expected);
    }
}
