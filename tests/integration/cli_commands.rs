#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    ratings: PathBuf,
    books: PathBuf,
    config: PathBuf,
}

const BOOKS_HEADER: &str = "Book-Title,Book-Author,Year-Of-Publication,Image-URL-L\n";

fn fixture() -> Fixture {
    fixture_with(
        "title,userId,rating\nA,1,5\nA,3,3\nB,1,5\nB,3,3\nC,2,0\n",
        &format!("{BOOKS_HEADER}A,Author A,2001,http://a.jpg\nB,Author B,2002,http://b.jpg\n"),
    )
}

fn fixture_with(ratings_csv: &str, books_csv: &str) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let ratings = dir.path().join("ratings.csv");
    let books = dir.path().join("books.csv");
    fs::write(&ratings, ratings_csv).expect("ratings");
    fs::write(&books, books_csv).expect("books");
    let config = dir.path().join("cli.toml");
    Fixture {
        dir,
        ratings,
        books,
        config,
    }
}

impl Fixture {
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("shelfmate");
        cmd.env_remove("SHELFMATE_LOG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .arg("--ratings")
            .arg(&self.ratings)
            .arg("--books")
            .arg(&self.books);
        cmd
    }

    fn write_config(&self, toml: &str) {
        fs::write(&self.config, toml).expect("config");
    }

    fn recommend_json(&self, extra: &[&str], title: &str) -> Value {
        let output = self
            .cmd()
            .args(extra)
            .args(["--format", "json", "recommend", title])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("valid json")
    }
}

#[test]
fn recommend_json_ranks_by_similarity() {
    let fx = fixture();
    let output = fx
        .cmd()
        .args(["--format", "json", "recommend", "A", "--count", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["status"], "ok");
    let recs = json["recommendations"].as_array().expect("array");
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["title"], "B");
    assert_eq!(recs[0]["score"], 1.0);
    assert_eq!(recs[0]["author"], "Author B");
    assert_eq!(recs[1]["title"], "C");
    assert_eq!(recs[1]["score"], 0.0);
    assert!(recs[1]["author"].is_null());
}

#[test]
fn recommend_unknown_title_exits_with_not_found() {
    let fx = fixture();
    let assert = fx
        .cmd()
        .args(["recommend", "Nope"])
        .assert()
        .code(3);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("Book not found in the database."));
}

#[test]
fn recommend_rejects_zero_count() {
    let fx = fixture();
    let assert = fx
        .cmd()
        .args(["recommend", "A", "--count", "0"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("invalid recommendation count 0"));
}

#[test]
fn search_is_case_insensitive() {
    let fx = fixture();
    let output = fx
        .cmd()
        .args(["--format", "json", "search", "b"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json, serde_json::json!(["B"]));
}

#[test]
fn stats_reports_missing_metadata() {
    let fx = fixture();
    let output = fx
        .cmd()
        .args(["--format", "json", "stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["titles"], 3);
    assert_eq!(json["users"], 3);
    assert_eq!(json["zero_vector_titles"], serde_json::json!(["C"]));
    assert_eq!(json["warnings"][0]["kind"], "missing_metadata");
    assert_eq!(json["warnings"][0]["title"], "C");
}

#[test]
fn config_set_dataset_is_used_by_later_runs() {
    let fx = fixture();
    cargo_bin_cmd!("shelfmate")
        .arg("--config")
        .arg(&fx.config)
        .args(["config", "set-dataset", "--ratings-path"])
        .arg(&fx.ratings)
        .assert()
        .success();
    cargo_bin_cmd!("shelfmate")
        .arg("--config")
        .arg(&fx.config)
        .args(["config", "set-count", "1"])
        .assert()
        .success();

    let saved = fs::read_to_string(&fx.config).expect("config written");
    assert!(saved.contains("default_count = 1"));

    let output = cargo_bin_cmd!("shelfmate")
        .arg("--config")
        .arg(&fx.config)
        .args(["--format", "json", "recommend", "B"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["recommendations"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["recommendations"][0]["title"], "A");
    drop(fx.dir);
}

#[test]
fn missing_dataset_is_an_error() {
    let fx = fixture();
    cargo_bin_cmd!("shelfmate")
        .arg("--config")
        .arg(&fx.config)
        .args(["stats"])
        .assert()
        .failure();
}

fn override_fixture() -> Fixture {
    fixture_with(
        "title,userId,rating\nNeedful Things,1,5\nEmma,1,4\n",
        &format!(
            "{BOOKS_HEADER}Needful Things,Stephen King,1992,http://source/needful.jpg\n\
             Emma,Jane Austen,1815,http://source/emma.jpg\n"
        ),
    )
}

#[test]
fn builtin_image_corrections_apply_by_default() {
    let fx = override_fixture();
    let json = fx.recommend_json(&[], "Emma");
    assert_eq!(json["recommendations"][0]["title"], "Needful Things");
    assert_eq!(
        json["recommendations"][0]["image_url"],
        "http://images.amazon.com/images/P/0451172817.01.LZZZZZZZ.jpg"
    );
}

#[test]
fn builtin_image_corrections_can_be_disabled() {
    let fx = override_fixture();
    fx.write_config("[overrides]\nuse_defaults = false\n");
    let json = fx.recommend_json(&[], "Emma");
    assert_eq!(
        json["recommendations"][0]["image_url"],
        "http://source/needful.jpg"
    );
}

#[test]
fn configured_image_urls_win_over_builtin_ones() {
    let fx = override_fixture();
    fx.write_config(
        "[overrides.image_urls]\n\
         \"Needful Things\" = \"http://mirror/needful.jpg\"\n\
         \"Emma\" = \"http://mirror/emma.jpg\"\n",
    );
    let json = fx.recommend_json(&[], "Needful Things");
    assert_eq!(json["recommendations"][0]["image_url"], "http://mirror/emma.jpg");
    let json = fx.recommend_json(&[], "Emma");
    assert_eq!(
        json["recommendations"][0]["image_url"],
        "http://mirror/needful.jpg"
    );
}

// User 1 rates A twice: last-wins gives A = (3, 2), mean gives A = (2, 2),
// which is parallel to B.
fn duplicates_fixture() -> Fixture {
    fixture_with(
        "title,userId,rating\nA,1,1\nA,1,3\nA,2,2\nB,1,2\nB,2,2\n",
        BOOKS_HEADER,
    )
}

#[test]
fn duplicate_policy_from_config_is_applied() {
    let fx = duplicates_fixture();
    let score = fx.recommend_json(&[], "A")["recommendations"][0]["score"]
        .as_f64()
        .expect("score");
    assert!(score < 0.99, "last-wins score was {score}");

    fx.write_config("duplicate_policy = \"mean\"\n");
    let json = fx.recommend_json(&[], "A");
    assert_eq!(json["recommendations"][0]["title"], "B");
    assert_eq!(json["recommendations"][0]["score"], 1.0);
}

#[test]
fn duplicates_flag_overrides_config() {
    let fx = duplicates_fixture();
    fx.write_config("duplicate_policy = \"mean\"\n");
    let score = fx.recommend_json(&["--duplicates", "last-wins"], "A")["recommendations"][0]
        ["score"]
        .as_f64()
        .expect("score");
    assert!(score < 0.99, "last-wins score was {score}");

    let assert = fx
        .cmd()
        .args(["--duplicates", "reject", "recommend", "A"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("duplicate rating for 'A' by user 1"), "{stderr}");
}

#[test]
fn invalid_duplicate_policy_in_config_fails() {
    let fx = fixture();
    fx.write_config("duplicate_policy = \"median\"\n");
    let assert = fx.cmd().args(["stats"]).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("duplicate_policy 'median' is invalid"), "{stderr}");
}

#[test]
fn config_show_prints_effective_toml() {
    let fx = fixture();
    fx.write_config("default_count = 4\nduplicate_policy = \"mean\"\n");
    let assert = fx.cmd().args(["config", "show"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("default_count = 4"), "{stdout}");
    assert!(stdout.contains("duplicate_policy = \"mean\""), "{stdout}");
}

#[test]
fn completions_are_generated() {
    let fx = fixture();
    let assert = fx.cmd().args(["completions", "bash"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("shelfmate"));
    assert!(stdout.contains("recommend"));
}

#[test]
fn rust_log_is_used_without_log_level() {
    let fx = fixture();
    let assert = fx
        .cmd()
        .env("RUST_LOG", "shelfmate=debug")
        .args(["stats"])
        .assert()
        .success();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("config loaded"), "{stderr}");
}
