//! Case-insensitive substring search over titles, used for typeahead.

use rustc_hash::FxHashSet;

/// Returns every title containing `needle`, ignoring case.
///
/// Results keep the order in which titles first appear and each title is
/// returned once. An empty needle matches everything.
pub fn search<'a, I>(titles: I, needle: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = needle.to_lowercase();
    let mut seen = FxHashSet::default();
    titles
        .into_iter()
        .filter(|title| title.to_lowercase().contains(&needle))
        .filter(|title| seen.insert(*title))
        .map(str::to_string)
        .collect()
}
