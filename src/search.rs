use crate::store::{Entry, Index};

/// Entries whose name contains `query`, ignoring case, in index order. A
/// blank query matches everything.
pub fn filter<'a>(index: &'a Index, query: &str) -> Vec<&'a Entry> {
    filter_entries(index.entries(), query)
}

/// [`filter`] over an arbitrary slice, e.g. an already filtered list.
pub fn filter_entries<'a, I>(entries: I, query: &str) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let query = query.trim().to_lowercase();

    entries
        .into_iter()
        .filter(|entry| query.is_empty() || entry.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn entries(names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|name| Entry {
                name: (*name).to_owned(),
                path: PathBuf::from(name),
            })
            .collect()
    }

    #[test]
    fn matches_substrings_ignoring_case() {
        let entries = entries(&["email/Gmail", "email/work", "bank"]);
        let found = filter_entries(&entries, "  GMA ");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "email/Gmail");
    }

    #[test]
    fn whitespace_query_keeps_everything() {
        let entries = entries(&["a", "b"]);
        assert_eq!(filter_entries(&entries, " \t").len(), 2);
    }
}
