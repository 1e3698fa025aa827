//! Prefix matching over the catalog.

use dex_catalog::types::{CatalogEntry, EntityDetail};

/// Anything that can be matched by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for CatalogEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for EntityDetail {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Entries whose name starts with `query`, ignoring case and surrounding
/// whitespace of the query.
///
/// Keeps the order of `items` and stops after `max_results` matches.
/// A blank query matches nothing.
pub fn filter_by_prefix<T>(items: &[T], query: &str, max_results: usize) -> Vec<T>
where
    T: Named + Clone,
{
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }

    items
        .iter()
        .filter(|item| item.name().to_lowercase().starts_with(&normalized))
        .take(max_results)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use dex_catalog::testing::mock_entry;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(String);

    impl Named for Item {
        fn name(&self) -> &str {
            &self.0
        }
    }

    fn names<T: Named>(items: &[T]) -> Vec<&str> {
        items.iter().map(Named::name).collect()
    }

    #[test]
    fn matches_prefix_case_insensitively() {
        let catalog = [
            mock_entry("Pikachu"),
            mock_entry("charizard"),
            mock_entry("pichu"),
        ];
        let matched = filter_by_prefix(&catalog, "  PI ", 5);
        assert_eq!(names(&matched), ["Pikachu", "pichu"]);
    }

    #[test]
    fn does_not_match_substrings() {
        let catalog = [mock_entry("charizard"), mock_entry("raichu")];
        assert!(filter_by_prefix(&catalog, "chu", 5).is_empty());
        assert!(filter_by_prefix(&catalog, "iz", 5).is_empty());
    }

    #[test]
    fn blank_query_matches_nothing() {
        let catalog = [mock_entry("pikachu")];
        assert!(filter_by_prefix(&catalog, "", 5).is_empty());
        assert!(filter_by_prefix(&catalog, " \t ", 5).is_empty());
    }

    #[test]
    fn stops_after_max_results() {
        let catalog = ["pidgey", "pidgeotto", "pidgeot", "pikachu", "pichu", "piplup"]
            .map(mock_entry);
        let matched = filter_by_prefix(&catalog, "pi", 5);
        assert_eq!(names(&matched), [
            "pidgey",
            "pidgeotto",
            "pidgeot",
            "pikachu",
            "pichu"
        ]);
    }

    proptest! {
        #[test]
        fn results_are_ordered_bounded_prefix_matches(
            raw_names in proptest::collection::vec("[a-cA-C]{0,4}", 0..20),
            query in "[ a-cA-C]{0,3}",
            max_results in 0..8_usize,
        ) {
            let items = raw_names.into_iter().map(Item).collect::<Vec<_>>();
            let matched = filter_by_prefix(&items, &query, max_results);
            let normalized = query.trim().to_lowercase();

            prop_assert!(matched.len() <= max_results);
            if normalized.is_empty() {
                prop_assert!(matched.is_empty());
            }
            for item in &matched {
                prop_assert!(item.0.to_lowercase().starts_with(&normalized));
            }

            let expected = items
                .iter()
                .filter(|item| !normalized.is_empty() && item.0.to_lowercase().starts_with(&normalized))
                .take(max_results)
                .cloned()
                .collect::<Vec<_>>();
            prop_assert_eq!(matched, expected);
        }
    }
}
