use std::collections::HashMap;

use crate::consolidate::ConsolidationMap;

/// Example reviews reported per theme.
pub const MAX_EXAMPLES: usize = 3;

/// Raw theme labels and the reviews that carry them, in first-seen label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeIndex {
    order: Vec<String>,
    members: HashMap<String, Vec<usize>>,
}

impl ThemeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, review: usize, label: &str) {
        match self.members.get_mut(label) {
            Some(reviews) => reviews.push(review),
            None => {
                self.order.push(label.to_string());
                self.members.insert(label.to_string(), vec![review]);
            }
        }
    }

    /// Distinct labels in the order they were first recorded.
    pub fn labels(&self) -> &[String] {
        &self.order
    }

    pub fn reviews(&self, label: &str) -> &[usize] {
        self.members.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Reviews that ended up under one consolidated theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeGroup {
    pub theme: String,
    /// Distinct review indices, first-seen order.
    pub reviews: Vec<usize>,
}

impl ThemeGroup {
    pub fn count(&self) -> usize {
        self.reviews.len()
    }
}

/// Fold raw assignments through `map`, merge reviews per resulting category,
/// and keep the `max_themes` largest groups.
///
/// Groups are ordered by count descending; equal counts keep the order in
/// which their category was first reached.
pub fn group_themes(
    index: &ThemeIndex,
    map: &ConsolidationMap,
    max_themes: usize,
) -> Vec<ThemeGroup> {
    let mut groups: Vec<ThemeGroup> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for label in index.labels() {
        let category = map.resolve(label);
        let slot = match position.get(category) {
            Some(&slot) => slot,
            None => {
                groups.push(ThemeGroup {
                    theme: category.to_string(),
                    reviews: Vec::new(),
                });
                position.insert(category.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[slot];
        for &review in index.reviews(label) {
            if !group.reviews.contains(&review) {
                group.reviews.push(review);
            }
        }
    }

    groups.sort_by(|a, b| b.count().cmp(&a.count()));
    groups.truncate(max_themes);
    groups
}

/// The first `limit` reviews of a group.
pub fn first_examples(group: &ThemeGroup, limit: usize) -> Vec<usize> {
    group.reviews.iter().take(limit).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_from(assignments: &[(usize, &[&str])]) -> ThemeIndex {
        let mut index = ThemeIndex::new();
        for (review, labels) in assignments {
            for label in *labels {
                index.record(*review, label);
            }
        }
        index
    }

    fn map_from(pairs: &[(&str, &str)]) -> ConsolidationMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_index_keeps_first_seen_order() {
        let index = index_from(&[(0, &["support", "pricing"]), (1, &["pricing", "delivery"])]);
        assert_eq!(index.labels(), ["support", "pricing", "delivery"]);
        assert_eq!(index.reviews("pricing"), [0, 1]);
        assert!(index.reviews("missing").is_empty());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_support_scenario_single_category() {
        let index = index_from(&[
            (0, &["customer support"]),
            (1, &["customer support", "slow response"]),
        ]);
        let map = map_from(&[
            ("customer support", "customer support"),
            ("slow response", "customer support"),
        ]);

        let groups = group_themes(&index, &map, 10);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].theme, "customer support");
        assert_eq!(groups[0].count(), 2);
        assert_eq!(first_examples(&groups[0], MAX_EXAMPLES), vec![0, 1]);
    }

    #[test]
    fn test_unmapped_labels_keep_their_name() {
        let index = index_from(&[(0, &["fake reviews"]), (1, &["pricing"])]);
        let map = map_from(&[("pricing", "price/value")]);
        let groups = group_themes(&index, &map, 10);
        let themes: Vec<&str> = groups.iter().map(|g| g.theme.as_str()).collect();
        assert_eq!(themes, vec!["fake reviews", "price/value"]);
    }

    #[test]
    fn test_ranking_by_count_with_stable_ties() {
        let index = index_from(&[
            (0, &["a"]),
            (1, &["b"]),
            (2, &["b", "c"]),
            (3, &["c"]),
            (4, &["d"]),
            (5, &["c"]),
        ]);
        let groups = group_themes(&index, &ConsolidationMap::default(), 10);
        let ranked: Vec<(&str, usize)> =
            groups.iter().map(|g| (g.theme.as_str(), g.count())).collect();
        assert_eq!(ranked, vec![("c", 3), ("b", 2), ("a", 1), ("d", 1)]);
    }

    #[test]
    fn test_grouping_is_repeatable() {
        let index = index_from(&[
            (0, &["x", "y"]),
            (1, &["y"]),
            (2, &["z"]),
            (3, &["x"]),
        ]);
        let map = map_from(&[("z", "x")]);
        let first = group_themes(&index, &map, 10);
        let second = group_themes(&index, &map, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncates_to_max_themes() {
        let mut index = ThemeIndex::new();
        for review in 0..25 {
            index.record(review, &format!("theme {review}"));
        }
        let groups = group_themes(&index, &ConsolidationMap::default(), 10);
        assert_eq!(groups.len(), 10);
        assert_eq!(groups[0].theme, "theme 0");
    }

    #[test]
    fn test_count_is_distinct_reviews() {
        // Two raw labels of the same review merge into one category.
        let index = index_from(&[(7, &["rude staff", "slow replies"]), (9, &["rude staff"])]);
        let map = map_from(&[("rude staff", "support"), ("slow replies", "support")]);
        let groups = group_themes(&index, &map, 10);
        assert_eq!(groups[0].reviews, vec![7, 9]);
        assert_eq!(groups[0].count(), 2);
    }

    #[test]
    fn test_empty_index() {
        let groups = group_themes(&ThemeIndex::new(), &ConsolidationMap::default(), 10);
        assert!(groups.is_empty());
    }
}
