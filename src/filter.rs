//! Per-column substring filtering.
//!
//! A record survives when the stringified value of every filtered column
//! contains that column's pattern. Predicates naming a column the table does
//! not know are skipped (fail-open) and reported through `tracing`.

use std::collections::BTreeMap;
use tracing::{trace, warn};

use crate::column::ColumnDef;

/// How a pattern is compared to a cell value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    CaseSensitive,
    #[default]
    CaseInsensitive,
}

impl MatchMode {
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            MatchMode::CaseSensitive
        } else {
            MatchMode::CaseInsensitive
        }
    }

    fn prepare(self, pattern: &str) -> String {
        match self {
            MatchMode::CaseSensitive => pattern.to_string(),
            MatchMode::CaseInsensitive => pattern.to_lowercase(),
        }
    }

    // `pattern` must already be prepared for this mode.
    fn contains(self, value: &str, pattern: &str) -> bool {
        match self {
            MatchMode::CaseSensitive => value.contains(pattern),
            MatchMode::CaseInsensitive => value.to_lowercase().contains(pattern),
        }
    }

    /// Whether `value` contains `pattern` under this mode.
    pub fn matches(self, value: &str, pattern: &str) -> bool {
        self.contains(value, &self.prepare(pattern))
    }
}

/// A single column's filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    pub column_id: String,
    pub pattern: String,
}

impl FilterPredicate {
    pub fn new(column_id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            pattern: pattern.into(),
        }
    }
}

/// The active predicates of a table, at most one per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    patterns: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the predicate for `column_id`. An empty pattern removes it.
    /// Returns whether the set changed.
    pub fn set(&mut self, column_id: &str, pattern: &str) -> bool {
        if pattern.is_empty() {
            return self.remove(column_id);
        }
        match self.patterns.get(column_id) {
            Some(current) if current == pattern => false,
            _ => {
                self.patterns
                    .insert(column_id.to_string(), pattern.to_string());
                true
            }
        }
    }

    pub fn remove(&mut self, column_id: &str) -> bool {
        self.patterns.remove(column_id).is_some()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    pub fn get(&self, column_id: &str) -> Option<&str> {
        self.patterns.get(column_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// `(column id, pattern)` pairs ordered by column id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .iter()
            .map(|(column, pattern)| (column.as_str(), pattern.as_str()))
    }

    pub fn predicates(&self) -> Vec<FilterPredicate> {
        self.iter()
            .map(|(column, pattern)| FilterPredicate::new(column, pattern))
            .collect()
    }
}

impl FromIterator<FilterPredicate> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterPredicate>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for predicate in iter {
            set.set(&predicate.column_id, &predicate.pattern);
        }
        set
    }
}

// Pairs each active predicate with its column. Unknown columns are dropped.
fn resolve<'c, R>(
    columns: &'c [ColumnDef<R>],
    predicates: &FilterSet,
    mode: MatchMode,
) -> Vec<(&'c ColumnDef<R>, String)> {
    predicates
        .iter()
        .filter_map(|(column_id, pattern)| {
            match columns.iter().find(|c| c.id() == column_id) {
                Some(column) => Some((column, mode.prepare(pattern))),
                None => {
                    warn!("Ignoring filter on unknown column \"{column_id}\"");
                    None
                }
            }
        })
        .collect()
}

/// Positions in `records` of every record matching all `predicates`, in order.
pub fn matching_indices<R>(
    records: &[R],
    columns: &[ColumnDef<R>],
    predicates: &FilterSet,
    mode: MatchMode,
) -> Vec<usize> {
    let resolved = resolve(columns, predicates, mode);
    if resolved.is_empty() {
        return (0..records.len()).collect();
    }

    let matches: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            resolved
                .iter()
                .all(|(column, pattern)| mode.contains(&column.value(record), pattern))
        })
        .map(|(idx, _)| idx)
        .collect();

    trace!(
        "Filter with {} predicates kept {}/{} records",
        resolved.len(),
        matches.len(),
        records.len()
    );
    matches
}

/// The records matching all `predicates`, original order preserved.
pub fn apply<'a, R>(
    records: &'a [R],
    columns: &[ColumnDef<R>],
    predicates: &FilterSet,
    mode: MatchMode,
) -> Vec<&'a R> {
    matching_indices(records, columns, predicates, mode)
        .into_iter()
        .map(|idx| &records[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct City {
        name: &'static str,
        country: &'static str,
    }

    fn cities() -> Vec<City> {
        vec![
            City {
                name: "Vienna",
                country: "Austria",
            },
            City {
                name: "Graz",
                country: "Austria",
            },
            City {
                name: "Berlin",
                country: "Germany",
            },
            City {
                name: "Vientiane",
                country: "Laos",
            },
        ]
    }

    fn columns() -> Vec<ColumnDef<City>> {
        vec![
            ColumnDef::new("name", |c: &City| c.name.to_string()),
            ColumnDef::new("country", |c: &City| c.country.to_string()),
        ]
    }

    fn names(found: &[&City]) -> Vec<&'static str> {
        found.iter().map(|c| c.name).collect()
    }

    #[test]
    fn no_predicates_keeps_everything() {
        let data = cities();
        let found = apply(&data, &columns(), &FilterSet::new(), MatchMode::default());
        assert_eq!(found.len(), data.len());
    }

    #[test]
    fn substring_match_preserves_order() {
        let data = cities();
        let filters: FilterSet = [FilterPredicate::new("name", "Vi")].into_iter().collect();
        let found = apply(&data, &columns(), &filters, MatchMode::CaseSensitive);
        assert_eq!(names(&found), vec!["Vienna", "Vientiane"]);
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let data = cities();
        let filters: FilterSet = [
            FilterPredicate::new("name", "vi"),
            FilterPredicate::new("country", "aus"),
        ]
        .into_iter()
        .collect();
        let found = apply(&data, &columns(), &filters, MatchMode::CaseInsensitive);
        assert_eq!(names(&found), vec!["Vienna"]);
    }

    #[test]
    fn case_sensitivity_follows_mode() {
        let data = cities();
        let filters: FilterSet = [FilterPredicate::new("name", "vi")].into_iter().collect();
        assert!(apply(&data, &columns(), &filters, MatchMode::CaseSensitive).is_empty());
        assert_eq!(
            apply(&data, &columns(), &filters, MatchMode::CaseInsensitive).len(),
            2
        );
    }

    #[test]
    fn unknown_column_is_ignored() {
        let data = cities();
        let filters: FilterSet = [
            FilterPredicate::new("population", "1000"),
            FilterPredicate::new("country", "Austria"),
        ]
        .into_iter()
        .collect();
        let found = apply(&data, &columns(), &filters, MatchMode::default());
        assert_eq!(names(&found), vec!["Vienna", "Graz"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let data: Vec<City> = Vec::new();
        let filters: FilterSet = [FilterPredicate::new("name", "a")].into_iter().collect();
        assert!(matching_indices(&data, &columns(), &filters, MatchMode::default()).is_empty());
    }

    #[test]
    fn empty_pattern_removes_predicate() {
        let mut filters = FilterSet::new();
        assert!(filters.set("name", "Gr"));
        assert!(!filters.set("name", "Gr"));
        assert_eq!(filters.get("name"), Some("Gr"));
        assert!(filters.set("name", "Be"));
        assert_eq!(filters.len(), 1);
        assert!(filters.set("name", ""));
        assert!(filters.is_empty());
        assert!(!filters.set("name", ""));
    }

    #[test]
    fn predicates_are_listed_by_column() {
        let mut filters = FilterSet::new();
        filters.set("name", "a");
        filters.set("country", "b");
        assert_eq!(
            filters.predicates(),
            vec![
                FilterPredicate::new("country", "b"),
                FilterPredicate::new("name", "a"),
            ]
        );
    }

    #[test]
    fn matches_lowercases_unicode() {
        assert!(MatchMode::CaseInsensitive.matches("ÖSTERREICH", "öst"));
        assert!(!MatchMode::CaseSensitive.matches("ÖSTERREICH", "öst"));
    }
}
