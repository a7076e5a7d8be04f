use crate::models::EvaluationRecord;
use clap::ValueEnum;
use std::cmp::Ordering;

/// Sort orders for the history table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[value(name = "timestamp-desc")]
    TimestampDesc,
    #[value(name = "timestamp-asc")]
    TimestampAsc,
    #[value(name = "trust-score-desc")]
    TrustScoreDesc,
    #[value(name = "trust-score-asc")]
    TrustScoreAsc,
    #[value(name = "model-asc")]
    ModelAsc,
    #[value(name = "scenario-asc")]
    ScenarioAsc,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::TimestampDesc
    }
}

/// Filterable, sortable view over the fetched evaluation history.
///
/// The backing list is replaced wholesale on refresh; filtering and sorting
/// never mutate it.
#[derive(Debug, Default)]
pub struct HistoryView {
    records: Vec<EvaluationRecord>,
    filter: String,
    sort: SortKey,
}

impl HistoryView {
    pub fn new(records: Vec<EvaluationRecord>) -> Self {
        Self {
            records,
            filter: String::new(),
            sort: SortKey::default(),
        }
    }

    /// Replace the whole backing list (after a refresh)
    pub fn replace(&mut self, records: Vec<EvaluationRecord>) {
        self.records = records;
    }

    /// Set the free-text filter; empty text matches everything
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    /// Number of records in the backing list
    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// Number of records the current filter matches
    pub fn matching_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches_filter(r, &self.filter))
            .count()
    }

    /// Filtered then sorted snapshot of the list.
    ///
    /// Sorting is stable, so records that compare equal keep their fetched
    /// order.
    pub fn apply(&self) -> Vec<EvaluationRecord> {
        let mut rows: Vec<EvaluationRecord> = self
            .records
            .iter()
            .filter(|r| matches_filter(r, &self.filter))
            .cloned()
            .collect();

        match self.sort {
            SortKey::TimestampDesc => rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortKey::TimestampAsc => rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortKey::TrustScoreDesc => rows.sort_by(|a, b| compare_scores(b, a)),
            SortKey::TrustScoreAsc => rows.sort_by(|a, b| compare_scores(a, b)),
            SortKey::ModelAsc => rows.sort_by(|a, b| compare_names(&a.model.name, &b.model.name)),
            SortKey::ScenarioAsc => {
                rows.sort_by(|a, b| compare_names(&a.scenario.title, &b.scenario.title))
            }
        }

        rows
    }
}

/// Case-insensitive substring match over model name, scenario title, and
/// scenario category
fn matches_filter(record: &EvaluationRecord, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }

    let needle = filter.to_lowercase();
    record.model.name.to_lowercase().contains(&needle)
        || record.scenario.title.to_lowercase().contains(&needle)
        || record
            .scenario
            .category
            .as_ref()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
}

fn compare_scores(a: &EvaluationRecord, b: &EvaluationRecord) -> Ordering {
    a.metrics
        .trust_score
        .partial_cmp(&b.metrics.trust_score)
        .unwrap_or(Ordering::Equal)
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metrics, ModelRef, ScenarioRef};
    use chrono::{TimeZone, Utc};

    fn record(model: &str, scenario: &str, category: Option<&str>, trust: f64, day: u32) -> EvaluationRecord {
        EvaluationRecord {
            id: format!("{}-{}", model, scenario),
            model: ModelRef {
                name: model.to_string(),
            },
            scenario: ScenarioRef {
                title: scenario.to_string(),
                category: category.map(|c| c.to_string()),
            },
            metrics: Metrics {
                trust_score: trust,
                hallucinations_found: 0,
                hallucinations_corrected: 0,
            },
            raw_model_output: String::new(),
            advisor_corrected_output: String::new(),
            detailed_hallucination_report: vec![],
            detailed_corrections_log: vec![],
            timestamp: Utc.with_ymd_and_hms(2025, 11, day, 12, 0, 0).unwrap(),
            evaluation_log: String::new(),
        }
    }

    #[test]
    fn test_filter_matches_model_name_case_insensitively() {
        let mut view = HistoryView::new(vec![
            record("GPT-Eval", "Install Firefox", None, 0.9, 1),
            record("Claude", "Install Chrome", None, 0.8, 2),
            record("Llama", "Uninstall Java", None, 0.7, 3),
        ]);
        view.set_filter("gpt");

        let rows = view.apply();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model.name, "GPT-Eval");
        assert_eq!(view.matching_count(), 1);
    }

    #[test]
    fn test_filter_matches_scenario_title_and_category() {
        let mut view = HistoryView::new(vec![
            record("M1", "Install Firefox", Some("installer"), 0.9, 1),
            record("M2", "Patch Office", Some("update"), 0.8, 2),
        ]);

        view.set_filter("firefox");
        assert_eq!(view.apply().len(), 1);

        view.set_filter("UPDATE");
        let rows = view.apply();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model.name, "M2");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let view = HistoryView::new(vec![
            record("M1", "S1", None, 0.9, 1),
            record("M2", "S2", None, 0.8, 2),
        ]);
        assert_eq!(view.apply().len(), 2);
        assert_eq!(view.matching_count(), 2);
    }

    #[test]
    fn test_sort_by_trust_score_both_directions() {
        let mut view = HistoryView::new(vec![
            record("A", "S1", None, 0.75, 1),
            record("B", "S2", None, 0.95, 2),
            record("C", "S3", None, 0.40, 3),
        ]);

        view.set_sort(SortKey::TrustScoreDesc);
        let scores: Vec<f64> = view.apply().iter().map(|r| r.metrics.trust_score).collect();
        assert_eq!(scores, vec![0.95, 0.75, 0.40]);

        view.set_sort(SortKey::TrustScoreAsc);
        let scores: Vec<f64> = view.apply().iter().map(|r| r.metrics.trust_score).collect();
        assert_eq!(scores, vec![0.40, 0.75, 0.95]);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut view = HistoryView::new(vec![
            record("A", "S1", None, 0.5, 2),
            record("B", "S2", None, 0.5, 4),
            record("C", "S3", None, 0.5, 1),
        ]);

        view.set_sort(SortKey::TimestampDesc);
        let names: Vec<String> = view.apply().iter().map(|r| r.model.name.clone()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        view.set_sort(SortKey::TimestampAsc);
        let names: Vec<String> = view.apply().iter().map(|r| r.model.name.clone()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_sort_by_model_and_scenario_name() {
        let mut view = HistoryView::new(vec![
            record("beta", "Zeta", None, 0.5, 1),
            record("Alpha", "eta", None, 0.5, 2),
        ]);

        view.set_sort(SortKey::ModelAsc);
        let names: Vec<String> = view.apply().iter().map(|r| r.model.name.clone()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);

        view.set_sort(SortKey::ScenarioAsc);
        let titles: Vec<String> = view.apply().iter().map(|r| r.scenario.title.clone()).collect();
        assert_eq!(titles, vec!["eta", "Zeta"]);
    }

    #[test]
    fn test_equal_keys_keep_fetched_order() {
        let mut view = HistoryView::new(vec![
            record("first", "S1", None, 0.5, 1),
            record("second", "S2", None, 0.5, 1),
            record("third", "S3", None, 0.5, 1),
        ]);
        view.set_sort(SortKey::TrustScoreDesc);

        let names: Vec<String> = view.apply().iter().map(|r| r.model.name.clone()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_replace_swaps_backing_list() {
        let mut view = HistoryView::new(vec![record("old", "S1", None, 0.5, 1)]);
        view.replace(vec![
            record("new-a", "S1", None, 0.5, 1),
            record("new-b", "S2", None, 0.5, 2),
        ]);

        assert_eq!(view.total_count(), 2);
        assert!(view.apply().iter().all(|r| r.model.name.starts_with("new")));
    }
}
