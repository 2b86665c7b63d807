use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::data::model::Table;
use crate::data::pipeline::{CampaignSelections, StageReport};
use crate::data::proportion::{proportions, ProportionTable};
use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Chart selector
// ---------------------------------------------------------------------------

/// How the presentation layer draws the two proportion tables.
/// Never affects what the pipeline computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "pie" => Ok(ChartKind::Pie),
            other => Err(format!("unknown chart kind: {other} (expected bar or pie)")),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar => f.write_str("bar"),
            ChartKind::Pie => f.write_str("pie"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One loaded dataset and the derived state of the latest filter run,
/// independent of rendering.
#[derive(Debug, Clone)]
pub struct Session {
    /// Name the dataset was uploaded under.
    pub name: String,

    pub config: AnalysisConfig,

    /// Loaded dataset; never modified after construction.
    raw: Table,

    /// Proportions of the raw table (None when it has no rows).
    raw_proportions: Option<ProportionTable>,

    /// Selections of the last successful run.
    pub selections: CampaignSelections,

    /// Output of the last successful run.
    pub filtered: Table,

    /// Per-stage row counts of the last successful run.
    pub stages: Vec<StageReport>,

    /// Proportions of `filtered` (None when no row survived).
    pub filtered_proportions: Option<ProportionTable>,

    pub chart: ChartKind,

    /// Error of the last failed run, cleared by the next success.
    pub status_message: Option<String>,
}

impl Session {
    /// Start a session with every filter open (full age span, "all" everywhere).
    pub fn new(name: impl Into<String>, raw: Table, config: AnalysisConfig) -> PipelineResult<Self> {
        let selections = CampaignSelections::full_range(&raw, &config.age_column)?;
        let raw_proportions = proportions_or_none(&raw, &config.target_column)?;

        let mut session = Session {
            name: name.into(),
            chart: config.chart,
            filtered: raw.empty_like(),
            raw,
            raw_proportions,
            selections: selections.clone(),
            stages: Vec::new(),
            filtered_proportions: None,
            status_message: None,
            config,
        };
        session.apply(selections)?;
        Ok(session)
    }

    pub fn raw(&self) -> &Table {
        &self.raw
    }

    pub fn raw_proportions(&self) -> Option<&ProportionTable> {
        self.raw_proportions.as_ref()
    }

    /// Re-run the pipeline with new selections.
    ///
    /// Derived state is replaced only when the whole run succeeds. On failure
    /// the previous results stay in place, the error is recorded in
    /// `status_message` and returned.
    pub fn apply(&mut self, selections: CampaignSelections) -> PipelineResult<()> {
        match self.run(&selections) {
            Ok((filtered, stages, filtered_proportions)) => {
                log::info!(
                    "{}: {} of {} rows after filtering",
                    self.name,
                    filtered.n_rows(),
                    self.raw.n_rows()
                );
                self.selections = selections;
                self.filtered = filtered;
                self.stages = stages;
                self.filtered_proportions = filtered_proportions;
                self.status_message = None;
                Ok(())
            }
            Err(e) => {
                log::error!("{}: filter run failed: {e}", self.name);
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    fn run(
        &self,
        selections: &CampaignSelections,
    ) -> PipelineResult<(Table, Vec<StageReport>, Option<ProportionTable>)> {
        let (filtered, stages) = selections.apply(&self.raw, &self.config.age_column)?;
        let props = proportions_or_none(&filtered, &self.config.target_column)?;
        Ok((filtered, stages, props))
    }

    pub fn set_chart(&mut self, chart: ChartKind) {
        self.chart = chart;
    }
}

/// Proportions, with an empty table mapped to `None` ("no data").
fn proportions_or_none(table: &Table, target: &str) -> PipelineResult<Option<ProportionTable>> {
    match proportions(table, target) {
        Ok(p) => Ok(Some(p)),
        Err(PipelineError::EmptyTable(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Selection;
    use crate::data::model::Column;

    fn raw() -> Table {
        Table::new(vec![
            Column::integer("age", [25, 40, 60]),
            Column::text("job", ["admin.", "services", "admin."]),
            Column::text("marital", ["single", "married", "married"]),
            Column::text("housing", ["yes", "no", "yes"]),
            Column::text("loan", ["no", "no", "no"]),
            Column::text("contact", ["cellular", "cellular", "telephone"]),
            Column::text("month", ["may", "may", "jun"]),
            Column::text("day_of_week", ["mon", "tue", "wed"]),
            Column::text("default", ["no", "no", "no"]),
            Column::text("y", ["no", "yes", "no"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_session_is_unfiltered() {
        let session = Session::new("bank.csv", raw(), AnalysisConfig::default()).unwrap();
        assert_eq!(&session.filtered, session.raw());
        assert_eq!(session.selections.age_range, (25, 60));
        assert_eq!(session.raw_proportions(), session.filtered_proportions.as_ref());
    }

    #[test]
    fn test_apply_updates_filtered_only() {
        let mut session = Session::new("bank.csv", raw(), AnalysisConfig::default()).unwrap();
        session
            .apply(CampaignSelections::with_age_range(30, 60))
            .unwrap();
        assert_eq!(session.filtered.n_rows(), 2);
        assert_eq!(session.raw().n_rows(), 3);
        let filtered = session.filtered_proportions.as_ref().unwrap();
        assert_eq!(filtered.get("no"), Some(50.0));
        assert_eq!(filtered.get("yes"), Some(50.0));
    }

    #[test]
    fn test_empty_result_has_no_proportions() {
        let mut session = Session::new("bank.csv", raw(), AnalysisConfig::default()).unwrap();
        let mut selections = CampaignSelections::with_age_range(25, 60);
        selections.job = Selection::none();
        session.apply(selections).unwrap();
        assert_eq!(session.filtered.n_rows(), 0);
        assert!(session.filtered_proportions.is_none());
        assert!(session.raw_proportions().is_some());
    }

    #[test]
    fn test_failed_run_keeps_previous_state() {
        let mut session = Session::new("bank.csv", raw(), AnalysisConfig::default()).unwrap();
        session
            .apply(CampaignSelections::with_age_range(30, 60))
            .unwrap();
        let before = session.filtered.clone();

        let err = session
            .apply(CampaignSelections::with_age_range(60, 30))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRange { .. }));
        assert_eq!(session.filtered, before);
        assert_eq!(session.selections.age_range, (30, 60));
        assert!(session.status_message.is_some());
    }

    #[test]
    fn test_header_only_dataset_has_no_data() {
        let raw = crate::data::loader::load(b"age;job;y\n", "empty.csv").unwrap();
        let session = Session::new("empty.csv", raw, AnalysisConfig::default()).unwrap();
        assert_eq!(session.filtered.n_rows(), 0);
        assert!(session.raw_proportions().is_none());
        assert!(session.filtered_proportions.is_none());
        assert!(session.status_message.is_none());
    }

    #[test]
    fn test_unreadable_ages_are_skipped() {
        let raw = crate::data::loader::load(b"age;y\n25;no\nunknown;yes\n40;no\n", "bank.csv").unwrap();
        let session = Session::new("bank.csv", raw, AnalysisConfig::default()).unwrap();
        assert_eq!(session.selections.age_range, (25, 40));
        assert_eq!(session.filtered.n_rows(), 2);
        assert_eq!(session.filtered_proportions.as_ref().unwrap().get("no"), Some(100.0));
        assert_eq!(session.raw().n_rows(), 3);
    }

    #[test]
    fn test_missing_target_column() {
        let config = AnalysisConfig {
            target_column: "poutcome".into(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            Session::new("bank.csv", raw(), config),
            Err(PipelineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_chart_kind_parsing() {
        assert_eq!("Pie".parse::<ChartKind>().unwrap(), ChartKind::Pie);
        assert!("line".parse::<ChartKind>().is_err());
        assert_eq!(ChartKind::default().to_string(), "bar");
    }
}
