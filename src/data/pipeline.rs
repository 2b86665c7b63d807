use serde::Serialize;

use super::filter::{CategoricalFilter, FilterSpec, RangeFilter, Selection};
use super::model::Table;
use crate::error::PipelineResult;

// ---------------------------------------------------------------------------
// Sequential filter pipeline
// ---------------------------------------------------------------------------

/// Row counts around one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// Apply the range filter (if any), then every categorical filter in order.
///
/// `raw` is never modified and a new table is returned even when every stage
/// is a no-op. The first failing stage aborts the run.
pub fn apply(
    raw: &Table,
    range: Option<&RangeFilter>,
    categoricals: &[CategoricalFilter],
) -> PipelineResult<Table> {
    apply_with_report(raw, range, categoricals).map(|(table, _)| table)
}

/// [`apply`], also returning the row counts of each stage.
pub fn apply_with_report(
    raw: &Table,
    range: Option<&RangeFilter>,
    categoricals: &[CategoricalFilter],
) -> PipelineResult<(Table, Vec<StageReport>)> {
    let stages: Vec<FilterSpec> = range
        .cloned()
        .map(FilterSpec::from)
        .into_iter()
        .chain(categoricals.iter().cloned().map(FilterSpec::from))
        .collect();
    run_stages(raw, &stages)
}

/// Left fold of `stages` over a copy of `raw`.
pub fn run_stages(raw: &Table, stages: &[FilterSpec]) -> PipelineResult<(Table, Vec<StageReport>)> {
    let mut reports = Vec::with_capacity(stages.len());
    let mut current = raw.clone();

    for stage in stages {
        let rows_in = current.n_rows();
        current = stage.apply(&current).inspect_err(|e| {
            log::debug!("stage '{stage}' failed: {e}");
        })?;
        log::debug!("stage '{stage}': {rows_in} -> {} rows", current.n_rows());
        reports.push(StageReport {
            stage: stage.to_string(),
            rows_in,
            rows_out: current.n_rows(),
        });
    }

    Ok((current, reports))
}

// ---------------------------------------------------------------------------
// Campaign selections: the filter inputs of the bank-marketing dataset
// ---------------------------------------------------------------------------

/// Categorical columns in the order their filters are chained.
pub const CAMPAIGN_COLUMNS: [&str; 8] = [
    "job",
    "marital",
    "housing",
    "loan",
    "contact",
    "month",
    "day_of_week",
    "default",
];

/// One submission of the filter form.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSelections {
    /// Inclusive age bounds.
    pub age_range: (i64, i64),
    pub default: Selection,
    pub job: Selection,
    pub marital: Selection,
    pub housing: Selection,
    pub loan: Selection,
    pub contact: Selection,
    pub month: Selection,
    pub day_of_week: Selection,
}

impl CampaignSelections {
    /// Every multiselect on "all" and the given age bounds.
    pub fn with_age_range(low: i64, high: i64) -> Self {
        CampaignSelections {
            age_range: (low, high),
            default: Selection::all(),
            job: Selection::all(),
            marital: Selection::all(),
            housing: Selection::all(),
            loan: Selection::all(),
            contact: Selection::all(),
            month: Selection::all(),
            day_of_week: Selection::all(),
        }
    }

    /// Defaults for a freshly loaded table: the full age span, no restriction
    /// on any category. Bounds are truncated to integers.
    ///
    /// A table without a single numeric age (no rows, or nothing readable)
    /// gets `(0, 0)`; the range stage then keeps nothing, which is what that
    /// table holds anyway.
    pub fn full_range(table: &Table, age_column: &str) -> PipelineResult<Self> {
        let (low, high) = table
            .numeric_bounds(age_column)?
            .map_or((0, 0), |(low, high)| (low as i64, high as i64));
        Ok(Self::with_age_range(low, high))
    }

    pub fn selection(&self, column: &str) -> Option<&Selection> {
        match column {
            "default" => Some(&self.default),
            "job" => Some(&self.job),
            "marital" => Some(&self.marital),
            "housing" => Some(&self.housing),
            "loan" => Some(&self.loan),
            "contact" => Some(&self.contact),
            "month" => Some(&self.month),
            "day_of_week" => Some(&self.day_of_week),
            _ => None,
        }
    }

    pub fn selection_mut(&mut self, column: &str) -> Option<&mut Selection> {
        match column {
            "default" => Some(&mut self.default),
            "job" => Some(&mut self.job),
            "marital" => Some(&mut self.marital),
            "housing" => Some(&mut self.housing),
            "loan" => Some(&mut self.loan),
            "contact" => Some(&mut self.contact),
            "month" => Some(&mut self.month),
            "day_of_week" => Some(&mut self.day_of_week),
            _ => None,
        }
    }

    /// The range spec on `age_column` and the categorical specs in
    /// [`CAMPAIGN_COLUMNS`] order.
    pub fn to_specs(&self, age_column: &str) -> (RangeFilter, Vec<CategoricalFilter>) {
        let range = RangeFilter::new(age_column, self.age_range.0 as f64, self.age_range.1 as f64);
        let categoricals = CAMPAIGN_COLUMNS
            .iter()
            .filter_map(|&col| {
                self.selection(col)
                    .map(|sel| CategoricalFilter::new(col, sel.clone()))
            })
            .collect();
        (range, categoricals)
    }

    /// Run the whole form against `raw`.
    pub fn apply(&self, raw: &Table, age_column: &str) -> PipelineResult<(Table, Vec<StageReport>)> {
        let (range, categoricals) = self.to_specs(age_column);
        apply_with_report(raw, Some(&range), &categoricals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Value};
    use crate::error::PipelineError;

    fn campaign() -> Table {
        Table::new(vec![
            Column::integer("age", [25, 40, 60, 35, 52]),
            Column::text("job", ["admin.", "services", "admin.", "retired", "services"]),
            Column::text("marital", ["single", "married", "married", "single", "married"]),
            Column::text("housing", ["yes", "no", "yes", "yes", "no"]),
            Column::text("loan", ["no", "no", "yes", "no", "no"]),
            Column::text("contact", ["cellular", "telephone", "cellular", "cellular", "cellular"]),
            Column::text("month", ["may", "jun", "may", "jul", "may"]),
            Column::text("day_of_week", ["mon", "tue", "wed", "thu", "fri"]),
            Column::text("default", ["no", "no", "unknown", "no", "no"]),
            Column::text("y", ["no", "yes", "no", "yes", "no"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_range_then_categoricals() {
        let raw = campaign();
        let range = RangeFilter::new("age", 30.0, 60.0);
        let cats = vec![
            CategoricalFilter::new("marital", Selection::of(["married"])),
            CategoricalFilter::new("job", Selection::all()),
        ];
        let (out, report) = apply_with_report(&raw, Some(&range), &cats).unwrap();
        assert_eq!(out.n_rows(), 3);
        assert_eq!(
            report.iter().map(|r| (r.rows_in, r.rows_out)).collect::<Vec<_>>(),
            vec![(5, 4), (4, 3), (3, 3)]
        );
        assert_eq!(raw.n_rows(), 5);
    }

    #[test]
    fn test_no_stages_is_a_copy() {
        let raw = campaign();
        let out = apply(&raw, None, &[]).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_fail_fast() {
        let raw = campaign();
        let cats = vec![
            CategoricalFilter::new("education", Selection::of(["basic.4y"])),
            CategoricalFilter::new("job", Selection::none()),
        ];
        let err = apply(&raw, None, &cats).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(c) if c == "education"));
    }

    #[test]
    fn test_invalid_range_aborts_before_categoricals() {
        let raw = campaign();
        let range = RangeFilter::new("age", 70.0, 20.0);
        let cats = vec![CategoricalFilter::new("missing", Selection::all())];
        assert!(matches!(
            apply(&raw, Some(&range), &cats),
            Err(PipelineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_campaign_spec_order() {
        let (range, cats) = CampaignSelections::with_age_range(18, 95).to_specs("age");
        assert_eq!(range.low, 18.0);
        let cols: Vec<&str> = cats.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(cols, CAMPAIGN_COLUMNS.to_vec());
    }

    #[test]
    fn test_full_range_defaults_keep_everything() {
        let raw = campaign();
        let selections = CampaignSelections::full_range(&raw, "age").unwrap();
        assert_eq!(selections.age_range, (25, 60));
        let (out, _) = selections.apply(&raw, "age").unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_full_range_without_ages() {
        let raw = campaign().empty_like();
        let selections = CampaignSelections::full_range(&raw, "age").unwrap();
        assert_eq!(selections.age_range, (0, 0));
        let (out, _) = selections.apply(&raw, "age").unwrap();
        assert_eq!(out.n_rows(), 0);
        assert!(matches!(
            CampaignSelections::full_range(&raw, "years"),
            Err(PipelineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_campaign_apply() {
        let raw = campaign();
        let mut selections = CampaignSelections::full_range(&raw, "age").unwrap();
        *selections.selection_mut("month").unwrap() = Selection::of(["may"]);
        *selections.selection_mut("default").unwrap() = Selection::of(["no"]);
        let (out, report) = selections.apply(&raw, "age").unwrap();
        assert_eq!(report.len(), 9);
        assert_eq!(
            out.column("age").unwrap().values(),
            &[Value::Integer(25), Value::Integer(52)]
        );
    }

    #[test]
    fn test_idempotent() {
        let raw = campaign();
        let range = RangeFilter::new("age", 30.0, 55.0);
        let cats = vec![CategoricalFilter::new("housing", Selection::of(["no"]))];
        let once = apply(&raw, Some(&range), &cats).unwrap();
        let twice = apply(&once, Some(&range), &cats).unwrap();
        assert_eq!(once, twice);
    }
}
