use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::config::AnalysisConfig;
use crate::data::filter::Selection;
use crate::data::pipeline::CampaignSelections;
use crate::state::ChartKind;

/// Inclusive age bounds given as `LOW-HIGH` or `LOW:HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange(pub i64, pub i64);

impl FromStr for AgeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // a leading '-' is the sign of LOW, not the separator
        let (low, high) = s
            .split_once(':')
            .or_else(|| {
                s.char_indices()
                    .skip(1)
                    .find(|&(_, c)| c == '-')
                    .map(|(i, _)| (&s[..i], &s[i + 1..]))
            })
            .ok_or_else(|| format!("expected LOW-HIGH, got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid age '{v}': {e}"))
        };
        Ok(AgeRange(parse(low)?, parse(high)?))
    }
}

/// Filter a campaign dataset and compare target proportions.
///
/// Category flags can be repeated; omitting one (or passing "all") leaves the
/// column unrestricted.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "campaign-filter", version, about)]
pub struct Args {
    /// Dataset to load (semicolon-delimited text, csv, xlsx, xls or ods)
    pub path: Option<PathBuf>,

    /// Inclusive age range, e.g. 30-60
    #[arg(long)]
    pub age: Option<AgeRange>,

    #[arg(long)]
    pub default: Vec<String>,

    #[arg(long)]
    pub job: Vec<String>,

    #[arg(long)]
    pub marital: Vec<String>,

    #[arg(long)]
    pub housing: Vec<String>,

    #[arg(long)]
    pub loan: Vec<String>,

    #[arg(long)]
    pub contact: Vec<String>,

    #[arg(long)]
    pub month: Vec<String>,

    #[arg(long = "day-of-week")]
    pub day_of_week: Vec<String>,

    /// Column whose proportions are compared
    #[arg(long)]
    pub target: Option<String>,

    /// Chart kind handed to the renderer (bar or pie)
    #[arg(long)]
    pub chart: Option<ChartKind>,

    /// Write filtered data and proportion tables here
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print a JSON report instead of text tables
    #[arg(long)]
    pub json: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Flags take precedence over the configuration file.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(target) = &self.target {
            config.target_column = target.clone();
        }
        if let Some(chart) = self.chart {
            config.chart = chart;
        }
    }

    /// `base` with every flag that was given replacing its field.
    pub fn selections(&self, base: CampaignSelections) -> CampaignSelections {
        let mut selections = base;
        if let Some(AgeRange(low, high)) = self.age {
            selections.age_range = (low, high);
        }
        let flags: [(&str, &Vec<String>); 8] = [
            ("default", &self.default),
            ("job", &self.job),
            ("marital", &self.marital),
            ("housing", &self.housing),
            ("loan", &self.loan),
            ("contact", &self.contact),
            ("month", &self.month),
            ("day_of_week", &self.day_of_week),
        ];
        for (column, values) in flags {
            if values.is_empty() {
                continue;
            }
            if let Some(sel) = selections.selection_mut(column) {
                *sel = Selection::of(values.iter().cloned());
            }
        }
        selections
    }
}
