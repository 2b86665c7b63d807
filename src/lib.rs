//! Filter-and-aggregate pipeline for marketing campaign datasets.
//!
//! Load a table, narrow it with a range filter and a chain of categorical
//! filters, compare the target column's proportions before and after, and
//! export either view as CSV or xlsx.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use data::filter::{CategoricalFilter, FilterSpec, RangeFilter, Selection, ALL};
pub use data::model::{Column, ColumnKind, Table, Value};
pub use data::pipeline::{apply, CampaignSelections};
pub use data::proportion::{proportions, ProportionTable};
pub use error::{PipelineError, PipelineResult};
