use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use campaign_filter::cache::{ExportCache, LoadCache};
use campaign_filter::cli::Args;
use campaign_filter::config::{AnalysisConfig, DEFAULT_CONFIG_TEMPLATE};
use campaign_filter::data::export::ExportFormat;
use campaign_filter::data::proportion::ProportionTable;
use campaign_filter::state::Session;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.print_config {
        print!("{DEFAULT_CONFIG_TEMPLATE}");
        return Ok(());
    }

    let path = args
        .path
        .as_deref()
        .context("missing dataset path (see --help)")?;

    let mut config = match &args.config {
        Some(p) => AnalysisConfig::load(p)?,
        None => AnalysisConfig::default(),
    };
    args.apply_overrides(&mut config);

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut loads = LoadCache::new();
    let raw = loads.load(&bytes, &name)?.clone();
    log::info!("Loaded {} rows with columns {:?}", raw.n_rows(), raw.column_names());

    let mut session = Session::new(name, raw, config)?;
    let selections = args.selections(session.selections.clone());
    session.apply(selections)?;

    if args.json {
        print_json(&session)?;
    } else {
        print_text(&session);
    }

    if let Some(dir) = &args.out_dir {
        write_exports(&session, dir)?;
    }
    Ok(())
}

fn print_text(session: &Session) {
    let rows = session.config.preview_rows;
    println!("# Loaded data\n{}\n", session.raw().head(rows));
    println!("# After filters\n{}\n", session.filtered.head(rows));
    for stage in &session.stages {
        println!("  {}: {} -> {}", stage.stage, stage.rows_in, stage.rows_out);
    }
    println!();
    print_proportions("Original proportion", session.raw_proportions());
    print_proportions("Proportion after filter", session.filtered_proportions.as_ref());
    println!("chart: {}", session.chart);
}

fn print_proportions(title: &str, table: Option<&ProportionTable>) {
    println!("# {title}");
    match table {
        Some(p) => {
            for (label, pct) in p.entries() {
                println!("  {label:<12} {pct:>7.2}%");
            }
        }
        None => println!("  no data"),
    }
    println!();
}

fn print_json(session: &Session) -> Result<()> {
    let report = serde_json::json!({
        "dataset": session.name,
        "rows_raw": session.raw().n_rows(),
        "rows_filtered": session.filtered.n_rows(),
        "chart": session.chart,
        "stages": session.stages,
        "raw_proportions": session.raw_proportions(),
        "filtered_proportions": session.filtered_proportions,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn write_exports(session: &Session, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stem = &session.config.dataset_stem;
    let mut exports = ExportCache::new();

    let mut outputs = vec![
        (session.filtered.clone(), ExportFormat::Csv, "filtered"),
        (session.filtered.clone(), ExportFormat::Xlsx, "filtered"),
    ];
    if let Some(p) = session.raw_proportions() {
        outputs.push((p.to_table()?, ExportFormat::Xlsx, "raw_target_perc"));
    }
    if let Some(p) = &session.filtered_proportions {
        outputs.push((p.to_table()?, ExportFormat::Xlsx, "target_perc"));
    }

    for (table, format, suffix) in outputs {
        let file = dir.join(format.suggested_file_name(stem, suffix));
        let bytes = exports.encode(&table, format)?;
        std::fs::write(&file, bytes).with_context(|| format!("writing {}", file.display()))?;
        log::info!("Wrote {} ({} bytes)", file.display(), bytes.len());
    }
    Ok(())
}
