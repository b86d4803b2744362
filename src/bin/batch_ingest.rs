use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use glob::glob;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use psd_ingest::{loader::export_stem, parse_export, ExportFormat, Sheet};
use rayon::prelude::*;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "batch-ingest",
    about = "Parsing many dose tracking exports into canonical irradiation event tables"
)]
struct Opt {
    /// Export files glob pattern [default: $PSD_EXPORTS]
    pattern: Option<String>,
    /// Export format: dosetrack or radimetrics
    #[structopt(short = "f", long, default_value = "dosetrack")]
    source: ExportFormat,
    /// Spreadsheet sheet index or name
    #[structopt(long, default_value = "0")]
    sheet: Sheet,
    /// Canonical tables directory [default: next to the exports]
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn ingest(path: &Path, opt: &Opt) -> anyhow::Result<usize> {
    let table = parse_export(path, opt.source, opt.sheet.clone())
        .with_context(|| format!("failed to parse {:?}", path))?;
    let name = format!("{}_psd.csv", export_stem(path));
    let output = match &opt.output {
        Some(dir) => dir.join(name),
        None => path.with_file_name(name),
    };
    table
        .to_csv(&output)
        .with_context(|| format!("failed to write {:?}", output))?;
    Ok(table.len())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let pattern = match &opt.pattern {
        Some(pattern) => pattern.clone(),
        None => env::var("PSD_EXPORTS")
            .context("no export pattern given and PSD_EXPORTS is not set")?,
    };
    if let Some(dir) = &opt.output {
        std::fs::create_dir_all(dir)?;
    }
    let paths = glob(&pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;
    println!("Ingesting {} exports matching {:?}", paths.len(), pattern);

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} [{elapsed}]")?);
    let results: Vec<_> = paths
        .par_iter()
        .progress_with(pb)
        .map(|path| (path, ingest(path, &opt)))
        .collect();

    let mut n_events = 0;
    let mut n_failed = 0;
    for (path, result) in results {
        match result {
            Ok(n) => n_events += n,
            Err(e) => {
                n_failed += 1;
                log::error!("{:?}: {:#}", path, e);
            }
        }
    }
    println!(
        "{} irradiation events from {} exports, {} failed",
        n_events,
        paths.len() - n_failed,
        n_failed
    );

    Ok(())
}
