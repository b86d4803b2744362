use std::path::PathBuf;

use psd_ingest::{loader::export_stem, parse_export, ExportFormat, Sheet};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "psd-ingest",
    about = "Parsing dose tracking exports into the canonical irradiation event table"
)]
struct Opt {
    /// Path to the export file
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// Export format: dosetrack or radimetrics
    #[structopt(short = "f", long, default_value = "dosetrack")]
    source: ExportFormat,
    /// Spreadsheet sheet index or name
    #[structopt(long, default_value = "0")]
    sheet: Sheet,
    /// Canonical table CSV file [default: <export>_psd.csv]
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Print a summary of the canonical table
    #[structopt(short, long)]
    summary: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let opt = Opt::from_args();

    let table = parse_export(&opt.path, opt.source, opt.sheet)?;
    if opt.summary {
        table.summary();
    }
    let output = opt.output.unwrap_or_else(|| {
        opt.path
            .with_file_name(format!("{}_psd.csv", export_stem(&opt.path)))
    });
    table.to_csv(&output)?;
    println!("Canonical table written to {:?}", output);

    Ok(())
}
