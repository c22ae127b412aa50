//! Converts a folder of markdown stat blocks into monster records.
//!
//! Usage: `import-monsters <MD_DIR> [--out DIR]`
//!
//! Records land in `data/monsters` unless `--out` is given; the folder's
//! `index.json` is reconciled afterwards.

use std::path::PathBuf;
use std::process::ExitCode;

use asset_index::{import_monsters, ReconcileOutcome};

const DEFAULT_OUT_DIR: &str = "data/monsters";

struct Args {
    source: PathBuf,
    out: PathBuf,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut source = None;
    let mut out = PathBuf::from(DEFAULT_OUT_DIR);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                out = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| "--out needs a directory".to_string())?;
            }
            _ if source.is_none() => source = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }
    let source = source.ok_or_else(|| "usage: import-monsters <MD_DIR> [--out DIR]".to_string())?;
    Ok(Args { source, out })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            log::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match import_monsters(&args.source, &args.out) {
        Ok(report) => {
            if let ReconcileOutcome::Written(index) = &report.index {
                log::info!(
                    "{} records written, {} indexed in {}",
                    report.written.len(),
                    index.entries,
                    index.index_path.display()
                );
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
