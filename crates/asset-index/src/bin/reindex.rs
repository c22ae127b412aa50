//! Regenerates every collection index of a site.
//!
//! Usage: `reindex [CONFIG]`
//!
//! Without an argument, `reindex.json` in the current directory is used when
//! present, otherwise the stock layout rooted at the current directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asset_index::config::REINDEX_CONFIG_FILENAME;
use asset_index::{reconcile_all, ReconcileOutcome, ReindexConfig};

fn load_config(arg: Option<String>) -> asset_index::Result<ReindexConfig> {
    match arg.map(PathBuf::from) {
        Some(path) => ReindexConfig::load(&path),
        None => {
            let default_path = Path::new(REINDEX_CONFIG_FILENAME);
            if default_path.exists() {
                ReindexConfig::load(default_path)
            } else {
                Ok(ReindexConfig::default_for(Path::new(".")))
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match load_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(error) => {
            log::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0usize;
    for (name, result) in reconcile_all(&config.collections) {
        match result {
            Ok(ReconcileOutcome::Written(report)) => {
                for file in &report.added {
                    log::debug!("{name}: + {file}");
                }
                for file in &report.removed {
                    log::debug!("{name}: - {file}");
                }
            }
            Ok(ReconcileOutcome::Skipped { .. }) => {}
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        log::error!("{failed} collection(s) failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
