//! Implementation of the 'locate' subcommand.

use crate::cli::LocateArgs;
use crate::error::CliResult;

use aved_core::CoreConfig;
use aved_core::external::{ProcessProber, ToolLocator};

use std::sync::Arc;
use std::time::Duration;

use log::debug;

pub fn run_locate(args: &LocateArgs) -> CliResult<()> {
    let mut config = CoreConfig::from_env();
    if let Some(ms) = args.timeout_ms {
        config.probe_timeout = Duration::from_millis(ms);
    }

    let locator = ToolLocator::from_config(&config, Arc::new(ProcessProber));
    debug!("Searching for {} in {:?}", args.name, locator.dirs());

    let path = locator.locate(&args.name)?;
    println!("{}", path.display());
    Ok(())
}
