//! Implementation of `pollguard status`.

use super::remote_client;
use crate::config::Config;
use crate::error::Result;
use crate::inspect::{InspectInputs, SystemProcessTable, inspect, print_report};
use crate::remote::RemoteApi;
use std::path::Path;

/// Execute the `pollguard status` command.
///
/// Read-only. Findings are reported, never turned into errors, so the
/// command exits 0 whatever it finds. An unusable config file becomes a
/// finding and the remaining checks run against the defaults.
pub fn cmd_status(config_path: &Path) -> Result<()> {
    let (config, config_error) = match Config::load_or_default(config_path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let manager = config.lock_manager();
    let processes = SystemProcessTable::snapshot();
    let api = remote_client(&config);

    let inputs = InspectInputs {
        config_path,
        config_error: config_error.as_ref(),
        port: config.port,
        token_env: &config.token_env,
        credential_present: api.is_some(),
        remote: api.as_ref().map(|api| api as &dyn RemoteApi),
        processes: &processes,
        competitor_process_name: &config.competitor_process_name,
    };

    let report = inspect(&manager, &inputs);
    print_report(&report);

    Ok(())
}
