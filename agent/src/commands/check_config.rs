//! `pma check-config`: validate the configuration and print a summary.

use std::process::ExitCode;

use crate::app::AgentContext;
use crate::domain::rps_url;

/// Run the check-config command. Loading already validated the file, so
/// this only reports. Secrets are never printed, only whether they are set.
pub fn run(app: &AgentContext) -> ExitCode {
    let config = &app.config;
    let dm = &config.device_manager;
    let tls = match (dm.tls.enabled, dm.tls.is_mtls()) {
        (false, _) => "disabled",
        (true, true) => "mutual",
        (true, false) => "server-only",
    };

    println!("Configuration OK: {}", app.config_path.display());
    println!("  host_id:         {}", config.host_id);
    println!("  rps:             {}", rps_url(&config.rps_address));
    println!("  device_manager:  {}", dm.url);
    println!("  tls:             {tls}");
    println!(
        "  access token:    {}",
        dm.access_token_path
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    );
    println!("  heartbeat:       {}s", config.heartbeat_interval_secs);
    println!("  rpc timeout:     {}s", dm.rpc_timeout_secs);
    println!("  tool:            {}", config.tool.binary);
    ExitCode::SUCCESS
}
