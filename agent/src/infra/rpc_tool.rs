//! `ToolExecutor` backed by the `rpc` AMT provisioning binary.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{CommandRunner, ToolExecutor, ToolOutput};
use crate::domain::ActionPassword;
use crate::domain::config::ToolConfig;

const REDACTED: &str = "***";

/// Runs `rpc amtinfo | activate | deactivate` through a [`CommandRunner`].
pub struct RpcToolExecutor<R> {
    runner: R,
    binary: String,
    amtinfo_timeout: Duration,
    activation_timeout: Duration,
}

impl<R: CommandRunner> RpcToolExecutor<R> {
    pub fn new(runner: R, config: &ToolConfig) -> Self {
        Self {
            runner,
            binary: config.binary.clone(),
            amtinfo_timeout: Duration::from_secs(config.amtinfo_timeout_secs),
            activation_timeout: Duration::from_secs(config.activation_timeout_secs),
        }
    }

    /// Run the tool; `secret` is masked in the logged argv.
    async fn invoke(
        &self,
        args: &[&str],
        secret: Option<&str>,
        timeout: Duration,
    ) -> Result<ToolOutput> {
        let shown: Vec<&str> = args
            .iter()
            .map(|&a| if Some(a) == secret { REDACTED } else { a })
            .collect();
        tracing::debug!(binary = %self.binary, args = ?shown, "running AMT tool");

        let output = self
            .runner
            .run_with_timeout(&self.binary, args, timeout)
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let result = ToolOutput {
            exit_code: output.status.code(),
            output: combined,
        };
        if !result.is_success() {
            tracing::debug!(exit_code = ?result.exit_code, subcommand = args[0], "AMT tool exited non-zero");
        }
        Ok(result)
    }
}

#[async_trait]
impl<R: CommandRunner> ToolExecutor for RpcToolExecutor<R> {
    async fn amtinfo(&self) -> Result<ToolOutput> {
        self.invoke(&["amtinfo"], None, self.amtinfo_timeout).await
    }

    async fn activate(
        &self,
        rps_url: &str,
        profile: &str,
        password: &ActionPassword,
    ) -> Result<ToolOutput> {
        let secret = password.expose();
        self.invoke(
            &[
                "activate",
                "--url",
                rps_url,
                "--profile",
                profile,
                "--password",
                secret,
            ],
            Some(secret),
            self.activation_timeout,
        )
        .await
    }

    async fn deactivate(&self, rps_url: &str, password: &ActionPassword) -> Result<ToolOutput> {
        let secret = password.expose();
        self.invoke(
            &["deactivate", "--url", rps_url, "--password", secret],
            Some(secret),
            self.activation_timeout,
        )
        .await
    }
}
