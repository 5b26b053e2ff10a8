//! Composition root: builds the production adapters from [`AgentConfig`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::application::services::{ActivationController, ActivationSettings, ActivationTick};
use crate::domain::{AgentConfig, Backoff};
use crate::infra::clock::SystemClock;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::dm_client::GrpcDeviceManager;
use crate::infra::rpc_tool::RpcToolExecutor;

/// Tool executor used outside tests.
pub type Tools = RpcToolExecutor<TokioCommandRunner>;

/// Controller wired to the production adapters.
pub type Controller = ActivationController<Tools, GrpcDeviceManager, SystemClock>;

/// Loaded configuration plus where it came from.
pub struct AgentContext {
    pub config: AgentConfig,
    pub config_path: PathBuf,
}

impl AgentContext {
    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or invalid.
    pub fn load(path: PathBuf) -> Result<Self> {
        let config = YamlConfigStore::new(path.clone()).load()?;
        Ok(Self {
            config,
            config_path: path,
        })
    }

    /// Install the global subscriber. `RUST_LOG` wins over `log_level`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.config.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    #[must_use]
    pub fn tools(&self) -> Tools {
        RpcToolExecutor::new(TokioCommandRunner, &self.config.tool)
    }

    /// Build the controller. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the Device-Manager channel cannot be configured.
    pub fn controller(&self) -> Result<Arc<Controller>> {
        let dm = GrpcDeviceManager::connect_lazy(&self.config.device_manager)?;
        Ok(Arc::new(ActivationController::new(
            Arc::new(self.tools()),
            Arc::new(dm),
            SystemClock,
        )))
    }

    /// Bind `controller` to this host for the periodic driver.
    #[must_use]
    pub fn tick(
        &self,
        controller: Arc<Controller>,
    ) -> ActivationTick<Tools, GrpcDeviceManager, SystemClock> {
        ActivationTick {
            controller,
            host_id: self.config.host_id.clone(),
            settings: ActivationSettings {
                rps_address: self.config.rps_address.clone(),
            },
        }
    }

    /// Upper bound on waiting for an in-flight deactivation at exit: one
    /// tool run plus the post-deactivate polling budget.
    #[must_use]
    pub fn deactivation_grace(&self) -> Duration {
        Duration::from_secs(self.config.tool.activation_timeout_secs)
            + Backoff::DEACTIVATION_POLL.budget
    }
}
