//! gRPC implementation of the `DeviceManager` port.
//!
//! One lazily-connected channel is shared by all calls; the stub is cloned
//! per request. `FailedPrecondition` means the Device-Manager has nothing
//! for this host yet and maps to [`DeviceManagerError::Skipped`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dm_api::DeviceManagementClient;
use tonic::codegen::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::application::ports::DeviceManager;
use crate::domain::config::DeviceManagerConfig;
use crate::domain::{
    ActionPassword, ActivationIntent, ActivationStatus, AmtStatus, DeviceManagerError, Operation,
};
use crate::infra::tls::client_tls_config;
use crate::infra::token::BearerToken;

type Client = DeviceManagementClient<InterceptedService<Channel, BearerToken>>;

/// Device-Manager client over a tonic channel.
#[derive(Clone)]
pub struct GrpcDeviceManager {
    client: Client,
    timeout: Duration,
}

impl GrpcDeviceManager {
    /// Build the channel without connecting. Must be called inside a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or TLS material cannot be
    /// loaded.
    pub fn connect_lazy(config: &DeviceManagerConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.rpc_timeout_secs);
        let mut endpoint = Endpoint::from_shared(config.url.clone())
            .with_context(|| format!("invalid device manager url {}", config.url))?
            .timeout(timeout)
            .connect_timeout(timeout);

        if config.tls.enabled {
            let domain = endpoint
                .uri()
                .host()
                .map(ToString::to_string)
                .with_context(|| format!("device manager url {} has no host", config.url))?;
            endpoint = endpoint
                .tls_config(client_tls_config(&config.tls, &domain)?)
                .context("configuring device manager TLS")?;
        }

        tracing::debug!(
            url = %config.url,
            tls = config.tls.enabled,
            mtls = config.tls.is_mtls(),
            "device manager channel configured"
        );
        let channel = endpoint.connect_lazy();
        let token = BearerToken::new(config.access_token_path.clone());
        Ok(Self {
            client: DeviceManagementClient::with_interceptor(channel, token),
            timeout,
        })
    }

    fn request<M>(&self, message: M) -> tonic::Request<M> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.timeout);
        request
    }
}

#[async_trait]
impl DeviceManager for GrpcDeviceManager {
    async fn report_amt_status(
        &self,
        host_id: &str,
        status: AmtStatus,
        feature: &str,
    ) -> Result<(), DeviceManagerError> {
        let message = dm_api::AmtStatusRequest {
            host_id: host_id.to_string(),
            status: amt_status_to_proto(status) as i32,
            feature: feature.to_string(),
        };
        match self
            .client
            .clone()
            .report_amt_status(self.request(message))
            .await
        {
            Ok(_) => Ok(()),
            Err(status) if status.code() == Code::FailedPrecondition => {
                tracing::debug!(host_id, message = status.message(), "AMT status report skipped");
                Ok(())
            }
            Err(status) => Err(map_status(&status)),
        }
    }

    async fn retrieve_activation_details(
        &self,
        host_id: &str,
    ) -> Result<ActivationIntent, DeviceManagerError> {
        let message = dm_api::ActivationRequest {
            host_id: host_id.to_string(),
        };
        let response = self
            .client
            .clone()
            .retrieve_activation_details(self.request(message))
            .await
            .map_err(|s| map_status(&s))?
            .into_inner();
        Ok(intent_from_proto(response))
    }

    async fn report_activation_results(
        &self,
        host_id: &str,
        status: ActivationStatus,
    ) -> Result<(), DeviceManagerError> {
        let message = dm_api::ActivationResultRequest {
            host_id: host_id.to_string(),
            activation_status: activation_status_to_proto(status) as i32,
        };
        self.client
            .clone()
            .report_activation_results(self.request(message))
            .await
            .map_err(|s| map_status(&s))?;
        Ok(())
    }
}

// ── Wire conversions ─────────────────────────────────────────────────────────

fn map_status(status: &Status) -> DeviceManagerError {
    match status.code() {
        Code::FailedPrecondition => DeviceManagerError::Skipped(status.message().to_string()),
        Code::Unavailable => DeviceManagerError::Transport(status.message().to_string()),
        code => DeviceManagerError::Rpc {
            code: format!("{code:?}"),
            message: status.message().to_string(),
        },
    }
}

fn intent_from_proto(response: dm_api::ActivationDetailsResponse) -> ActivationIntent {
    let operation = match response.operation() {
        dm_api::OperationType::Activate => Operation::Activate,
        dm_api::OperationType::Deactivate => Operation::Deactivate,
        dm_api::OperationType::Unspecified => Operation::Unspecified,
    };
    ActivationIntent {
        host_id: response.host_id,
        operation,
        profile_name: response.profile_name,
        action_password: ActionPassword::new(response.action_password),
    }
}

fn amt_status_to_proto(status: AmtStatus) -> dm_api::AmtStatus {
    match status {
        AmtStatus::Enabled => dm_api::AmtStatus::Enabled,
        AmtStatus::Disabled => dm_api::AmtStatus::Disabled,
    }
}

fn activation_status_to_proto(status: ActivationStatus) -> dm_api::ActivationStatus {
    match status {
        ActivationStatus::Unspecified => dm_api::ActivationStatus::Unspecified,
        ActivationStatus::Activating => dm_api::ActivationStatus::Activating,
        ActivationStatus::Activated => dm_api::ActivationStatus::Activated,
        ActivationStatus::ActivationFailed => dm_api::ActivationStatus::ActivationFailed,
    }
}
