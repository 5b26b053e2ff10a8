//! Typed client stub for the `DeviceManagement` service.
//!
//! Same shape as a `tonic-build` client: generic over any `GrpcService`, so
//! callers can wrap a `Channel` in an interceptor (bearer tokens) without the
//! stub knowing about it.

use tonic::codegen::{Body, Bytes, InterceptedService, StdError, http};

use crate::messages::{
    ActivationDetailsResponse, ActivationRequest, ActivationResultRequest,
    ActivationResultResponse, AmtStatusRequest, AmtStatusResponse,
};

const RETRIEVE_ACTIVATION_DETAILS: &str =
    "/device_management.DeviceManagement/RetrieveActivationDetails";
const REPORT_AMT_STATUS: &str = "/device_management.DeviceManagement/ReportAMTStatus";
const REPORT_ACTIVATION_RESULTS: &str =
    "/device_management.DeviceManagement/ReportActivationResults";

/// Client for the Device-Manager `DeviceManagement` service.
#[derive(Debug, Clone)]
pub struct DeviceManagementClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl<T> DeviceManagementClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(inner),
        }
    }

    /// Wrap `inner` so `interceptor` sees every outgoing request.
    pub fn with_interceptor<F>(
        inner: T,
        interceptor: F,
    ) -> DeviceManagementClient<InterceptedService<T, F>>
    where
        F: tonic::service::Interceptor,
        T::ResponseBody: Default,
        T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
        <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
            Into<StdError> + Send + Sync,
    {
        DeviceManagementClient::new(InterceptedService::new(inner, interceptor))
    }

    /// Fetch the activation intent for a host.
    pub async fn retrieve_activation_details(
        &mut self,
        request: impl tonic::IntoRequest<ActivationRequest>,
    ) -> Result<tonic::Response<ActivationDetailsResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(RETRIEVE_ACTIVATION_DETAILS);
        self.inner.unary(request.into_request(), path, codec).await
    }

    /// Report whether AMT is enabled on the host.
    pub async fn report_amt_status(
        &mut self,
        request: impl tonic::IntoRequest<AmtStatusRequest>,
    ) -> Result<tonic::Response<AmtStatusResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(REPORT_AMT_STATUS);
        self.inner.unary(request.into_request(), path, codec).await
    }

    /// Report the outcome of an activation step.
    pub async fn report_activation_results(
        &mut self,
        request: impl tonic::IntoRequest<ActivationResultRequest>,
    ) -> Result<tonic::Response<ActivationResultResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(REPORT_ACTIVATION_RESULTS);
        self.inner.unary(request.into_request(), path, codec).await
    }

    async fn ready(&mut self) -> Result<(), tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
        })
    }
}
