//! Protobuf messages and enums for the `DeviceManagement` service.

/// Request for the activation intent of a single host.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivationRequest {
    #[prost(string, tag = "1")]
    pub host_id: ::prost::alloc::string::String,
}

/// Activation intent advertised by the Device-Manager.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivationDetailsResponse {
    #[prost(string, tag = "1")]
    pub host_id: ::prost::alloc::string::String,
    #[prost(enumeration = "OperationType", tag = "2")]
    pub operation: i32,
    #[prost(string, tag = "3")]
    pub profile_name: ::prost::alloc::string::String,
    /// Secret handed to the activation tool. Never log this message.
    #[prost(string, tag = "4")]
    pub action_password: ::prost::alloc::string::String,
}

/// Opportunistic AMT enablement report.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AmtStatusRequest {
    #[prost(string, tag = "1")]
    pub host_id: ::prost::alloc::string::String,
    #[prost(enumeration = "AmtStatus", tag = "2")]
    pub status: i32,
    /// `"AMT"`, `"ISM"` or empty.
    #[prost(string, tag = "3")]
    pub feature: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct AmtStatusResponse {}

/// Outcome of one reconciliation step.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivationResultRequest {
    #[prost(string, tag = "1")]
    pub host_id: ::prost::alloc::string::String,
    #[prost(enumeration = "ActivationStatus", tag = "2")]
    pub activation_status: i32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ActivationResultResponse {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OperationType {
    Unspecified = 0,
    Activate = 1,
    Deactivate = 2,
}

impl OperationType {
    /// Proto enum value name, as emitted in logs and error tags.
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "OPERATION_TYPE_UNSPECIFIED",
            Self::Activate => "OPERATION_TYPE_ACTIVATE",
            Self::Deactivate => "OPERATION_TYPE_DEACTIVATE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AmtStatus {
    Unspecified = 0,
    Enabled = 1,
    Disabled = 2,
}

impl AmtStatus {
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "AMT_STATUS_UNSPECIFIED",
            Self::Enabled => "AMT_STATUS_ENABLED",
            Self::Disabled => "AMT_STATUS_DISABLED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActivationStatus {
    Unspecified = 0,
    Activating = 1,
    Activated = 2,
    ActivationFailed = 3,
}

impl ActivationStatus {
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "ACTIVATION_STATUS_UNSPECIFIED",
            Self::Activating => "ACTIVATION_STATUS_ACTIVATING",
            Self::Activated => "ACTIVATION_STATUS_ACTIVATED",
            Self::ActivationFailed => "ACTIVATION_STATUS_ACTIVATION_FAILED",
        }
    }
}
