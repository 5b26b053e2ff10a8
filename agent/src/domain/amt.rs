//! AMT info parser.
//!
//! Turns raw `rpc amtinfo` output into an [`AmtSnapshot`]. The parser is
//! total: unrecognised or missing fields degrade to `Unknown` instead of
//! failing, because the tool's output format is free-form text.

use serde::Serialize;

/// Marker printed by the tool when the HECI/MEI driver is absent.
pub const DRIVER_NOT_DETECTED: &str = "HECIDriverNotDetected";

const FEATURES_KEY: &str = "Features";
const RAS_REMOTE_STATUS_KEY: &str = "RAS Remote Status";
const CONTROL_MODE_KEY: &str = "Control Mode";

const AMT_PRO_CORPORATE: &str = "AMT Pro Corporate";
const ISM_CORPORATE: &str = "Intel Standard Manageability Corporate";
const PRE_PROVISIONING: &str = "pre-provisioning";

/// Manageability SKU reported under `Features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmtFeatures {
    AmtProCorporate,
    IsmCorporate,
    Other,
    Unknown,
}

impl AmtFeatures {
    /// Feature label sent with the AMT status report: `"AMT"`, `"ISM"` or `""`.
    #[must_use]
    pub fn report_label(self) -> &'static str {
        match self {
            Self::AmtProCorporate => "AMT",
            Self::IsmCorporate => "ISM",
            Self::Other | Self::Unknown => "",
        }
    }

    fn classify(value: &str) -> Self {
        if value.contains(AMT_PRO_CORPORATE) {
            Self::AmtProCorporate
        } else if value.contains(ISM_CORPORATE) {
            Self::IsmCorporate
        } else {
            Self::Other
        }
    }
}

/// State of the AMT remote-management link (`RAS Remote Status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RasRemoteStatus {
    NotConnected,
    Connecting,
    Connected,
    Unknown,
}

impl RasRemoteStatus {
    /// Parse a tool value, case-insensitive and whitespace-trimmed.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "not connected" => Self::NotConnected,
            "connecting" => Self::Connecting,
            "connected" => Self::Connected,
            _ => Self::Unknown,
        }
    }

    /// The literal the tool prints for this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotConnected => "not connected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RasRemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed AMT state derived from one `amtinfo` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmtSnapshot {
    pub features: AmtFeatures,
    pub ras_remote_status: RasRemoteStatus,
    /// Raw `Control Mode` value, if printed.
    pub control_mode: Option<String>,
    /// `false` when the output signals [`DRIVER_NOT_DETECTED`].
    pub driver_present: bool,
}

impl AmtSnapshot {
    /// Parse `amtinfo` output. Never fails.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        let features = field_value(output, FEATURES_KEY)
            .map_or(AmtFeatures::Unknown, AmtFeatures::classify);
        let ras_remote_status = field_value(output, RAS_REMOTE_STATUS_KEY)
            .map_or(RasRemoteStatus::Unknown, RasRemoteStatus::parse);
        let control_mode = field_value(output, CONTROL_MODE_KEY)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            features,
            ras_remote_status,
            control_mode,
            driver_present: !output.contains(DRIVER_NOT_DETECTED),
        }
    }

    /// Whether AMT has left the factory pre-provisioning state.
    #[must_use]
    pub fn provisioned(&self) -> bool {
        self.control_mode
            .as_deref()
            .is_some_and(|mode| !mode.to_lowercase().contains(PRE_PROVISIONING))
    }
}

/// Value of the first line shaped `<key> ... : <value>`, trimmed.
///
/// The tool pads keys with spaces before the colon, so only the text between
/// the key and the first `:` may be whitespace.
fn field_value<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix(key)?;
        let rest = rest.trim_start().strip_prefix(':')?;
        Some(rest.trim())
    })
}
