use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application identifier registered with the cast service
pub type AppId = String;

/// Opaque identifier of a running activity
pub type ActivityId = String;

/// Receiver identifier, in the discovery transport's id scheme
pub type ReceiverId = String;

/// Volume level between 0.0 and 1.0
pub type VolumeLevel = f64;

/// Status string the device API reports for failed activity commands
const ACTIVITY_ERROR_STATUS: &str = "error";

const UNKNOWN_ERROR: &str = "Unknown error";

/// A discoverable device capable of running activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub id: ReceiverId,

    #[serde(default)]
    pub name: String,

    /// Transport-specific fields, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Receiver {
    pub fn new(id: impl Into<ReceiverId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Request to launch an application on a receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub app_id: AppId,
    pub receiver: Receiver,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl LaunchRequest {
    pub fn new(app_id: impl Into<AppId>, receiver: Receiver) -> Self {
        Self {
            app_id: app_id.into(),
            receiver,
            parameters: None,
        }
    }

    /// Set the launch parameters passed to the activity
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }
}

/// Result of a launch, stop or activity status command
///
/// A failed command carries `status == "error"` and an `errorString`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<ActivityId>,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,
}

impl ActivityStatus {
    /// Status for a running activity
    pub fn running(activity_id: impl Into<ActivityId>, status: impl Into<String>) -> Self {
        Self {
            activity_id: Some(activity_id.into()),
            status: status.into(),
            error_string: None,
        }
    }

    /// Status with no activity attached (e.g. after a stop)
    pub fn stopped(status: impl Into<String>) -> Self {
        Self {
            activity_id: None,
            status: status.into(),
            error_string: None,
        }
    }

    /// Failed command
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            activity_id: None,
            status: ACTIVITY_ERROR_STATUS.to_string(),
            error_string: Some(detail.into()),
        }
    }

    /// Check if this status reports a failure
    pub fn is_error(&self) -> bool {
        self.status == ACTIVITY_ERROR_STATUS
    }

    /// Get the failure detail, if this status reports a failure
    pub fn error_message(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }
        Some(
            self.error_string
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        )
    }
}

/// Playback state reported by an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    #[serde(default)]
    pub volume: VolumeLevel,

    #[serde(default)]
    pub muted: bool,

    /// Present only when the activity supports pausing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_pause: Option<bool>,

    /// Any other reported fields (title, position, state...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MediaStatus {
    pub fn new(volume: VolumeLevel, muted: bool) -> Self {
        Self {
            volume,
            muted,
            has_pause: None,
            extra: BTreeMap::new(),
        }
    }

    /// Mark the status as exposing a pause capability
    pub fn with_pause(mut self, has_pause: bool) -> Self {
        self.has_pause = Some(has_pause);
        self
    }

    /// Whether the status exposes the pause capability field at all
    pub fn exposes_pause(&self) -> bool {
        self.has_pause.is_some()
    }
}

/// Result of any media command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MediaStatus>,
}

impl MediaResult {
    pub fn ok(status: MediaStatus) -> Self {
        Self {
            success: true,
            error_string: None,
            status: Some(status),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error_string: Some(detail.into()),
            status: None,
        }
    }

    /// Get the failure detail, if the command failed
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(
            self.error_string
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        )
    }
}

/// Request to start or resume playback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaPlayRequest {
    /// Start position in seconds; resumes from the current one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
}

/// Request to change volume and mute state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaVolumeRequest {
    pub volume: VolumeLevel,
    pub muted: bool,
}

impl MediaVolumeRequest {
    pub fn new(volume: VolumeLevel, muted: bool) -> Self {
        Self { volume, muted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_status_from_wire() {
        let running: ActivityStatus =
            serde_json::from_value(json!({ "activityId": "A1", "status": "running" })).unwrap();
        assert!(!running.is_error());
        assert_eq!(running.activity_id.as_deref(), Some("A1"));
        assert_eq!(running.error_message(), None);

        let failed: ActivityStatus =
            serde_json::from_value(json!({ "status": "error", "errorString": "no such app" }))
                .unwrap();
        assert!(failed.is_error());
        assert_eq!(failed.error_message().as_deref(), Some("no such app"));

        let bare: ActivityStatus = serde_json::from_value(json!({ "status": "error" })).unwrap();
        assert_eq!(bare.error_message().as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_media_status_keeps_extra_fields() {
        let status: MediaStatus = serde_json::from_value(json!({
            "volume": 0.25,
            "muted": true,
            "hasPause": false,
            "title": "Big Buck Bunny",
            "position": 12.5
        }))
        .unwrap();
        assert_eq!(status.volume, 0.25);
        assert!(status.muted);
        assert!(status.exposes_pause());
        assert_eq!(status.extra.get("title"), Some(&json!("Big Buck Bunny")));
        assert_eq!(status.extra.len(), 2);
    }

    #[test]
    fn test_media_status_pause_field_presence() {
        let without: MediaStatus = serde_json::from_value(json!({ "volume": 1.0 })).unwrap();
        assert!(!without.exposes_pause());

        let null: MediaStatus =
            serde_json::from_value(json!({ "volume": 1.0, "hasPause": null })).unwrap();
        assert!(!null.exposes_pause());
    }

    #[test]
    fn test_media_result_failure() {
        let result: MediaResult =
            serde_json::from_value(json!({ "success": false, "errorString": "device offline" }))
                .unwrap();
        assert_eq!(result.error_message().as_deref(), Some("device offline"));
        assert!(result.status.is_none());
        assert_eq!(MediaResult::ok(MediaStatus::new(0.5, false)).error_message(), None);
    }

    #[test]
    fn test_launch_request_wire_shape() {
        let request = LaunchRequest::new("Foo", Receiver::new("R1", "Living Room"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "appId": "Foo", "receiver": { "id": "R1", "name": "Living Room" } })
        );

        let request = request.with_parameters("v=abc");
        assert_eq!(request.parameters.as_deref(), Some("v=abc"));
    }

    #[test]
    fn test_receiver_passes_through_transport_fields() {
        let receiver: Receiver = serde_json::from_value(json!({
            "id": "R2",
            "name": "Kitchen",
            "ipAddress": "192.168.1.20",
            "isTabProjected": false
        }))
        .unwrap();
        assert_eq!(receiver.id, "R2");
        assert_eq!(receiver.extra.get("ipAddress"), Some(&json!("192.168.1.20")));
    }
}
