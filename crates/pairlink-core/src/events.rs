//! Real-time channel wire events.
//!
//! Every frame is a JSON envelope `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events pushed from the server to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "desktop:code")]
    DesktopCode { code: String },
    #[serde(rename = "desktop:link")]
    DesktopLink { link: String },
    #[serde(rename = "desktop:mobile-connected")]
    MobileConnected { code: String },
    #[serde(rename = "desktop:mobile-disconnected")]
    MobileDisconnected { code: String },
    #[serde(rename = "desktop:error")]
    DesktopError { message: String },
    #[serde(rename = "mobile:paired")]
    MobilePaired { code: String, success: bool },
    #[serde(rename = "mobile:link-sent")]
    LinkSent { success: bool },
    #[serde(rename = "mobile:error")]
    MobileError { message: String },
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::DesktopCode { .. } => "desktop:code",
            ServerEvent::DesktopLink { .. } => "desktop:link",
            ServerEvent::MobileConnected { .. } => "desktop:mobile-connected",
            ServerEvent::MobileDisconnected { .. } => "desktop:mobile-disconnected",
            ServerEvent::DesktopError { .. } => "desktop:error",
            ServerEvent::MobilePaired { .. } => "mobile:paired",
            ServerEvent::LinkSent { .. } => "mobile:link-sent",
            ServerEvent::MobileError { .. } => "mobile:error",
        }
    }
}

/// Events received from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Desktop asks for a code; `code` resumes a pending session.
    DesktopConnect { code: Option<String> },
    MobileValidate { code: String },
    MobileSubmitLink { link: String },
}

/// Why an incoming frame was not understood.
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("event {event} is missing field {field}")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

fn string_field(data: &Value, field: &str) -> Option<String> {
    data.get(field).and_then(Value::as_str).map(String::from)
}

impl ClientEvent {
    /// Parse one text frame. `data` may be omitted for `desktop:connect`.
    pub fn parse(frame: &str) -> Result<Self, EventParseError> {
        let Envelope { event, data } = serde_json::from_str(frame)?;
        match event.as_str() {
            "desktop:connect" => Ok(ClientEvent::DesktopConnect {
                code: string_field(&data, "code"),
            }),
            "mobile:validate" => string_field(&data, "code")
                .map(|code| ClientEvent::MobileValidate { code })
                .ok_or(EventParseError::MissingField {
                    event: "mobile:validate",
                    field: "code",
                }),
            "mobile:submit-link" => string_field(&data, "link")
                .map(|link| ClientEvent::MobileSubmitLink { link })
                .ok_or(EventParseError::MissingField {
                    event: "mobile:submit-link",
                    field: "link",
                }),
            _ => Err(EventParseError::UnknownEvent(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_event_envelope() {
        let event = ServerEvent::MobilePaired {
            code: "ABC123".into(),
            success: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "mobile:paired", "data": {"code": "ABC123", "success": true}})
        );
        assert_eq!(event.name(), "mobile:paired");

        let link = ServerEvent::DesktopLink {
            link: "https://example.com".into(),
        };
        assert_eq!(
            serde_json::to_value(&link).unwrap()["event"],
            json!(link.name())
        );
    }

    #[test]
    fn test_desktop_connect_without_data() {
        assert_eq!(
            ClientEvent::parse(r#"{"event":"desktop:connect"}"#).unwrap(),
            ClientEvent::DesktopConnect { code: None }
        );
        assert_eq!(
            ClientEvent::parse(r#"{"event":"desktop:connect","data":{"code":"ABC123"}}"#).unwrap(),
            ClientEvent::DesktopConnect {
                code: Some("ABC123".into())
            }
        );
    }

    #[test]
    fn test_mobile_events() {
        assert_eq!(
            ClientEvent::parse(r#"{"event":"mobile:validate","data":{"code":"ABC123"}}"#)
                .unwrap(),
            ClientEvent::MobileValidate {
                code: "ABC123".into()
            }
        );
        assert!(matches!(
            ClientEvent::parse(r#"{"event":"mobile:submit-link","data":{}}"#),
            Err(EventParseError::MissingField { field: "link", .. })
        ));
        assert!(matches!(
            ClientEvent::parse(r#"{"event":"mobile:submit-link","data":{"link":42}}"#),
            Err(EventParseError::MissingField { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(matches!(
            ClientEvent::parse(r#"{"event":"desktop:explode"}"#),
            Err(EventParseError::UnknownEvent(name)) if name == "desktop:explode"
        ));
        assert!(matches!(
            ClientEvent::parse("not json"),
            Err(EventParseError::Malformed(_))
        ));
    }
}
