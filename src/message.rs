//! Messages exchanged between a dashboard and its host.
//!
//! Both directions are closed enums encoded as JSON objects of the form
//! `{"command": "...", "data": ...}`. Requests travel inside a
//! [`RequestEnvelope`] that carries a dashboard-assigned id; pushes travel
//! inside a [`PushEnvelope`] that carries a host-assigned revision.
//!
//! ```text
//! → {"id":3,"message":{"command":"updateSetting","data":{"name":"open_on_start","value":true}}}
//! ← {"revision":7,"request":3,"message":{"command":"settings","data":{...}}}
//! ← {"revision":8,"request":3,"message":{"command":"pages","data":[...]}}
//! ```
//!
//! Revisions only ever grow, so a dashboard can drop a push that arrives after
//! a newer one of the same kind (see [`crate::store::ViewStateStore::apply`]).
//! Unknown commands are rejected with [`MessageError::UnknownCommand`].

use crate::types::{CustomScript, Page, Settings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("message has no command")]
    MissingCommand,
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dashboard → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum Request {
    /// Ask for a settings push followed by a pages push.
    GetData,
    OpenFile(PathBuf),
    CreateContent,
    /// Persist one setting; the host answers with fresh settings and pages.
    UpdateSetting { name: String, value: Value },
    DeleteFile(PathBuf),
    RunCustomScript { script: CustomScript, path: PathBuf },
    /// Write a stock `frontdesk.toml` when the workspace has none.
    InitializeProject,
    /// The dashboard reset its session and wants everything again.
    Reload,
}

impl Request {
    pub const COMMANDS: &'static [&'static str] = &[
        "getData",
        "openFile",
        "createContent",
        "updateSetting",
        "deleteFile",
        "runCustomScript",
        "initializeProject",
        "reload",
    ];

    pub fn command(&self) -> &'static str {
        match self {
            Request::GetData => "getData",
            Request::OpenFile(_) => "openFile",
            Request::CreateContent => "createContent",
            Request::UpdateSetting { .. } => "updateSetting",
            Request::DeleteFile(_) => "deleteFile",
            Request::RunCustomScript { .. } => "runCustomScript",
            Request::InitializeProject => "initializeProject",
            Request::Reload => "reload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Monotonic per dashboard session.
    pub id: u64,
    pub message: Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Host → dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum Push {
    Settings(Box<Settings>),
    Pages(Vec<Page>),
    Notification(Notification),
}

impl Push {
    pub const COMMANDS: &'static [&'static str] = &["settings", "pages", "notification"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Monotonic per host.
    pub revision: u64,
    /// Id of the request this push answers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<u64>,
    pub message: Push,
}

/// Decode one request line, rejecting unknown commands by name.
pub fn decode_request(line: &str) -> Result<RequestEnvelope, MessageError> {
    let value: Value = serde_json::from_str(line)?;
    check_command(&value, Request::COMMANDS)?;
    Ok(serde_json::from_value(value)?)
}

/// Decode one push line, rejecting unknown commands by name.
pub fn decode_push(line: &str) -> Result<PushEnvelope, MessageError> {
    let value: Value = serde_json::from_str(line)?;
    check_command(&value, Push::COMMANDS)?;
    Ok(serde_json::from_value(value)?)
}

fn check_command(envelope: &Value, known: &[&str]) -> Result<(), MessageError> {
    let command = envelope
        .get("message")
        .and_then(|m| m.get("command"))
        .and_then(Value::as_str)
        .ok_or(MessageError::MissingCommand)?;
    if known.contains(&command) {
        Ok(())
    } else {
        Err(MessageError::UnknownCommand(command.to_string()))
    }
}

/// Encode a message as a single JSON line (no trailing newline).
pub fn encode<T: Serialize>(message: &T) -> Result<String, MessageError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_request_has_no_data() {
        let line = encode(&RequestEnvelope {
            id: 1,
            message: Request::GetData,
        })
        .unwrap();
        assert_eq!(line, r#"{"id":1,"message":{"command":"getData"}}"#);
    }

    #[test]
    fn decodes_update_setting() {
        let env = decode_request(
            r#"{"id":4,"message":{"command":"updateSetting","data":{"name":"open_on_start","value":true}}}"#,
        )
        .unwrap();
        assert_eq!(env.id, 4);
        assert_eq!(
            env.message,
            Request::UpdateSetting {
                name: "open_on_start".to_string(),
                value: json!(true),
            }
        );
    }

    #[test]
    fn decodes_path_payload() {
        let env =
            decode_request(r#"{"id":2,"message":{"command":"openFile","data":"/w/a.md"}}"#)
                .unwrap();
        assert_eq!(env.message, Request::OpenFile(PathBuf::from("/w/a.md")));
    }

    #[test]
    fn unknown_command_is_rejected_by_name() {
        let result = decode_request(r#"{"id":1,"message":{"command":"formatDisk"}}"#);
        assert!(matches!(result, Err(MessageError::UnknownCommand(c)) if c == "formatDisk"));
    }

    #[test]
    fn missing_command_is_rejected() {
        let result = decode_request(r#"{"id":1,"message":{"data":1}}"#);
        assert!(matches!(result, Err(MessageError::MissingCommand)));
    }

    #[test]
    fn known_command_with_bad_payload_is_json_error() {
        let result = decode_request(r#"{"id":1,"message":{"command":"deleteFile"}}"#);
        assert!(matches!(result, Err(MessageError::Json(_))));
    }

    #[test]
    fn every_request_command_is_listed() {
        let samples = [
            Request::GetData,
            Request::OpenFile(PathBuf::new()),
            Request::CreateContent,
            Request::UpdateSetting {
                name: String::new(),
                value: Value::Null,
            },
            Request::DeleteFile(PathBuf::new()),
            Request::RunCustomScript {
                script: CustomScript {
                    title: "t".into(),
                    script: "s".into(),
                    command: None,
                    script_type: None,
                    bulk: false,
                },
                path: PathBuf::new(),
            },
            Request::InitializeProject,
            Request::Reload,
        ];
        for request in samples {
            let value = serde_json::to_value(&request).unwrap();
            assert_eq!(value["command"], request.command());
            assert!(Request::COMMANDS.contains(&request.command()));
        }
    }

    #[test]
    fn push_notification_decodes() {
        let env = decode_push(
            r#"{"revision":9,"message":{"command":"notification","data":{"level":"error","message":"boom"}}}"#,
        )
        .unwrap();
        assert_eq!(env.revision, 9);
        assert_eq!(env.request, None);
        assert_eq!(env.message, Push::Notification(Notification::error("boom")));
    }

    #[test]
    fn unknown_push_is_rejected() {
        let result = decode_push(r#"{"revision":1,"message":{"command":"media","data":[]}}"#);
        assert!(matches!(result, Err(MessageError::UnknownCommand(_))));
    }
}
