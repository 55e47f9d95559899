//! JSON command protocol
//!
//! One request per line:
//!
//! ```json
//! {"id": 1, "command": "searchNumber", "params": {"value": "100", "type": "I32"}}
//! ```
//!
//! answered by `{"id": 1, "result": 42}`, or `{"id": 1, "error": "..."}`
//! when the request itself could not be decoded.

use crate::core::types::{ProcessEntry, ProcessId, ResultEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attach by executable name substring or by pid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachTarget {
    Name { name: String },
    Pid { pid: ProcessId },
}

/// A decoded command with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "camelCase")]
pub enum Command {
    Attach(AttachTarget),
    Detach,
    IsAttached,
    GetProcessInfo,
    ListProcesses,
    SearchNumber {
        value: String,
        #[serde(rename = "type")]
        value_type: String,
        #[serde(rename = "startAddr", default)]
        start_addr: Option<String>,
        #[serde(rename = "endAddr", default)]
        end_addr: Option<String>,
    },
    SearchNearby {
        value: String,
        #[serde(rename = "type")]
        value_type: String,
        offset: String,
    },
    EditAll {
        value: String,
        #[serde(rename = "type")]
        value_type: String,
    },
    SetValue {
        address: String,
        value: String,
        #[serde(rename = "type")]
        value_type: String,
    },
    ReadValue {
        address: String,
        #[serde(rename = "type")]
        value_type: String,
    },
    GetResults {
        count: i64,
    },
    GetResultsCount,
    ClearResults,
}

impl Command {
    /// Protocol name of the command, as sent in `"command"`
    pub fn name(&self) -> &'static str {
        match self {
            Command::Attach(_) => "attach",
            Command::Detach => "detach",
            Command::IsAttached => "isAttached",
            Command::GetProcessInfo => "getProcessInfo",
            Command::ListProcesses => "listProcesses",
            Command::SearchNumber { .. } => "searchNumber",
            Command::SearchNearby { .. } => "searchNearby",
            Command::EditAll { .. } => "editAll",
            Command::SetValue { .. } => "setValue",
            Command::ReadValue { .. } => "readValue",
            Command::GetResults { .. } => "getResults",
            Command::GetResultsCount => "getResultsCount",
            Command::ClearResults => "clearResults",
        }
    }
}

/// What a command returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Bool(bool),
    Count(usize),
    Text(String),
    Results(Vec<ResultEntry>),
    Processes(Vec<ProcessEntry>),
    Unit,
}

/// Raw request line before the command is decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: impl Into<Value>, command: &Command) -> serde_json::Result<Self> {
        let mut encoded = serde_json::to_value(command)?;
        let params = encoded.as_object_mut().and_then(|o| o.remove("params"));
        Ok(Request {
            id: id.into(),
            command: command.name().to_string(),
            params,
        })
    }

    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Decodes the command and its parameters.
    ///
    /// Missing, null and empty-object params are all accepted for commands
    /// that take none.
    pub fn command(&self) -> serde_json::Result<Command> {
        let mut envelope = Map::new();
        envelope.insert("command".to_string(), Value::String(self.command.clone()));
        match &self.params {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) if params.is_empty() => {}
            Some(params) => {
                envelope.insert("params".to_string(), params.clone());
            }
        }
        serde_json::from_value(Value::Object(envelope))
    }
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(id: Value, output: CommandOutput) -> Self {
        Response {
            id,
            result: Some(output),
            error: None,
        }
    }

    pub fn failure(id: Value, message: impl Into<String>) -> Self {
        Response {
            id,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
