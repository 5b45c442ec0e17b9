//! JSON-RPC 2.0 client for an external generator process.
//!
//! Each request spawns the configured command, writes one `generate` request
//! line to its stdin and reads stdout until the matching response arrives.
//! Notification lines (no id) are logged and skipped.

use super::generation::{GenerationRequest, GenerationResponse, GenerationService};
use crate::config::GenerationConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// JSON-RPC 2.0 version string
const JSONRPC_VERSION: &str = "2.0";

/// Method invoked on the generator
const GENERATE_METHOD: &str = "generate";

/// JSON-RPC Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new request with an ID (expects response)
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Get the result, or the generator's error message as a rejection
    pub fn into_result(self) -> GenerationResult<Value> {
        if let Some(error) = self.error {
            Err(GenerationError::Rejected(error.message))
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// JSON-RPC Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Classify one stdout line: `Ok(None)` for notifications and blank lines
fn parse_line(line: &str) -> GenerationResult<Option<JsonRpcResponse>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| GenerationError::Protocol(format!("invalid JSON line: {}", e)))?;
    if value.get("method").is_some() {
        tracing::debug!("Generator notification: {}", trimmed);
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| GenerationError::Protocol(e.to_string()))
}

/// Generation service backed by a spawned generator process
pub struct RpcGenerationService {
    command: String,
    args: Vec<String>,
    next_id: AtomicU64,
}

impl RpcGenerationService {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call(&self, request: &JsonRpcRequest) -> GenerationResult<JsonRpcResponse> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GenerationError::Unavailable(format!("{}: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GenerationError::Unavailable("generator stdin closed".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GenerationError::Unavailable("generator stdout closed".to_string()))?;

        let msg = serde_json::to_string(request)
            .map_err(|e| GenerationError::Protocol(e.to_string()))?;
        let io_err = |e: std::io::Error| GenerationError::Unavailable(e.to_string());
        stdin.write_all(msg.as_bytes()).await.map_err(io_err)?;
        stdin.write_all(b"\n").await.map_err(io_err)?;
        stdin.flush().await.map_err(io_err)?;
        drop(stdin);

        let mut lines = BufReader::new(stdout).lines();
        let response = loop {
            let Some(line) = lines.next_line().await.map_err(io_err)? else {
                break None;
            };
            match parse_line(&line)? {
                Some(response) if response.id == request.id => break Some(response),
                Some(response) => {
                    tracing::warn!("Ignoring response for unknown id {:?}", response.id);
                }
                None => {}
            }
        };

        let status = child.wait().await.map_err(io_err)?;
        response.ok_or_else(|| {
            GenerationError::Protocol(format!("generator exited ({}) without a response", status))
        })
    }
}

#[async_trait]
impl GenerationService for RpcGenerationService {
    async fn generate_artifact(
        &self,
        request: &GenerationRequest,
    ) -> GenerationResult<GenerationResponse> {
        let params =
            serde_json::to_value(request).map_err(|e| GenerationError::Protocol(e.to_string()))?;
        let rpc = JsonRpcRequest::new(self.next_request_id(), GENERATE_METHOD, Some(params));

        tracing::debug!("Calling generator {} for {}", self.command, request.kind);
        let result = self.call(&rpc).await?.into_result()?;

        serde_json::from_value(result).map_err(|e| GenerationError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactKind, Project, WebsiteType};

    fn request() -> GenerationRequest {
        let project = Project::new("Acme", "", WebsiteType::Landing);
        GenerationRequest::new(ArtifactKind::Sitemap, "landing page", &project)
    }

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest::new(1, "generate", Some(serde_json::json!({"key": "value"})));
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"method\":\"generate\""));
    }

    #[test]
    fn test_response_error_becomes_rejection() {
        let response = JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: Some(1),
            result: None,
            error: Some(JsonRpcError {
                code: -32000,
                message: "quota exceeded".to_string(),
                data: None,
            }),
        };
        assert!(response.is_error());
        assert_eq!(
            response.into_result(),
            Err(GenerationError::Rejected("quota exceeded".to_string()))
        );
    }

    #[test]
    fn test_parse_line_skips_notifications() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line(r#"{"jsonrpc":"2.0","method":"progress","params":{}}"#)
            .unwrap()
            .is_none());
        let response = parse_line(r#"{"jsonrpc":"2.0","id":3,"result":{}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(response.id, Some(3));
        assert!(matches!(parse_line("not json"), Err(GenerationError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let service = RpcGenerationService::new("sitewright-no-such-generator", vec![]);
        let err = service.generate_artifact(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_round_trip_through_shell_generator() {
        let script = r#"read line; echo '{"jsonrpc":"2.0","method":"progress"}'; echo '{"jsonrpc":"2.0","id":1,"result":{"artifact":{"pages":[]},"metadata":{"confidence":0.75}}}'"#;
        let service = RpcGenerationService::new("sh", vec!["-c".to_string(), script.to_string()]);

        let response = service.generate_artifact(&request()).await.unwrap();
        assert_eq!(response.metadata.confidence, 0.75);
        assert_eq!(response.artifact["pages"], serde_json::json!([]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generator_error_is_rejection() {
        let script = r#"read line; echo '{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"model overloaded"}}'"#;
        let service = RpcGenerationService::new("sh", vec!["-c".to_string(), script.to_string()]);

        let err = service.generate_artifact(&request()).await.unwrap_err();
        assert_eq!(err, GenerationError::Rejected("model overloaded".to_string()));
    }
}
