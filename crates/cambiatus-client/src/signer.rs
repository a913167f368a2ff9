//! JSON-RPC client for the external transaction signer.
//!
//! The signer owns the member's keys. It speaks newline-delimited JSON-RPC
//! 2.0 over a Unix domain socket (one request per line, one response per
//! line) and exposes two methods:
//!
//! - `push_actions`: sign and push actions; the result carries
//!   `transaction_id`, a failure carries the chain error in `error.data`.
//! - `authenticate`: prompt the member to unlock their key; the result is
//!   `true` once unlocked.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::{debug, error};

use cambiatus_claims::VerificationAction;
use cambiatus_types::{Account, ChainError};

/// Errors talking to the signer.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// Failed to connect to the signer socket.
    #[error("Failed to connect to signer at '{path}': {reason}")]
    ConnectionFailed { path: String, reason: String },

    /// Failed to serialize the request.
    #[error("Failed to serialize RPC request: {0}")]
    SerializationFailed(String),

    /// Failed to write to the socket.
    #[error("Failed to write to signer socket: {0}")]
    WriteFailed(String),

    /// Failed to read from the socket.
    #[error("Failed to read from signer socket: {0}")]
    ReadFailed(String),

    /// The signer closed the connection unexpectedly.
    #[error("Signer disconnected unexpectedly (EOF)")]
    Disconnected,

    /// Failed to parse the signer's response as JSON-RPC.
    #[error("Failed to parse signer response: {reason} (raw: {raw})")]
    ParseFailed { reason: String, raw: String },

    /// The signer answered with an error object.
    #[error("{0}")]
    Rpc(ChainError),
}

impl SignerError {
    /// The chain error to report for a failed push.
    pub fn into_chain_error(self) -> ChainError {
        match self {
            Self::Rpc(err) => err,
            other => ChainError::message(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl RpcError {
    /// Structured chain error from `data` when present, else the message.
    fn into_chain_error(self) -> ChainError {
        self.data
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_else(|| ChainError::message(self.message))
    }
}

#[derive(Deserialize)]
struct PushResult {
    transaction_id: String,
}

/// Connection settings for the signer.
#[derive(Debug)]
pub struct SignerBridge {
    socket_path: PathBuf,
    next_id: AtomicU64,
}

impl SignerBridge {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sign and push one action. Returns the transaction id.
    pub async fn push_action(&self, action: &VerificationAction) -> Result<String, SignerError> {
        let result = self
            .call("push_actions", json!({ "actions": [action] }))
            .await?;
        let pushed: PushResult =
            serde_json::from_value(result.clone()).map_err(|e| SignerError::ParseFailed {
                reason: e.to_string(),
                raw: result.to_string(),
            })?;
        Ok(pushed.transaction_id)
    }

    /// Ask the member to unlock their key. `false` when they declined.
    pub async fn authenticate(&self, account: &Account) -> Result<bool, SignerError> {
        let result = self
            .call("authenticate", json!({ "account": account }))
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    /// Send a single JSON-RPC request and return its `result`.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, SignerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let path = self.socket_path.display().to_string();

        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            error!("Failed to connect to signer socket at {}: {}", path, e);
            SignerError::ConnectionFailed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!("Connected to signer socket at {}", path);

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // Serialize the request to a single line of JSON, terminated by newline.
        let mut request_json = serde_json::to_string(&request)
            .map_err(|e| SignerError::SerializationFailed(e.to_string()))?;
        request_json.push('\n');

        writer
            .write_all(request_json.as_bytes())
            .await
            .map_err(|e| {
                error!("Failed to write request to signer: {}", e);
                SignerError::WriteFailed(e.to_string())
            })?;
        writer
            .flush()
            .await
            .map_err(|e| SignerError::WriteFailed(e.to_string()))?;

        debug!(method, id, "Sent RPC request to signer");

        let mut response_line = String::new();
        let bytes_read = reader.read_line(&mut response_line).await.map_err(|e| {
            error!("Failed to read response from signer: {}", e);
            SignerError::ReadFailed(e.to_string())
        })?;

        if bytes_read == 0 {
            return Err(SignerError::Disconnected);
        }

        parse_response(&response_line)
    }
}

fn parse_response(line: &str) -> Result<serde_json::Value, SignerError> {
    let response: RpcResponse =
        serde_json::from_str(line).map_err(|e| SignerError::ParseFailed {
            reason: e.to_string(),
            raw: line.to_string(),
        })?;
    if let Some(err) = response.error {
        return Err(SignerError::Rpc(err.into_chain_error()));
    }
    response.result.ok_or_else(|| SignerError::ParseFailed {
        reason: "response has neither result nor error".to_string(),
        raw: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambiatus_claims::Verifier;
    use cambiatus_claims::Credentials;
    use cambiatus_types::ClaimId;
    use tokio::net::UnixListener;

    #[test]
    fn test_error_with_chain_data() {
        let line = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"push failed","data":{"code":3050003,"name":"eosio_assert_message_exception","message":"assertion failure","details":["assertion failure with message: already voted"]}}}"#;
        let Err(SignerError::Rpc(err)) = parse_response(line) else {
            unreachable!("expected rpc error");
        };
        assert_eq!(err.code, Some(3050003));
        assert_eq!(err.details.len(), 1);
    }

    #[test]
    fn test_error_without_data_keeps_message() {
        let line = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"Key unlock failed"}}"#;
        let err = parse_response(line).expect_err("error").into_chain_error();
        assert_eq!(err, ChainError::message("Key unlock failed"));
    }

    #[test]
    fn test_transport_failure_becomes_chain_message() {
        let err = SignerError::Disconnected.into_chain_error();
        assert_eq!(err.message, "Signer disconnected unexpectedly (EOF)");
        assert_eq!(err.code, None);
    }

    #[tokio::test]
    async fn test_push_action_round_trip_over_socket() {
        let dir = std::env::temp_dir().join(format!("cambiatus-signer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("signer.sock");
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).expect("bind");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            reader.read_line(&mut line).await.expect("read");
            let request: serde_json::Value = serde_json::from_str(&line).expect("json");
            let reply = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": { "transaction_id": "0xT1" },
            });
            writer
                .write_all(format!("{reply}\n").as_bytes())
                .await
                .expect("write");
            request
        });

        let verifier = Verifier {
            account: "verifier1".parse().expect("account"),
            contract: "cambiatus.cm".parse().expect("account"),
            credentials: Credentials::Cached,
        };
        let action = VerificationAction::verify_claim(&verifier, ClaimId(42), true);
        let bridge = SignerBridge::new(&path);
        let tx = bridge.push_action(&action).await.expect("push");
        assert_eq!(tx, "0xT1");

        let request = server.await.expect("server");
        assert_eq!(request["method"], "push_actions");
        assert_eq!(request["params"]["actions"][0]["name"], "verifyclaim");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_socket_is_connection_error() {
        let bridge = SignerBridge::new("/nonexistent/cambiatus/signer.sock");
        let account: Account = "verifier1".parse().expect("account");
        let err = bridge.authenticate(&account).await.expect_err("no socket");
        assert!(matches!(err, SignerError::ConnectionFailed { .. }));
    }
}
