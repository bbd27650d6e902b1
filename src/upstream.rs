//! The upstream client (component A): one-shot JSON-RPC calls to the
//! execution node, plus the raw pass-through used by the front end for
//! methods it doesn't otherwise understand.

use std::time::Duration;

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::CancellationToken;
use crate::error::UpstreamError;

const JSON_RPC_VERSION: &str = "2.0";

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcErrorObj>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObj {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

/// What happened when `send_raw` tried to hand a transaction to the
/// upstream node. The three-way split is load-bearing: the gas monitor
/// uses it to decide whether a broadcast failure means the transaction is
/// permanently bad ([`BroadcastOutcome::Rejected`], -> FAILED) versus a
/// transient network issue ([`BroadcastOutcome::Transient`], leave STORED
/// for retry).
#[derive(Debug)]
pub enum BroadcastOutcome {
    /// Upstream accepted the transaction.
    Accepted,
    /// Upstream returned a JSON-RPC `error` object; the chain rejected it
    /// (e.g. nonce too low). The message is preserved verbatim.
    Rejected(String),
    /// Transport, HTTP, or decoding failure. Worth retrying.
    Transient(UpstreamError),
}

/// A response forwarded verbatim for any JSON-RPC method this proxy
/// doesn't special-case.
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// HTTP JSON-RPC client for the upstream execution node.
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Transport)?;
        Ok(Self { http, url })
    }

    /// `eth_gasPrice`: the network's current suggested per-gas rate, in
    /// wei. Fails on transport error, non-200 status, undecodable body, a
    /// present `error` field, or a `result` that isn't a valid hex
    /// integer.
    pub async fn get_gas_price(&self, ctx: &CancellationToken) -> Result<u128, UpstreamError> {
        trace!("get_gas_price");
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: "eth_gasPrice",
            params: Vec::<Value>::new(),
            id: 1,
        };

        let body: JsonRpcResponse<String> = self.call(ctx, &request).await?;
        if let Some(err) = body.error {
            return Err(UpstreamError::Rpc(err.message));
        }
        let hex = body
            .result
            .ok_or_else(|| UpstreamError::Decode("missing result".to_string()))?;
        let digits = hex
            .strip_prefix("0x")
            .ok_or_else(|| UpstreamError::Decode(format!("not a hex integer: {hex}")))?;
        u128::from_str_radix(digits, 16)
            .map_err(|e| UpstreamError::Decode(format!("invalid hex integer {hex}: {e}")))
    }

    /// `eth_sendRawTransaction`: broadcast an already-signed, hex-encoded
    /// transaction.
    pub async fn send_raw(&self, ctx: &CancellationToken, raw_hex: &str) -> BroadcastOutcome {
        trace!("send_raw");
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: "eth_sendRawTransaction",
            params: [raw_hex],
            id: 1,
        };

        match self.call::<_, Value>(ctx, &request).await {
            Ok(body) => match body.error {
                Some(err) => BroadcastOutcome::Rejected(err.message),
                None => BroadcastOutcome::Accepted,
            },
            Err(e) => BroadcastOutcome::Transient(e),
        }
    }

    /// Forward an arbitrary JSON-RPC request body to the upstream node
    /// unmodified, returning its status, content type, and body
    /// unmodified so the front end can relay them verbatim.
    pub async fn forward(
        &self,
        ctx: &CancellationToken,
        body: Vec<u8>,
    ) -> Result<ForwardedResponse, UpstreamError> {
        let send = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send();

        let response = tokio::select! {
            biased;
            _ = ctx.canceled() => return Err(UpstreamError::Canceled),
            result = send => result?,
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }

    async fn call<P: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        ctx: &CancellationToken,
        request: &JsonRpcRequest<'_, P>,
    ) -> Result<JsonRpcResponse<T>, UpstreamError> {
        let send = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send();

        let response = tokio::select! {
            biased;
            _ = ctx.canceled() => return Err(UpstreamError::Canceled),
            result = send => result?,
        };

        if !response.status().is_success() {
            return Err(UpstreamError::Decode(format!(
                "upstream returned HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> UpstreamClient {
        UpstreamClient::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn get_gas_price_parses_hex_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x3b9aca00"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let price = client
            .get_gas_price(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(price, 0x3b9aca00);
    }

    #[tokio::test]
    async fn get_gas_price_surfaces_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "boom" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_gas_price(&CancellationToken::new()).await;
        assert!(matches!(err, Err(UpstreamError::Rpc(msg)) if msg == "boom"));
    }

    #[tokio::test]
    async fn get_gas_price_rejects_non_hex_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "not-hex"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_gas_price(&CancellationToken::new()).await;
        assert!(matches!(err, Err(UpstreamError::Decode(_))));
    }

    #[tokio::test]
    async fn send_raw_accepted_on_empty_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0xabc"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.send_raw(&CancellationToken::new(), "0xdead").await;
        assert!(matches!(outcome, BroadcastOutcome::Accepted));
    }

    #[tokio::test]
    async fn send_raw_rejected_preserves_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "nonce too low" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.send_raw(&CancellationToken::new(), "0xdead").await;
        match outcome {
            BroadcastOutcome::Rejected(msg) => assert_eq!(msg, "nonce too low"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_raw_transient_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.send_raw(&CancellationToken::new(), "0xdead").await;
        assert!(matches!(outcome, BroadcastOutcome::Transient(_)));
    }

    #[tokio::test]
    async fn canceled_token_aborts_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ctx = CancellationToken::new();
        ctx.cancel();
        let err = client.get_gas_price(&ctx).await;
        assert!(matches!(err, Err(UpstreamError::Canceled)));
    }
}
