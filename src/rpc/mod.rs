//! The JSON-RPC front end (component I): decodes inbound requests,
//! dispatches the two methods the core understands, and proxies
//! everything else upstream verbatim.

pub mod server;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decoder::TransactionDecoder;
use crate::error::CoreError;
use crate::store::Store;
use crate::upstream::UpstreamClient;

/// Shared application state handed to every request handler.
pub struct AppState {
    pub store: Arc<Store>,
    pub upstream: Arc<UpstreamClient>,
    pub decoder: Arc<dyn TransactionDecoder>,
}

#[derive(Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

#[derive(Serialize)]
struct RpcErrorObj {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcErrorObj>,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcErrorObj {
                code,
                message: message.into(),
            }),
        }
    }
}

/// What the dispatcher decided to do with one inbound request.
enum Dispatched {
    /// Handled locally; serialize and return as a JSON-RPC envelope.
    Local(RpcResponse),
    /// Not a method this proxy understands; forward the original body
    /// upstream and relay its response verbatim.
    Proxy,
}

const RAW_TX_PARAM_ERR: &str = "params[0] must match ^0x[0-9a-fA-F]+$";
const CANCEL_HASH_PARAM_ERR: &str = "params[0] must match ^0x[0-9a-fA-F]{64}$";

fn is_hex_bytes(s: &str) -> bool {
    s.len() > 2 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_tx_hash(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn core_error_to_rpc(id: Value, err: CoreError) -> RpcResponse {
    match err {
        CoreError::Duplicate(status) => {
            RpcResponse::err(id, -32000, format!("already {status}"))
        }
        CoreError::NotFound => RpcResponse::err(id, -32000, "transaction not found"),
        CoreError::InvalidTransition { from, to } => RpcResponse::err(
            id,
            -32000,
            format!("invalid status transition from {from} to {to}"),
        ),
        CoreError::Unprocessable => {
            RpcResponse::err(id, -32602, "could not recover sender")
        }
    }
}

async fn dispatch(state: &AppState, request: RpcRequest) -> Dispatched {
    let id = request.id.clone().unwrap_or(Value::Null);

    if request.jsonrpc.as_deref() != Some("2.0") {
        return Dispatched::Local(RpcResponse::err(
            id,
            -32600,
            "Expected json_rpc set to '2.0'",
        ));
    }

    let method = match &request.method {
        Some(m) => m.as_str(),
        None => return Dispatched::Local(RpcResponse::err(id, -32600, "missing method")),
    };

    match method {
        "eth_sendRawTransaction" => Dispatched::Local(handle_send_raw(state, id, &request).await),
        "cancel_transaction" => Dispatched::Local(handle_cancel(state, id, &request).await),
        _ => Dispatched::Proxy,
    }
}

fn first_param_str(request: &RpcRequest) -> Option<&str> {
    request.params.as_array()?.first()?.as_str()
}

async fn handle_send_raw(state: &AppState, id: Value, request: &RpcRequest) -> RpcResponse {
    let raw_hex = match first_param_str(request) {
        Some(s) if is_hex_bytes(s) => s,
        _ => return RpcResponse::err(id, -32602, RAW_TX_PARAM_ERR),
    };

    let tx = match state.decoder.decode(raw_hex) {
        Ok(tx) => tx,
        Err(e) => return core_error_to_rpc(id, e),
    };

    match state.store.ingest(tx, raw_hex.to_string()).await {
        Ok(hash) => RpcResponse::ok(id, Value::String(hash)),
        Err(e) => core_error_to_rpc(id, e),
    }
}

async fn handle_cancel(state: &AppState, id: Value, request: &RpcRequest) -> RpcResponse {
    let hash = match first_param_str(request) {
        Some(s) if is_tx_hash(s) => s,
        _ => return RpcResponse::err(id, -32602, CANCEL_HASH_PARAM_ERR),
    };

    match state.store.cancel(hash).await {
        Ok(()) => RpcResponse::ok(id, Value::String("Transaction canceled".to_string())),
        Err(e) => core_error_to_rpc(id, e),
    }
}
