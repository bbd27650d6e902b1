//! The actix-web wiring for the JSON-RPC front end: one `json_rpc`-style
//! handler bound to a single POST route.

use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, HttpResponse};

use super::{dispatch, AppState, Dispatched, RpcRequest};
use crate::context::CancellationToken;

/// Single entry point: parse the body as a JSON-RPC envelope, dispatch
/// the methods this proxy understands locally, and forward anything else
/// upstream with its response relayed verbatim.
pub async fn json_rpc(
    state: web::Data<AppState>,
    ctx: web::Data<CancellationToken>,
    body: web::Bytes,
) -> HttpResponse {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return HttpResponse::Ok().json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": "Parse error" }
            }))
        }
    };

    match dispatch(state.get_ref(), request).await {
        Dispatched::Local(response) => HttpResponse::Ok().json(response),
        Dispatched::Proxy => match state.upstream.forward(ctx.get_ref(), body.to_vec()).await {
            Ok(forwarded) => {
                let mut builder = HttpResponse::build(
                    actix_web::http::StatusCode::from_u16(forwarded.status)
                        .unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY),
                );
                if let Some(content_type) = forwarded.content_type {
                    if let (Ok(name), Ok(value)) = (
                        HeaderName::try_from("content-type"),
                        HeaderValue::try_from(content_type),
                    ) {
                        builder.insert_header((name, value));
                    }
                }
                builder.body(forwarded.body)
            }
            Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32000, "message": format!("upstream error: {e}") }
            })),
        },
    }
}
