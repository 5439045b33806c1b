//! A server with the endpoints the integration tests talk to.
use std::{
    borrow::Cow,
    collections::BTreeMap,
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query,
    },
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post, IntoMakeService},
    Json, Router, Server,
};
use hyper::server::conn::AddrIncoming;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{Echo, Question, QuestionQuery};

pub const CLOSE_CODE: u16 = 4000;

/// The only subprotocol `/ws/protocol` accepts.
pub const PROTOCOL: &str = "questions.v2";

type Params = BTreeMap<String, String>;

pub fn dev_server(port: u16) -> axum::Server<AddrIncoming, IntoMakeService<Router>> {
    let app = Router::new()
        .route(
            "/api/questions",
            get(question).post(echo).put(echo).delete(echo),
        )
        .route("/api/status/:code", any(status))
        .route("/api/errors", get(errors))
        .route("/api/text", get(text))
        .route("/api/empty", post(empty))
        .route("/ws", get(websocket))
        .route("/ws/protocol", get(protocol_socket))
        .layer(CorsLayer::permissive());

    Server::bind(&SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port))
        .serve(app.into_make_service())
}

/// Run `client` against a dev server on a free port, then shut the server
/// down.
pub async fn end_to_end_test<Client, Block>(client: Client)
where
    Client: FnOnce(u16) -> Block,
    Block: Future<Output = ()>,
{
    let server = dev_server(0);
    let port = server.local_addr().port();
    server.with_graceful_shutdown(client(port)).await.unwrap();
}

async fn question(Query(query): Query<QuestionQuery>) -> impl IntoResponse {
    (
        [("x-total-count", "1")],
        Json(Question {
            id: query.id,
            text: format!("Question {}", query.id),
        }),
    )
}

async fn echo(
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Params>,
    body: String,
) -> Json<Echo> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    Json(Echo {
        method: method.to_string(),
        content_type,
        body,
        params,
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(json!({ "status": code }))).into_response()
}

async fn errors() -> Json<serde_json::Value> {
    Json(json!({ "errors": ["Question not found", "Answer not found"] }))
}

async fn text() -> &'static str {
    "plain text"
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Greets with `{"connected": <query params>}`, then echoes messages.
///
/// The text messages `drop` and `close` end the connection, without and
/// with a close frame.
async fn websocket(ws: WebSocketUpgrade, Query(params): Query<Params>) -> Response {
    ws.on_upgrade(|socket| async move {
        if let Err(e) = echo_socket(socket, params).await {
            tracing::error!("Error on WebSocket: {e}");
        }
    })
}

/// Greets with `{"protocol": <negotiated subprotocol>}`, then hangs up.
async fn protocol_socket(ws: WebSocketUpgrade) -> Response {
    ws.protocols([PROTOCOL]).on_upgrade(|mut socket| async move {
        let protocol = socket
            .protocol()
            .and_then(|protocol| protocol.to_str().ok())
            .map(str::to_owned);
        let greeting = json!({ "protocol": protocol }).to_string();

        if let Err(e) = socket.send(Message::Text(greeting)).await {
            tracing::error!("Error on WebSocket: {e}");
        }
    })
}

async fn echo_socket(mut socket: WebSocket, params: Params) -> Result<(), axum::Error> {
    socket
        .send(Message::Text(json!({ "connected": params }).to_string()))
        .await?;

    while let Some(msg) = socket.recv().await {
        match msg? {
            Message::Text(text) if text == "drop" => return Ok(()),
            Message::Text(text) if text == "close" => {
                socket
                    .send(Message::Close(Some(CloseFrame {
                        code: CLOSE_CODE,
                        reason: Cow::from("bye"),
                    })))
                    .await?;
                return Ok(());
            }
            Message::Text(text) => socket.send(Message::Text(text)).await?,
            Message::Binary(bytes) => socket.send(Message::Binary(bytes)).await?,
            Message::Close(_) => return Ok(()),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    Ok(())
}
