//! WebSocket transport against an in-process REPL server.

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{
        Path, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use remote_repl_core::{ApiToken, Instruction, InstructionId, MachineName, RequestId};
use remote_repl_transport::{
    ClientFrame, ServerEvent, Transport, TransportError, WebSocketTransport, repl_url,
};
use serde_json::{Value, json};
use url::Url;

const TOKEN: &str = "test.token";

async fn repl_handler(
    Path(machine): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let expected = format!("Bearer {TOKEN}");
    let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if bearer != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| serve_repl(socket, machine))
}

/// Echo server: acknowledges each exec, echoes the code as output and
/// finishes with a fixed result.
async fn serve_repl(socket: WebSocket, machine: String) {
    let (mut sender, mut receiver) = socket.split();

    let connected = json!({ "type": "connected", "machine_name": machine });
    if sender
        .send(Message::Text(connected.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: Value = serde_json::from_str(text.as_str()).expect("client frame is json");
        let request_id = frame["request_id"].as_u64().expect("request id");
        let code = frame["instruction"]["code"].as_str().unwrap_or_default();
        let seq = request_id + 100;

        let replies = [
            json!({ "type": "ping_unknown" }),
            json!({ "type": "exec_received", "request_id": request_id, "seq": seq }),
            json!({
                "type": "output",
                "instruction_id": seq,
                "chunk": { "stream": "stdout", "data": code, "seq": 0 }
            }),
            json!({
                "type": "result",
                "instruction_id": seq,
                "result": { "value": "None", "runtime_ms": 1 }
            }),
        ];
        for reply in replies {
            if sender
                .send(Message::Text(reply.to_string().into()))
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new().route("/v1/machine/{machine}/repl", get(repl_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn endpoint(addr: SocketAddr, machine: &str) -> Url {
    let base = Url::parse(&format!("http://{addr}")).expect("base url");
    repl_url(&base, &MachineName::from(machine)).expect("repl url")
}

#[tokio::test]
async fn exec_round_trip_over_websocket() {
    let addr = spawn_server().await;
    let mut transport = WebSocketTransport::connect(&endpoint(addr, "box-7"), &ApiToken::new(TOKEN))
        .await
        .expect("connect");

    assert_eq!(
        transport.recv().await.expect("connected"),
        ServerEvent::Connected {
            machine_name: MachineName::from("box-7")
        }
    );

    transport
        .send(&ClientFrame::exec(Instruction::new("print(2)"), RequestId(4)))
        .await
        .expect("send exec");

    assert_eq!(transport.recv().await.expect("unknown").kind(), "ping_unknown");
    assert_eq!(
        transport.recv().await.expect("ack"),
        ServerEvent::ExecReceived {
            request_id: RequestId(4),
            seq: InstructionId(104)
        }
    );
    match transport.recv().await.expect("output") {
        ServerEvent::Output {
            instruction_id,
            chunk,
        } => {
            assert_eq!(instruction_id, InstructionId(104));
            assert_eq!(chunk.data(), "print(2)");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(transport.recv().await.expect("result").kind(), "result");

    transport.close().await.expect("close");
    assert!(!transport.is_open());
    assert!(matches!(transport.recv().await, Err(TransportError::Closed)));
    assert!(matches!(
        transport
            .send(&ClientFrame::exec(Instruction::new("x"), RequestId(5)))
            .await,
        Err(TransportError::Closed)
    ));
}

#[tokio::test]
async fn handshake_requires_bearer_token() {
    let addr = spawn_server().await;
    let result = WebSocketTransport::connect(&endpoint(addr, "new"), &ApiToken::new("wrong")).await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}

#[tokio::test]
async fn tls_handshake_failure_is_an_error() {
    // Plain TCP peer that hangs up before any TLS bytes are exchanged.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let base = Url::parse(&format!("https://{addr}")).expect("base url");
    let url = repl_url(&base, &MachineName::new_machine()).expect("repl url");
    assert_eq!(url.scheme(), "wss");

    let result = WebSocketTransport::connect(&url, &ApiToken::new(TOKEN)).await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}
