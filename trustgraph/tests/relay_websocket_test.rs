//! WebSocket transport against local in-process relays

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use trustgraph::{
    Event, EventKind, Filter, RelayError, RelayPool, RelayTransport, WebSocketTransport,
};

#[derive(Clone)]
enum Behaviour {
    /// Answer REQ with these stored events, then EOSE
    Serve(Vec<Event>),
    /// Answer REQ with CLOSED
    Reject(String),
    /// Accept the connection and never answer
    Silent,
}

async fn spawn_relay(behaviour: Behaviour) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let behaviour = behaviour.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    let Message::Text(text) = msg else { continue };
                    let frame: Value = serde_json::from_str(&text).unwrap();
                    match frame[0].as_str() {
                        Some("REQ") => {
                            let sub = frame[1].as_str().unwrap().to_string();
                            let replies = match &behaviour {
                                Behaviour::Serve(events) => {
                                    let mut replies = vec![
                                        json!(["NOTICE", "welcome"]).to_string(),
                                        "this is not json".to_string(),
                                    ];
                                    if let Some(first) = events.first() {
                                        replies.push(json!(["EVENT", "someone-else", first]).to_string());
                                    }
                                    for event in events {
                                        replies.push(json!(["EVENT", sub, event]).to_string());
                                    }
                                    replies.push(json!(["EOSE", sub]).to_string());
                                    replies
                                }
                                Behaviour::Reject(reason) => {
                                    vec![json!(["CLOSED", sub, reason]).to_string()]
                                }
                                Behaviour::Silent => Vec::new(),
                            };
                            for reply in replies {
                                if ws.send(Message::Text(reply)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some("CLOSE") => break,
                        _ => {}
                    }
                }
            });
        }
    });

    format!("ws://{addr}")
}

#[tokio::test]
async fn test_fetch_collects_until_eose() {
    let events = vec![
        follow_list(key(1), 10, &[key(2)]),
        follow_list(key(1), 20, &[key(3)]),
    ];
    let url = spawn_relay(Behaviour::Serve(events.clone())).await;

    let transport = WebSocketTransport::new();
    let fetched = transport
        .fetch(&url, &Filter::follow_lists([key(1)]))
        .await
        .unwrap();

    // Both stored events come back; deduplication is the pool's job.
    assert_eq!(fetched, events);
}

#[tokio::test]
async fn test_closed_subscription_is_an_error() {
    let url = spawn_relay(Behaviour::Reject("blocked: rate limited".into())).await;

    let result = WebSocketTransport::new()
        .fetch(&url, &Filter::metadata([key(1)]))
        .await;
    match result {
        Err(RelayError::Closed(reason)) => assert_eq!(reason, "blocked: rate limited"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_pool_over_websocket_relays() {
    let one = spawn_relay(Behaviour::Serve(vec![
        metadata(key(1), 10, "old"),
        follow_list(key(1), 5, &[key(2)]),
    ]))
    .await;
    let two = spawn_relay(Behaviour::Serve(vec![metadata(key(1), 30, "new")])).await;
    let silent = spawn_relay(Behaviour::Silent).await;
    let rejecting = spawn_relay(Behaviour::Reject("auth-required: nope".into())).await;

    let pool = RelayPool::new(
        vec![one, two, silent, rejecting],
        Arc::new(WebSocketTransport::new()),
    )
    .with_timeout(Duration::from_millis(500));

    let events = pool.query(&Filter::metadata([key(1)])).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Metadata);
    assert_eq!(events[0].created_at, 30);
    assert!(events[0].content.contains("new"));
}
