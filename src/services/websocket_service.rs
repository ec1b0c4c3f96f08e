use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{InputInboundMessage, KeyPressAck},
    services::binding_service,
    state::SharedState,
};

/// Handle the lifecycle of an input WebSocket connection.
///
/// Every `key_press` frame goes through the binding session and is answered with an ack.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!("input client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match InputInboundMessage::from_json_str(&text) {
                Ok(InputInboundMessage::KeyPress(request)) => {
                    let outcome =
                        binding_service::observe_key_press(&state, request.into()).await;
                    if send_json(&outbound_tx, &KeyPressAck { outcome }).is_err() {
                        info!("input connection closed while acknowledging, terminating");
                        break;
                    }
                }
                Ok(InputInboundMessage::Unknown) => {
                    debug!(payload = %text, "ignoring unknown input message");
                }
                Err(err) => {
                    warn!(error = %err, "failed to parse or validate input message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!("input client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, "websocket error");
                break;
            }
        }
    }

    info!("input client disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and queue it on the writer; errors only when the writer is gone.
fn send_json<T: serde::Serialize>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), mpsc::error::SendError<Message>> {
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize websocket message");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into()))
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
