//! WebSocket push channel.
//!
//! Each connection gets one subscriber id and joins the occupancy list topic
//! on connect. Client frames manage its other subscriptions; every
//! `PushMessage` routed to it is sent back as a JSON text frame. Closing the
//! socket drops all of its subscriptions.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use beachline_core::{CoreError, PushMessage, SearchParams, SubscriberHandle, SubscriberId, Topic};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::alternatives::AlternativesRequest;
use crate::error::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    SubscribeStation { station_id: String },
    #[serde(rename_all = "camelCase")]
    UnsubscribeStation { station_id: String },
    SubscribeAlternatives { search: AlternativesRequest },
    UnsubscribeAlternatives { search: AlternativesRequest },
}

pub async fn push_channel(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_subscriber(socket, app_state))
}

/// Apply one client frame to the subscription registry.
pub(crate) fn handle_client_message(
    app_state: &AppState,
    handle: &SubscriberHandle,
    text: &str,
) -> Result<(), CoreError> {
    let message: ClientMessage = serde_json::from_str(text)
        .map_err(|e| CoreError::invalid(format!("malformed client message: {e}")))?;
    let subscriber = handle.id();
    match message {
        ClientMessage::SubscribeStation { station_id } => {
            tracing::info!("Subscriber {} joins station:{}", subscriber, station_id);
            app_state
                .engine()?
                .subscribe_station(&station_id, handle.clone())
        }
        ClientMessage::UnsubscribeStation { station_id } => {
            app_state
                .engine()?
                .unsubscribe(&Topic::Station(station_id), subscriber);
            Ok(())
        }
        ClientMessage::SubscribeAlternatives { search } => {
            let params = SearchParams::try_from(search)?;
            tracing::info!(
                "Subscriber {} joins alternatives:{}",
                subscriber,
                params.canonical_key()
            );
            app_state
                .engine()?
                .subscribe_alternatives(params, handle.clone())
        }
        ClientMessage::UnsubscribeAlternatives { search } => {
            let params = SearchParams::try_from(search)?;
            app_state
                .engine()?
                .unsubscribe(&Topic::Alternatives(params), subscriber);
            Ok(())
        }
    }
}

async fn send_json(socket: &mut WebSocket, payload: &impl Serialize) -> Result<(), axum::Error> {
    match serde_json::to_string(payload) {
        Ok(frame) => socket.send(Message::Text(frame.into())).await,
        Err(error) => {
            tracing::warn!("Could not serialize outgoing frame: {}", error);
            Ok(())
        }
    }
}

async fn serve_subscriber(mut socket: WebSocket, app_state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<PushMessage>();
    let handle = SubscriberHandle::new(SubscriberId::new(), Arc::new(tx));
    let subscriber = handle.id();
    tracing::info!("Subscriber {} connected", subscriber);
    match app_state.engine() {
        Ok(mut engine) => engine.subscribe_occupancy_list(handle.clone()),
        Err(error) => {
            tracing::warn!("Refusing subscriber {}: {}", subscriber, error);
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(error) = handle_client_message(&app_state, &handle, text.as_str()) {
                        tracing::warn!("Rejected frame from subscriber {}: {}", subscriber, error);
                        let reply = ErrorResponse {
                            error: error.to_string(),
                            kind: error.kind(),
                        };
                        if send_json(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            outgoing = rx.recv() => match outgoing {
                Some(message) => {
                    if send_json(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    match app_state.engine() {
        Ok(mut engine) => {
            let removed = engine.disconnect(subscriber);
            tracing::info!(
                "Subscriber {} disconnected, left {} topics",
                subscriber,
                removed
            );
        }
        Err(error) => tracing::warn!("Could not unregister subscriber {}: {}", subscriber, error),
    }
}
