// src/handlers/ws.rs
// Canal de notificações em tempo real. O navegador não manda headers no
// handshake de WebSocket, então o JWT chega como query param.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/api/ws",
    tag = "Notifications",
    params(("token" = String, Query, description = "JWT de acesso")),
    responses((status = 101, description = "Conexão aceita"))
)]
pub async fn connect(
    State(app_state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let user = app_state.auth_service.validate_token(&query.token).await?;

    let receiver = app_state.notification_service.hub().subscribe(user.id);
    tracing::info!("🔌 WebSocket conectado para {}", user.email);

    Ok(ws.on_upgrade(move |socket| pump(socket, user.id, receiver)))
}

// Encaminha notificações até o cliente fechar. O lado de leitura só existe
// para detectar o close; qualquer mensagem recebida é ignorada.
async fn pump(socket: WebSocket, user_id: Uuid, mut receiver: UnboundedReceiver<String>) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outgoing = receiver.recv() => {
                let Some(text) = outgoing else { break };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!("🔌 WebSocket encerrado para {}", user_id);
}
