// src/services/notification.rs
// Pipeline de notificações: dedupe -> persistência -> fan-out em tempo real.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{NotificationRepository, UserRepository},
    models::{
        auth::Role,
        notification::{Notification, NotifyInput},
    },
};

// Notificações idênticas para o mesmo usuário dentro desta janela são
// descartadas (reenvio acidental, duplo clique, retries do front).
const DEDUPE_WINDOW: Duration = Duration::from_secs(60);

/// Conexões WebSocket vivas, indexadas por usuário. Cada usuário pode ter
/// várias abas abertas; cada aba é um sender.
#[derive(Clone, Default)]
pub struct NotificationHub {
    connections: Arc<Mutex<HashMap<Uuid, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, user_id: Uuid) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        connections.entry(user_id).or_default().push(tx);
        rx
    }

    /// Empurra o payload para todas as abas do usuário. Senders mortos
    /// (aba fechada) são removidos de passagem.
    pub fn push(&self, user_id: Uuid, payload: &str) {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = connections.get_mut(&user_id) {
            senders.retain(|tx| tx.send(payload.to_string()).is_ok());
            if senders.is_empty() {
                connections.remove(&user_id);
            }
        }
    }

    pub fn connected_users(&self) -> usize {
        self.connections.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    user_repo: UserRepository,
    hub: NotificationHub,
    recent: Arc<Mutex<HashMap<(Uuid, String), Instant>>>,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, user_repo: UserRepository, hub: NotificationHub) -> Self {
        Self {
            repo,
            user_repo,
            hub,
            recent: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Notifica um usuário. Retorna None quando o dedupe descartou.
    pub async fn notify(
        &self,
        user_id: Uuid,
        input: NotifyInput,
    ) -> Result<Option<Notification>, AppError> {
        if self.is_duplicate(user_id, &input) {
            tracing::debug!("🔁 Notificação duplicada para {} descartada: {}", user_id, input.title);
            return Ok(None);
        }

        let notification = self.repo.insert(user_id, &input).await?;
        self.broadcast_one(&notification);
        Ok(Some(notification))
    }

    /// Mesma notificação para uma lista explícita de usuários.
    pub async fn notify_many(
        &self,
        user_ids: &[Uuid],
        input: NotifyInput,
    ) -> Result<Vec<Notification>, AppError> {
        let targets: Vec<Uuid> = user_ids
            .iter()
            .copied()
            .filter(|id| !self.is_duplicate(*id, &input))
            .collect();

        let notifications = self.repo.insert_bulk(&targets, &input).await?;
        for n in &notifications {
            self.broadcast_one(n);
        }
        Ok(notifications)
    }

    /// Broadcast para todos os usuários de um papel.
    pub async fn notify_role(
        &self,
        role: Role,
        input: NotifyInput,
    ) -> Result<Vec<Notification>, AppError> {
        let ids = self.user_repo.list_ids_by_role(role).await?;
        self.notify_many(&ids, input).await
    }

    /// Atalho: avisa todos os admins (novo registro, novo chamado...).
    pub async fn notify_admins(&self, input: NotifyInput) -> Result<(), AppError> {
        self.notify_role(Role::Admin, input).await?;
        Ok(())
    }

    fn broadcast_one(&self, notification: &Notification) {
        let envelope = serde_json::json!({
            "event": "notification:new",
            "data": notification,
        });
        self.hub.push(notification.user_id, &envelope.to_string());
    }

    // Janela deslizante em memória. A chave junta título e mensagem; o
    // mapa é podado a cada consulta para não crescer sem limite.
    fn is_duplicate(&self, user_id: Uuid, input: &NotifyInput) -> bool {
        let key = (user_id, format!("{}\n{}", input.title, input.message));
        let now = Instant::now();
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.retain(|_, seen| now.duration_since(*seen) < DEDUPE_WINDOW);

        if recent.contains_key(&key) {
            return true;
        }
        recent.insert(key, now);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_delivers_to_all_tabs_and_drops_dead_ones() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        let mut rx1 = hub.subscribe(user);
        let rx2 = hub.subscribe(user);

        hub.push(user, "hello");
        assert_eq!(rx1.try_recv().unwrap(), "hello");

        // Fecha a segunda aba; o próximo push deve limpá-la.
        drop(rx2);
        hub.push(user, "again");
        assert_eq!(rx1.try_recv().unwrap(), "again");
        assert_eq!(hub.connected_users(), 1);

        drop(rx1);
        hub.push(user, "gone");
        assert_eq!(hub.connected_users(), 0);
    }

    #[test]
    fn hub_ignores_unknown_users() {
        let hub = NotificationHub::new();
        hub.push(Uuid::new_v4(), "nobody");
        assert_eq!(hub.connected_users(), 0);
    }
}
