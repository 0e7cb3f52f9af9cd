// src/middleware/rate_limit.rs
// Janela fixa em memória, por IP. Protege os endpoints de autenticação
// contra força bruta de senha e de OTP.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct WindowInfo {
    requests: u32,
    window_start: Instant,
}

#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, WindowInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_duration,
        }
    }

    /// true quando a requisição ainda cabe na janela do IP.
    pub async fn allow(&self, ip: &str) -> bool {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Entradas expiradas saem de passagem.
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        let info = requests.entry(ip.to_string()).or_insert(WindowInfo {
            requests: 0,
            window_start: now,
        });

        if now.duration_since(info.window_start) >= self.window_duration {
            info.requests = 1;
            info.window_start = now;
            return true;
        }

        if info.requests >= self.max_requests {
            return false;
        }
        info.requests += 1;
        true
    }
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // Atrás do proxy o IP real chega no x-forwarded-for.
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .split(',')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string();

    if !state.allow(&ip).await {
        tracing::warn!("🚦 Rate limit excedido pelo IP {}", ip);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Muitas tentativas. Aguarde um pouco e tente novamente.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_and_isolates_ips() {
        let state = RateLimitState::new(2, Duration::from_secs(60));
        assert!(state.allow("1.1.1.1").await);
        assert!(state.allow("1.1.1.1").await);
        assert!(!state.allow("1.1.1.1").await);
        // Outro IP tem a própria janela.
        assert!(state.allow("2.2.2.2").await);
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let state = RateLimitState::new(1, Duration::from_millis(10));
        assert!(state.allow("1.1.1.1").await);
        assert!(!state.allow("1.1.1.1").await);
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(state.allow("1.1.1.1").await);
    }
}
