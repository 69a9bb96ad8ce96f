//! Periodic removal of expired login sessions

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::AppResult;

use super::auth::AuthService;

#[async_trait]
pub trait ExpiredSessionPurge: Send + Sync {
    async fn purge_expired(&self) -> AppResult<u64>;
}

#[async_trait]
impl ExpiredSessionPurge for AuthService {
    async fn purge_expired(&self) -> AppResult<u64> {
        self.cleanup_expired_sessions().await
    }
}

pub struct SessionSweeper<P> {
    purge: P,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<P: ExpiredSessionPurge> SessionSweeper<P> {
    pub fn new(purge: P, period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            purge,
            period,
            shutdown,
        }
    }

    /// Runs until the shutdown flag is raised or its sender is dropped.
    /// Spawn as a background task.
    pub async fn run(mut self) {
        tracing::info!("Session sweeper started (every {:?})", self.period);

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.purge.purge_expired().await {
                        Ok(0) => tracing::debug!("No expired sessions"),
                        Ok(n) => tracing::info!("Removed {} expired sessions", n),
                        Err(e) => tracing::error!("Session sweep failed: {}", e),
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Session sweeper stopped");
    }
}
