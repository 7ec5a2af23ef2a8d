//! Tracking storage selected from configuration.

use storedesk_core::{AppConfig, DeliveryStatus};
use storedesk_db::{
    DbError, DeliveryTracking, MemoryTrackingStore, PgTrackingStore, PoolConfig, TrackingKey,
    TrackingStore, TrackingWrite,
};

/// Postgres when `DATABASE_URL` is set, otherwise process memory.
pub(crate) enum Store {
    Postgres(PgTrackingStore),
    Memory(MemoryTrackingStore),
}

impl Store {
    pub(crate) async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        match &config.database_url {
            Some(url) => {
                let pool = storedesk_db::connect_pool(url, PoolConfig::from_app_config(config))
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
                Ok(Self::Postgres(PgTrackingStore::new(pool)))
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL is not set; tracking records live in memory for this process only"
                );
                Ok(Self::Memory(MemoryTrackingStore::new()))
            }
        }
    }
}

impl TrackingStore for Store {
    async fn find(&self, key: &TrackingKey) -> Result<Option<DeliveryTracking>, DbError> {
        match self {
            Self::Postgres(s) => s.find(key).await,
            Self::Memory(s) => s.find(key).await,
        }
    }

    async fn save(&self, write: TrackingWrite<'_>) -> Result<DeliveryTracking, DbError> {
        match self {
            Self::Postgres(s) => s.save(write).await,
            Self::Memory(s) => s.save(write).await,
        }
    }

    async fn delete(&self, id: i64, store_id: &str) -> Result<bool, DbError> {
        match self {
            Self::Postgres(s) => s.delete(id, store_id).await,
            Self::Memory(s) => s.delete(id, store_id).await,
        }
    }

    async fn list(
        &self,
        store_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<DeliveryTracking>, DbError> {
        match self {
            Self::Postgres(s) => s.list(store_id, status).await,
            Self::Memory(s) => s.list(store_id, status).await,
        }
    }

    async fn list_in_progress(&self, limit: usize) -> Result<Vec<DeliveryTracking>, DbError> {
        match self {
            Self::Postgres(s) => s.list_in_progress(limit).await,
            Self::Memory(s) => s.list_in_progress(limit).await,
        }
    }
}
