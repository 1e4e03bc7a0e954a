use crate::{
    db::redis::{Cache, CacheKey},
    error::AppResult,
    models::Signal,
    services::signal_store::SignalRepository,
};

/// Signals are stored as JSON under `upvotes:{user_id}` with no expiry
#[async_trait::async_trait]
impl SignalRepository for Cache {
    async fn load(&self, user_id: &str) -> AppResult<Option<Signal>> {
        let signal: Option<Signal> = self
            .get_from_cache(&CacheKey::Upvotes(user_id.to_string()))
            .await?;

        // A stored snapshot under another user's key is ignored
        Ok(signal.filter(|s| s.user_id == user_id))
    }

    fn save(&self, signal: &Signal) {
        self.set_in_background(&CacheKey::Upvotes(signal.user_id.clone()), signal, None);
    }
}
