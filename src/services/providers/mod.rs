/// Remote personalization provider abstraction
///
/// The provider supplies ranked candidates per user and receives the user's
/// interactions so it can retrain. Both seams are traits so the feed and
/// interaction flows can run against fakes.
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Interaction, ModelStatus, ScoredId},
};

pub mod shaped;

pub use shaped::ShapedClient;

/// Source of per-user rankings
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RankingProvider: Send + Sync {
    /// Fetches up to `limit` scored item ids for a user, in provider order
    async fn rank(&self, user_id: &str, limit: usize) -> AppResult<Vec<ScoredId>>;

    /// Reports whether the remote model can serve rankings
    ///
    /// Never fails: problems reaching the provider are reported as
    /// [`ModelStatus::Error`].
    async fn model_status(&self) -> ModelStatus;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Destination for interaction events
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InteractionSink: Send + Sync {
    async fn send_interaction(&self, interaction: &Interaction) -> AppResult<()>;
}

/// Delivers an interaction, logging instead of returning failures
///
/// Local signal state is already updated when this runs and is never rolled back.
pub async fn deliver_interaction(sink: Arc<dyn InteractionSink>, interaction: Interaction) {
    match sink.send_interaction(&interaction).await {
        Ok(()) => tracing::debug!(
            user_id = %interaction.user_id,
            item_id = %interaction.item_id,
            rating = u8::from(interaction.rating),
            "Interaction delivered"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            user_id = %interaction.user_id,
            item_id = %interaction.item_id,
            "Interaction delivery failed; keeping local state"
        ),
    }
}

/// Sends the interaction on a detached task
pub fn spawn_interaction_delivery(sink: Arc<dyn InteractionSink>, interaction: Interaction) {
    tokio::spawn(deliver_interaction(sink, interaction));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, models::ItemId};

    #[tokio::test]
    async fn test_deliver_interaction_swallows_errors() {
        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction()
            .withf(|i| i.item_id == "7" && u8::from(i.rating) == 5)
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));

        deliver_interaction(Arc::new(sink), Interaction::new("u1", ItemId(7), true)).await;
    }

    #[tokio::test]
    async fn test_spawned_delivery_reaches_sink() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));

        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction().times(1).returning(move |i| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(i.rating);
            }
            Ok(())
        });

        spawn_interaction_delivery(Arc::new(sink), Interaction::new("u1", ItemId(7), false));

        let rating = tokio::time::timeout(std::time::Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(u8::from(rating), 0);
    }
}
