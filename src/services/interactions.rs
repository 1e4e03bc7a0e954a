use crate::{
    api::AppState,
    error::{AppError, AppResult},
    models::{Interaction, ItemId, Signal},
    services::{providers::spawn_interaction_delivery, recommendations::ensure_signal_loaded},
};

/// Records an upvote (`endorsed`) or its retraction for a user
///
/// The local signal store is updated and persisted first, and that update stands
/// on its own. The interaction is then forwarded to the sink on a detached task
/// whose outcome never affects the returned signal.
pub async fn record_upvote(
    state: &AppState,
    user_id: &str,
    item_id: ItemId,
    endorsed: bool,
) -> AppResult<Signal> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id cannot be empty".to_string()));
    }

    // No write until the persisted set has been read
    ensure_signal_loaded(state, user_id).await?;

    // Saved under the lock so queued snapshots follow mutation order
    let signal = {
        let mut inner = state.inner.write().await;
        inner.signals.record(user_id, item_id, endorsed);
        let signal = inner.signals.snapshot(user_id);
        state.signal_repository.save(&signal);
        signal
    };

    tracing::info!(
        user_id = %user_id,
        item_id = %item_id,
        endorsed,
        upvotes = signal.upvoted_item_ids.len(),
        "Recorded upvote"
    );

    spawn_interaction_delivery(
        state.interaction_sink.clone(),
        Interaction::new(user_id, item_id, endorsed),
    );

    Ok(signal)
}

/// Current upvotes of a user, hydrating persisted state on first access
pub async fn current_upvotes(state: &AppState, user_id: &str) -> AppResult<Signal> {
    ensure_signal_loaded(state, user_id).await?;
    Ok(state.inner.read().await.signals.snapshot(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        providers::{MockInteractionSink, MockRankingProvider},
        reranker::ScoringPolicy,
        signal_store::MockSignalRepository,
    };
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    fn state_with(sink: MockInteractionSink, repository: MockSignalRepository) -> AppState {
        AppState::new(
            Arc::new(MockRankingProvider::new()),
            Arc::new(sink),
            Arc::new(repository),
            ScoringPolicy::default(),
            10,
        )
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_local_state() {
        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction()
            .returning(|_| Err(AppError::ExternalApi("dataset unavailable".to_string())));

        let mut repository = MockSignalRepository::new();
        repository.expect_load().returning(|_| Ok(None));
        repository
            .expect_save()
            .withf(|signal| signal.user_id == "u1")
            .times(2)
            .returning(|_| ());

        let state = state_with(sink, repository);

        let signal = record_upvote(&state, "u1", ItemId(8), true).await.unwrap();
        assert_eq!(signal.upvoted_item_ids, BTreeSet::from([ItemId(8)]));

        // Let the detached deliveries run and fail
        tokio::task::yield_now().await;

        let signal = record_upvote(&state, "u1", ItemId(9), true).await.unwrap();
        assert_eq!(signal.upvoted_item_ids, BTreeSet::from([ItemId(8), ItemId(9)]));
        assert_eq!(current_upvotes(&state, "u1").await.unwrap(), signal);
    }

    #[tokio::test]
    async fn test_retraction_after_hydration() {
        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction().returning(|_| Ok(()));

        let mut repository = MockSignalRepository::new();
        repository.expect_load().times(1).returning(|user| {
            let mut signal = Signal::new(user);
            signal.upvoted_item_ids.extend([ItemId(1), ItemId(2)]);
            Ok(Some(signal))
        });
        repository.expect_save().returning(|_| ());

        let state = state_with(sink, repository);

        let signal = record_upvote(&state, "u1", ItemId(1), false).await.unwrap();
        assert_eq!(signal.upvoted_item_ids, BTreeSet::from([ItemId(2)]));
    }

    #[tokio::test]
    async fn test_load_failure_refuses_write() {
        let mut repository = MockSignalRepository::new();
        repository
            .expect_load()
            .times(2)
            .returning(|_| Err(AppError::Internal("redis blip".to_string())));
        repository.expect_save().never();

        let state = state_with(MockInteractionSink::new(), repository);

        let result = record_upvote(&state, "u1", ItemId(9), true).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        // Still unknown, so the persisted set gets another chance to load
        let inner = state.inner.read().await;
        assert!(!inner.signals.knows("u1"));
        drop(inner);
        assert!(current_upvotes(&state, "u1").await.is_err());
    }

    #[tokio::test]
    async fn test_load_recovers_after_failure() {
        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction().returning(|_| Ok(()));

        let mut repository = MockSignalRepository::new();
        let mut attempts = 0;
        repository.expect_load().times(2).returning(move |user| {
            attempts += 1;
            if attempts == 1 {
                return Err(AppError::Internal("redis blip".to_string()));
            }
            let mut signal = Signal::new(user);
            signal.upvoted_item_ids.extend([ItemId(1), ItemId(2)]);
            Ok(Some(signal))
        });
        repository
            .expect_save()
            .withf(|signal| signal.upvoted_item_ids == BTreeSet::from([ItemId(1), ItemId(2), ItemId(9)]))
            .times(1)
            .returning(|_| ());

        let state = state_with(sink, repository);

        assert!(record_upvote(&state, "u1", ItemId(9), true).await.is_err());
        let signal = record_upvote(&state, "u1", ItemId(9), true).await.unwrap();
        assert_eq!(
            signal.upvoted_item_ids,
            BTreeSet::from([ItemId(1), ItemId(2), ItemId(9)])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_saved_snapshot_matches_final_state() {
        let mut sink = MockInteractionSink::new();
        sink.expect_send_interaction().returning(|_| Ok(()));

        let saved = Arc::new(Mutex::new(Vec::<Signal>::new()));
        let log = saved.clone();
        let mut repository = MockSignalRepository::new();
        repository.expect_load().returning(|_| Ok(None));
        repository
            .expect_save()
            .returning(move |signal| log.lock().unwrap().push(signal.clone()));

        let state = state_with(sink, repository);

        let tasks: Vec<_> = (0..32u64)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    record_upvote(&state, "u1", ItemId(i % 4), i % 3 != 0).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let final_state = state.inner.read().await.signals.snapshot("u1");
        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 32);
        assert_eq!(saved.last(), Some(&final_state));
    }

    #[tokio::test]
    async fn test_empty_user_rejected() {
        let state = state_with(MockInteractionSink::new(), MockSignalRepository::new());
        let result = record_upvote(&state, " ", ItemId(1), true).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
