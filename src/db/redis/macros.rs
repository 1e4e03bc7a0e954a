/// Read-through caching on top of [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write with the given TTL and returns it. A failed cache
/// read is logged and treated as a miss. Errors from `$block` propagate with `?`,
/// so a failed computation is never cached.
///
/// # Arguments
/// * `$cache`: anything with `get_from_cache` and `set_in_background`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: TTL in seconds, as `Option<u64>`
/// * `$block`: future computing the value on a miss
///
/// # Example
/// ```rust,ignore
/// let status: ModelStatus = cached!(cache, CacheKey::ModelStatus(model_id), Some(30), async {
///     fetch_status().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                ::tracing::warn!(error = %e, key = %$key, "Cache read failed, computing value");
                None
            }
        };
        match hit {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
