/// Read-through caching for async lookups.
///
/// `$cache` is an `Option<Cache>`. With a cache, a hit is returned directly;
/// on a miss `$block` runs and its value is written back in the background.
/// Cache read failures are logged and treated as misses. Without a cache,
/// `$block` simply runs.
///
/// # Arguments
/// * `$cache`: `Option<Cache>` used for retrieval and storage.
/// * `$key`: The `CacheKey` for the value.
/// * `$ttl`: Time-to-live in seconds.
/// * `$block`: Future producing `AppResult<T>` when the value is not cached.
///
/// # Example
/// ```rust,ignore
/// let trending: Vec<TmdbMovie> = cached!(self.cache, CacheKey::Trending, TTL, async move {
///     fetch_trending().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.as_ref() {
            Some(cache) => {
                let key = $key;
                match cache.get_from_cache(&key).await {
                    Ok(Some(hit)) => Ok(hit),
                    miss => {
                        if let Err(e) = miss {
                            tracing::warn!(error = %e, key = %key, "Cache read failed, fetching");
                        }
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
