/// Cache-aside lookup against Redis.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write and returns it. A failed cache read is logged
/// and treated as a miss; errors from `$block` propagate with `?`.
///
/// # Arguments
/// * `$cache`: a `Cache` (anything with `get_from_cache` and `set_in_background`).
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live of a stored value, in seconds.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let movie: AppResult<TmdbMovie> = cached!(cache, CacheKey::TmdbMovie(id), 3600, async move {
///     request_movie(id).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(key = %$key, error = %e, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
