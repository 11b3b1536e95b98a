/// Redis access with graceful degradation.
///
/// Every operation swallows Redis errors after logging a warning: reads return
/// `None`, writes return `false`. Predictions are always recomputable from the
/// in-memory reference data, so the server runs unchanged without Redis.
use redis::AsyncCommands;
use tracing::warn;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// A `None` URL, or one that fails to parse, yields a disabled cache.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "invalid redis url, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// PING round trip.
    pub async fn is_available(&self) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        value
    }

    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    async fn connection(&self) -> Option<redis::aio::MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::RedisCache;

    #[tokio::test]
    async fn disabled_cache_degrades() {
        let cache = RedisCache::new(None);
        assert!(!cache.is_enabled());
        assert!(!cache.is_available().await);
        assert_eq!(cache.get("anything").await, None);
        assert!(!cache.set_with_ttl("anything", "value", 10).await);
    }

    #[test]
    fn malformed_url_disables_cache() {
        let cache = RedisCache::new(Some("not a url"));
        assert!(!cache.is_enabled());
    }
}
