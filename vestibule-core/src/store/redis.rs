use super::{OrderedStore, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::fmt;
use tracing::{debug, info};

/// Redis scripts for atomic operations
mod scripts {
    use redis::Script;

    /// Pop up to `ARGV[1]` lowest members of `KEYS[1]` and add each to
    /// `KEYS[2]` at score `ARGV[2]`, all inside a single server-side call.
    pub fn zpopmin_into() -> Script {
        Script::new(
            r#"
            local popped = redis.call('ZPOPMIN', KEYS[1], ARGV[1])
            local moved = 0
            for i = 1, #popped, 2 do
                redis.call('ZADD', KEYS[2], ARGV[2], popped[i])
                moved = moved + 1
            end
            return moved
            "#,
        )
    }
}

/// Redis-backed [`OrderedStore`] over a shared [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisStore {
    /// Connect to Redis and hand back a cloneable store handle.
    ///
    /// Connection failure here is a startup fault; the store does not
    /// retry on the caller's behalf afterwards (the manager reconnects
    /// transparently, failed commands surface as `StoreError`).
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to ordered store at {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Successfully connected to ordered store");

        Ok(Self { conn })
    }
}

#[async_trait]
impl OrderedStore for RedisStore {
    async fn zadd(&self, key: &str, member: &str, score: i64) -> StoreResult<bool> {
        debug!("ZADD NX {} {} {}", key, score, member);

        // NX keeps this a true add: an existing member is left untouched
        // and reported as not-added.
        let mut conn = self.conn.clone();
        let added: u64 = redis::cmd("ZADD")
            .arg(key)
            .arg("NX")
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await?;

        Ok(added == 1)
    }

    async fn zrank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        debug!("ZRANK {} {}", key, member);

        let mut conn = self.conn.clone();
        let rank: Option<u64> = redis::cmd("ZRANK")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await?;

        Ok(rank)
    }

    async fn zpopmin(&self, key: &str, count: u64) -> StoreResult<Vec<(String, i64)>> {
        debug!("ZPOPMIN {} {}", key, count);

        let mut conn = self.conn.clone();
        let popped: Vec<(String, f64)> = redis::cmd("ZPOPMIN")
            .arg(key)
            .arg(count)
            .query_async(&mut conn)
            .await?;

        Ok(popped
            .into_iter()
            .map(|(member, score)| (member, score as i64))
            .collect())
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        debug!("SCAN MATCH {}", pattern);

        let mut conn = self.conn.clone();
        let mut found = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            found.extend(keys);

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }

    async fn zpopmin_into(
        &self,
        src: &str,
        dst: &str,
        count: u64,
        score: i64,
    ) -> StoreResult<u64> {
        debug!("ZPOPMIN {} -> ZADD {} (count {})", src, dst, count);

        let mut conn = self.conn.clone();
        let moved: u64 = scripts::zpopmin_into()
            .key(src)
            .key(dst)
            .arg(count)
            .arg(score)
            .invoke_async(&mut conn)
            .await?;

        Ok(moved)
    }
}
