//! The ordered-store contract the admission engine runs against.
//!
//! The engine only ever needs score-ordered insert, rank lookup,
//! pop-minimum, and key enumeration; anything providing those semantics can
//! back a waiting room. Production uses [`RedisStore`]; tests and dev mode
//! use [`MemoryStore`].

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::error::StoreError;
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A shared, score-ordered associative store.
///
/// Keys name independent sorted sets; members within a set are unique and
/// ordered ascending by an integer score (unix seconds throughout this
/// crate). Member order among equal scores is store-defined.
#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// Insert `member` with `score` iff it is not already present.
    ///
    /// Returns `true` for a fresh insert and `false` for an existing
    /// member; an existing member's score is never updated.
    async fn zadd(&self, key: &str, member: &str, score: i64) -> StoreResult<bool>;

    /// 0-based ascending rank of `member`, or `None` if absent.
    async fn zrank(&self, key: &str, member: &str) -> StoreResult<Option<u64>>;

    /// Remove and return up to `count` lowest-score members, ascending.
    async fn zpopmin(&self, key: &str, count: u64) -> StoreResult<Vec<(String, i64)>>;

    /// Enumerate keys matching a glob `pattern`.
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Move up to `count` lowest-score members of `src` into `dst` at
    /// `score`, returning how many moved.
    ///
    /// The default composes [`zpopmin`](Self::zpopmin) and
    /// [`zadd`](Self::zadd), so a member can transiently be outside both
    /// sets mid-move. Implementations with server-side atomicity should
    /// override (the Redis store does, with a Lua script).
    async fn zpopmin_into(
        &self,
        src: &str,
        dst: &str,
        count: u64,
        score: i64,
    ) -> StoreResult<u64> {
        let popped = self.zpopmin(src, count).await?;
        let mut moved = 0;
        for (member, _) in popped {
            self.zadd(dst, &member, score).await?;
            moved += 1;
        }
        Ok(moved)
    }
}
