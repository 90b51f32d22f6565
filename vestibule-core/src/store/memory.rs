use super::{OrderedStore, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-process [`OrderedStore`] for tests and single-node dev mode.
///
/// Members with equal scores keep their insertion order, which makes
/// same-second registrations deterministic where Redis leaves the
/// tie-break lexicographic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    sets: HashMap<String, Vec<Entry>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    member: String,
    score: i64,
    seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn insert(&mut self, key: &str, member: &str, score: i64) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        let entries = self.sets.entry(key.to_string()).or_default();
        if entries.iter().any(|e| e.member == member) {
            return false;
        }

        entries.push(Entry {
            member: member.to_string(),
            score,
            seq,
        });
        entries.sort_by_key(|e| (e.score, e.seq));
        true
    }

    fn pop_min(&mut self, key: &str, count: u64) -> Vec<(String, i64)> {
        let Some(entries) = self.sets.get_mut(key) else {
            return Vec::new();
        };

        let take = (count as usize).min(entries.len());
        let popped = entries
            .drain(..take)
            .map(|e| (e.member, e.score))
            .collect();

        // Redis drops a sorted set once its last member is removed.
        if entries.is_empty() {
            self.sets.remove(key);
        }

        popped
    }
}

#[async_trait]
impl OrderedStore for MemoryStore {
    async fn zadd(&self, key: &str, member: &str, score: i64) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.insert(key, member, score))
    }

    async fn zrank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(key)
            .and_then(|entries| entries.iter().position(|e| e.member == member))
            .map(|pos| pos as u64))
    }

    async fn zpopmin(&self, key: &str, count: u64) -> StoreResult<Vec<(String, i64)>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.pop_min(key, count))
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.lock().await;
        let mut keys: Vec<String> = inner
            .sets
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn zpopmin_into(
        &self,
        src: &str,
        dst: &str,
        count: u64,
        score: i64,
    ) -> StoreResult<u64> {
        // Single lock: the move is atomic the way the Redis Lua script is.
        let mut inner = self.inner.lock().await;
        let popped = inner.pop_min(src, count);
        let mut moved = 0;
        for (member, _) in popped {
            inner.insert(dst, &member, score);
            moved += 1;
        }
        Ok(moved)
    }
}

/// Minimal glob matcher: only `*` (any run of characters) is supported,
/// which covers the wait-set scan pattern.
fn glob_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == text;
    }

    let first = segments[0];
    let last = segments[segments.len() - 1];
    if text.len() < first.len() + last.len()
        || !text.starts_with(first)
        || !text.ends_with(last)
    {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for segment in &segments[1..segments.len() - 1] {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_wait_pattern() {
        assert!(glob_match("users:queue:*:wait", "users:queue:sale:wait"));
        assert!(glob_match("users:queue:*:wait", "users:queue:default:wait"));
        assert!(!glob_match("users:queue:*:wait", "users:queue:sale:proceed"));
        assert!(!glob_match("users:queue:*:wait", "other:queue:sale:wait"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    #[tokio::test]
    async fn zadd_is_insert_only() {
        let store = MemoryStore::new();
        assert!(store.zadd("k", "1001", 10).await.unwrap());
        assert!(!store.zadd("k", "1001", 20).await.unwrap());
        // Score 20 was discarded: still ranked by the original score.
        assert!(store.zadd("k", "1002", 15).await.unwrap());
        assert_eq!(store.zrank("k", "1001").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let store = MemoryStore::new();
        for user in ["3", "1", "2"] {
            store.zadd("k", user, 100).await.unwrap();
        }
        let popped = store.zpopmin("k", 3).await.unwrap();
        let members: Vec<&str> = popped.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(members, ["3", "1", "2"]);
    }

    #[tokio::test]
    async fn zpopmin_respects_score_order_and_count() {
        let store = MemoryStore::new();
        store.zadd("k", "late", 30).await.unwrap();
        store.zadd("k", "early", 10).await.unwrap();
        store.zadd("k", "mid", 20).await.unwrap();

        let popped = store.zpopmin("k", 2).await.unwrap();
        assert_eq!(
            popped,
            vec![("early".to_string(), 10), ("mid".to_string(), 20)]
        );
        assert_eq!(store.zrank("k", "late").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn popping_last_member_drops_the_key() {
        let store = MemoryStore::new();
        store.zadd("users:queue:sale:wait", "1", 10).await.unwrap();
        store.zpopmin("users:queue:sale:wait", 5).await.unwrap();
        let keys = store.scan("users:queue:*:wait").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn zpopmin_on_missing_key_is_empty() {
        let store = MemoryStore::new();
        assert!(store.zpopmin("nope", 10).await.unwrap().is_empty());
    }
}
