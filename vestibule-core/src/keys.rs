//! Sorted-set key naming for queue state.

/// Builders for the per-queue sorted-set keys.
///
/// Every queue `q` owns exactly two keys: `users:queue:q:wait` and
/// `users:queue:q:proceed`. The scheduler discovers live queues by scanning
/// for wait keys and reading the queue name back out of the key.
#[derive(Debug, Clone, Copy)]
pub struct QueueKeys;

impl QueueKeys {
    /// Glob pattern matching every queue's wait set.
    pub const WAIT_SCAN_PATTERN: &'static str = "users:queue:*:wait";

    pub fn wait(queue: &str) -> String {
        format!("users:queue:{queue}:wait")
    }

    pub fn proceed(queue: &str) -> String {
        format!("users:queue:{queue}:proceed")
    }

    /// Extract the queue name from a wait-set key (the third
    /// colon-delimited segment).
    pub fn queue_from_wait_key(key: &str) -> Option<&str> {
        key.split(':').nth(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_wait_and_proceed_keys() {
        assert_eq!(QueueKeys::wait("sale"), "users:queue:sale:wait");
        assert_eq!(QueueKeys::proceed("sale"), "users:queue:sale:proceed");
    }

    #[test]
    fn extracts_queue_name_from_wait_key() {
        assert_eq!(
            QueueKeys::queue_from_wait_key("users:queue:sale:wait"),
            Some("sale")
        );
        assert_eq!(QueueKeys::queue_from_wait_key("users"), None);
    }

    #[test]
    fn round_trips_through_scan_pattern_shape() {
        let key = QueueKeys::wait("default");
        assert!(key.starts_with("users:queue:"));
        assert!(key.ends_with(":wait"));
        assert_eq!(QueueKeys::queue_from_wait_key(&key), Some("default"));
    }
}
