//! Queue registration, rank, and batch promotion.

use crate::{
    error::{AdmissionError, Result},
    keys::QueueKeys,
    store::OrderedStore,
    token,
};
use std::{
    fmt,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;

/// User identifiers as the gateway hands them in.
pub type UserId = u64;

/// How a promotion batch moves members between the two sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionMode {
    /// Pop from the wait set, then add each member to the proceed set as
    /// separate store calls. Matches the reference behavior; a member can
    /// transiently be outside both sets between the two calls.
    #[default]
    Relaxed,
    /// Delegate the whole move to the store's server-side atomic
    /// operation, so no member is ever observable outside both sets.
    Strict,
}

/// The waiting-room admission logic over an [`OrderedStore`].
///
/// Holds no mutable state of its own; every answer is recomputed from the
/// store, so concurrent gateways and the scheduler can share one engine.
#[derive(Clone)]
pub struct AdmissionEngine {
    store: Arc<dyn OrderedStore>,
    promotion_mode: PromotionMode,
}

impl fmt::Debug for AdmissionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionEngine")
            .field("promotion_mode", &self.promotion_mode)
            .finish_non_exhaustive()
    }
}

impl AdmissionEngine {
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        Self {
            store,
            promotion_mode: PromotionMode::default(),
        }
    }

    pub fn with_promotion_mode(mut self, mode: PromotionMode) -> Self {
        self.promotion_mode = mode;
        self
    }

    /// Register a user in the queue's wait set and return their 1-based
    /// rank.
    ///
    /// Fails with [`AdmissionError::AlreadyQueued`] if the user is already
    /// waiting; the store's insert-only add makes this check atomic, so
    /// exactly one of two racing registrations wins. If the rank readback
    /// finds the user already gone (promoted between the two calls), the
    /// lookup is retried once before the `-1` sentinel is returned.
    pub async fn register(&self, queue: &str, user_id: UserId) -> Result<i64> {
        let key = QueueKeys::wait(queue);
        let member = user_id.to_string();

        let added = self.store.zadd(&key, &member, epoch_seconds()).await?;
        if !added {
            return Err(AdmissionError::AlreadyQueued {
                queue: queue.to_string(),
                user_id,
            });
        }

        let rank = match self.store.zrank(&key, &member).await? {
            Some(rank) => Some(rank),
            None => self.store.zrank(&key, &member).await?,
        };

        debug!(queue, user_id, ?rank, "registered in wait set");
        Ok(rank.map(|r| r as i64 + 1).unwrap_or(-1))
    }

    /// Promote up to `count` longest-waiting users into the proceed set.
    ///
    /// Returns the number actually promoted; an empty wait set yields
    /// `Ok(0)`.
    pub async fn allow(&self, queue: &str, count: u64) -> Result<u64> {
        let wait = QueueKeys::wait(queue);
        let proceed = QueueKeys::proceed(queue);
        let now = epoch_seconds();

        let promoted = match self.promotion_mode {
            PromotionMode::Strict => {
                self.store.zpopmin_into(&wait, &proceed, count, now).await?
            }
            PromotionMode::Relaxed => {
                let popped = self.store.zpopmin(&wait, count).await?;
                let mut promoted = 0;
                for (member, _) in popped {
                    self.store.zadd(&proceed, &member, now).await?;
                    promoted += 1;
                }
                promoted
            }
        };

        debug!(queue, requested = count, promoted, "promotion batch");
        Ok(promoted)
    }

    /// True iff the user is a member of the queue's proceed set.
    pub async fn is_allowed(&self, queue: &str, user_id: UserId) -> Result<bool> {
        let rank = self
            .store
            .zrank(&QueueKeys::proceed(queue), &user_id.to_string())
            .await?;
        Ok(rank.is_some())
    }

    /// The user's live 1-based rank in the wait set, or `-1` if absent.
    pub async fn rank(&self, queue: &str, user_id: UserId) -> Result<i64> {
        let rank = self
            .store
            .zrank(&QueueKeys::wait(queue), &user_id.to_string())
            .await?;
        Ok(rank.map(|r| r as i64 + 1).unwrap_or(-1))
    }

    /// Names of every queue with a non-empty wait set, discovered by
    /// scanning for wait-set keys.
    pub async fn active_queues(&self) -> Result<Vec<String>> {
        let keys = self.store.scan(QueueKeys::WAIT_SCAN_PATTERN).await?;
        Ok(keys
            .iter()
            .filter_map(|key| QueueKeys::queue_from_wait_key(key))
            .map(str::to_string)
            .collect())
    }

    /// The deterministic admission token for this `(queue, user)` pair.
    pub fn generate_token(&self, queue: &str, user_id: UserId) -> String {
        token::generate(queue, user_id)
    }

    /// Capability-based admission check: recompute the expected token and
    /// compare, case-insensitively. Independent of [`is_allowed`]; the
    /// proceed set is never consulted.
    ///
    /// [`is_allowed`]: Self::is_allowed
    pub fn is_allowed_by_token(&self, queue: &str, user_id: UserId, token: &str) -> bool {
        token::verify(queue, user_id, token)
    }
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs() as i64
}
