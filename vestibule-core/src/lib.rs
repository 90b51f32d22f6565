//! # Vestibule Core
//!
//! Core library for the Vestibule waiting room, providing the ordered-queue
//! admission logic shared by the gateway and the promotion scheduler.
//!
//! ## Overview
//!
//! Each named queue is backed by two sorted sets in an external ordered
//! store (Redis in production, an in-memory double in tests):
//!
//! - **WaitSet** (`users:queue:<name>:wait`): users waiting to proceed,
//!   scored by arrival time.
//! - **ProceedSet** (`users:queue:<name>:proceed`): users admitted toward
//!   the protected resource, scored by promotion time.
//!
//! The [`AdmissionEngine`] registers arrivals, reports live ranks, and
//! promotes bounded batches from wait to proceed. Admitted users also carry
//! a deterministic capability token (see [`token`]) so repeat requests skip
//! re-registration entirely. The [`PromotionScheduler`] discovers active
//! wait sets and drains them on a fixed-delay cadence.
//!
//! ## Architecture
//!
//! - [`store`]: the [`OrderedStore`] contract plus Redis and in-memory
//!   implementations
//! - [`engine`]: queue registration, rank, and batch promotion
//! - [`scheduler`]: the recurring promotion task
//! - [`token`]: capability token generation and verification
//! - [`keys`]: sorted-set key naming

pub mod engine;
pub mod error;
pub mod keys;
pub mod scheduler;
pub mod store;
pub mod token;

pub use engine::{AdmissionEngine, PromotionMode, UserId};
pub use error::{AdmissionError, Result, StoreError};
pub use keys::QueueKeys;
pub use scheduler::{PromotionScheduler, SchedulerConfig};
pub use store::{MemoryStore, OrderedStore, RedisStore};
