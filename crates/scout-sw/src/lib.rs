//! # Scout SW
//!
//! Offline cache controller for the Scout Tools web toolkit.
//!
//! ## Features
//!
//! - **Lifecycle**: install (atomic precache), activate (stale generation
//!   purge + client claim), fetch handling
//! - **Stale-while-revalidate**: cached responses return immediately while a
//!   background task refreshes the cache
//! - **Offline fallback**: failed HTML navigations get the precached offline
//!   document
//! - **Injectable seams**: [`CacheStorage`] and [`Network`] traits so the
//!   policy runs against an in-memory store in tests
//!
//! ## Architecture
//!
//! ```text
//! page fetch ──► CacheController ──► CacheStorage (one generation)
//!                      │                   ▲
//!                      └──► Network ───────┘ (opportunistic update)
//! ```

pub mod config;
pub mod controller;
pub mod fetch;
pub mod lifecycle;
pub mod net;
pub mod store;

pub use config::SwConfig;
pub use controller::CacheController;
pub use fetch::{FetchRequest, FetchResponse};
pub use lifecycle::{LifecycleEvent, SwEvent, WorkerPhase};
pub use net::{HttpNetwork, HttpNetworkConfig, Network};
pub use store::{CacheEntry, CacheStorage, MemoryCacheStorage};
