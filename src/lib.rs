//! Order Dispatch
//!
//! Priority-ordered dispatch of equipment orders with time-based delivery
//! status tracking.
//!
//! Orders are stored by integer priority (lower is more urgent, FIFO within
//! a level) in a [`PriorityStore`]. A background [`StatusUpdater`] moves each
//! order from `ORDERED` to `IN_PROGRESS` once the 30 second dwell interval
//! has passed; `DELIVERED` is confirmed by callers through the
//! [`OrderDirectory`].
//!
//! ```
//! use std::sync::Arc;
//! use order_dispatch::{clock::SystemClock, Order, OrderDirectory, PriorityStore};
//!
//! let store = Arc::new(PriorityStore::new());
//! let clock = SystemClock::shared();
//! store.enqueue(Order::placed(1001, "A", 40, 2, clock.clone()));
//! store.enqueue(Order::placed(1002, "B", 80, 1, clock));
//!
//! let directory = OrderDirectory::new(Arc::clone(&store));
//! assert!(directory.find_by_id(1001).is_some());
//! assert_eq!(store.dequeue().unwrap().id, 1002);
//! ```

pub mod billing;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod directory;
pub mod placement;
pub mod store;
pub mod tracking;
pub mod types;
pub mod updater;

pub use catalog::{Catalog, Item};
pub use config::Config;
pub use directory::{DeliveryOutcome, OrderDirectory};
pub use placement::{Checkout, OrderDesk, PlacementError, Receipt};
pub use store::PriorityStore;
pub use tracking::{StatusTracker, TrackingSnapshot};
pub use types::*;
pub use updater::{ScanReport, StatusUpdater, UpdaterHandle};
