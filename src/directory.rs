//! Order lookup by identifier

use std::sync::Arc;
use tracing::{debug, info};

use crate::store::PriorityStore;
use crate::tracking::TrackingSnapshot;
use crate::types::{Order, OrderId, OrderStatus};

/// Result of a caller-driven delivery confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Order moved to `Delivered`
    Delivered,
    /// No stored order has this id
    NotFound,
    /// Order is not `InProgress` yet (or already delivered)
    NotInProgress(OrderStatus),
    /// Dwell interval since the last transition has not elapsed
    TooEarly,
}

/// Read-side view over a [`PriorityStore`]
#[derive(Debug, Clone)]
pub struct OrderDirectory {
    store: Arc<PriorityStore>,
}

impl OrderDirectory {
    pub fn new(store: Arc<PriorityStore>) -> Self {
        Self { store }
    }

    /// First stored order with `id`, in enumeration order. Ids are not
    /// unique, so later duplicates are shadowed by the earliest one.
    pub fn find_by_id(&self, id: OrderId) -> Option<Arc<Order>> {
        let mut found: Option<Arc<Order>> = None;
        self.store.for_each(|order| {
            if found.is_none() && order.id == id {
                found = Some(Arc::clone(order));
            }
        });

        debug!(id, found = found.is_some(), "Order lookup");
        found
    }

    pub fn status_of(&self, id: OrderId) -> Option<OrderStatus> {
        self.find_by_id(id).map(|order| order.status())
    }

    pub fn tracking_of(&self, id: OrderId) -> Option<TrackingSnapshot> {
        self.find_by_id(id).map(|order| order.tracker().snapshot())
    }

    /// Confirm delivery of an `InProgress` order. Subject to the same dwell
    /// gate as every other transition.
    pub fn mark_delivered(&self, id: OrderId) -> DeliveryOutcome {
        let Some(order) = self.find_by_id(id) else {
            return DeliveryOutcome::NotFound;
        };

        let current = order.status();
        if !current.can_advance_to(OrderStatus::Delivered) {
            return DeliveryOutcome::NotInProgress(current);
        }

        if order
            .tracker()
            .advance_from(OrderStatus::InProgress, OrderStatus::Delivered)
        {
            info!(id, "Order delivered");
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::TooEarly
        }
    }
}
