//! Core data types used across the dispatch system

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Item;
use crate::clock::SharedClock;
use crate::tracking::StatusTracker;

/// Caller-supplied order identifier (not unique across the store)
pub type OrderId = u64;

/// Dispatch priority, lower is more urgent
pub type Priority = i32;

/// Delivery status, progressing `Ordered -> InProgress -> Delivered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Ordered,
    InProgress,
    Delivered,
}

impl OrderStatus {
    /// The status that follows this one, if any
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Ordered => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// True when `target` is the immediate successor of this status
    pub fn can_advance_to(self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Ordered => "ORDERED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Delivered => "DELIVERED",
        };
        write!(f, "{}", s)
    }
}

/// How a line item is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Acquisition {
    Purchase,
    Rent { hours: Decimal },
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acquisition::Purchase => write!(f, "Purchase"),
            Acquisition::Rent { hours } => write!(f, "Rent ({}h)", hours),
        }
    }
}

/// One catalog item on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item: Item,
    pub quantity: u32,
    pub acquisition: Acquisition,
}

impl LineItem {
    pub fn purchase(item: Item, quantity: u32) -> Self {
        Self {
            item,
            quantity,
            acquisition: Acquisition::Purchase,
        }
    }

    pub fn rent(item: Item, quantity: u32, hours: Decimal) -> Self {
        Self {
            item,
            quantity,
            acquisition: Acquisition::Rent { hours },
        }
    }
}

/// A dispatchable order
///
/// One order per checkout: all line items share the order's single
/// [`StatusTracker`]. Everything except the tracker is fixed at construction.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub age: u32,
    pub priority: Priority,
    pub items: Vec<LineItem>,
    tracker: StatusTracker,
}

impl Order {
    pub fn new(
        id: OrderId,
        name: impl Into<String>,
        age: u32,
        priority: Priority,
        tracker: StatusTracker,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            priority,
            items: Vec::new(),
            tracker,
        }
    }

    /// Convenience constructor with a fresh tracker on `clock`
    pub fn placed(
        id: OrderId,
        name: impl Into<String>,
        age: u32,
        priority: Priority,
        clock: SharedClock,
    ) -> Self {
        Self::new(id, name, age, priority, StatusTracker::new(clock))
    }

    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items;
        self
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    pub fn status(&self) -> OrderStatus {
        self.tracker.status()
    }
}
