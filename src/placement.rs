//! Order placement
//!
//! Turns a checkout (patient, age, line items) into a single stored order.
//! Every line item of a checkout rides on that one order and shares its
//! status tracker.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::billing;
use crate::clock::SharedClock;
use crate::store::PriorityStore;
use crate::tracking::StatusTracker;
use crate::types::{Acquisition, LineItem, Order, OrderId, OrderStatus, Priority};

/// Patients at or above this age are dispatched first
pub const SENIOR_AGE: u32 = 75;
pub const SENIOR_PRIORITY: Priority = 1;
pub const STANDARD_PRIORITY: Priority = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("an order needs at least one line item")]
    NoItems,

    #[error("quantity for {0} must be at least 1")]
    ZeroQuantity(String),

    #[error("rental hours for {0} must be positive")]
    NonPositiveHours(String),
}

/// Dispatch priority for a patient's age
pub fn priority_for_age(age: u32) -> Priority {
    if age >= SENIOR_AGE {
        SENIOR_PRIORITY
    } else {
        STANDARD_PRIORITY
    }
}

/// Display name for an order
pub fn order_name(lines: &[LineItem]) -> String {
    match lines {
        [single] => format!("Order with {} {}(s)", single.quantity, single.item.name),
        many => format!("Order with {} items", many.len()),
    }
}

/// Everything collected from the patient before the order is stored
#[derive(Debug, Clone)]
pub struct Checkout {
    pub patient_id: OrderId,
    pub age: u32,
    pub items: Vec<LineItem>,
}

impl Checkout {
    pub fn new(patient_id: OrderId, age: u32) -> Self {
        Self {
            patient_id,
            age,
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, line: LineItem) -> &mut Self {
        self.items.push(line);
        self
    }

    fn validate(&self) -> Result<(), PlacementError> {
        if self.items.is_empty() {
            return Err(PlacementError::NoItems);
        }
        for line in &self.items {
            if line.quantity == 0 {
                return Err(PlacementError::ZeroQuantity(line.item.name.clone()));
            }
            if let Acquisition::Rent { hours } = line.acquisition {
                if hours <= Decimal::ZERO {
                    return Err(PlacementError::NonPositiveHours(line.item.name.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Summary handed back to the patient after placement
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub patient_id: OrderId,
    pub order_name: String,
    pub priority: Priority,
    pub total: Decimal,
    pub status: OrderStatus,
    pub lines: Vec<LineItem>,
}

impl Receipt {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("----------------------------------------\n");
        out.push_str("Bill Receipt:\n");
        out.push_str(&format!("\tOrder Name: {}\n", self.order_name));
        for line in &self.lines {
            out.push_str(&format!(
                "\t{} x {} [{}] Rs.{}\n",
                line.quantity,
                line.item.name,
                line.acquisition,
                billing::display_amount(billing::line_cost(line))
            ));
        }
        out.push_str(&format!(
            "\tTotal Cost: Rs.{}\n",
            billing::display_amount(self.total)
        ));
        out.push_str(&format!("\tPatient ID: {}\n", self.patient_id));
        out.push_str(&format!("\tPriority: {}\n", self.priority));
        out.push_str(&format!("\tDelivery Status: {}\n", self.status));
        out.push_str("----------------------------------------\n");
        out
    }
}

/// Places checkouts into the shared store
#[derive(Debug, Clone)]
pub struct OrderDesk {
    store: Arc<PriorityStore>,
    clock: SharedClock,
}

impl OrderDesk {
    pub fn new(store: Arc<PriorityStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Validate, price and enqueue one order for the whole checkout
    pub fn place(&self, checkout: Checkout) -> Result<(Arc<Order>, Receipt), PlacementError> {
        checkout.validate()?;

        let priority = priority_for_age(checkout.age);
        let name = order_name(&checkout.items);
        let total = billing::order_total(&checkout.items);

        let order = Order::new(
            checkout.patient_id,
            name.clone(),
            checkout.age,
            priority,
            StatusTracker::new(Arc::clone(&self.clock)),
        )
        .with_items(checkout.items.clone());
        let order = self.store.enqueue(order);

        info!(
            id = checkout.patient_id,
            priority,
            lines = checkout.items.len(),
            %total,
            "Order placed"
        );

        let receipt = Receipt {
            patient_id: checkout.patient_id,
            order_name: name,
            priority,
            total,
            status: order.status(),
            lines: checkout.items,
        };
        Ok((order, receipt))
    }
}
