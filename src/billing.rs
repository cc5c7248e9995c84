//! Line item pricing
//!
//! Purchases cost `quantity * purchase_price`; rentals cost
//! `quantity * hours * rental_price_per_hour`.

use rust_decimal::Decimal;

use crate::types::{Acquisition, LineItem};

/// Cost of a single line item
///
/// Rentals are charged per unit, so quantity scales the hourly cost too.
pub fn line_cost(line: &LineItem) -> Decimal {
    let quantity = Decimal::from(line.quantity);
    match line.acquisition {
        Acquisition::Purchase => quantity * line.item.purchase_price,
        Acquisition::Rent { hours } => quantity * hours * line.item.rental_price_per_hour,
    }
}

/// Sum of all line costs
pub fn order_total(lines: &[LineItem]) -> Decimal {
    lines.iter().map(line_cost).sum()
}

/// Round to paise for display, half-to-even
pub fn display_amount(amount: Decimal) -> Decimal {
    amount.round_dp(2).normalize()
}
