//! Interactive session command
//!
//! Console front end over the dispatch core:
//! - Place an order from the catalog
//! - View the dispatch queue
//! - Track an order by patient id
//! - Dispatch the next order
//! - Confirm delivery
//!
//! All number parsing happens here; malformed input is rejected with a
//! message and a re-prompt and never reaches the store.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use order_dispatch::clock::{SharedClock, SystemClock};
use order_dispatch::placement::Checkout;
use order_dispatch::{
    Catalog, Config, DeliveryOutcome, LineItem, OrderDesk, OrderDirectory, OrderStatus,
    PriorityStore, StatusUpdater,
};

/// Session input errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid input for {field}: '{input}' is not a valid number")]
    InvalidNumber { field: &'static str, input: String },

    #[error("Invalid input for {field}: '{input}' must be greater than zero")]
    NotPositive { field: &'static str, input: String },

    #[error("Invalid choice '{0}'")]
    InvalidChoice(String),

    #[error("Invalid item name.")]
    UnknownItem(String),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a numeric field, rejecting anything else
pub fn parse_field<T: FromStr>(field: &'static str, input: &str) -> Result<T, SessionError> {
    input
        .trim()
        .parse::<T>()
        .map_err(|_| SessionError::InvalidNumber {
            field,
            input: input.trim().to_string(),
        })
}

/// Parse a count or duration, rejecting zero and negatives
pub fn parse_positive<T>(field: &'static str, input: &str) -> Result<T, SessionError>
where
    T: FromStr + PartialOrd + Default,
{
    let value = parse_field::<T>(field, input)?;
    if value > T::default() {
        Ok(value)
    } else {
        Err(SessionError::NotPositive {
            field,
            input: input.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    PlaceOrder,
    ViewQueue,
    TrackOrder,
    DispatchNext,
    ConfirmDelivery,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::PlaceOrder),
            "2" => Ok(MenuChoice::ViewQueue),
            "3" => Ok(MenuChoice::TrackOrder),
            "4" => Ok(MenuChoice::DispatchNext),
            "5" => Ok(MenuChoice::ConfirmDelivery),
            "6" => Ok(MenuChoice::Exit),
            other => Err(SessionError::InvalidChoice(other.to_string())),
        }
    }
}

const MENU: &str = "\
************************ WELCOME TO OUR HEALTHCARE STORE ************************
1. Place an order
2. View dispatch queue
3. Track an order
4. Dispatch next order
5. Confirm delivery
6. Exit
";

/// Console session bound to an input and output stream
pub struct Session<R, W> {
    input: R,
    out: W,
    store: Arc<PriorityStore>,
    directory: OrderDirectory,
    desk: OrderDesk,
    catalog: Catalog,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        input: R,
        out: W,
        store: Arc<PriorityStore>,
        catalog: Catalog,
        clock: SharedClock,
    ) -> Self {
        Self {
            input,
            out,
            directory: OrderDirectory::new(Arc::clone(&store)),
            desk: OrderDesk::new(Arc::clone(&store), clock),
            store,
            catalog,
        }
    }

    /// Serve menu choices until Exit or end of input
    pub async fn run(&mut self) -> Result<(), SessionError> {
        loop {
            write!(self.out, "{}", MENU)?;
            let Some(line) = self.prompt("Enter your choice: ").await? else {
                return Ok(());
            };

            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(e) => {
                    writeln!(self.out, "{}. Please select 1-6.", e)?;
                    continue;
                }
            };

            let keep_going = match choice {
                MenuChoice::PlaceOrder => self.place_order().await?,
                MenuChoice::ViewQueue => {
                    write!(self.out, "{}", self.store.render_table())?;
                    true
                }
                MenuChoice::TrackOrder => self.track_order().await?,
                MenuChoice::DispatchNext => {
                    self.dispatch_next()?;
                    true
                }
                MenuChoice::ConfirmDelivery => self.confirm_delivery().await?,
                MenuChoice::Exit => {
                    writeln!(self.out, "Exiting the program.")?;
                    return Ok(());
                }
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    /// Returns `false` when input ended mid-flow
    async fn place_order(&mut self) -> Result<bool, SessionError> {
        let Some(patient_id) = self
            .prompt_number::<u64>("Enter patient id (last 4 digits of Aadhar card): ", "patient id")
            .await?
        else {
            return Ok(false);
        };
        let Some(age) = self
            .prompt_number::<u32>("Enter age of the patient: ", "age")
            .await?
        else {
            return Ok(false);
        };

        write!(self.out, "{}", self.catalog.render_menu())?;
        let mut checkout = Checkout::new(patient_id, age);

        loop {
            let Some(name) = self.prompt("Enter the item name to add to the order: ").await? else {
                return Ok(false);
            };
            let item = match self.catalog.item_by_name(name.trim()) {
                Some(item) => item.clone(),
                None => {
                    writeln!(self.out, "{}", SessionError::UnknownItem(name))?;
                    continue;
                }
            };

            let rent = loop {
                let Some(kind) = self.prompt("Select order type (1. Purchase, 2. Rent): ").await?
                else {
                    return Ok(false);
                };
                match kind.trim() {
                    "1" => break false,
                    "2" => break true,
                    other => writeln!(
                        self.out,
                        "{}. Please enter 1 for Purchase or 2 for Rent.",
                        SessionError::InvalidChoice(other.to_string())
                    )?,
                }
            };

            let hours = if rent {
                let Some(hours) = self
                    .prompt_positive::<Decimal>("Enter the rental duration in hours: ", "hours")
                    .await?
                else {
                    return Ok(false);
                };
                Some(hours)
            } else {
                None
            };

            let Some(quantity) = self
                .prompt_positive::<u32>("Enter the quantity: ", "quantity")
                .await?
            else {
                return Ok(false);
            };

            checkout.add(match hours {
                Some(hours) => LineItem::rent(item, quantity, hours),
                None => LineItem::purchase(item, quantity),
            });
            writeln!(self.out, "Item added to the order.")?;

            let Some(more) = self
                .prompt("Do you want to add more items to your order? (y/n): ")
                .await?
            else {
                return Ok(false);
            };
            if !more.trim().eq_ignore_ascii_case("y") {
                break;
            }
        }

        match self.desk.place(checkout) {
            Ok((_, receipt)) => {
                writeln!(self.out, "Order placed.")?;
                write!(self.out, "{}", receipt.render())?;
                writeln!(self.out, "THANK YOU!!")?;
            }
            Err(e) => {
                warn!(patient_id, error = %e, "Order rejected");
                writeln!(self.out, "Order not placed: {}", e)?;
            }
        }
        Ok(true)
    }

    async fn track_order(&mut self) -> Result<bool, SessionError> {
        let Some(id) = self
            .prompt_number::<u64>("Enter the order ID to track: ", "order id")
            .await?
        else {
            return Ok(false);
        };

        match self.directory.find_by_id(id) {
            Some(order) => {
                let status = order.status();
                writeln!(self.out, "Order ID: {}", order.id)?;
                writeln!(self.out, "Order Name: {}", order.name)?;
                writeln!(self.out, "Order Status: {}", status)?;
                match status {
                    OrderStatus::Delivered => writeln!(self.out, "This order has been DELIVERED.")?,
                    OrderStatus::InProgress => {
                        writeln!(self.out, "This order is currently IN_PROGRESS.")?
                    }
                    OrderStatus::Ordered => {}
                }
            }
            None => writeln!(self.out, "Order with ID {} not found.", id)?,
        }
        Ok(true)
    }

    fn dispatch_next(&mut self) -> Result<(), SessionError> {
        match self.store.dequeue() {
            Some(order) => {
                info!(id = order.id, priority = order.priority, "Order dispatched");
                writeln!(
                    self.out,
                    "Dispatched order {} ({}) at priority {} [{}]",
                    order.id,
                    order.name,
                    order.priority,
                    order.status()
                )?;
            }
            None => writeln!(self.out, "Queue is empty")?,
        }
        Ok(())
    }

    async fn confirm_delivery(&mut self) -> Result<bool, SessionError> {
        let Some(id) = self
            .prompt_number::<u64>("Enter the order ID delivered: ", "order id")
            .await?
        else {
            return Ok(false);
        };

        let message = match self.directory.mark_delivered(id) {
            DeliveryOutcome::Delivered => format!("Order {} marked DELIVERED.", id),
            DeliveryOutcome::NotFound => format!("Order with ID {} not found.", id),
            DeliveryOutcome::NotInProgress(status) => {
                format!("Order {} is {}, not IN_PROGRESS.", id, status)
            }
            DeliveryOutcome::TooEarly => {
                format!("Order {} changed status too recently, try again later.", id)
            }
        };
        writeln!(self.out, "{}", message)?;
        Ok(true)
    }

    /// Read one line; `None` at end of input
    async fn prompt(&mut self, text: &str) -> Result<Option<String>, SessionError> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Re-prompt until the input parses as `T`
    async fn prompt_number<T: FromStr>(
        &mut self,
        text: &str,
        field: &'static str,
    ) -> Result<Option<T>, SessionError> {
        loop {
            let Some(line) = self.prompt(text).await? else {
                return Ok(None);
            };
            match parse_field::<T>(field, &line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
    }

    /// Re-prompt until the input parses as `T` and is above zero
    async fn prompt_positive<T>(
        &mut self,
        text: &str,
        field: &'static str,
    ) -> Result<Option<T>, SessionError>
    where
        T: FromStr + PartialOrd + Default,
    {
        loop {
            let Some(line) = self.prompt(text).await? else {
                return Ok(None);
            };
            match parse_positive::<T>(field, &line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
    }
}

pub fn run(config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run_async(config))
}

async fn run_async(config: &Config) -> Result<()> {
    let catalog = config.catalog()?;
    let store = Arc::new(PriorityStore::new());
    let updater = StatusUpdater::new(Arc::clone(&store)).spawn();

    info!(items = catalog.len(), "Session started");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut session = Session::new(
        stdin,
        std::io::stdout(),
        Arc::clone(&store),
        catalog,
        SystemClock::shared(),
    );
    let result = session.run().await;

    updater
        .shutdown()
        .await
        .context("Status updater did not shut down cleanly")?;
    info!(remaining = store.len(), "Session ended");

    result.context("Session aborted")
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_dispatch::clock::ManualClock;

    async fn run_script(script: &str) -> (String, Arc<PriorityStore>) {
        let store = Arc::new(PriorityStore::new());
        let mut out = Vec::new();
        {
            let mut session = Session::new(
                script.as_bytes(),
                &mut out,
                Arc::clone(&store),
                Catalog::default(),
                ManualClock::default().shared(),
            );
            session.run().await.unwrap();
        }
        (String::from_utf8(out).unwrap(), store)
    }

    #[test]
    fn test_parse_field_rejects_non_numeric() {
        assert_eq!(parse_field::<u32>("age", " 42 ").unwrap(), 42);
        let err = parse_field::<u32>("age", "forty").unwrap_err();
        assert!(matches!(err, SessionError::InvalidNumber { field: "age", .. }));
        assert!(parse_field::<u32>("age", "-3").is_err());
    }

    #[test]
    fn test_parse_positive_rejects_zero() {
        assert_eq!(parse_positive::<u32>("quantity", "3").unwrap(), 3);
        assert!(matches!(
            parse_positive::<u32>("quantity", "0"),
            Err(SessionError::NotPositive { field: "quantity", .. })
        ));
        assert!(matches!(
            parse_positive::<Decimal>("hours", "-2"),
            Err(SessionError::NotPositive { .. })
        ));
        assert!(matches!(
            parse_positive::<Decimal>("hours", "0.0"),
            Err(SessionError::NotPositive { .. })
        ));
        assert!(parse_positive::<Decimal>("hours", "0.5").is_ok());
    }

    #[test]
    fn test_menu_choice_parsing() {
        assert_eq!("1".parse::<MenuChoice>().unwrap(), MenuChoice::PlaceOrder);
        assert_eq!(" 6 ".parse::<MenuChoice>().unwrap(), MenuChoice::Exit);
        assert!("7".parse::<MenuChoice>().is_err());
        assert!("x".parse::<MenuChoice>().is_err());
    }

    #[tokio::test]
    async fn test_place_then_track_order() {
        let script = "1\n1234\n80\nNebulizer\n1\n2\nn\n3\n1234\n6\n";
        let (out, store) = run_script(script).await;

        assert_eq!(store.len(), 1);
        assert!(out.contains("Order placed."));
        assert!(out.contains("Total Cost: Rs.19198"));
        assert!(out.contains("Priority: 1"));
        assert!(out.contains("Order Name: Order with 2 Nebulizer(s)"));
        assert!(out.contains("Order Status: ORDERED"));
        assert!(out.contains("Exiting the program."));
    }

    #[tokio::test]
    async fn test_bad_input_is_reprompted() {
        let script = "abc\n1\nnot-a-number\n1234\n30\nUnicorn\nECG machine\n3\n2\nlots\n1.5\n1\nn\n6\n";
        let (out, store) = run_script(script).await;

        assert!(out.contains("Invalid choice 'abc'"));
        assert!(out.contains("Invalid input for patient id: 'not-a-number'"));
        assert!(out.contains("Invalid item name."));
        assert!(out.contains("Please enter 1 for Purchase or 2 for Rent."));
        assert!(out.contains("Invalid input for hours: 'lots'"));
        assert!(out.contains("Total Cost: Rs.750"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].priority, 2);
    }

    #[tokio::test]
    async fn test_multi_item_checkout_is_one_order() {
        let script = "1\n55\n40\nBPL Oximeter\n1\n1\ny\nNebulizer\n1\n1\nn\n2\n6\n";
        let (out, store) = run_script(script).await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].items.len(), 2);
        assert!(out.contains("Order with 2 items"));
        assert!(out.contains("Total Cost: Rs.10868"));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_reprompted_and_earlier_lines_kept() {
        let script = "1\n4321\n40\nNebulizer\n1\n2\ny\nECG machine\n2\n0\n-1\n2\n0\n1\nn\n6\n";
        let (out, store) = run_script(script).await;

        assert!(out.contains("Invalid input for hours: '0' must be greater than zero"));
        assert!(out.contains("Invalid input for hours: '-1' must be greater than zero"));
        assert!(out.contains("Invalid input for quantity: '0' must be greater than zero"));
        assert!(!out.contains("Order not placed"));

        assert_eq!(store.len(), 1);
        let order = &store.snapshot()[0];
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].item.name, "Nebulizer");
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[1].quantity, 1);
        // 2 * 9599 + 1 * 2h * 500
        assert!(out.contains("Total Cost: Rs.20198"));
    }

    #[tokio::test]
    async fn test_dispatch_and_unknown_lookup() {
        let script = "4\n3\n99\n5\n99\n";
        let (out, _) = run_script(script).await;

        assert!(out.contains("Queue is empty"));
        assert!(out.contains("Order with ID 99 not found."));
        // Input ends without Exit
        assert!(!out.contains("Exiting the program."));
    }
}
