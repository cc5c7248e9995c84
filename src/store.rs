//! Priority-grouped order store
//!
//! Orders live in a binary heap keyed by `(priority, insertion sequence)`, so
//! the lowest priority number is served first and equal priorities come out
//! in the order they went in. A per-level counter mirrors the heap so the
//! store can report its priority levels; a level is present only while it
//! holds at least one order.
//!
//! All mutations and enumerations go through a single mutex. Enumeration
//! copies the membership under that lock and visits the copy after releasing
//! it, so visitors never block `enqueue`/`dequeue` and never see a
//! half-applied update. Order statuses are read live through each tracker.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::types::{Order, Priority};

/// Heap entry; ordering is reversed so `BinaryHeap` pops the minimum
#[derive(Debug)]
struct QueuedOrder {
    priority: Priority,
    seq: u64,
    order: Arc<Order>,
}

impl PartialEq for QueuedOrder {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedOrder {}

impl PartialOrd for QueuedOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
struct StoreState {
    heap: BinaryHeap<QueuedOrder>,
    /// Order count per priority level, never zero
    levels: BTreeMap<Priority, usize>,
    next_seq: u64,
}

/// Thread-safe priority store shared between callers and the status updater
#[derive(Debug, Default)]
pub struct PriorityStore {
    state: Mutex<StoreState>,
}

impl PriorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `order` to its priority level. Never rejects; duplicate ids
    /// and priorities are both fine. Returns a handle to the stored order.
    pub fn enqueue(&self, order: Order) -> Arc<Order> {
        let order = Arc::new(order);
        let mut state = self.lock();

        let seq = state.next_seq;
        state.next_seq += 1;
        *state.levels.entry(order.priority).or_insert(0) += 1;
        state.heap.push(QueuedOrder {
            priority: order.priority,
            seq,
            order: Arc::clone(&order),
        });

        debug!(
            id = order.id,
            priority = order.priority,
            seq,
            queued = state.heap.len(),
            "Order enqueued"
        );
        order
    }

    /// Remove and return the oldest order at the most urgent priority level,
    /// or `None` when the store is empty.
    pub fn dequeue(&self) -> Option<Arc<Order>> {
        let mut state = self.lock();
        let entry = state.heap.pop()?;

        match state.levels.get_mut(&entry.priority) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                state.levels.remove(&entry.priority);
            }
            None => debug_assert!(false, "priority level {} missing", entry.priority),
        }

        debug!(
            id = entry.order.id,
            priority = entry.priority,
            remaining = state.heap.len(),
            "Order dequeued"
        );
        Some(entry.order)
    }

    /// Point-in-time copy of every stored order, by ascending priority and
    /// FIFO within a level
    pub fn snapshot(&self) -> Vec<Arc<Order>> {
        let mut entries: Vec<(Priority, u64, Arc<Order>)> = {
            let state = self.lock();
            state
                .heap
                .iter()
                .map(|e| (e.priority, e.seq, Arc::clone(&e.order)))
                .collect()
        };
        entries.sort_unstable_by_key(|(priority, seq, _)| (*priority, *seq));
        entries.into_iter().map(|(_, _, order)| order).collect()
    }

    /// Visit every stored order (see [`PriorityStore::snapshot`] for order
    /// and consistency)
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Arc<Order>),
    {
        for order in self.snapshot() {
            visitor(&order);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Number of orders waiting at `priority`
    pub fn level_len(&self, priority: Priority) -> usize {
        self.lock().levels.get(&priority).copied().unwrap_or(0)
    }

    /// Occupied priority levels with their order counts, most urgent first
    pub fn levels(&self) -> Vec<(Priority, usize)> {
        self.lock()
            .levels
            .iter()
            .map(|(&priority, &count)| (priority, count))
            .collect()
    }

    /// Tabular listing of the queue contents
    pub fn render_table(&self) -> String {
        let mut rows = Vec::new();
        self.for_each(|order| {
            rows.push(format!(
                "| {:<8} | {:<40} | {:>8} | {:<11} |",
                order.id,
                order.name,
                order.priority,
                order.status().to_string()
            ));
        });

        if rows.is_empty() {
            return "Queue is empty\n".to_string();
        }

        let border = format!("+{}+", "-".repeat(79));
        let mut out = String::new();
        out.push_str(&border);
        out.push('\n');
        out.push_str(&format!(
            "| {:<8} | {:<40} | {:>8} | {:<11} |\n",
            "ID", "Order Name", "Priority", "Status"
        ));
        out.push_str(&border);
        out.push('\n');
        for row in rows {
            out.push_str(&row);
            out.push('\n');
        }
        out.push_str(&border);
        out.push('\n');
        out
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Priority store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
