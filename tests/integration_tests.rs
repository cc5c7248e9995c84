//! Integration Tests for the Order Dispatch System
//!
//! Covers:
//! - Priority ordering and FIFO within a level
//! - Level bookkeeping under enqueue/dequeue
//! - Time-gated status progression with a manual clock
//! - Concurrent callers racing the status updater
//! - Checkout placement end to end

use chrono::Duration;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use order_dispatch::clock::{Clock, ManualClock};
use order_dispatch::placement::{Checkout, SENIOR_PRIORITY, STANDARD_PRIORITY};
use order_dispatch::{
    Catalog, DeliveryOutcome, LineItem, Order, OrderDesk, OrderDirectory, OrderStatus,
    PriorityStore, StatusTracker, StatusUpdater,
};

// =============================================================================
// Helpers
// =============================================================================

fn order(clock: &ManualClock, id: u64, priority: i32) -> Order {
    Order::placed(id, format!("order-{id}"), 50, priority, clock.shared())
}

/// Small deterministic LCG so the ordering test covers varied inputs
fn pseudo_random_priorities(count: usize, seed: u64) -> Vec<i32> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 7) as i32 - 2
        })
        .collect()
}

// =============================================================================
// Store ordering
// =============================================================================

#[test]
fn test_example_dispatch_order() {
    let clock = ManualClock::default();
    let store = PriorityStore::new();

    store.enqueue(Order::placed(1001, "A", 40, 2, clock.shared()));
    store.enqueue(Order::placed(1002, "B", 40, 1, clock.shared()));

    assert_eq!(store.dequeue().unwrap().id, 1002);
    assert_eq!(store.dequeue().unwrap().id, 1001);
}

#[test]
fn test_dequeue_is_sorted_by_priority_then_fifo() {
    let clock = ManualClock::default();

    for seed in [1, 7, 42, 1234] {
        let store = PriorityStore::new();
        let priorities = pseudo_random_priorities(200, seed);
        for (id, &priority) in priorities.iter().enumerate() {
            store.enqueue(order(&clock, id as u64, priority));
        }

        let drained: Vec<_> = std::iter::from_fn(|| store.dequeue()).collect();
        assert_eq!(drained.len(), priorities.len());

        for pair in drained.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.priority <= b.priority, "priority went backwards");
            if a.priority == b.priority {
                // ids were assigned in enqueue order
                assert!(a.id < b.id, "FIFO violated within level {}", a.priority);
            }
        }
    }
}

#[test]
fn test_empty_dequeue_never_mutates() {
    let clock = ManualClock::default();
    let store = PriorityStore::new();

    for _ in 0..5 {
        assert!(store.dequeue().is_none());
    }

    // Later enqueues still behave normally
    store.enqueue(order(&clock, 1, 3));
    assert_eq!(store.levels(), vec![(3, 1)]);
    assert_eq!(store.dequeue().unwrap().id, 1);
    assert!(store.dequeue().is_none());
}

#[test]
fn test_level_counts_track_enqueue_and_dequeue() {
    let clock = ManualClock::default();
    let store = PriorityStore::new();

    for i in 0..3 {
        let before = store.level_len(4);
        store.enqueue(order(&clock, i, 4));
        assert_eq!(store.level_len(4), before + 1);
    }
    store.enqueue(order(&clock, 10, 9));

    for _ in 0..3 {
        store.dequeue();
    }

    let mut levels_seen = HashSet::new();
    store.for_each(|o| {
        levels_seen.insert(o.priority);
    });
    assert!(!levels_seen.contains(&4));
    assert_eq!(store.levels(), vec![(9, 1)]);
}

// =============================================================================
// Status progression
// =============================================================================

#[test]
fn test_tracker_dwell_from_creation() {
    let clock = ManualClock::default();
    let t0 = clock.now();
    let tracker = StatusTracker::new(clock.shared());

    clock.set(t0 + Duration::seconds(10));
    tracker.advance(OrderStatus::InProgress);
    assert_eq!(tracker.status(), OrderStatus::Ordered);

    clock.set(t0 + Duration::seconds(31));
    tracker.advance(OrderStatus::InProgress);
    let snap = tracker.snapshot();
    assert_eq!(snap.status, OrderStatus::InProgress);
    assert_eq!(snap.changed_at, t0 + Duration::seconds(31));
}

#[test]
fn test_updater_and_directory_together() {
    let clock = ManualClock::default();
    let store = Arc::new(PriorityStore::new());
    let updater = StatusUpdater::new(Arc::clone(&store));
    let directory = OrderDirectory::new(Arc::clone(&store));

    store.enqueue(order(&clock, 1, 1));
    clock.advance(Duration::seconds(15));
    store.enqueue(order(&clock, 2, 1));

    clock.advance(Duration::seconds(16));
    let report = updater.scan_once();
    assert_eq!(report.advanced, 1);
    assert_eq!(directory.status_of(1), Some(OrderStatus::InProgress));
    assert_eq!(directory.status_of(2), Some(OrderStatus::Ordered));

    clock.advance(Duration::seconds(30));
    updater.scan_once();
    assert_eq!(directory.status_of(2), Some(OrderStatus::InProgress));

    // Delivery only ever comes from the caller
    updater.scan_once();
    assert_eq!(directory.status_of(1), Some(OrderStatus::InProgress));
    assert_eq!(directory.mark_delivered(1), DeliveryOutcome::Delivered);
    assert_eq!(directory.status_of(1), Some(OrderStatus::Delivered));
}

#[test]
fn test_find_by_id_prefers_first_enqueued() {
    let clock = ManualClock::default();
    let store = Arc::new(PriorityStore::new());
    let directory = OrderDirectory::new(Arc::clone(&store));

    store.enqueue(Order::placed(3, "older", 20, 2, clock.shared()));
    store.enqueue(Order::placed(3, "newer", 20, 2, clock.shared()));

    assert_eq!(directory.find_by_id(3).unwrap().name, "older");
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_enqueue_while_scanning() {
    let clock = ManualClock::default();
    let store = Arc::new(PriorityStore::new());
    let updater = StatusUpdater::new(Arc::clone(&store));
    let scanning = Arc::new(AtomicBool::new(true));
    let per_producer = 500u64;
    let barrier = Arc::new(Barrier::new(3));

    let scanner = {
        let store = Arc::clone(&store);
        let scanning = Arc::clone(&scanning);
        let barrier = Arc::clone(&barrier);
        let clock = clock.clone();
        thread::spawn(move || {
            barrier.wait();
            while scanning.load(Ordering::SeqCst) {
                clock.advance(Duration::seconds(1));
                updater.scan_once();
                for (_, count) in store.levels() {
                    assert!(count > 0, "empty priority level observed");
                }
            }
        })
    };

    let producers: Vec<_> = (0..2u64)
        .map(|p| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let clock = clock.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_producer {
                    let id = p * per_producer + i;
                    store.enqueue(order(&clock, id, (i % 5) as i32));
                }
            })
        })
        .collect();

    for handle in producers {
        handle.join().expect("producer thread panicked");
    }
    scanning.store(false, Ordering::SeqCst);
    scanner.join().expect("scanner thread panicked");

    assert_eq!(store.len(), (2 * per_producer) as usize);
    let ids: HashSet<u64> = store.snapshot().iter().map(|o| o.id).collect();
    assert_eq!(ids.len(), (2 * per_producer) as usize);
}

#[test]
fn test_concurrent_dequeue_hands_out_each_order_once() {
    let clock = ManualClock::default();
    let store = Arc::new(PriorityStore::new());
    for id in 0..400 {
        store.enqueue(order(&clock, id, (id % 3) as i32));
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(order) = store.dequeue() {
                    taken.push(order.id);
                }
                taken
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in consumers {
        for id in handle.join().expect("consumer thread panicked") {
            assert!(seen.insert(id), "order {id} dequeued twice");
        }
    }
    assert_eq!(seen.len(), 400);
    assert!(store.is_empty());
    assert!(store.levels().is_empty());
}

// =============================================================================
// Placement
// =============================================================================

/// Aggregate model: one checkout, one order, one shared tracker.
#[test]
fn test_checkout_places_single_aggregate_order() {
    let clock = ManualClock::default();
    let store = Arc::new(PriorityStore::new());
    let desk = OrderDesk::new(Arc::clone(&store), clock.shared());
    let catalog = Catalog::default();

    let mut senior = Checkout::new(1111, 82);
    senior
        .add(LineItem::purchase(
            catalog.item_by_name("Nebulizer").cloned().unwrap(),
            1,
        ))
        .add(LineItem::rent(
            catalog.item_by_name("Medical Ventilator").cloned().unwrap(),
            1,
            rust_decimal::Decimal::from(10),
        ));
    let mut adult = Checkout::new(2222, 35);
    adult.add(LineItem::purchase(
        catalog.item_by_name("BPL Oximeter").cloned().unwrap(),
        3,
    ));

    desk.place(adult).unwrap();
    let (senior_order, receipt) = desk.place(senior).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(senior_order.items.len(), 2);
    assert_eq!(receipt.total, rust_decimal::Decimal::from(9599 + 8290));

    let first = store.dequeue().unwrap();
    assert_eq!(first.id, 1111);
    assert_eq!(first.priority, SENIOR_PRIORITY);
    assert_eq!(store.dequeue().unwrap().priority, STANDARD_PRIORITY);
}
