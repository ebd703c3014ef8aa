//! Observable store for per-product reconciliation state.
//!
//! The store is the coordination core of the pipeline: every mutation
//! replaces the tracked collection (copy-on-write, never in-place) and
//! synchronously notifies every subscriber with the full snapshot, even
//! when the resulting state is unchanged — subscribers must be idempotent
//! against redundant notifications.
//!
//! Each `set_products`/`reset` bumps a monotonically increasing generation
//! counter. In-flight lookups capture the generation at start and pass it to
//! [`ProductStore::update_product`]; a write tagged with a stale generation
//! is dropped, so lookups resolving after a reset cannot resurrect discarded
//! records.

use std::sync::{Arc, Mutex};

use crate::product::{ProductRecord, ProductState};

type Subscriber = Arc<dyn Fn(&[ProductState]) + Send + Sync>;

/// Handle returned by [`ProductStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

struct Inner {
    products: Arc<Vec<ProductState>>,
    generation: u64,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber_id: u64,
}

pub struct ProductStore {
    inner: Mutex<Inner>,
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                products: Arc::new(Vec::new()),
                generation: 0,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
            }),
        }
    }

    /// Registers a subscriber and immediately invokes it with the current
    /// snapshot, so late subscribers observe the present state without
    /// waiting for the next mutation.
    pub fn subscribe<F>(&self, f: F) -> SubscriberId
    where
        F: Fn(&[ProductState]) + Send + Sync + 'static,
    {
        let subscriber: Subscriber = Arc::new(f);
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = SubscriberId(inner.next_subscriber_id);
            inner.next_subscriber_id += 1;
            inner.subscribers.push((id, Arc::clone(&subscriber)));
            (id, Arc::clone(&inner.products))
        };
        subscriber(&snapshot);
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Current full state sequence, in parse order.
    #[must_use]
    pub fn get_state(&self) -> Vec<ProductState> {
        self.lock().products.as_ref().clone()
    }

    /// The generation of the currently tracked record set.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    #[must_use]
    pub fn find_product(&self, record_id: &str) -> Option<ProductState> {
        self.lock()
            .products
            .iter()
            .find(|p| p.record.record_id == record_id)
            .cloned()
    }

    /// Replaces the entire tracked set with fresh `Loading` states and
    /// notifies. Returns the new generation, which in-flight operations
    /// spawned from this set must carry into their updates.
    pub fn set_products(&self, records: Vec<ProductRecord>) -> u64 {
        let states = records.into_iter().map(ProductState::loading).collect();
        self.replace(states)
    }

    /// Empties the tracked set and notifies. Returns the new generation.
    pub fn reset(&self) -> u64 {
        self.replace(Vec::new())
    }

    /// Merges `state` into the current set by `record_id` and notifies.
    ///
    /// A `record_id` not present in the current set leaves every entry
    /// untouched (the notification still fires). Returns `false` without
    /// notifying when `generation` no longer matches the tracked set — the
    /// write came from an operation started before a reset/replace and is
    /// dropped.
    pub fn update_product(&self, generation: u64, state: ProductState) -> bool {
        let (snapshot, subscribers) = {
            let mut inner = self.lock();
            if generation != inner.generation {
                tracing::debug!(
                    record_id = %state.record.record_id,
                    stale = generation,
                    current = inner.generation,
                    "dropping stale store write"
                );
                return false;
            }
            let next: Vec<ProductState> = inner
                .products
                .iter()
                .map(|p| {
                    if p.record.record_id == state.record.record_id {
                        state.clone()
                    } else {
                        p.clone()
                    }
                })
                .collect();
            inner.products = Arc::new(next);
            (Arc::clone(&inner.products), Self::subscriber_arcs(&inner))
        };
        Self::notify(&snapshot, &subscribers);
        true
    }

    fn replace(&self, states: Vec<ProductState>) -> u64 {
        let (generation, snapshot, subscribers) = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.products = Arc::new(states);
            (
                inner.generation,
                Arc::clone(&inner.products),
                Self::subscriber_arcs(&inner),
            )
        };
        Self::notify(&snapshot, &subscribers);
        generation
    }

    fn subscriber_arcs(inner: &Inner) -> Vec<Subscriber> {
        inner.subscribers.iter().map(|(_, s)| Arc::clone(s)).collect()
    }

    // Subscribers run outside the lock so a callback may call back into the
    // store without deadlocking. Notification stays synchronous: it completes
    // before the mutating call returns.
    fn notify(snapshot: &Arc<Vec<ProductState>>, subscribers: &[Subscriber]) {
        for subscriber in subscribers {
            subscriber(snapshot);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("product store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::product::{ProductKind, ProductMetrics, ProductStatus};

    fn record(id: &str) -> ProductRecord {
        ProductRecord {
            record_id: id.to_owned(),
            product_id: Some(format!("p-{id}")),
            item_id: Some(format!("i-{id}")),
            vendor_option_id: None,
            display_name: String::new(),
            kind: ProductKind::Normal,
        }
    }

    fn metrics() -> ProductMetrics {
        ProductMetrics {
            brand_name: Some("Acme".to_owned()),
            page_views_28d: Some(1000.0),
            sales_28d: Some(50.0),
            conversion_rate: "5.00%".to_owned(),
            estimated_revenue: Some(50000.0),
            price_validation: None,
        }
    }

    #[test]
    fn set_products_starts_everything_loading() {
        let store = ProductStore::new();
        store.set_products(vec![record("a"), record("b")]);

        let state = store.get_state();
        assert_eq!(state.len(), 2);
        assert!(state.iter().all(|p| p.status == ProductStatus::Loading));
    }

    #[test]
    fn update_product_replaces_only_the_matching_key() {
        let store = ProductStore::new();
        let generation = store.set_products(vec![record("a"), record("b")]);

        let updated = store.find_product("a").unwrap().completed(metrics());
        assert!(store.update_product(generation, updated));

        let state = store.get_state();
        assert_eq!(state[0].status, ProductStatus::Complete);
        assert_eq!(state[1].status, ProductStatus::Loading);
    }

    #[test]
    fn update_for_unknown_key_leaves_other_keys_untouched() {
        let store = ProductStore::new();
        let generation = store.set_products(vec![record("a")]);

        let ghost = ProductState::loading(record("ghost")).with_status(ProductStatus::Fail);
        store.update_product(generation, ghost);

        let state = store.get_state();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].record.record_id, "a");
        assert_eq!(state[0].status, ProductStatus::Loading);
    }

    #[test]
    fn stale_generation_write_is_dropped() {
        let store = ProductStore::new();
        let old_generation = store.set_products(vec![record("a")]);
        store.reset();
        store.set_products(vec![record("a")]);

        let late = store.find_product("a").unwrap().completed(metrics());
        assert!(!store.update_product(old_generation, late));
        assert_eq!(
            store.find_product("a").unwrap().status,
            ProductStatus::Loading,
            "a write from a discarded generation must not land"
        );
    }

    #[test]
    fn reset_empties_and_new_subscriber_sees_the_empty_sequence() {
        let store = ProductStore::new();
        store.set_products(vec![record("a")]);
        store.reset();
        assert!(store.get_state().is_empty());

        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let seen_clone = Arc::clone(&seen);
        store.subscribe(move |state| {
            seen_clone.store(state.len(), Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn every_mutation_notifies_all_subscribers() {
        let store = ProductStore::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        store.subscribe(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = Arc::clone(&second);
        store.subscribe(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        // 1 initial call each, then set + update + reset.
        let generation = store.set_products(vec![record("a")]);
        let st = store.find_product("a").unwrap().with_status(ProductStatus::Fail);
        store.update_product(generation, st);
        store.reset();

        assert_eq!(first.load(Ordering::SeqCst), 4);
        assert_eq!(second.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = ProductStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = store.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        store.unsubscribe(id);
        store.set_products(vec![record("a")]);
        assert_eq!(count.load(Ordering::SeqCst), 1, "only the initial call");
    }

    #[test]
    fn generation_increases_monotonically() {
        let store = ProductStore::new();
        let g1 = store.set_products(vec![record("a")]);
        let g2 = store.reset();
        let g3 = store.set_products(vec![record("b")]);
        assert!(g1 < g2 && g2 < g3);
    }
}
