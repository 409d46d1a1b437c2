//! In-memory order collection
//!
//! Ordered newest first (by insertion, which follows `createdAt` descending
//! after a full load). Lookups are by id.

use shared::message::RemoteEvent;
use shared::order::{Order, OrderPatch, Role, User};

#[derive(Debug, Clone, Default)]
pub struct OrderCollection {
    orders: Vec<Order>,
}

impl OrderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything, sorted by `createdAt` descending
    pub fn replace_all(&mut self, mut orders: Vec<Order>) {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.orders = orders;
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[Order] {
        &self.orders
    }

    /// Admins see everything; workers see orders assigned to them
    pub fn visible_to(&self, user: &User) -> Vec<Order> {
        match user.role {
            Role::Admin => self.orders.clone(),
            Role::Worker => self
                .orders
                .iter()
                .filter(|o| o.is_assigned_to(&user.name, user.team.as_deref()))
                .cloned()
                .collect(),
        }
    }

    /// Prepend when absent, replace in place when present
    pub fn upsert(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.insert(0, order),
        }
    }

    /// Returns the removed order
    pub fn remove(&mut self, id: &str) -> Option<Order> {
        let idx = self.orders.iter().position(|o| o.id == id)?;
        Some(self.orders.remove(idx))
    }

    /// Returns the patched order, `None` when the id is unknown
    pub fn apply_patch(&mut self, id: &str, patch: &OrderPatch) -> Option<&Order> {
        let order = self.orders.iter_mut().find(|o| o.id == id)?;
        patch.apply_to(order);
        Some(order)
    }

    /// Merge one push notification. Each event fully replaces what was known
    /// about its id, so re-applying the same event changes nothing.
    pub fn merge(&mut self, event: &RemoteEvent) {
        match event {
            RemoteEvent::Insert { record } | RemoteEvent::Update { record } => {
                self.upsert(record.clone())
            }
            RemoteEvent::Delete { id } => {
                self.remove(id);
            }
        }
    }
}
