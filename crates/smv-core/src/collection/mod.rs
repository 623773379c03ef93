//! Collection Module
//!
//! An item set that owns its items and keeps them ordered by due time.
//! Grading goes through the set so the due queue is refreshed after every
//! transition.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::memory::Item;
use crate::scheduling::{ReviewQueue, SchedulingContext};

/// Collection error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
}

/// Collection result type
pub type Result<T> = std::result::Result<T, CollectionError>;

// ============================================================================
// DUE QUEUE
// ============================================================================

/// Item ids ordered by `(due, id)`
#[derive(Debug, Clone, Default)]
pub struct DueQueue {
    order: BTreeSet<(DateTime<Utc>, String)>,
    positions: HashMap<String, DateTime<Utc>>,
}

impl DueQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or move an item to its current due time
    pub fn enqueue(&mut self, item: &Item) {
        if let Some(previous) = self.positions.insert(item.id.clone(), item.due) {
            self.order.remove(&(previous, item.id.clone()));
        }
        self.order.insert((item.due, item.id.clone()));
    }

    /// Drop an id from the queue
    pub fn remove(&mut self, id: &str) -> bool {
        match self.positions.remove(id) {
            Some(due) => self.order.remove(&(due, id.to_string())),
            None => false,
        }
    }

    /// Ids due at or before `now`, earliest first
    pub fn due_ids(&self, now: DateTime<Utc>) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .take_while(move |(due, _)| *due <= now)
            .map(|(_, id)| id.as_str())
    }

    /// Earliest queued id regardless of due time
    pub fn peek(&self) -> Option<(&DateTime<Utc>, &str)> {
        self.order.first().map(|(due, id)| (due, id.as_str()))
    }

    /// Number of queued ids
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the queue holds nothing
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ReviewQueue for DueQueue {
    fn on_graded(&mut self, item: &Item) {
        self.enqueue(item);
    }
}

// ============================================================================
// ITEM SET
// ============================================================================

/// Items plus their due ordering
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    items: HashMap<String, Item>,
    queue: DueQueue,
}

impl ItemSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from loaded items
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Add or replace an item; returns the previous version if any
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.queue.enqueue(&item);
        self.items.insert(item.id.clone(), item)
    }

    /// Remove an item from the set and queue
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.queue.remove(id);
        self.items.remove(id)
    }

    /// Look up an item
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// All items, unordered
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set holds nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Grade an item and refresh its queue position
    pub fn grade<C>(&mut self, id: &str, grade: f64, now: DateTime<Utc>, ctx: &mut C) -> Result<&Item>
    where
        C: SchedulingContext + ?Sized,
    {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| CollectionError::NotFound(id.to_string()))?;
        item.grade(grade, now, ctx, &mut self.queue);
        Ok(item)
    }

    /// Earliest item due at or before `now`
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<&Item> {
        self.queue.due_ids(now).next().and_then(|id| self.items.get(id))
    }

    /// Every item due at or before `now`, earliest first
    pub fn due_items(&self, now: DateTime<Utc>) -> Vec<&Item> {
        self.queue
            .due_ids(now)
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    /// Due time of the earliest item, due or not
    pub fn next_due_time(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|(due, _)| *due)
    }
}
