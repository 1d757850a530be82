//! Buffer for live arrivals that the user has not asked to see yet.

use super::types::Keyed;
use std::collections::VecDeque;

/// Default affordance label: "1 new item", "3 new items".
pub fn default_pluralize(n: usize) -> String {
    format!("{} new item{}", n, if n == 1 { "" } else { "s" })
}

/// Result of pushing onto the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Added(usize),
    Replaced,
}

/// Live arrivals, most recent first.
#[derive(Debug, Clone)]
pub struct LiveQueue<T> {
    items: VecDeque<T>,
}

impl<T> Default for LiveQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T: Keyed> LiveQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queue an arrival. A key that is already queued keeps its place and
    /// takes the newer snapshot.
    pub fn push(&mut self, item: T) -> Pending {
        let key = item.key();
        if let Some(slot) = self.items.iter_mut().find(|queued| queued.key() == key) {
            *slot = item;
            return Pending::Replaced;
        }
        self.items.push_front(item);
        Pending::Added(self.items.len())
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let idx = self.items.iter().position(|queued| &queued.key() == key)?;
        self.items.remove(idx)
    }

    /// Empty the queue, yielding items in arrival order (oldest first).
    pub fn drain_oldest_first(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..).rev()
    }

    /// Queued items, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
