use super::queue::LiveQueue;
use super::types::Keyed;
use std::collections::HashSet;

/// A rendered row: the item snapshot and what the render function made of it.
#[derive(Debug, Clone)]
pub struct Row<T, R> {
    pub item: T,
    pub node: R,
}

/// Everything a feed knows about its list.
///
/// Keys are unique across `rows`; `insert` refuses duplicates and callers are
/// expected to `update` the existing row instead.
#[derive(Debug)]
pub struct ListState<T: Keyed, R> {
    rows: Vec<Row<T, R>>,
    keys: HashSet<T::Key>,
    /// Cursor for the next older page.
    pub cursor: Option<String>,
    no_more: bool,
    pub loading: bool,
    pub queue: LiveQueue<T>,
}

impl<T: Keyed, R> ListState<T, R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            keys: HashSet::new(),
            cursor: None,
            no_more: false,
            loading: false,
            queue: LiveQueue::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row<T, R>] {
        &self.rows
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    pub fn position(&self, key: &T::Key) -> Option<usize> {
        if !self.keys.contains(key) {
            return None;
        }
        self.rows.iter().position(|row| &row.item.key() == key)
    }

    /// Insert at `index`. Returns false (and drops the row) if the key exists.
    pub fn insert(&mut self, index: usize, row: Row<T, R>) -> bool {
        if !self.keys.insert(row.item.key()) {
            return false;
        }
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
        true
    }

    /// Swap in a new snapshot for the row at `index`.
    pub fn update(&mut self, index: usize, row: Row<T, R>) {
        if let Some(slot) = self.rows.get_mut(index) {
            *slot = row;
        }
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<(usize, Row<T, R>)> {
        let index = self.position(key)?;
        self.keys.remove(key);
        Some((index, self.rows.remove(index)))
    }

    pub fn no_more(&self) -> bool {
        self.no_more
    }

    /// Latches: there is no way to clear it for the lifetime of the list.
    pub fn mark_no_more(&mut self) {
        self.no_more = true;
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.keys.clear();
        self.queue.clear();
        self.cursor = None;
        self.loading = false;
    }
}

impl<T: Keyed, R> Default for ListState<T, R> {
    fn default() -> Self {
        Self::new()
    }
}
