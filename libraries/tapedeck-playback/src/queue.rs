//! Playback queue
//!
//! Ordered store of audio items with stable ids. Play order is the vector
//! order, and every item's `position` mirrors its index.

use crate::types::AudioItem;

/// Ordered queue of audio items
///
/// Structure:
/// ```text
/// index:    0        1        2
///        ┌────────┬────────┬────────┐
///        │ id 0   │ id 1   │ id 5   │   ids are never reused
///        │ pos 0  │ pos 1  │ pos 2  │   positions track the index
///        └────────┴────────┴────────┘
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Items in play order
    items: Vec<AudioItem>,

    /// Next id handed out by `add`
    next_id: i64,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a playlist already carries positions and ids
    ///
    /// Only the first item is inspected.
    pub fn is_presorted(items: &[AudioItem]) -> bool {
        items.first().is_some_and(AudioItem::is_placed)
    }

    /// Replace the queue contents
    ///
    /// Unless `already_sorted`, every item gets `id = position = index` in the
    /// given order. Sorted playlists are trusted as they are.
    pub fn initialize(&mut self, mut items: Vec<AudioItem>, already_sorted: bool) {
        if !already_sorted {
            for (index, item) in items.iter_mut().enumerate() {
                item.id = index as i64;
                item.position = index as i64;
            }
        }

        self.next_id = items.iter().map(|item| item.id).max().map_or(0, |id| id + 1);
        self.items = items;
    }

    /// Append an item
    ///
    /// Returns false without touching the queue if an equal item is already
    /// present. Otherwise the item gets a fresh id and the next position.
    pub fn add(&mut self, mut item: AudioItem) -> bool {
        if self.contains(&item) {
            return false;
        }

        item.id = self.next_id;
        item.position = self.items.len() as i64;
        self.next_id += 1;
        self.items.push(item);
        true
    }

    /// Remove an item
    ///
    /// Returns the index the item occupied. Positions of later items shift
    /// down by one.
    pub fn remove(&mut self, item: &AudioItem) -> Option<usize> {
        let index = self.index_of(item)?;
        self.items.remove(index);
        self.renumber_from(index);
        Some(index)
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_id = 0;
    }

    /// Check if an equal item is queued
    pub fn contains(&self, item: &AudioItem) -> bool {
        self.items.contains(item)
    }

    /// Index of an equal item
    pub fn index_of(&self, item: &AudioItem) -> Option<usize> {
        self.items.iter().position(|queued| queued == item)
    }

    /// Get item at index
    pub fn get(&self, index: usize) -> Option<&AudioItem> {
        self.items.get(index)
    }

    /// Find a queued item by id
    pub fn find_by_id(&self, id: i64) -> Option<&AudioItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// First item in play order
    pub fn first(&self) -> Option<&AudioItem> {
        self.items.first()
    }

    /// Last item in play order
    pub fn last(&self) -> Option<&AudioItem> {
        self.items.last()
    }

    /// Index after `current`, if any
    pub fn next_index(&self, current: usize) -> Option<usize> {
        let next = current + 1;
        (next < self.items.len()).then_some(next)
    }

    /// Index before `current`, if any
    pub fn previous_index(&self, current: usize) -> Option<usize> {
        if current >= self.items.len() {
            return None;
        }
        current.checked_sub(1)
    }

    /// All items in play order
    pub fn items(&self) -> &[AudioItem] {
        &self.items
    }

    /// Iterate items in play order
    pub fn iter(&self) -> std::slice::Iter<'_, AudioItem> {
        self.items.iter()
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn renumber_from(&mut self, start: usize) {
        for (index, item) in self.items.iter_mut().enumerate().skip(start) {
            item.position = index as i64;
        }
    }
}

impl<'a> IntoIterator for &'a Queue {
    type Item = &'a AudioItem;
    type IntoIter = std::slice::Iter<'a, AudioItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
