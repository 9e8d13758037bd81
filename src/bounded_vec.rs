use crate::deque::{self, LazilyDeallocatedDeque};

/// A deque that maintains a maximum length by removing oldest elements
#[derive(Debug)]
pub struct BoundedVec<T> {
    items: LazilyDeallocatedDeque<T>,
    max_size: usize,
}

impl<T> BoundedVec<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: LazilyDeallocatedDeque::new(),
            max_size,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        if self.items.len() > self.max_size {
            self.items.pop_front();
        }
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.items.len() > max_size {
            self.items.pop_front();
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> deque::Iter<'_, T> {
        self.items.iter()
    }

    /// Gives back storage left over from a larger history, if due.
    pub fn compact(&mut self) -> bool {
        self.items.maybe_shrink()
    }
}

impl<T: Clone> BoundedVec<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
