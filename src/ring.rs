//! Fixed-capacity circular buffer used as one link of the deque's ring chain.
//!
//! `front` points at the slot *before* the first element and `back` at the
//! slot holding the last element, so the ring is empty when they are equal.
//! One slot is always left unused to tell "full" apart from "empty", which
//! means a ring of capacity `C` holds at most `C - 1` elements.

#[derive(Debug)]
pub struct Ring<T> {
    data: Box<[Option<T>]>,
    front: usize,
    back: usize,
}

impl<T> Ring<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2, got {capacity}");
        Self {
            data: std::iter::repeat_with(|| None).take(capacity).collect(),
            front: 0,
            back: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        (self.back + self.capacity() - self.front) % self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    pub fn can_push(&self) -> bool {
        self.front != self.increment(self.back)
    }

    pub fn can_pop(&self) -> bool {
        !self.is_empty()
    }

    pub fn push_back(&mut self, value: T) {
        assert!(self.can_push(), "push_back on a full ring");
        self.back = self.increment(self.back);
        self.data[self.back] = Some(value);
    }

    pub fn push_front(&mut self, value: T) {
        assert!(self.can_push(), "push_front on a full ring");
        self.data[self.front] = Some(value);
        self.front = self.decrement(self.front);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if !self.can_pop() {
            return None;
        }
        self.front = self.increment(self.front);
        self.data[self.front].take()
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if !self.can_pop() {
            return None;
        }
        let value = self.data[self.back].take();
        self.back = self.decrement(self.back);
        value
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.data[self.increment(self.front)].as_ref()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        let index = self.increment(self.front);
        self.data[index].as_mut()
    }

    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.data[self.back].as_ref()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        self.data[self.back].as_mut()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ring: self,
            index: self.front,
            remaining: self.len(),
        }
    }

    fn increment(&self, index: usize) -> usize {
        if index + 1 == self.capacity() {
            0
        } else {
            index + 1
        }
    }

    fn decrement(&self, index: usize) -> usize {
        if index == 0 {
            self.capacity() - 1
        } else {
            index - 1
        }
    }
}

/// Forward iterator over a single ring, front to back.
#[derive(Debug)]
pub struct Iter<'a, T> {
    ring: &'a Ring<T>,
    index: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.index = self.ring.increment(self.index);
        self.remaining -= 1;
        self.ring.data[self.index].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ring: self.ring,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_slot() {
        let mut ring = Ring::new(4);
        assert!(ring.is_empty());
        assert!(ring.can_push());

        ring.push_back(1);
        ring.push_back(2);
        ring.push_back(3);

        // Capacity 4 only ever holds 3 elements
        assert_eq!(ring.len(), 3);
        assert!(!ring.can_push());
        assert!(ring.can_pop());
    }

    #[test]
    #[should_panic(expected = "full ring")]
    fn test_push_on_full_ring_panics() {
        let mut ring = Ring::new(2);
        ring.push_back(1);
        ring.push_front(0);
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn test_capacity_too_small() {
        let _ = Ring::<u8>::new(1);
    }

    #[test]
    fn test_wraps_around() {
        let mut ring = Ring::new(4);
        for round in 0..10 {
            ring.push_back(round);
            ring.push_back(round + 100);
            assert_eq!(ring.pop_front(), Some(round));
            assert_eq!(ring.pop_front(), Some(round + 100));
            assert!(ring.is_empty());
        }
        assert_eq!(ring.pop_front(), None);
    }

    #[test]
    fn test_both_ends() {
        let mut ring = Ring::new(8);
        ring.push_back(2);
        ring.push_front(1);
        ring.push_back(3);
        ring.push_front(0);

        assert_eq!(ring.front(), Some(&0));
        assert_eq!(ring.back(), Some(&3));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        assert_eq!(ring.pop_back(), Some(3));
        assert_eq!(ring.pop_front(), Some(0));
        assert_eq!(ring.len(), 2);

        if let Some(front) = ring.front_mut() {
            *front = 10;
        }
        assert_eq!(ring.front(), Some(&10));
        assert_eq!(ring.back(), Some(&2));
    }

    #[test]
    fn test_pop_clears_slot() {
        use std::rc::Rc;

        let value = Rc::new(());
        let mut ring = Ring::new(4);
        ring.push_back(Rc::clone(&value));
        assert_eq!(Rc::strong_count(&value), 2);

        drop(ring.pop_front());
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_iter_len() {
        let mut ring = Ring::new(5);
        ring.push_front(1);
        ring.push_front(0);
        ring.push_back(2);

        let iter = ring.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.collect::<Vec<_>>(), vec![&0, &1, &2]);
    }
}
