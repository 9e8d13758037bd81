//! Double-ended queue backed by a chain of fixed-size rings.
//!
//! Rings are only released when they are drained from either end, so a
//! burst followed by a drain can leave a lot of capacity behind. Owners are
//! expected to call [`LazilyDeallocatedDeque::maybe_shrink`] periodically to
//! hand that memory back; the call is rate limited and only reallocates once
//! a whole evaluation window has stayed well below the current capacity.

use std::collections::vec_deque;
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::DequeConfig;
use crate::ring::{self, Ring};

/// Where the shrink heuristic stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkState {
    /// `max_size` covers everything since the last reallocation.
    Stable,
    /// An evaluation found the storage in use and opened a fresh window; the
    /// next eligible evaluation decides using only that window's peak.
    PendingConfirm,
}

impl ShrinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShrinkState::Stable => "stable",
            ShrinkState::PendingConfirm => "pending",
        }
    }
}

pub struct LazilyDeallocatedDeque<T, C: Clock = SystemClock> {
    rings: VecDeque<Ring<T>>,
    size: usize,
    max_size: usize,
    next_shrink: Option<Instant>,
    shrink_state: ShrinkState,
    config: DequeConfig,
    clock: C,
}

impl<T> LazilyDeallocatedDeque<T> {
    pub fn new() -> Self {
        Self::with_config(DequeConfig::default())
    }

    pub fn with_config(config: DequeConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<T, C: Clock> LazilyDeallocatedDeque<T, C> {
    /// Panics if `config` does not pass [`DequeConfig::validate`].
    pub fn with_clock(config: DequeConfig, clock: C) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid deque config: {e}");
        }
        Self {
            rings: VecDeque::new(),
            size: 0,
            max_size: 0,
            next_shrink: None,
            shrink_state: ShrinkState::Stable,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &DequeConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// High-water mark of `len()` since the last shrink evaluation.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Total slots across every allocated ring, reserved slots included.
    pub fn capacity(&self) -> usize {
        self.rings.iter().map(Ring::capacity).sum()
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn shrink_state(&self) -> ShrinkState {
        self.shrink_state
    }

    pub fn push_back(&mut self, value: T) {
        let needs_ring = self.rings.back().map_or(true, |ring| !ring.can_push());
        if needs_ring {
            let capacity = self
                .rings
                .back()
                .map_or(0, |ring| ring.capacity() * 2)
                .max(self.config.min_ring_size);
            log::trace!("appending ring of capacity {capacity} at size {}", self.size);
            self.rings.push_back(Ring::new(capacity));
        }
        if let Some(ring) = self.rings.back_mut() {
            ring.push_back(value);
        }
        self.grew();
    }

    /// Front growth always uses the minimum ring size; queues are expected
    /// to grow at the back.
    pub fn push_front(&mut self, value: T) {
        let needs_ring = self.rings.front().map_or(true, |ring| !ring.can_push());
        if needs_ring {
            let capacity = self.config.min_ring_size;
            log::trace!("prepending ring of capacity {capacity} at size {}", self.size);
            self.rings.push_front(Ring::new(capacity));
        }
        if let Some(ring) = self.rings.front_mut() {
            ring.push_front(value);
        }
        self.grew();
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let ring = self.rings.front_mut()?;
        let value = ring.pop_front()?;
        // The last ring is kept around for the next push.
        if ring.is_empty() && self.rings.len() > 1 {
            if let Some(drained) = self.rings.pop_front() {
                log::trace!("released front ring of capacity {}", drained.capacity());
            }
        }
        self.size -= 1;
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let ring = self.rings.back_mut()?;
        let value = ring.pop_back()?;
        if ring.is_empty() && self.rings.len() > 1 {
            if let Some(drained) = self.rings.pop_back() {
                log::trace!("released back ring of capacity {}", drained.capacity());
            }
        }
        self.size -= 1;
        Some(value)
    }

    pub fn front(&self) -> Option<&T> {
        self.rings.front().and_then(Ring::front)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.rings.front_mut().and_then(Ring::front_mut)
    }

    pub fn back(&self) -> Option<&T> {
        self.rings.back().and_then(Ring::back)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.rings.back_mut().and_then(Ring::back_mut)
    }

    /// Moves every element, in order, into a single ring of `new_capacity`
    /// slots.
    ///
    /// Panics unless `new_capacity > len()`, since one slot stays reserved.
    pub fn set_capacity(&mut self, new_capacity: usize) {
        assert!(
            new_capacity > self.size,
            "capacity {new_capacity} cannot hold {} elements",
            self.size
        );
        let mut replacement = Ring::new(new_capacity);
        for mut ring in self.rings.drain(..) {
            while let Some(value) = ring.pop_front() {
                replacement.push_back(value);
            }
        }
        self.rings.push_back(replacement);
    }

    /// Reallocates down to fit the recent high-water mark if the storage has
    /// been oversized for a whole evaluation window.
    ///
    /// Each call closes the current window. After a reallocation further
    /// calls are no-ops until `shrink_interval` has passed. Returns true when
    /// the storage was reallocated.
    pub fn maybe_shrink(&mut self) -> bool {
        if self.rings.is_empty() {
            return false;
        }

        let now = self.clock.now();
        if self.next_shrink.is_some_and(|next| now < next) {
            return false;
        }

        let target = (self.max_size + 1).max(self.config.min_ring_size);
        let window_peak = self.max_size;
        self.max_size = self.size;

        let capacity = self.capacity();
        if target + self.config.reclaim_threshold >= capacity {
            log::debug!(
                "keeping capacity {capacity}: window peak {window_peak} needs {target} slots"
            );
            self.shrink_state = ShrinkState::PendingConfirm;
            return false;
        }

        log::debug!("shrinking capacity {capacity} -> {target} (window peak {window_peak})");
        self.set_capacity(target);
        self.next_shrink = Some(now + self.config.shrink_interval);
        self.shrink_state = ShrinkState::Stable;
        true
    }

    pub fn clear(&mut self) {
        self.rings.clear();
        self.size = 0;
        self.max_size = 0;
        self.shrink_state = ShrinkState::Stable;
    }

    /// Exchanges contents and shrink bookkeeping; each side keeps its own
    /// clock and config.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.rings, &mut other.rings);
        std::mem::swap(&mut self.size, &mut other.size);
        std::mem::swap(&mut self.max_size, &mut other.max_size);
        std::mem::swap(&mut self.next_shrink, &mut other.next_shrink);
        std::mem::swap(&mut self.shrink_state, &mut other.shrink_state);
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            rings: self.rings.iter(),
            current: None,
            remaining: self.size,
        }
    }

    fn grew(&mut self) {
        self.size += 1;
        self.max_size = self.max_size.max(self.size);
    }
}

impl<T, C: Clock + Default> Default for LazilyDeallocatedDeque<T, C> {
    fn default() -> Self {
        Self::with_clock(DequeConfig::default(), C::default())
    }
}

impl<T: fmt::Debug, C: Clock> fmt::Debug for LazilyDeallocatedDeque<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, C: Clock> Extend<T> for LazilyDeallocatedDeque<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T, C: Clock + Default> FromIterator<T> for LazilyDeallocatedDeque<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::default();
        deque.extend(iter);
        deque
    }
}

/// Forward iterator over the whole chain in logical order.
pub struct Iter<'a, T> {
    rings: vec_deque::Iter<'a, Ring<T>>,
    current: Option<ring::Iter<'a, T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.current.as_mut().and_then(|ring| ring.next()) {
                self.remaining -= 1;
                return Some(value);
            }
            self.current = Some(self.rings.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T, C: Clock> IntoIterator for &'a LazilyDeallocatedDeque<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator; drains from the front.
pub struct IntoIter<T, C: Clock> {
    deque: LazilyDeallocatedDeque<T, C>,
}

impl<T, C: Clock> Iterator for IntoIter<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T, C: Clock> ExactSizeIterator for IntoIter<T, C> {}

impl<T, C: Clock> IntoIterator for LazilyDeallocatedDeque<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}
