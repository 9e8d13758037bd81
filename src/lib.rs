//! A double-ended queue built from a chain of fixed-size rings that hands
//! back over-provisioned storage after a burst has drained.

pub mod bounded_vec;
pub mod clock;
pub mod config;
pub mod deque;
pub mod report;
pub mod ring;
pub mod workload;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DequeConfig;
pub use deque::{LazilyDeallocatedDeque, ShrinkState};
