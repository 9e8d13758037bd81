//! Scripted workloads and the simulator that drives a deque through them.

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::bounded_vec::BoundedVec;
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::DequeConfig;
use crate::deque::{LazilyDeallocatedDeque, ShrinkState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Phase {
    PushBack { count: usize },
    PushFront { count: usize },
    PopFront { count: usize },
    PopBack { count: usize },
    Idle { millis: u64 },
    Shrink,
}

impl Phase {
    pub fn label(&self) -> String {
        match self {
            Phase::PushBack { count } => format!("push_back x{count}"),
            Phase::PushFront { count } => format!("push_front x{count}"),
            Phase::PopFront { count } => format!("pop_front x{count}"),
            Phase::PopBack { count } => format!("pop_back x{count}"),
            Phase::Idle { millis } => format!("idle {millis}ms"),
            Phase::Shrink => "shrink".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    /// Deque tuning carried by the workload file; command line flags win.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<DequeConfig>,
    pub phases: Vec<Phase>,
}

impl Workload {
    /// Fill up, drain almost everything, then give the shrink heuristic
    /// enough idle time to reclaim the burst's storage.
    pub fn burst_then_drain() -> Self {
        Self {
            name: "burst-then-drain".to_string(),
            config: None,
            phases: vec![
                Phase::PushBack { count: 1000 },
                Phase::PopFront { count: 990 },
                Phase::Shrink,
                Phase::Idle { millis: 6000 },
                Phase::Shrink,
            ],
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading workload {}", path.display()))?;
        let workload: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parsing workload {}", path.display()))?;
        workload.validate()?;
        Ok(workload)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects workloads that would pop from an empty deque.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.phases.is_empty(), "workload '{}' has no phases", self.name);
        if let Some(config) = &self.config {
            config.validate()?;
        }

        let mut queued = 0usize;
        for (index, phase) in self.phases.iter().enumerate() {
            match phase {
                Phase::PushBack { count } | Phase::PushFront { count } => {
                    queued = queued.checked_add(*count).with_context(|| {
                        format!(
                            "phase {index} ({}) would queue more than {} elements",
                            phase.label(),
                            usize::MAX
                        )
                    })?;
                }
                Phase::PopFront { count } | Phase::PopBack { count } => {
                    ensure!(
                        *count <= queued,
                        "phase {index} ({}) pops {count} elements but at most {queued} are queued",
                        phase.label()
                    );
                    queued -= count;
                }
                Phase::Idle { .. } | Phase::Shrink => {}
            }
        }
        Ok(())
    }
}

/// Deque state captured after a phase or an idle tick.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub phase: String,
    pub len: usize,
    pub capacity: usize,
    pub max_size: usize,
    pub rings: usize,
    pub state: ShrinkState,
    pub shrunk: bool,
}

pub struct Simulator<C: Clock> {
    deque: LazilyDeallocatedDeque<u64, C>,
    history: BoundedVec<Sample>,
    update_interval: Duration,
    manual_clock: Option<ManualClock>,
    started: Instant,
    started_at: DateTime<Utc>,
    next_value: u64,
}

impl Simulator<SystemClock> {
    /// Idle phases really sleep.
    pub fn realtime(config: DequeConfig, update_interval: Duration, history: usize) -> Result<Self> {
        Self::build(config, SystemClock, None, update_interval, history)
    }
}

impl Simulator<ManualClock> {
    /// Idle phases advance a manual clock instead of sleeping.
    pub fn simulated(config: DequeConfig, update_interval: Duration, history: usize) -> Result<Self> {
        let clock = ManualClock::new();
        Self::build(config, clock.clone(), Some(clock), update_interval, history)
    }
}

impl<C: Clock> Simulator<C> {
    fn build(
        config: DequeConfig,
        clock: C,
        manual_clock: Option<ManualClock>,
        update_interval: Duration,
        history: usize,
    ) -> Result<Self> {
        config.validate()?;
        ensure!(!update_interval.is_zero(), "update interval must be non-zero");
        ensure!(history > 0, "history must keep at least one sample");

        let started = clock.now();
        Ok(Self {
            deque: LazilyDeallocatedDeque::with_clock(config, clock),
            history: BoundedVec::new(history),
            update_interval,
            manual_clock,
            started,
            started_at: Utc::now(),
            next_value: 0,
        })
    }

    pub fn deque(&self) -> &LazilyDeallocatedDeque<u64, C> {
        &self.deque
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.history.to_vec()
    }

    pub async fn run(&mut self, workload: &Workload) -> Result<()> {
        workload.validate()?;
        log::info!(
            "running workload '{}' ({} phases)",
            workload.name,
            workload.phases.len()
        );

        for phase in &workload.phases {
            log::debug!("phase: {}", phase.label());
            match phase {
                Phase::PushBack { count } => {
                    for _ in 0..*count {
                        let value = self.next_value();
                        self.deque.push_back(value);
                    }
                    self.record(phase.label(), false);
                }
                Phase::PushFront { count } => {
                    for _ in 0..*count {
                        let value = self.next_value();
                        self.deque.push_front(value);
                    }
                    self.record(phase.label(), false);
                }
                Phase::PopFront { count } => {
                    let popped = (0..*count)
                        .take_while(|_| self.deque.pop_front().is_some())
                        .count();
                    ensure!(popped == *count, "deque ran dry during {}", phase.label());
                    self.record(phase.label(), false);
                }
                Phase::PopBack { count } => {
                    let popped = (0..*count)
                        .take_while(|_| self.deque.pop_back().is_some())
                        .count();
                    ensure!(popped == *count, "deque ran dry during {}", phase.label());
                    self.record(phase.label(), false);
                }
                Phase::Idle { millis } => self.idle(Duration::from_millis(*millis)).await,
                Phase::Shrink => {
                    let shrunk = self.deque.maybe_shrink();
                    self.record(phase.label(), shrunk);
                }
            }
        }

        self.history.compact();
        Ok(())
    }

    /// Waits out `duration` in `update_interval` ticks, giving the deque a
    /// chance to shrink on each one.
    async fn idle(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let step = remaining.min(self.update_interval);
            match &self.manual_clock {
                Some(clock) => clock.advance(step),
                None => tokio::time::sleep(step).await,
            }
            remaining -= step;

            let shrunk = self.deque.maybe_shrink();
            if shrunk {
                log::info!("reclaimed storage, capacity now {}", self.deque.capacity());
            }
            self.record("tick".to_string(), shrunk);
        }
    }

    fn next_value(&mut self) -> u64 {
        let value = self.next_value;
        self.next_value += 1;
        value
    }

    fn record(&mut self, phase: String, shrunk: bool) {
        let elapsed = self.deque.clock().now().saturating_duration_since(self.started);
        let timestamp = self.started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        self.history.push(Sample {
            timestamp,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            phase,
            len: self.deque.len(),
            capacity: self.deque.capacity(),
            max_size: self.deque.max_size(),
            rings: self.deque.ring_count(),
            state: self.deque.shrink_state(),
            shrunk,
        });
    }
}
