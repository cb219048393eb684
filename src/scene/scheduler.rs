//! The per-frame loop, as a two-state machine.
//!
//! The scheduler doesn't own a thread or a timer. It models the host's
//! "call me on the next display refresh" primitive with [FrameToken]s: each
//! armed frame has a token, the host hands it back when the frame arrives,
//! and only the currently armed token is honored. Stopping drops the armed
//! token, so a frame the host had already queued turns into a no-op.

use std::convert::TryFrom;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Source of wall-clock time.
pub trait Clock {
    /// Time since some fixed, arbitrary origin. Must never go backwards.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saturates at `u64::MAX` nanoseconds, some 584 years in.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |nanos| {
                Some(nanos.saturating_add(by))
            });
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Registration for one pending frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl fmt::Display for FrameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

pub struct FpsCounter {
    window_start: Duration,
    counter: usize,
    window: Duration,
    previous_fps: f64,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        FpsCounter {
            window_start: Duration::ZERO,
            counter: 0,
            window,
            previous_fps: 0.0,
        }
    }

    pub fn reset(&mut self, now: Duration) {
        self.window_start = now;
        self.counter = 0;
    }

    pub fn value(&self) -> f64 {
        self.previous_fps
    }

    pub fn increment(&mut self, now: Duration) {
        self.counter += 1;

        let elapsed = now.saturating_sub(self.window_start);
        if elapsed > self.window {
            self.previous_fps = self.counter as f64 / elapsed.as_secs_f64();
            self.reset(now);
        }
    }
}

pub struct AnimationScheduler {
    clock: Box<dyn Clock>,
    state: SchedulerState,
    pending: Option<FrameToken>,
    next_token: u64,
    // Clock reading that corresponds to elapsed == 0
    started_at: Duration,
    elapsed: f64,
    ticks: u64,
    fps_counter: FpsCounter,
}

impl AnimationScheduler {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        AnimationScheduler {
            clock,
            state: SchedulerState::Stopped,
            pending: None,
            next_token: 0,
            started_at: Duration::ZERO,
            elapsed: 0.0,
            ticks: 0,
            fps_counter: FpsCounter::new(Duration::from_secs(1)),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Seconds of animation so far. Never decreases.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn fps(&self) -> f64 {
        self.fps_counter.value()
    }

    /// The frame currently armed, if any.
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    fn arm(&mut self) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        token
    }

    /// Stopped -> Running, arming the first frame. Starting a running
    /// scheduler does nothing and returns `None`: there is only ever one
    /// loop.
    pub fn start(&mut self) -> Option<FrameToken> {
        if self.is_running() {
            warn!("scheduler already running; not starting a second loop");
            return None;
        }

        // Pick up where we left off, so elapsed time stays monotonic
        let now = self.clock.now();
        self.started_at = now.saturating_sub(Duration::from_secs_f64(self.elapsed));
        self.fps_counter.reset(now);
        self.state = SchedulerState::Running;
        let token = self.arm();
        debug!("scheduler started, first {}", token);
        Some(token)
    }

    /// Running -> Stopped, cancelling the armed frame. Stopping a stopped
    /// scheduler is fine and does nothing.
    pub fn stop(&mut self) {
        if let Some(token) = self.pending.take() {
            debug!("cancelled {}", token);
        }
        if self.is_running() {
            debug!("scheduler stopped after {} ticks", self.ticks);
        }
        self.state = SchedulerState::Stopped;
    }

    /// Runs one frame if `token` is the armed one: advances elapsed time,
    /// calls `frame` with it, then arms and returns the next token. Stale or
    /// cancelled tokens are ignored and yield `None`.
    pub fn tick<F>(&mut self, token: FrameToken, frame: F) -> Option<FrameToken>
    where
        F: FnOnce(f64),
    {
        if !self.is_running() || self.pending != Some(token) {
            debug!("ignoring stale {}", token);
            return None;
        }
        self.pending = None;

        let now = self.clock.now();
        let since_start = now.saturating_sub(self.started_at).as_secs_f64();
        self.elapsed = f64::max(self.elapsed, since_start);
        self.ticks += 1;
        self.fps_counter.increment(now);

        frame(self.elapsed);

        // The frame callback can't reach the scheduler, so we're still
        // running here; re-arm.
        Some(self.arm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (AnimationScheduler, ManualClock) {
        let clock = ManualClock::new();
        (AnimationScheduler::new(Box::new(clock.clone())), clock)
    }

    #[test]
    fn test_start_stop() {
        let (mut s, _) = scheduler();
        assert_eq!(s.state(), SchedulerState::Stopped);

        let token = s.start().unwrap();
        assert!(s.is_running());
        assert_eq!(s.pending(), Some(token));

        s.stop();
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.pending(), None);

        // Second stop is a no-op
        s.stop();
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.pending(), None);
    }

    #[test]
    fn test_single_loop() {
        let (mut s, _) = scheduler();
        let first = s.start().unwrap();
        assert!(s.start().is_none());
        assert_eq!(s.pending(), Some(first));

        // Only one token is ever live, so only one frame runs per refresh
        let mut runs = 0;
        let next = s.tick(first, |_| runs += 1).unwrap();
        assert!(s.tick(first, |_| runs += 1).is_none());
        assert_eq!(runs, 1);
        assert_eq!(s.pending(), Some(next));
    }

    #[test]
    fn test_stop_cancels_queued_frame() {
        let (mut s, _) = scheduler();
        let token = s.start().unwrap();
        s.stop();

        let mut ran = false;
        assert!(s.tick(token, |_| ran = true).is_none());
        assert!(!ran);

        // A restart doesn't resurrect old tokens either
        let fresh = s.start().unwrap();
        assert_ne!(fresh, token);
        assert!(s.tick(token, |_| ran = true).is_none());
        assert!(!ran);
    }

    #[test]
    fn test_elapsed_follows_clock() {
        let (mut s, clock) = scheduler();
        clock.advance_secs(100.0); // time before start doesn't count
        let mut token = s.start().unwrap();

        let mut seen = vec![];
        for dt in [0.0, 0.016, 0.5, 0.016].iter() {
            clock.advance_secs(*dt);
            token = s.tick(token, |t| seen.push(t)).unwrap();
        }

        approx::assert_abs_diff_eq!(seen[0], 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(seen[1], 0.016, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(seen[2], 0.516, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(seen[3], 0.532, epsilon = 1e-9);
        assert_eq!(s.ticks(), 4);
    }

    #[test]
    fn test_elapsed_survives_restart() {
        let (mut s, clock) = scheduler();
        let token = s.start().unwrap();
        clock.advance_secs(2.0);
        s.tick(token, |_| {});
        s.stop();

        clock.advance_secs(10.0);
        let token = s.start().unwrap();
        clock.advance_secs(1.0);
        let mut elapsed = 0.0;
        s.tick(token, |t| elapsed = t);
        approx::assert_abs_diff_eq!(elapsed, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));

        // Too many nanoseconds for a u64; used to wrap around to a small value
        clock.advance(Duration::from_secs(u64::MAX));
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn test_fps() {
        let mut counter = FpsCounter::new(Duration::from_secs(1));
        let mut now = Duration::ZERO;
        for _ in 0..121 {
            now += Duration::from_millis(10);
            counter.increment(now);
        }
        approx::assert_relative_eq!(counter.value(), 100.0, max_relative = 0.02);
    }
}
