//! All code relating to individual clock states is behind this module and
//! enforces unrepresentable states : a frame can only advance through a
//! `ClockState<Running>`, and only the transitions below reach one.
//!
//! ┌──────────────── State Transition Flow ──────────────────┐
//! │  From State  →  Event         →  To State               │
//! ├─────────────────────────────────────────────────────────┤
//! │  Idle        →  Start         →  Running (frame 0)      │
//! │  Running     →  Stop          →  Idle    (frame 0)      │
//! │  Running     →  Tick/Advance  →  Running (frame + n)    │
//! │  Running     →  ChangeAction  →  Running (frame 0)      │
//! │  Idle        →  ChangeAction  →  Idle    (frame 0)      │
//! └─────────────────────────────────────────────────────────┘

use super::speed::ClickRate;
use crate::config::SpeedConfig;

#[derive(Debug, Copy, Clone)]
pub struct Idle;

#[derive(Debug, Copy, Clone)]
pub struct Running;

/// Shared data for every state
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClockContext {
    pub frame: usize,
    pub frame_length: usize,
    /// Milliseconds accumulated towards the next tick
    pub elapsed: f64,
}

impl ClockContext {
    fn new(frame_length: usize) -> Self {
        ClockContext {
            frame: 0,
            frame_length: frame_length.max(1),
            elapsed: 0.0,
        }
    }

    fn tick(self) -> Self {
        self.advance_frames(1)
    }

    fn advance_frames(mut self, frames: usize) -> Self {
        self.frame = (self.frame + frames % self.frame_length) % self.frame_length;
        self
    }

    /// Reset to frame 0 on every transition : each action has its own frame
    /// count, so a frame carried over could index past the new sheet.
    fn on_state_transition(mut self) -> Self {
        self.frame = 0;
        self.elapsed = 0.0;
        self
    }

    fn with_frame_length(mut self, frame_length: usize) -> Self {
        self.frame_length = frame_length.max(1);
        self
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ClockState<S> {
    context: ClockContext,
    // phantom marker : differentiates states at compile time, never read
    _state: S,
}

impl<S> ClockState<S> {
    pub fn context(&self) -> &ClockContext {
        &self.context
    }
}

impl ClockState<Idle> {
    pub fn new(frame_length: usize) -> Self {
        ClockState {
            context: ClockContext::new(frame_length),
            _state: Idle,
        }
    }

    pub fn start(self) -> ClockState<Running> {
        ClockState {
            context: self.context.on_state_transition(),
            _state: Running,
        }
    }

    pub fn change_action(self, frame_length: usize) -> Self {
        ClockState {
            context: self
                .context
                .on_state_transition()
                .with_frame_length(frame_length),
            _state: Idle,
        }
    }
}

impl ClockState<Running> {
    pub fn tick(mut self) -> Self {
        self.context = self.context.tick();
        self
    }

    /// Accumulates `elapsed` ms and issues one tick per whole `interval`
    pub fn advance(mut self, elapsed: f64, interval: f64) -> Self {
        let interval = interval.max(1.0);
        let accumulated = self.context.elapsed + elapsed.max(0.0);
        let ticks = (accumulated / interval).floor();
        self.context.elapsed = accumulated - ticks * interval;
        self.context = self.context.advance_frames(ticks as usize);
        self
    }

    pub fn stop(self) -> ClockState<Idle> {
        ClockState {
            context: self.context.on_state_transition(),
            _state: Idle,
        }
    }

    /// Restarts the timer at frame 0 with the new action's frame count
    pub fn change_action(self, frame_length: usize) -> Self {
        ClockState {
            context: self
                .context
                .on_state_transition()
                .with_frame_length(frame_length),
            _state: Running,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Event {
    Start,
    Stop,
    Tick,
    Advance { elapsed: f64, interval: f64 },
    ChangeAction(usize),
}

#[derive(Debug, Copy, Clone)]
pub enum ClockMachine {
    Idle(ClockState<Idle>),
    Running(ClockState<Running>),
}

impl From<ClockState<Idle>> for ClockMachine {
    fn from(state: ClockState<Idle>) -> Self {
        ClockMachine::Idle(state)
    }
}

impl From<ClockState<Running>> for ClockMachine {
    fn from(state: ClockState<Running>) -> Self {
        ClockMachine::Running(state)
    }
}

impl ClockMachine {
    /// Consumes the current state and returns the next one; events a state
    /// doesn't handle leave it unchanged (Tick while Idle, Start while Running)
    pub fn transition(self, event: Event) -> Self {
        use ClockMachine::*;
        match (self, event) {
            (Idle(state), Event::Start) => state.start().into(),
            (Idle(state), Event::ChangeAction(length)) => state.change_action(length).into(),
            (Running(state), Event::Stop) => state.stop().into(),
            (Running(state), Event::Tick) => state.tick().into(),
            (Running(state), Event::Advance { elapsed, interval }) => {
                state.advance(elapsed, interval).into()
            }
            (Running(state), Event::ChangeAction(length)) => state.change_action(length).into(),
            _ => self,
        }
    }

    pub fn context(&self) -> &ClockContext {
        match self {
            ClockMachine::Idle(state) => state.context(),
            ClockMachine::Running(state) => state.context(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ClockMachine::Running(_))
    }
}

/// Frame index generator for one on-screen character.
///
/// Owns the state machine plus the click-rate speed that sets its tick
/// interval. Nothing here reads a real clock : callers pass the timestamps
/// (requestAnimationFrame's in the browser, made-up ones in tests).
#[derive(Debug, Clone)]
pub struct AnimationClock {
    state: ClockMachine,
    speed: ClickRate,
    last_time: Option<f64>,
}

impl AnimationClock {
    pub fn new(frame_length: usize, config: SpeedConfig) -> Self {
        AnimationClock {
            state: ClockState::new(frame_length).into(),
            speed: ClickRate::new(config),
            last_time: None,
        }
    }

    pub fn frame(&self) -> usize {
        self.state.context().frame
    }

    pub fn frame_length(&self) -> usize {
        self.state.context().frame_length
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Milliseconds per frame right now
    pub fn speed(&self) -> f64 {
        self.speed.speed()
    }

    pub fn start(&mut self) {
        self.state = self.state.transition(Event::Start);
    }

    pub fn stop(&mut self) {
        self.state = self.state.transition(Event::Stop);
    }

    /// Edge triggered : only a change of the flag starts or stops the clock
    pub fn set_animating(&mut self, animating: bool) {
        match (animating, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// New action : back to frame 0 and base speed, timer restarted if running
    pub fn set_action(&mut self, frame_length: usize) {
        self.state = self.state.transition(Event::ChangeAction(frame_length));
        self.speed.reset();
    }

    pub fn tick(&mut self) {
        self.state = self.state.transition(Event::Tick);
    }

    pub fn set_speed(&mut self, speed_ms: f64) {
        self.speed.set_speed(speed_ms);
    }

    pub fn record_click(&mut self, now: f64) -> f64 {
        self.speed.record(now)
    }

    /// Moves the virtual timer to `now`. Fires the speed decay when due and
    /// issues as many ticks as whole intervals have passed. Returns true when
    /// the frame changed.
    pub fn advance_to(&mut self, now: f64) -> bool {
        self.speed.poll(now);
        let Some(last) = self.last_time.replace(now) else {
            return false;
        };
        let before = self.frame();
        self.state = self.state.transition(Event::Advance {
            elapsed: now - last,
            interval: self.speed.speed(),
        });
        self.frame() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn running_clock(frame_length: usize) -> AnimationClock {
        let mut clock = AnimationClock::new(frame_length, SpeedConfig::default());
        clock.start();
        clock
    }

    #[test]
    fn idle_clock_is_pinned_at_zero() {
        let mut clock = AnimationClock::new(5, SpeedConfig::default());
        clock.tick();
        clock.advance_to(0.0);
        clock.advance_to(10_000.0);
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn frame_wraps_once_per_cycle() {
        let mut clock = running_clock(5);
        let mut wraps = 0;
        for _ in 0..15 {
            clock.tick();
            if clock.frame() == 0 {
                wraps += 1;
            }
            assert!(clock.frame() < 5);
        }
        assert_eq!(wraps, 3);
    }

    #[test]
    fn stopping_mid_cycle_resets_and_halts() {
        let mut clock = running_clock(5);
        for _ in 0..3 {
            clock.tick();
        }
        assert_eq!(clock.frame(), 3);

        clock.set_animating(false);
        assert_eq!(clock.frame(), 0);

        clock.tick();
        clock.advance_to(0.0);
        clock.advance_to(1_000.0);
        assert_eq!(clock.frame(), 0);

        clock.set_animating(true);
        clock.tick();
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn advance_ticks_once_per_interval() {
        let mut clock = running_clock(10);
        assert!(!clock.advance_to(0.0));
        assert!(!clock.advance_to(69.0));
        assert!(clock.advance_to(70.0));
        assert_eq!(clock.frame(), 1);

        clock.advance_to(70.0 + 3.0 * 70.0);
        assert_eq!(clock.frame(), 4);
    }

    #[test]
    fn long_pause_wraps_without_overflow() {
        let mut clock = running_clock(4);
        clock.advance_to(0.0);
        clock.advance_to(70.0 * 4.0 * 1_000.0 + 70.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn clicks_shorten_the_interval_then_decay() {
        let mut clock = running_clock(100);
        clock.advance_to(0.0);
        for i in 0..10 {
            clock.record_click(i as f64 * 10.0);
        }
        let fast = clock.speed();
        assert!(fast < 70.0);

        clock.advance_to(fast * 2.0);
        assert_eq!(clock.frame(), 2);

        clock.advance_to(90.0 + 1_500.0);
        assert_relative_eq!(clock.speed(), 70.0);
    }

    #[test]
    fn action_change_resets_frame_and_speed_but_keeps_running() {
        let mut clock = running_clock(10);
        clock.record_click(0.0);
        clock.tick();
        clock.tick();

        clock.set_action(6);
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.frame_length(), 6);
        assert!(clock.is_running());
        assert_relative_eq!(clock.speed(), 70.0);
    }

    #[test]
    fn start_while_running_does_not_rewind() {
        let mut clock = running_clock(10);
        clock.tick();
        clock.set_animating(true);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn unhandled_events_keep_state() {
        let machine: ClockMachine = ClockState::new(3).into();
        let machine = machine.transition(Event::Tick).transition(Event::Stop);
        assert!(!machine.is_running());
        assert_eq!(machine.context().frame, 0);
    }
}
