//! Indicator State Machine

use crate::led::Led;
use crate::palette::{Palette, Pattern, Rgb};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a dropped batch is shown before returning to `Waiting`
pub const DEFAULT_ERROR_DWELL: Duration = Duration::from_secs(1);

const SLOW_BLINK: Duration = Duration::from_millis(500);
const FAST_BLINK: Duration = Duration::from_millis(250);

/// Indicator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Init,
    Connecting,
    Waiting,
    Receiving,
    Sending,
    Error,
}

impl LedState {
    /// Drawing pattern for this state
    pub fn pattern(&self, palette: &Palette) -> Pattern {
        match self {
            LedState::Init => Pattern::Solid(palette.alert),
            LedState::Connecting => Pattern::Blink {
                colour: palette.connecting,
                half_period: SLOW_BLINK,
            },
            LedState::Waiting => Pattern::Solid(palette.waiting),
            LedState::Receiving => Pattern::Solid(palette.receiving),
            LedState::Sending => Pattern::Blink {
                colour: palette.sending,
                half_period: FAST_BLINK,
            },
            LedState::Error => Pattern::Blink {
                colour: palette.alert,
                half_period: FAST_BLINK,
            },
        }
    }
}

/// Snapshot of the pipeline taken once per producer tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineView {
    /// Consumer is transmitting
    pub sending: bool,
    /// A batch was dropped and not yet surfaced
    pub batch_dropped: bool,
    /// Sensor bytes arrived this tick
    pub receiving: bool,
}

/// Outcome of one evaluation of the selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: LedState,
    /// The drop has been shown for the full dwell and its flag may be cleared
    pub clear_drop: bool,
}

/// Pick the next state. Priority: sending, dropped batch, receiving, waiting.
pub fn next_state(
    current: LedState,
    entered_at: Instant,
    view: PipelineView,
    now: Instant,
    error_dwell: Duration,
) -> Transition {
    let next = |next| Transition {
        next,
        clear_drop: false,
    };

    if view.sending {
        return next(LedState::Sending);
    }

    if view.batch_dropped {
        if current != LedState::Error {
            return next(LedState::Error);
        }
        if now.saturating_duration_since(entered_at) >= error_dwell {
            return Transition {
                next: LedState::Waiting,
                clear_drop: true,
            };
        }
        return next(LedState::Error);
    }

    if view.receiving {
        next(LedState::Receiving)
    } else {
        next(LedState::Waiting)
    }
}

/// Colour of `state` at `now`, given when the state was entered
pub fn render(state: LedState, entered_at: Instant, now: Instant, palette: &Palette) -> Rgb {
    match state.pattern(palette) {
        Pattern::Solid(colour) => colour,
        Pattern::Blink {
            colour,
            half_period,
        } => {
            let half = half_period.as_millis().max(1);
            let phase = now.saturating_duration_since(entered_at).as_millis() / half;
            if phase % 2 == 0 {
                colour
            } else {
                Rgb::OFF
            }
        }
    }
}

/// Drives an [`Led`] from the pipeline state
pub struct StatusIndicator<L> {
    led: L,
    palette: Palette,
    error_dwell: Duration,
    state: LedState,
    entered_at: Instant,
    shown: Option<Rgb>,
}

impl<L: Led> StatusIndicator<L> {
    /// Create an indicator in `Init` and light the LED
    pub fn new(led: L, palette: Palette, error_dwell: Duration) -> Self {
        let mut indicator = Self {
            led,
            palette,
            error_dwell,
            state: LedState::Init,
            entered_at: Instant::now(),
            shown: None,
        };
        indicator.refresh(indicator.entered_at);
        indicator
    }

    /// Switch state; re-entering the current state keeps its blink phase
    pub fn enter(&mut self, state: LedState, now: Instant) {
        if state != self.state {
            debug!("Status {:?} -> {:?}", self.state, state);
            self.state = state;
            self.entered_at = now;
        }
        self.refresh(now);
    }

    /// Redraw the LED if the rendered colour changed
    pub fn refresh(&mut self, now: Instant) {
        let colour = render(self.state, self.entered_at, now, &self.palette);
        if self.shown != Some(colour) {
            self.led.show(colour);
            self.shown = Some(colour);
        }
    }

    /// Apply the per-tick selection policy
    pub fn tick(&mut self, view: PipelineView, now: Instant) -> Transition {
        let transition = next_state(self.state, self.entered_at, view, now, self.error_dwell);
        self.enter(transition.next, now);
        transition
    }

    /// Current state
    pub fn state(&self) -> LedState {
        self.state
    }

    /// When the current state was entered
    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Output sink
    pub fn led(&self) -> &L {
        &self.led
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingLed {
        shown: Vec<Rgb>,
    }

    impl Led for RecordingLed {
        fn show(&mut self, colour: Rgb) {
            self.shown.push(colour);
        }
    }

    fn view(sending: bool, batch_dropped: bool, receiving: bool) -> PipelineView {
        PipelineView {
            sending,
            batch_dropped,
            receiving,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_sending_beats_dropped() {
        let t0 = Instant::now();
        let t = next_state(LedState::Waiting, t0, view(true, true, true), t0, DEFAULT_ERROR_DWELL);
        assert_eq!(t.next, LedState::Sending);
        assert!(!t.clear_drop);
    }

    #[test]
    fn test_priority_order() {
        let t0 = Instant::now();
        let dwell = DEFAULT_ERROR_DWELL;
        assert_eq!(next_state(LedState::Waiting, t0, view(false, true, true), t0, dwell).next, LedState::Error);
        assert_eq!(next_state(LedState::Waiting, t0, view(false, false, true), t0, dwell).next, LedState::Receiving);
        assert_eq!(next_state(LedState::Receiving, t0, view(false, false, false), t0, dwell).next, LedState::Waiting);
    }

    #[test]
    fn test_error_dwell_then_clear() {
        let t0 = Instant::now();
        let dwell = DEFAULT_ERROR_DWELL;
        let dropped = view(false, true, true);

        let held = next_state(LedState::Error, t0, dropped, t0 + ms(999), dwell);
        assert_eq!(held, Transition { next: LedState::Error, clear_drop: false });

        let expired = next_state(LedState::Error, t0, dropped, t0 + ms(1000), dwell);
        assert_eq!(expired, Transition { next: LedState::Waiting, clear_drop: true });
    }

    #[test]
    fn test_blink_rendering() {
        let palette = Palette::default();
        let t0 = Instant::now();

        assert_eq!(render(LedState::Sending, t0, t0, &palette), palette.sending);
        assert_eq!(render(LedState::Sending, t0, t0 + ms(260), &palette), Rgb::OFF);
        assert_eq!(render(LedState::Sending, t0, t0 + ms(510), &palette), palette.sending);

        assert_eq!(render(LedState::Connecting, t0, t0 + ms(499), &palette), palette.connecting);
        assert_eq!(render(LedState::Connecting, t0, t0 + ms(500), &palette), Rgb::OFF);

        assert_eq!(render(LedState::Error, t0, t0 + ms(300), &palette), Rgb::OFF);
        assert_eq!(render(LedState::Waiting, t0, t0 + ms(300), &palette), palette.waiting);
        assert_eq!(render(LedState::Init, t0, t0 + ms(300), &palette), palette.alert);
    }

    #[test]
    fn test_indicator_error_cycle() {
        let mut indicator = StatusIndicator::new(RecordingLed::default(), Palette::default(), DEFAULT_ERROR_DWELL);
        assert_eq!(indicator.state(), LedState::Init);
        assert_eq!(indicator.led().shown, vec![Palette::default().alert]);

        let t0 = Instant::now();
        let t = indicator.tick(view(false, true, false), t0);
        assert_eq!(t.next, LedState::Error);
        assert_eq!(indicator.entered_at(), t0);

        // Re-entering Error keeps the original entry time
        indicator.tick(view(false, true, false), t0 + ms(500));
        assert_eq!(indicator.entered_at(), t0);

        let t = indicator.tick(view(false, true, false), t0 + ms(1000));
        assert!(t.clear_drop);
        assert_eq!(indicator.state(), LedState::Waiting);
    }

    #[test]
    fn test_state_change_resets_blink_phase() {
        let palette = Palette::default();
        let mut indicator = StatusIndicator::new(RecordingLed::default(), palette, DEFAULT_ERROR_DWELL);
        let t0 = Instant::now();

        indicator.enter(LedState::Connecting, t0);
        indicator.refresh(t0 + ms(600));
        indicator.enter(LedState::Sending, t0 + ms(700));

        assert_eq!(
            indicator.led().shown,
            vec![palette.alert, palette.connecting, Rgb::OFF, palette.sending]
        );
    }

    #[test]
    fn test_led_written_only_on_change() {
        let mut indicator = StatusIndicator::new(RecordingLed::default(), Palette::default(), DEFAULT_ERROR_DWELL);
        let t0 = Instant::now();
        for i in 0..10 {
            indicator.tick(view(false, false, false), t0 + ms(i * 10));
        }
        assert_eq!(indicator.led().shown.len(), 2);
    }
}
