use std::time::{Duration, Instant};

/// Default hold time that turns a press into a long-press
pub const LONG_PRESS_DELAY: Duration = Duration::from_millis(600);

/// Action produced by a press/release cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Pressed { since: Instant },
    /// Long-press already reported; the release is swallowed
    Fired,
}

/// Tap vs long-press recognizer.
///
/// Exactly one of `Tap` or `LongPress` is produced per press/release cycle,
/// and none if the press is cancelled (for example because it became a drag).
#[derive(Debug, Clone)]
pub struct PressGesture {
    delay: Duration,
    state: GestureState,
}

impl Default for PressGesture {
    fn default() -> Self {
        Self::new(LONG_PRESS_DELAY)
    }
}

impl PressGesture {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn press(&mut self, now: Instant) {
        self.state = GestureState::Pressed { since: now };
    }

    /// Timer check; reports `LongPress` once when the hold delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Gesture> {
        match self.state {
            GestureState::Pressed { since } if self.elapsed(since, now) => {
                self.state = GestureState::Fired;
                Some(Gesture::LongPress)
            }
            _ => None,
        }
    }

    pub fn release(&mut self, now: Instant) -> Option<Gesture> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            // Deadline passed before anyone polled: the timer still wins
            GestureState::Pressed { since } if self.elapsed(since, now) => {
                Some(Gesture::LongPress)
            }
            GestureState::Pressed { .. } => Some(Gesture::Tap),
            GestureState::Fired | GestureState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Time left until the long-press fires, if a press is pending
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            GestureState::Pressed { since } => {
                Some(self.delay.saturating_sub(now.saturating_duration_since(since)))
            }
            _ => None,
        }
    }

    fn elapsed(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) >= self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_quick_release_is_tap() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::default();

        gesture.press(t0);
        assert_eq!(gesture.poll(t0 + ms(300)), None);
        assert_eq!(gesture.release(t0 + ms(599)), Some(Gesture::Tap));
        assert_eq!(gesture.state(), GestureState::Idle);
    }

    #[test]
    fn test_hold_fires_long_press_once() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::default();

        gesture.press(t0);
        assert_eq!(gesture.poll(t0 + ms(600)), Some(Gesture::LongPress));
        assert_eq!(gesture.poll(t0 + ms(700)), None);
        assert_eq!(gesture.state(), GestureState::Fired);

        // Release after firing produces no tap
        assert_eq!(gesture.release(t0 + ms(900)), None);
        assert_eq!(gesture.state(), GestureState::Idle);
    }

    #[test]
    fn test_late_release_without_poll_is_long_press() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::default();

        gesture.press(t0);
        assert_eq!(gesture.release(t0 + ms(600)), Some(Gesture::LongPress));
    }

    #[test]
    fn test_cancel_suppresses_everything() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::default();

        gesture.press(t0);
        gesture.cancel();
        assert_eq!(gesture.poll(t0 + ms(1000)), None);
        assert_eq!(gesture.release(t0 + ms(1000)), None);
    }

    #[test]
    fn test_release_without_press() {
        let mut gesture = PressGesture::default();
        assert_eq!(gesture.release(Instant::now()), None);
        assert_eq!(gesture.poll(Instant::now()), None);
    }

    #[test]
    fn test_each_cycle_is_independent() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::new(ms(100));

        gesture.press(t0);
        assert_eq!(gesture.poll(t0 + ms(150)), Some(Gesture::LongPress));
        assert_eq!(gesture.release(t0 + ms(160)), None);

        gesture.press(t0 + ms(200));
        assert_eq!(gesture.release(t0 + ms(250)), Some(Gesture::Tap));
    }

    #[test]
    fn test_remaining() {
        let t0 = Instant::now();
        let mut gesture = PressGesture::default();
        assert_eq!(gesture.remaining(t0), None);

        gesture.press(t0);
        assert_eq!(gesture.remaining(t0 + ms(200)), Some(ms(400)));
        assert_eq!(gesture.remaining(t0 + ms(800)), Some(Duration::ZERO));
    }
}
