//! Pulsing selection highlight for tiles.
//!
//! Each tile keeps a plain [`HighlightState`]; one [`HighlightAnimator`] owned by the
//! map view advances every enabled state on a fixed step.

use std::time::{Duration, Instant};

use strata_engine::paint::Color;
use strata_engine::time::Timer;

pub const HIGHLIGHT_FADE_START: i32 = 60;
pub const HIGHLIGHT_FADE_END: i32 = 120;
pub const HIGHLIGHT_FADE_STEP: i32 = 10;
pub const HIGHLIGHT_INTERVAL: Duration = Duration::from_millis(40);

/// Steps applied at most per tick after a stall; one full fade cycle.
const MAX_CATCH_UP: u32 = 16;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HighlightState {
    enabled: bool,
    fade_level: i32,
    rising: bool,
    color: Color,
}

impl Default for HighlightState {
    fn default() -> Self {
        Self {
            enabled: false,
            fade_level: HIGHLIGHT_FADE_START,
            rising: false,
            color: yellow(HIGHLIGHT_FADE_START),
        }
    }
}

impl HighlightState {
    /// Enables the highlight from the start of its fade.
    pub fn start(&mut self) {
        *self = Self { enabled: true, ..Self::default() };
    }

    pub fn stop(&mut self) {
        self.enabled = false;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn fade_level(&self) -> i32 {
        self.fade_level
    }

    #[inline]
    pub fn is_rising(&self) -> bool {
        self.rising
    }

    /// Overlay color, yellow with the current fade as alpha.
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Advances the fade by one step, turning around once it leaves 60..=120.
    pub fn step(&mut self) {
        self.fade_level += if self.rising { HIGHLIGHT_FADE_STEP } else { -HIGHLIGHT_FADE_STEP };
        self.color = yellow(self.fade_level);

        let turn = if self.rising {
            self.fade_level > HIGHLIGHT_FADE_END
        } else {
            self.fade_level < HIGHLIGHT_FADE_START
        };
        if turn {
            self.rising = !self.rising;
        }
    }
}

fn yellow(alpha: i32) -> Color {
    Color::from_srgb_u8(255, 255, 0, alpha.clamp(0, 255) as u8)
}

/// Central clock for every tile highlight.
#[derive(Debug, Copy, Clone)]
pub struct HighlightAnimator {
    timer: Timer,
    interval: Duration,
}

impl Default for HighlightAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightAnimator {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(now: Instant) -> Self {
        Self { timer: Timer::started_at(now), interval: HIGHLIGHT_INTERVAL }
    }

    /// Advances all enabled states by the whole steps elapsed since the last tick.
    ///
    /// Returns how many states changed. Leftover time below one step carries over.
    pub fn tick_at<'a>(
        &mut self,
        now: Instant,
        states: impl IntoIterator<Item = &'a mut HighlightState>,
    ) -> usize {
        let elapsed = self.timer.elapsed_at(now);
        let steps = (elapsed.as_nanos() / self.interval.as_nanos()) as u32;
        if steps == 0 {
            return 0;
        }
        self.timer.restart_at(self.timer.start() + self.interval * steps);

        let mut changed = 0;
        for state in states.into_iter().filter(|s| s.is_enabled()) {
            for _ in 0..steps.min(MAX_CATCH_UP) {
                state.step();
            }
            changed += 1;
        }
        changed
    }

    pub fn tick<'a>(&mut self, states: impl IntoIterator<Item = &'a mut HighlightState>) -> usize {
        self.tick_at(Instant::now(), states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(state: &mut HighlightState, n: usize) -> Vec<i32> {
        (0..n)
            .map(|_| {
                state.step();
                state.fade_level()
            })
            .collect()
    }

    #[test]
    fn fade_turns_around_outside_the_band() {
        let mut s = HighlightState::default();
        s.start();
        assert_eq!(levels(&mut s, 2), vec![50, 60]);
        assert!(s.is_rising());

        assert_eq!(levels(&mut s, 7), vec![70, 80, 90, 100, 110, 120, 130]);
        assert!(!s.is_rising());
        assert_eq!(levels(&mut s, 1), vec![120]);
    }

    #[test]
    fn color_alpha_tracks_fade() {
        let mut s = HighlightState::default();
        s.start();
        s.step();
        assert_eq!(s.color(), Color::from_srgb_u8(255, 255, 0, 50));
    }

    #[test]
    fn animator_steps_every_40ms() {
        let t0 = Instant::now();
        let mut anim = HighlightAnimator::started_at(t0);
        let mut on = HighlightState::default();
        on.start();
        let mut off = HighlightState::default();

        assert_eq!(anim.tick_at(t0 + Duration::from_millis(39), [&mut on, &mut off]), 0);
        assert_eq!(on.fade_level(), 60);

        assert_eq!(anim.tick_at(t0 + Duration::from_millis(40), [&mut on, &mut off]), 1);
        assert_eq!(on.fade_level(), 50);
        assert_eq!(off.fade_level(), 60);

        // 130 ms after the last step: three more steps, 10 ms carried over.
        assert_eq!(anim.tick_at(t0 + Duration::from_millis(170), [&mut on]), 1);
        assert_eq!(on.fade_level(), 80);
        assert_eq!(anim.tick_at(t0 + Duration::from_millis(200), [&mut on]), 1);
        assert_eq!(on.fade_level(), 90);
    }

    #[test]
    fn stop_keeps_level() {
        let mut s = HighlightState::default();
        s.start();
        s.step();
        s.stop();
        assert!(!s.is_enabled());
        assert_eq!(s.fade_level(), 50);
    }
}
