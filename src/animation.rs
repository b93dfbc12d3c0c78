//! Transition state machine between base maps.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::interpolate::MapMorph;

/// What is moving during a transition.
#[derive(Clone, Debug)]
pub enum Motion {
    /// Divider position, 0 = all of map 0, 1 = all of map 1.
    Wipe { from: f64, to: f64 },
    Morph(Rc<MapMorph>),
}

#[derive(Clone, Debug, Default)]
pub enum Animation {
    #[default]
    Idle,
    Animating {
        motion: Motion,
        /// Map shown once the transition completes.
        target: usize,
        started: Instant,
        duration: Duration,
    },
}

impl Animation {
    pub fn start(motion: Motion, target: usize, duration: Duration, now: Instant) -> Self {
        Self::Animating { motion, target, started: now, duration }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self, Self::Animating { .. })
    }

    pub fn is_morphing(&self) -> bool {
        matches!(self, Self::Animating { motion: Motion::Morph(_), .. })
    }

    pub fn target(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Animating { target, .. } => Some(*target),
        }
    }

    /// Eased progress in [0, 1], `None` when idle.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        let Self::Animating { started, duration, .. } = self else {
            return None;
        };
        let elapsed = now.saturating_duration_since(*started);
        let raw = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
        };
        Some(ease_cubic_in_out(raw))
    }

    /// Current divider position of a running wipe.
    pub fn wipe_position(&self, now: Instant) -> Option<f64> {
        match self {
            Self::Animating { motion: Motion::Wipe { from, to }, .. } => {
                let t = self.progress(now)?;
                Some(from + (to - from) * t)
            }
            _ => None,
        }
    }

    /// Running morph and its eased progress.
    pub fn morph(&self, now: Instant) -> Option<(&MapMorph, f64)> {
        match self {
            Self::Animating { motion: Motion::Morph(morph), .. } => Some((morph.as_ref(), self.progress(now)?)),
            _ => None,
        }
    }

    /// Advances the clock; returns the target map when the transition just
    /// completed, leaving the machine idle.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let Self::Animating { target, started, duration, .. } = self else {
            return None;
        };
        if now.saturating_duration_since(*started) < *duration {
            return None;
        }
        let target = *target;
        *self = Self::Idle;
        Some(target)
    }
}

/// Cubic ease-in-out.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
