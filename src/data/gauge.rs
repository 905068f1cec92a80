//! Animated gauge state.
//!
//! A [`GaugeState`] holds the value currently shown on a gauge and animates it
//! toward the last reading it was given. Time is passed in explicitly so the
//! UI loop and tests drive the animation the same way.

use std::time::{Duration, Instant};

use crate::error::FetchError;

use super::band::{Band, Rgb};
use super::metric::GaugeOptions;

/// Whether a gauge is mid-animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Idle,
    Animating,
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: f64,
    to: f64,
    started: Instant,
    duration: Duration,
}

impl Animation {
    fn value_at(&self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return None;
        }
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        Some(self.from + (self.to - self.from) * ease_in_out_cubic(progress))
    }
}

fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t * 2.0;
    if t < 1.0 {
        0.5 * t.powi(3)
    } else {
        0.5 * ((t - 2.0).powi(3) + 2.0)
    }
}

/// Parse a raw sensor body into a reading.
pub fn parse_reading(raw: &str) -> Result<f64, FetchError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FetchError::Malformed(trimmed.to_string())),
    }
}

/// Display state of a single gauge.
#[derive(Debug, Clone)]
pub struct GaugeState {
    options: GaugeOptions,
    /// Animated value, not clamped. Drives label and color.
    value: f64,
    /// Last reading applied.
    target: f64,
    animation: Option<Animation>,
    last_update: Option<Instant>,
}

impl GaugeState {
    pub fn new(options: GaugeOptions) -> Self {
        Self {
            options,
            value: options.initial,
            target: options.initial,
            animation: None,
            last_update: None,
        }
    }

    /// Start animating toward `value` over `duration`.
    ///
    /// Any animation in progress is replaced; the new one starts from whatever
    /// value is on screen at `now`.
    pub fn set_value_animated(&mut self, value: f64, duration: Duration, now: Instant) {
        self.tick(now);
        self.target = value;
        self.last_update = Some(now);

        if duration.is_zero() {
            self.value = value;
            self.animation = None;
        } else {
            self.animation = Some(Animation {
                from: self.value,
                to: value,
                started: now,
                duration,
            });
        }
    }

    /// Advance the animation to `now`.
    pub fn tick(&mut self, now: Instant) {
        let Some(anim) = self.animation else {
            return;
        };
        match anim.value_at(now) {
            Some(v) => self.value = v,
            None => {
                self.value = anim.to;
                self.animation = None;
            }
        }
    }

    /// Displayed value clamped to `[0, max]`, i.e. the arc position.
    pub fn current(&self) -> f64 {
        self.value.clamp(0.0, self.options.max)
    }

    /// Displayed value before clamping.
    pub fn animated_value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn max(&self) -> f64 {
        self.options.max
    }

    /// Fill ratio in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.options.max > 0.0 {
            self.current() / self.options.max
        } else {
            0.0
        }
    }

    pub fn label(&self) -> String {
        self.options.label.format(self.value)
    }

    pub fn band(&self) -> Band {
        self.options.bands.band_for(self.value)
    }

    pub fn color(&self) -> Rgb {
        self.band().color
    }

    pub fn status(&self) -> AnimationStatus {
        if self.animation.is_some() {
            AnimationStatus::Animating
        } else {
            AnimationStatus::Idle
        }
    }

    /// When the last reading was applied, if any.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}
