use std::time::Duration;

use tokio::time::Instant;

/// Fixed-duration eased movement of the feed's vertical offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetTween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

impl OffsetTween {
    pub fn new(from: f32, to: f32, start: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration: duration.max(Duration::from_millis(1)),
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }

    pub fn sample(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Where the slide strip sits: at rest, following a finger, or easing to a new index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetMotion {
    Resting { offset: f32 },
    Dragging { base: f32, delta: f32 },
    Animating(OffsetTween),
}

impl OffsetMotion {
    pub fn offset_at(&self, now: Instant) -> f32 {
        match self {
            OffsetMotion::Resting { offset } => *offset,
            OffsetMotion::Dragging { base, delta } => base + delta,
            OffsetMotion::Animating(tween) => tween.sample(now),
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self, OffsetMotion::Animating(_))
    }
}

impl Default for OffsetMotion {
    fn default() -> Self {
        OffsetMotion::Resting { offset: 0.0 }
    }
}

/// Resting offset of the slide at `index`.
pub fn offset_for_index(index: usize, viewport_height: f32) -> f32 {
    -(index as f32) * viewport_height
}
