//! Drag tracking, rubber-band resistance at the feed edges, and swipe detection.
//!
//! Positions are vertical pointer coordinates in pixels. A positive drag distance means
//! the pointer moved down, which reveals the previous slide.

use std::time::Duration;

use tokio::time::Instant;

use super::Direction;

/// Ephemeral state of one pointer drag, discarded on release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start_position: f32,
    pub last_position: f32,
    pub current_position: f32,
    pub start_time: Instant,
    pub last_time: Instant,
    /// Pixels per millisecond between the two most recent samples.
    pub velocity: f32,
}

impl DragState {
    pub fn begin(position: f32, at: Instant) -> Self {
        Self {
            start_position: position,
            last_position: position,
            current_position: position,
            start_time: at,
            last_time: at,
            velocity: 0.0,
        }
    }

    pub fn update(&mut self, position: f32, at: Instant) {
        let elapsed_ms = at.saturating_duration_since(self.last_time).as_secs_f32() * 1000.0;
        self.last_position = self.current_position;
        self.current_position = position;
        if elapsed_ms > 0.0 {
            self.velocity = (self.current_position - self.last_position) / elapsed_ms;
            self.last_time = at;
        }
    }

    /// Signed distance from the drag origin.
    pub fn distance(&self) -> f32 {
        self.current_position - self.start_position
    }

    pub fn duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistance {
    /// Floor for the damping factor.
    pub min: f32,
    /// Distance over which the factor decays by e.
    pub falloff: f32,
}

/// Damping applied to a drag of `distance` px.
///
/// Returns 1 unless the drag pulls past the first slide (backward) or the last slide
/// (forward); there it decays exponentially with distance, floored at `resistance.min`.
pub fn resistance_factor(distance: f32, at_first: bool, at_last: bool, resistance: &Resistance) -> f32 {
    let past_edge = (distance > 0.0 && at_first) || (distance < 0.0 && at_last);
    if !past_edge {
        return 1.0;
    }
    (-distance.abs() / resistance.falloff)
        .exp()
        .max(resistance.min)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    pub distance: f32,
    pub velocity: f32,
    pub duration_cap: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Navigate(Direction),
    SnapBack,
}

/// A release is a swipe when it travelled far enough, or was fast enough and short enough.
pub fn classify_swipe(
    distance: f32,
    velocity: f32,
    duration: Duration,
    thresholds: &SwipeThresholds,
) -> SwipeOutcome {
    let far = distance.abs() > thresholds.distance;
    let flick = velocity.abs() > thresholds.velocity && duration < thresholds.duration_cap;
    if !(far || flick) {
        return SwipeOutcome::SnapBack;
    }

    let heading = if distance != 0.0 { distance } else { velocity };
    if heading < 0.0 {
        SwipeOutcome::Navigate(Direction::Next)
    } else if heading > 0.0 {
        SwipeOutcome::Navigate(Direction::Previous)
    } else {
        SwipeOutcome::SnapBack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESISTANCE: Resistance = Resistance {
        min: 0.3,
        falloff: 300.0,
    };

    fn thresholds() -> SwipeThresholds {
        SwipeThresholds {
            distance: 50.0,
            velocity: 0.3,
            duration_cap: Duration::from_millis(300),
        }
    }

    #[test]
    fn resistance_is_one_away_from_edges() {
        assert_eq!(resistance_factor(120.0, false, false, &RESISTANCE), 1.0);
        assert_eq!(resistance_factor(-120.0, false, false, &RESISTANCE), 1.0);
        // Dragging forward at the first slide and backward at the last are not past an edge.
        assert_eq!(resistance_factor(-120.0, true, false, &RESISTANCE), 1.0);
        assert_eq!(resistance_factor(120.0, false, true, &RESISTANCE), 1.0);
    }

    #[test]
    fn resistance_reduces_displacement_past_edges() {
        for distance in [1.0_f32, 10.0, 150.0, 600.0, 5_000.0] {
            let backward = resistance_factor(distance, true, false, &RESISTANCE);
            assert!(distance * backward < distance);

            let forward = resistance_factor(-distance, false, true, &RESISTANCE);
            assert!((distance * forward) < distance);
        }
    }

    #[test]
    fn resistance_decays_to_the_floor() {
        let near = resistance_factor(30.0, true, false, &RESISTANCE);
        let far = resistance_factor(300.0, true, false, &RESISTANCE);
        assert!(near > far);
        assert_eq!(resistance_factor(10_000.0, true, false, &RESISTANCE), 0.3);
    }

    #[test]
    fn long_drag_is_a_swipe_regardless_of_speed() {
        let outcome = classify_swipe(-80.0, 0.0, Duration::from_secs(2), &thresholds());
        assert_eq!(outcome, SwipeOutcome::Navigate(Direction::Next));

        let outcome = classify_swipe(80.0, 0.0, Duration::from_secs(2), &thresholds());
        assert_eq!(outcome, SwipeOutcome::Navigate(Direction::Previous));
    }

    #[test]
    fn quick_flick_is_a_swipe_only_within_the_duration_cap() {
        let quick = classify_swipe(-20.0, -0.8, Duration::from_millis(120), &thresholds());
        assert_eq!(quick, SwipeOutcome::Navigate(Direction::Next));

        let slow = classify_swipe(-20.0, -0.8, Duration::from_millis(400), &thresholds());
        assert_eq!(slow, SwipeOutcome::SnapBack);
    }

    #[test]
    fn short_slow_drag_snaps_back() {
        let outcome = classify_swipe(30.0, 0.1, Duration::from_millis(100), &thresholds());
        assert_eq!(outcome, SwipeOutcome::SnapBack);
    }

    #[test]
    fn exact_threshold_is_not_a_swipe() {
        let outcome = classify_swipe(50.0, 0.3, Duration::from_millis(100), &thresholds());
        assert_eq!(outcome, SwipeOutcome::SnapBack);
    }

    #[test]
    fn drag_tracks_velocity_between_samples() {
        let start = Instant::now();
        let mut drag = DragState::begin(500.0, start);
        drag.update(480.0, start + Duration::from_millis(10));
        drag.update(440.0, start + Duration::from_millis(20));

        assert_eq!(drag.distance(), -60.0);
        assert_eq!(drag.last_position, 480.0);
        assert!((drag.velocity - -4.0).abs() < 1e-4);
        assert_eq!(drag.duration(start + Duration::from_millis(20)), Duration::from_millis(20));
    }

    #[test]
    fn same_instant_samples_keep_previous_velocity() {
        let start = Instant::now();
        let mut drag = DragState::begin(500.0, start);
        drag.update(300.0, start);
        assert_eq!(drag.velocity, 0.0);
        assert_eq!(drag.distance(), -200.0);
    }
}
