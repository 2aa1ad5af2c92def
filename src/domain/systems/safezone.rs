// Safe-zone shrink, out-of-zone elimination timer, and the NPC idle
// fail-safe.

pub const OUT_OF_ZONE_FACTOR: f32 = 1.02;
pub const OUT_OF_ZONE_ELIMINATE_SECS: f32 = 5.0;
pub const IDLE_SPEED_THRESHOLD: f32 = 6.0;
pub const IDLE_ELIMINATE_SECS: f32 = 8.0;

/// Returns the updated `(shrink_elapsed, safe_radius)`.
pub fn apply_shrink(
    shrink_elapsed: f32,
    safe_radius: f32,
    dt: f32,
    shrink_delay: f32,
    shrink_rate: f32,
    safe_radius_min: f32,
) -> (f32, f32) {
    let elapsed = shrink_elapsed + dt;
    let radius = if elapsed >= shrink_delay {
        (safe_radius - shrink_rate * dt).max(safe_radius_min)
    } else {
        safe_radius
    };
    (elapsed, radius)
}

/// Returns `(new_outside_timer, should_eliminate)`.
pub fn check_out_of_zone(
    pos: (f32, f32),
    safe_center: (f32, f32),
    safe_radius: f32,
    outside_timer: f32,
    dt: f32,
) -> (f32, bool) {
    let d = ((pos.0 - safe_center.0).powi(2) + (pos.1 - safe_center.1).powi(2)).sqrt();
    let timer = if d > OUT_OF_ZONE_FACTOR * safe_radius {
        outside_timer + dt
    } else {
        0.0
    };
    (timer, timer >= OUT_OF_ZONE_ELIMINATE_SECS)
}

/// Returns `(new_idle_timer, should_eliminate)`.
pub fn check_idle(speed: f32, idle_timer: f32, dt: f32) -> (f32, bool) {
    let timer = if speed < IDLE_SPEED_THRESHOLD { idle_timer + dt } else { 0.0 };
    (timer, timer > IDLE_ELIMINATE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_holds_until_delay_elapses() {
        let (elapsed, radius) = apply_shrink(0.0, 750.0, 1.0, 8.0, 8.0, 220.0);
        assert_eq!(elapsed, 1.0);
        assert_eq!(radius, 750.0);
    }

    #[test]
    fn shrink_decreases_after_delay_and_floors_at_min() {
        let (elapsed, radius) = apply_shrink(8.0, 230.0, 1.0, 8.0, 8.0, 220.0);
        assert_eq!(elapsed, 9.0);
        assert_eq!(radius, 222.0);

        let (_, radius2) = apply_shrink(8.0, 221.0, 1.0, 8.0, 8.0, 220.0);
        assert_eq!(radius2, 220.0);
    }

    #[test]
    fn exactly_on_boundary_is_inside() {
        let (timer, eliminate) = check_out_of_zone((1.02 * 100.0, 0.0), (0.0, 0.0), 100.0, 0.0, 1.0);
        assert_eq!(timer, 0.0);
        assert!(!eliminate);
    }

    #[test]
    fn beyond_boundary_accumulates_and_eliminates_at_five_seconds() {
        let pos = (1.03 * 100.0, 0.0);
        let mut timer = 0.0;
        let mut eliminate = false;
        for _ in 0..5 {
            let (t, e) = check_out_of_zone(pos, (0.0, 0.0), 100.0, timer, 1.0);
            timer = t;
            eliminate = e;
        }
        assert!(eliminate);
    }

    #[test]
    fn idle_eliminates_after_eight_seconds_below_threshold() {
        let mut timer = 0.0;
        let mut eliminate = false;
        for _ in 0..9 {
            let (t, e) = check_idle(1.0, timer, 1.0);
            timer = t;
            eliminate = e;
        }
        assert!(eliminate);
    }

    #[test]
    fn idle_resets_when_speed_recovers() {
        let (timer, _) = check_idle(1.0, 7.0, 1.0);
        assert_eq!(timer, 8.0);
        let (timer2, eliminate2) = check_idle(10.0, timer, 1.0);
        assert_eq!(timer2, 0.0);
        assert!(!eliminate2);
    }
}
