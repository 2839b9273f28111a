//! Collision detection and response for a rectangular field
//!
//! Everything the ball can hit is either a circle (targets, answer zones) or
//! an axis-aligned rectangle (paddle, obstacles, quiz guides), so the whole
//! collision layer reduces to circle-vs-rect tests plus component flips.

use glam::Vec2;

/// Which edge plane a rectangle bounce resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectEdge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Check whether a circle overlaps an axis-aligned rectangle
///
/// Clamps the circle center into the rect and compares squared distances, so
/// corners are handled exactly rather than by a bounding-box approximation.
#[inline]
pub fn circle_rect_hit(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let nearest = center.clamp(min, max);
    center.distance_squared(nearest) <= radius * radius
}

/// Push a circle out of a rectangle through the nearest edge plane and flip
/// the matching velocity component toward the exit side
///
/// The circle is guaranteed to sit fully outside the rectangle afterwards,
/// so it cannot stay wedged inside across frames.
pub fn resolve_circle_rect_bounce(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    min: Vec2,
    max: Vec2,
) -> RectEdge {
    let to_left = (pos.x - min.x).abs();
    let to_right = (max.x - pos.x).abs();
    let to_top = (pos.y - min.y).abs();
    let to_bottom = (max.y - pos.y).abs();

    let nearest = to_left.min(to_right).min(to_top).min(to_bottom);
    if nearest == to_left {
        pos.x = min.x - radius;
        vel.x = -vel.x.abs();
        RectEdge::Left
    } else if nearest == to_right {
        pos.x = max.x + radius;
        vel.x = vel.x.abs();
        RectEdge::Right
    } else if nearest == to_top {
        pos.y = min.y - radius;
        vel.y = -vel.y.abs();
        RectEdge::Top
    } else {
        pos.y = max.y + radius;
        vel.y = vel.y.abs();
        RectEdge::Bottom
    }
}

/// Rescale a velocity so its magnitude lands in `[min_speed, max_speed]`
///
/// Direction is preserved exactly. A near-zero velocity is returned as-is;
/// the caller decides whether a dead ball needs a re-serve.
pub fn clamp_speed(vel: Vec2, min_speed: f32, max_speed: f32) -> Vec2 {
    let speed = vel.length();
    if speed < 1e-6 {
        return vel;
    }
    if speed < min_speed {
        vel * (min_speed / speed)
    } else if speed > max_speed {
        vel * (max_speed / speed)
    } else {
        vel
    }
}

/// Round to one decimal place (score multiplier granularity)
#[inline]
pub fn round_to_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_circle_rect_hit_overlap() {
        let min = Vec2::new(10.0, 10.0);
        let max = Vec2::new(30.0, 20.0);

        // Center inside
        assert!(circle_rect_hit(Vec2::new(20.0, 15.0), 3.0, min, max));
        // Overlapping the left edge
        assert!(circle_rect_hit(Vec2::new(8.0, 15.0), 3.0, min, max));
        // Touching exactly
        assert!(circle_rect_hit(Vec2::new(7.0, 15.0), 3.0, min, max));
        // Clear miss
        assert!(!circle_rect_hit(Vec2::new(5.0, 15.0), 3.0, min, max));
    }

    #[test]
    fn test_circle_rect_hit_corner() {
        let min = Vec2::new(0.0, 0.0);
        let max = Vec2::new(10.0, 10.0);

        // Diagonal distance to the corner is ~4.24: inside a radius of 5,
        // outside a radius of 4. A bounding-box test would accept both.
        assert!(circle_rect_hit(Vec2::new(13.0, 13.0), 5.0, min, max));
        assert!(!circle_rect_hit(Vec2::new(13.0, 13.0), 4.0, min, max));
    }

    #[test]
    fn test_bounce_resolves_through_nearest_edge() {
        let min = Vec2::new(100.0, 100.0);
        let max = Vec2::new(200.0, 140.0);

        // Ball overlapping near the top edge, moving down
        let mut pos = Vec2::new(150.0, 102.0);
        let mut vel = Vec2::new(20.0, 80.0);
        let edge = resolve_circle_rect_bounce(&mut pos, &mut vel, 6.0, min, max);
        assert_eq!(edge, RectEdge::Top);
        assert_eq!(pos.y, min.y - 6.0);
        assert!(vel.y < 0.0);
        assert_eq!(vel.x, 20.0);

        // Ball overlapping near the right edge, moving left
        let mut pos = Vec2::new(198.0, 120.0);
        let mut vel = Vec2::new(-50.0, 10.0);
        let edge = resolve_circle_rect_bounce(&mut pos, &mut vel, 6.0, min, max);
        assert_eq!(edge, RectEdge::Right);
        assert_eq!(pos.x, max.x + 6.0);
        assert!(vel.x > 0.0);
    }

    #[test]
    fn test_bounce_never_leaves_circle_inside() {
        let min = Vec2::new(0.0, 0.0);
        let max = Vec2::new(60.0, 20.0);

        for (x, y) in [(1.0, 10.0), (59.0, 10.0), (30.0, 1.0), (30.0, 19.0), (30.0, 10.0)] {
            let mut pos = Vec2::new(x, y);
            let mut vel = Vec2::new(33.0, -21.0);
            resolve_circle_rect_bounce(&mut pos, &mut vel, 5.0, min, max);
            assert!(
                !circle_rect_hit(pos, 4.99, min, max),
                "still inside after resolve from ({x}, {y}): {pos:?}"
            );
        }
    }

    #[test]
    fn test_clamp_speed_bounds() {
        let slow = clamp_speed(Vec2::new(3.0, 4.0), 100.0, 400.0);
        assert!((slow.length() - 100.0).abs() < 0.01);

        let fast = clamp_speed(Vec2::new(300.0, 400.0), 100.0, 400.0);
        assert!((fast.length() - 400.0).abs() < 0.01);

        let fine = clamp_speed(Vec2::new(120.0, 160.0), 100.0, 400.0);
        assert_eq!(fine, Vec2::new(120.0, 160.0));
    }

    #[test]
    fn test_clamp_speed_zero_velocity_untouched() {
        assert_eq!(clamp_speed(Vec2::ZERO, 100.0, 400.0), Vec2::ZERO);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(1.4499), 1.4);
        assert_eq!(round_to_tenth(1.55), 1.6);
        assert_eq!(round_to_tenth(5.0), 5.0);
    }

    proptest! {
        /// Property: clamped speed is always inside the band and collinear
        /// with the input direction
        #[test]
        fn prop_clamp_speed_in_band(
            vx in -900.0f32..900.0f32,
            vy in -900.0f32..900.0f32,
        ) {
            let vel = Vec2::new(vx, vy);
            prop_assume!(vel.length() > 1e-3);
            let clamped = clamp_speed(vel, 150.0, 500.0);
            let speed = clamped.length();
            prop_assert!(speed >= 150.0 * 0.999 && speed <= 500.0 * 1.001);
            // Cross product of parallel vectors is zero
            let cross = vel.x * clamped.y - vel.y * clamped.x;
            prop_assert!(cross.abs() < vel.length() * speed * 1e-4);
            prop_assert!(vel.dot(clamped) > 0.0);
        }

        /// Property: after a bounce the circle is outside the rectangle
        #[test]
        fn prop_bounce_exits_rect(
            px in 0.0f32..100.0f32,
            py in 0.0f32..40.0f32,
            vx in -300.0f32..300.0f32,
            vy in -300.0f32..300.0f32,
        ) {
            let min = Vec2::ZERO;
            let max = Vec2::new(100.0, 40.0);
            let mut pos = Vec2::new(px, py);
            let mut vel = Vec2::new(vx, vy);
            resolve_circle_rect_bounce(&mut pos, &mut vel, 6.0, min, max);
            prop_assert!(!circle_rect_hit(pos, 5.99, min, max));
        }
    }
}
