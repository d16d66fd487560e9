//! Tessellation of circular outlines into straight segments.

use std::f32::consts::TAU;

use glam::Vec2;

/// Fewest segments ever used for a closed outline.
pub const MIN_SEGMENTS: usize = 4;
/// Upper bound, keeps huge radii from flooding the overlay.
pub const MAX_SEGMENTS: usize = 512;

/// Number of chords approximating an arc so that no chord strays further than
/// `tolerance` from the true curve.
///
/// The chord sagitta for an angle `phi` is `r * (1 - cos(phi / 2))`, so the
/// largest admissible angle is `2 * acos(1 - tolerance / r)`. The result is
/// rounded up to an even count for symmetric outlines.
pub fn circle_segments(radius: f32, angular_span: f32, tolerance: f32) -> usize {
    let max_angle = 2.0 * (1.0 - (tolerance / radius).min(1.0)).acos();
    // NaN and negative spans end up as zero after the cast and get clamped below.
    let count = (angular_span / max_angle)
        .ceil()
        .clamp(0.0, MAX_SEGMENTS as f32) as usize;
    ((count + 1) & !1).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Unit direction for an angle measured from +Y towards +X, i.e. `(sin, cos)`.
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(sin, cos)
}

/// Points of a full circle outline, first point at angle zero.
pub fn circle_points(center: Vec2, radius: f32, tolerance: f32) -> Vec<Vec2> {
    let segments = circle_segments(radius, TAU, tolerance);
    (0..segments)
        .map(|i| center + radius * direction(i as f32 * TAU / segments as f32))
        .collect()
}

/// Consecutive pairs of a closed loop, including the closing `last -> first` pair.
pub fn closed_loop_pairs(points: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let closing = points.last().zip(points.first()).map(|(&l, &f)| (l, f));
    points
        .windows(2)
        .map(|w| (w[0], w[1]))
        .chain(closing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, 0.1, 8)]
    #[case(1.0, 0.02, 16)]
    #[case(5.0, 1.0, 6)]
    #[case(0.0, 0.1, MIN_SEGMENTS)]
    #[case(1.0e6, 1.0e-4, MAX_SEGMENTS)]
    fn full_circle_segment_counts(#[case] radius: f32, #[case] tolerance: f32, #[case] expected: usize) {
        assert_eq!(circle_segments(radius, TAU, tolerance), expected);
    }

    #[test]
    fn segment_count_respects_tolerance() {
        for &(radius, tolerance) in &[(1.0f32, 0.1f32), (10.0, 0.1), (3.5, 0.01)] {
            let n = circle_segments(radius, TAU, tolerance);
            let sagitta = radius * (1.0 - (TAU / n as f32 / 2.0).cos());
            assert!(sagitta <= tolerance + 1e-5, "r={radius} n={n} sagitta={sagitta}");
        }
    }

    #[test]
    fn degenerate_span_is_clamped() {
        assert_eq!(circle_segments(1.0, f32::NAN, 0.1), MIN_SEGMENTS);
        assert_eq!(circle_segments(1.0, -1.0, 0.1), MIN_SEGMENTS);
    }

    #[test]
    fn direction_starts_at_plus_y() {
        let d = direction(0.0);
        assert!((d - Vec2::Y).length() < 1e-6);
        let quarter = direction(std::f32::consts::FRAC_PI_2);
        assert!((quarter - Vec2::X).length() < 1e-6);
    }

    #[test]
    fn circle_points_lie_on_circle() {
        let center = Vec2::new(100.0, 50.0);
        let points = circle_points(center, 5.0, 1.0);
        assert_eq!(points.len(), 6);
        for p in &points {
            assert!(((*p - center).length() - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn closed_loop_wraps_around() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let pairs: Vec<_> = closed_loop_pairs(&points).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], (Vec2::Y, Vec2::ZERO));
        assert_eq!(closed_loop_pairs(&[]).count(), 0);
    }
}
