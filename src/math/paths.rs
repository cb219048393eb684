use nalgebra::Point3;
use rand::Rng;

/// Samples `f` at `num_segments + 1` evenly spaced parameters from `t_start`
/// to `t_end`, both ends included.
pub fn path_iter_parametric<F, S>(
    f: F,
    t_start: S,
    t_end: S,
    num_segments: usize,
) -> impl Iterator<Item = Point3<f32>>
where
    F: Fn(S) -> Point3<f32>,
    S: nalgebra::RealField + simba::scalar::SupersetOf<usize> + Copy,
{
    assert!(
        num_segments >= 1,
        "Must have at least one segment, num_segments was {}",
        num_segments
    );
    let convert = nalgebra::convert::<usize, S>;
    (0..=num_segments)
        .map(move |i| convert(i) / convert(num_segments))
        // u ranges from 0 to 1 (inclusive)
        .map(move |u| t_start + u * (t_end - t_start))
        .map(f)
}

/// Points on a circle of the given radius in the xy-plane, suitable for a
/// line loop: `num_segments` distinct points, and the loop closes itself.
pub fn circle_points(radius: f32, num_segments: usize) -> Vec<Point3<f32>> {
    let f = |theta: f32| Point3::new(theta.cos() * radius, theta.sin() * radius, 0.0);
    let mut points: Vec<_> =
        path_iter_parametric(f, 0.0, std::f32::consts::TAU, num_segments).collect();
    // the last point duplicates the first
    points.pop();
    points
}

/// Points scattered uniformly through an axis-aligned cube of side `spread`,
/// centered on the origin.
pub fn starfield_points<R: Rng + ?Sized>(rng: &mut R, count: usize, spread: f32) -> Vec<Point3<f32>> {
    let half = spread / 2.0;
    (0..count)
        .map(|_| {
            Point3::new(
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parametric_endpoints() {
        let pts: Vec<_> =
            path_iter_parametric(|t: f64| Point3::new(t as f32, 0.0, 0.0), 1.0, 3.0, 4).collect();
        assert_eq!(pts.len(), 5);
        approx::assert_relative_eq!(pts[0].x, 1.0);
        approx::assert_relative_eq!(pts[2].x, 2.0);
        approx::assert_relative_eq!(pts[4].x, 3.0);
    }

    #[test]
    fn test_circle() {
        let pts = circle_points(12.0, 128);
        assert_eq!(pts.len(), 128);
        for p in pts.iter() {
            approx::assert_relative_eq!(p.coords.norm(), 12.0, max_relative = 1e-5);
            assert_eq!(p.z, 0.0);
        }
        approx::assert_relative_eq!(pts[0], Point3::new(12.0, 0.0, 0.0));
        approx::assert_abs_diff_eq!(pts[32], Point3::new(0.0, 12.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_starfield_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let stars = starfield_points(&mut rng, 1000, 2000.0);
        assert_eq!(stars.len(), 1000);
        assert!(stars
            .iter()
            .all(|p| p.x.abs() <= 1000.0 && p.y.abs() <= 1000.0 && p.z.abs() <= 1000.0));
    }
}
