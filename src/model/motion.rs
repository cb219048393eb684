//! Parametric motion of bodies.
//!
//! Positions are a closed-form function of elapsed time: every body moves on
//! a circle of radius `orbit_distance` in the xy-plane. There is no
//! integration step, so positions never drift no matter how irregular the
//! frame timing is.
//!
//! Self-rotation is different. It advances by a fixed amount per tick, so
//! spin speed tracks the frame rate rather than the clock. That's a known
//! approximation.

use nalgebra::{Isometry3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

use super::body::BodyDescriptor;

/// Orbital angle, in radians, of a body `elapsed_time` after the scene started.
pub fn orbital_angle(descriptor: &BodyDescriptor, elapsed_time: f64) -> f64 {
    elapsed_time * descriptor.angular_speed_factor * descriptor.direction.sign()
        + descriptor.initial_phase
}

/// Position of the body in the orbital plane. Central bodies always end up
/// at the origin, since their orbit distance is zero.
pub fn compute_position(descriptor: &BodyDescriptor, elapsed_time: f64) -> Point2<f64> {
    let angle = orbital_angle(descriptor, elapsed_time);
    Point2::new(
        angle.cos() * descriptor.orbit_distance,
        angle.sin() * descriptor.orbit_distance,
    )
}

/// Lifts an orbital-plane position into scene space (z = 0).
pub fn to_scene_point(position: Point2<f64>) -> Point3<f64> {
    Point3::new(position.x, position.y, 0.0)
}

/// Advances a spin angle by one tick, keeping it in [0, 2pi).
pub fn advance_spin(rotation_y: f64, spin_per_tick: f64) -> f64 {
    (rotation_y + spin_per_tick).rem_euclid(std::f64::consts::TAU)
}

/// Placement of a body mesh: translated to its position, spun about its
/// local y-axis.
pub fn body_transform(position: Point2<f64>, rotation_y: f64) -> Isometry3<f32> {
    let position: Point3<f32> = nalgebra::convert(to_scene_point(position));
    Isometry3::from_parts(
        Translation3::from(position.coords),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), rotation_y as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::body::{Direction, Rgb};
    use std::f64::consts::PI;

    fn body(distance: f64, speed: f64, phase: f64, direction: Direction) -> BodyDescriptor {
        BodyDescriptor {
            name: String::from("test"),
            mean_radius: 1.0,
            orbit_distance: distance,
            angular_speed_factor: speed,
            fallback_color: Rgb::WHITE,
            initial_phase: phase,
            direction,
            is_emissive: false,
        }
    }

    #[test]
    fn test_circular_orbit() {
        let bodies = [
            body(120.0, 1.0, 0.0, Direction::Prograde),
            body(6.0, 0.415, 2.3, Direction::Prograde),
            body(38.0, 0.0006, 5.9, Direction::Retrograde),
        ];

        for b in bodies.iter() {
            for i in 0..200 {
                let t = i as f64 * 0.731 - 20.0;
                let p = compute_position(b, t);
                approx::assert_relative_eq!(
                    p.coords.norm(),
                    b.orbit_distance,
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_known_positions() {
        let earth = body(120.0, 1.0, 0.0, Direction::Prograde);

        let p = compute_position(&earth, 0.0);
        approx::assert_abs_diff_eq!(p, Point2::new(120.0, 0.0), epsilon = 1e-9);

        let p = compute_position(&earth, PI);
        approx::assert_abs_diff_eq!(p, Point2::new(-120.0, 0.0), epsilon = 1e-9);

        let p = compute_position(&earth, PI / 2.0);
        approx::assert_abs_diff_eq!(p, Point2::new(0.0, 120.0), epsilon = 1e-9);
    }

    #[test]
    fn test_direction_and_phase() {
        let forward = body(10.0, 1.0, 0.0, Direction::Prograde);
        let backward = body(10.0, 1.0, 0.0, Direction::Retrograde);

        // Quarter turn each way: mirror images across the x-axis
        let p = compute_position(&forward, PI / 2.0);
        let q = compute_position(&backward, PI / 2.0);
        approx::assert_abs_diff_eq!(p.y, -q.y, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(p.x, q.x, epsilon = 1e-9);

        let shifted = body(10.0, 1.0, PI, Direction::Prograde);
        approx::assert_abs_diff_eq!(
            compute_position(&shifted, 0.0),
            Point2::new(-10.0, 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_central_body_stays_put() {
        let sun = body(0.0, 1.0, 1.0, Direction::Prograde);
        for t in [0.0, 1.0, 1e6].iter() {
            assert_eq!(compute_position(&sun, *t), Point2::origin());
        }
    }

    #[test]
    fn test_spin_wraps() {
        let mut spin = 0.0;
        for _ in 0..10_000 {
            spin = advance_spin(spin, 0.005);
            assert!((0.0..std::f64::consts::TAU).contains(&spin));
        }
        approx::assert_relative_eq!(spin, (50.0f64).rem_euclid(std::f64::consts::TAU), max_relative = 1e-9);
    }

    #[test]
    fn test_body_transform() {
        let transform = body_transform(Point2::new(3.0, -4.0), PI / 2.0);
        approx::assert_relative_eq!(
            transform.translation.vector,
            Vector3::new(3.0, -4.0, 0.0)
        );
        // Spinning about y sends +x to -z
        approx::assert_abs_diff_eq!(
            transform.rotation * Vector3::x(),
            -Vector3::z(),
            epsilon = 1e-6
        );
    }
}
