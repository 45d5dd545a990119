//! # Transform Module
//!
//! Pure coordinate mapping used to move template-relative positions into
//! place: mirror first, then a quarter-turn rotation about the vertical axis
//! through `pivot`. The vertical component is never touched.
//!
//! Cells and continuous points use slightly different formulas. A cell at
//! integer `x` covers `[x, x + 1)`, so reflecting or turning the cell's
//! *corner* lands on the opposite corner of the target cell; the continuous
//! form adds the `+1` that compensates for that.
//!
//! Every cell transform here is a bijection on the integer lattice. Undoing
//! one means applying the inverse rotation and then the same mirror, with
//! the same pivot (see [`inverse_transform_pos`]).

use cgmath::{Point3, Vector3};

use crate::voxels::block::direction::{wrap_degrees, Mirror, Rotation};

/// Maps a cell position through `mirror`, then `rotation` about `pivot`.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_structures::structure::transform::transform_pos;
/// use voxel_structures::voxels::block::direction::{Mirror, Rotation};
///
/// let mapped = transform_pos(
///     Point3::new(2, 0, 0),
///     Mirror::None,
///     Rotation::Clockwise90,
///     Point3::new(1, 0, 1),
/// );
/// assert_eq!(mapped, Point3::new(2, 0, 2));
/// ```
pub fn transform_pos(
    pos: Point3<i32>,
    mirror: Mirror,
    rotation: Rotation,
    pivot: Point3<i32>,
) -> Point3<i32> {
    let (mut x, y, mut z) = (pos.x, pos.y, pos.z);
    match mirror {
        Mirror::None => {}
        Mirror::FrontBack => x = -x,
        Mirror::LeftRight => z = -z,
    }

    let (px, pz) = (pivot.x, pivot.z);
    match rotation {
        Rotation::None => Point3::new(x, y, z),
        Rotation::Clockwise90 => Point3::new(px + pz - z, y, pz - px + x),
        Rotation::Counterclockwise90 => Point3::new(px - pz + z, y, px + pz - x),
        Rotation::Clockwise180 => Point3::new(px + px - x, y, pz + pz - z),
    }
}

/// Undoes [`transform_pos`] for the same `mirror`, `rotation` and `pivot`.
pub fn inverse_transform_pos(
    pos: Point3<i32>,
    mirror: Mirror,
    rotation: Rotation,
    pivot: Point3<i32>,
) -> Point3<i32> {
    let unrotated = transform_pos(pos, Mirror::None, rotation.inverse(), pivot);
    transform_pos(unrotated, mirror, Rotation::None, pivot)
}

/// Maps a continuous position through `mirror`, then `rotation` about `pivot`.
///
/// Mirroring reflects about the cell center plane (`0.5`), and each rotation
/// carries the unit-cell `+1` correction on its reflected side.
pub fn transform_vec(
    pos: Point3<f64>,
    mirror: Mirror,
    rotation: Rotation,
    pivot: Point3<i32>,
) -> Point3<f64> {
    let (mut x, y, mut z) = (pos.x, pos.y, pos.z);
    match mirror {
        Mirror::None => {}
        Mirror::FrontBack => x = 1.0 - x,
        Mirror::LeftRight => z = 1.0 - z,
    }

    let (px, pz) = (pivot.x as f64, pivot.z as f64);
    match rotation {
        Rotation::None => Point3::new(x, y, z),
        Rotation::Clockwise90 => Point3::new(px + pz + 1.0 - z, y, pz - px + x),
        Rotation::Counterclockwise90 => Point3::new(px - pz + z, y, px + pz + 1.0 - x),
        Rotation::Clockwise180 => Point3::new(px + px + 1.0 - x, y, pz + pz + 1.0 - z),
    }
}

/// Extent of a template after `rotation`: X and Z swap for quarter turns.
pub fn transformed_size(size: Vector3<i32>, rotation: Rotation) -> Vector3<i32> {
    if rotation.swaps_axes() {
        Vector3::new(size.z, size.y, size.x)
    } else {
        size
    }
}

/// Heading of an entity after placement, in degrees.
///
/// The rotation turns the heading; the mirror contributes the flip it would
/// apply to the original heading.
pub fn transform_yaw(yaw: f32, mirror: Mirror, rotation: Rotation) -> f32 {
    let rotated = wrap_degrees(yaw) + rotation.degrees();
    rotated + mirror.mirror_yaw(yaw) - yaw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_positions() -> Vec<Point3<i32>> {
        let mut positions = Vec::new();
        for x in -3..=3 {
            for z in -3..=3 {
                positions.push(Point3::new(x * 5 + 1, x - z, z * 3 - 2));
            }
        }
        positions
    }

    fn sample_pivots() -> Vec<Point3<i32>> {
        vec![
            Point3::new(0, 0, 0),
            Point3::new(1, 0, 1),
            Point3::new(-4, 7, 2),
            Point3::new(13, -1, -8),
        ]
    }

    #[test]
    fn test_identity_transform() {
        for pivot in sample_pivots() {
            for pos in sample_positions() {
                assert_eq!(transform_pos(pos, Mirror::None, Rotation::None, pivot), pos);
            }
        }
    }

    #[test]
    fn test_mirror_is_self_inverse() {
        for mirror in [Mirror::FrontBack, Mirror::LeftRight] {
            for pivot in sample_pivots() {
                for pos in sample_positions() {
                    let once = transform_pos(pos, mirror, Rotation::None, pivot);
                    assert_eq!(transform_pos(once, mirror, Rotation::None, pivot), pos);
                }
            }
        }
    }

    #[test]
    fn test_four_clockwise_turns_and_cw_ccw_cancel() {
        for pivot in sample_pivots() {
            for pos in sample_positions() {
                let mut turned = pos;
                for _ in 0..4 {
                    turned = transform_pos(turned, Mirror::None, Rotation::Clockwise90, pivot);
                }
                assert_eq!(turned, pos);

                let there = transform_pos(pos, Mirror::None, Rotation::Clockwise90, pivot);
                let back = transform_pos(there, Mirror::None, Rotation::Counterclockwise90, pivot);
                assert_eq!(back, pos);
            }
        }
    }

    #[test]
    fn test_vertical_component_untouched() {
        for mirror in [Mirror::None, Mirror::FrontBack, Mirror::LeftRight] {
            for rotation in Rotation::all() {
                for pos in sample_positions() {
                    let mapped = transform_pos(pos, mirror, rotation, Point3::new(2, 9, 3));
                    assert_eq!(mapped.y, pos.y);
                }
            }
        }
    }

    #[test]
    fn test_inverse_undoes_every_combination() {
        for mirror in [Mirror::None, Mirror::FrontBack, Mirror::LeftRight] {
            for rotation in Rotation::all() {
                for pivot in sample_pivots() {
                    for pos in sample_positions() {
                        let mapped = transform_pos(pos, mirror, rotation, pivot);
                        assert_eq!(inverse_transform_pos(mapped, mirror, rotation, pivot), pos);
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_cell_fixed_point() {
        let mapped = transform_pos(
            Point3::new(0, 0, 0),
            Mirror::None,
            Rotation::Clockwise90,
            Point3::new(0, 0, 0),
        );
        assert_eq!(mapped, Point3::new(0, 0, 0));
    }

    #[test]
    fn test_pivoted_quarter_turn() {
        let mapped = transform_pos(
            Point3::new(2, 0, 0),
            Mirror::None,
            Rotation::Clockwise90,
            Point3::new(1, 0, 1),
        );
        assert_eq!(mapped, Point3::new(2, 0, 2));
    }

    #[test]
    fn test_continuous_form_tracks_cell_form() {
        // The center of a cell must land in the cell the integer form maps to.
        for mirror in [Mirror::None, Mirror::FrontBack, Mirror::LeftRight] {
            for rotation in Rotation::all() {
                for pivot in sample_pivots() {
                    for pos in sample_positions() {
                        let cell = transform_pos(pos, mirror, rotation, pivot);
                        let center = Point3::new(
                            pos.x as f64 + 0.5,
                            pos.y as f64 + 0.5,
                            pos.z as f64 + 0.5,
                        );
                        let mapped = transform_vec(center, mirror, rotation, pivot);
                        assert_eq!(
                            Point3::new(
                                mapped.x.floor() as i32,
                                mapped.y.floor() as i32,
                                mapped.z.floor() as i32
                            ),
                            cell,
                            "mirror {mirror:?} rotation {rotation:?} pivot {pivot:?} pos {pos:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_transformed_size() {
        let size = Vector3::new(3, 4, 7);
        assert_eq!(transformed_size(size, Rotation::None), size);
        assert_eq!(transformed_size(size, Rotation::Clockwise180), size);
        assert_eq!(transformed_size(size, Rotation::Clockwise90), Vector3::new(7, 4, 3));
        assert_eq!(transformed_size(size, Rotation::Counterclockwise90), Vector3::new(7, 4, 3));
    }

    #[test]
    fn test_transform_yaw() {
        assert_eq!(transform_yaw(0.0, Mirror::None, Rotation::Clockwise90), 90.0);
        assert_eq!(transform_yaw(0.0, Mirror::LeftRight, Rotation::None), 180.0);
        assert_eq!(transform_yaw(90.0, Mirror::FrontBack, Rotation::None), 270.0);
    }
}
