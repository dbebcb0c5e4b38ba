//! Common types and traits for 3D geometry.
//!
//! This module defines the reusable building blocks of the packing core:
//! the `Vec3` vector type, the global numerical tolerances and small trait
//! abstractions shared by items and placements.

use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for general numerical operations such as dimension and weight
/// comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Tolerance for the free-space bookkeeping.
///
/// Degenerate sub-spaces thinner than this are discarded, and two spaces
/// count as adjacent when their faces meet within this tolerance. The same
/// value decides whether a candidate sits on the cargo floor or flush on
/// top of another item.
pub const EPSILON_SPACE: f64 = 1e-3;

/// Represents a 3D vector or point in space.
///
/// Used for positions, dimensions, and calculations in 3D space. Positions
/// of placed items are the geometric centers of their bounding boxes; free
/// spaces are anchored at their minimum corner.
///
/// # Examples
/// ```
/// use pack_my_van::types::Vec3;
///
/// let corner = Vec3::new(-90.0, -90.0, -90.0);
/// let dims = Vec3::new(50.0, 50.0, 50.0);
/// let center = corner + dims * 0.5;
/// assert_eq!(center, Vec3::new(-65.0, -65.0, -65.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (along the cargo depth)
    /// * `y` - Y component (vertical)
    /// * `z` - Z component (along the cargo width)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Calculates the volume (product of all components).
    ///
    /// Useful for dimension vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Returns this vector scaled by one half.
    ///
    /// The half extents of a dimension vector, for center/corner conversion.
    #[inline]
    pub fn half(&self) -> Self {
        Self::new(self.x / 2.0, self.y / 2.0, self.z / 2.0)
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0
            && self.y > 0.0
            && self.z > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    /// Checks if the vector fits within another vector (component-wise `<=`).
    ///
    /// # Parameters
    /// * `outer` - The enclosing vector (e.g. a free-space size)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance
            && self.y <= outer.y + tolerance
            && self.z <= outer.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;

    #[inline]
    fn index(&self, axis: usize) -> &f64 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 axis index out of bounds: {axis}"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    #[inline]
    fn index_mut(&mut self, axis: usize) -> &mut f64 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 axis index out of bounds: {axis}"),
        }
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

/// Trait for objects with 3D dimensions.
///
/// Provides a common interface for all objects with spatial extent.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
///
/// Provides a common interface for weight operations.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Used for containment checks against the cargo hold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new bounding box.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from its center and full dimensions.
    #[inline]
    pub fn from_center_and_dims(center: Vec3, dims: Vec3) -> Self {
        let half = dims.half();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Creates a bounding box from its minimum corner and dimensions.
    #[inline]
    pub fn from_corner_and_dims(corner: Vec3, dims: Vec3) -> Self {
        Self {
            min: corner,
            max: corner + dims,
        }
    }

    /// Checks if another bounding box lies entirely inside this one.
    ///
    /// # Parameters
    /// * `other` - The inner bounding box
    /// * `tolerance` - Numerical tolerance for the face comparisons
    #[inline]
    pub fn contains(&self, other: &Self, tolerance: f64) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.min.z >= self.min.z - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
            && other.max.z <= self.max.z + tolerance
    }

    /// Returns the top (Y maximum).
    #[inline]
    pub fn top_y(&self) -> f64 {
        self.max.y
    }

    /// Returns the dimensions (extent per axis).
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_vec3_indexing() {
        let mut v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 2.0);
        assert_eq!(v[2], 3.0);

        v[1] = 9.0;
        assert_eq!(v.y, 9.0);
    }

    #[test]
    fn test_vec3_volume_and_half() {
        let dims = Vec3::new(10.0, 20.0, 30.0);
        assert!((dims.volume() - 6000.0).abs() < EPSILON_GENERAL);
        assert_eq!(dims.half(), Vec3::new(5.0, 10.0, 15.0));
    }

    #[test]
    fn test_vec3_fits_within() {
        let small = Vec3::new(5.0, 5.0, 5.0);
        let large = Vec3::new(10.0, 10.0, 10.0);

        assert!(small.fits_within(&large, EPSILON_GENERAL));
        assert!(!large.fits_within(&small, EPSILON_GENERAL));
    }

    #[test]
    fn test_vec3_valid_dimension() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(0.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, -2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, f64::NAN, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, 2.0, f64::INFINITY).is_valid_dimension());
    }

    #[test]
    fn test_aabb_center_corner_agree() {
        let dims = Vec3::new(10.0, 20.0, 30.0);
        let from_corner = Aabb::from_corner_and_dims(Vec3::new(-5.0, -10.0, -15.0), dims);
        let from_center = Aabb::from_center_and_dims(Vec3::zero(), dims);

        assert_eq!(from_corner, from_center);
        assert_eq!(from_center.dimensions(), dims);
        assert!((from_center.top_y() - 10.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_aabb_contains() {
        let outer = Aabb::from_center_and_dims(Vec3::zero(), Vec3::new(100.0, 100.0, 100.0));
        let inner =
            Aabb::from_center_and_dims(Vec3::new(20.0, 20.0, 20.0), Vec3::new(10.0, 10.0, 10.0));
        let poking_out =
            Aabb::from_center_and_dims(Vec3::new(48.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));

        assert!(outer.contains(&inner, EPSILON_GENERAL));
        assert!(!outer.contains(&poking_out, EPSILON_GENERAL));
        // Flush against the wall still counts as contained.
        let flush =
            Aabb::from_center_and_dims(Vec3::new(45.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        assert!(outer.contains(&flush, EPSILON_GENERAL));
    }
}
