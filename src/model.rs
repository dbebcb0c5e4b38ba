//! Data models for the van-loading computation.
//!
//! This module defines the fundamental data structures of the packing core:
//! - `CargoItem`: an object to be loaded, with dimensions, weight and shape
//! - `CargoHold`: the loading space of the vehicle with its weight limit
//! - `PlacedItem`: an item with its chosen position and orientation
//!
//! All dimensions share one caller-supplied unit (centimeters by
//! convention); weights are kilograms. The structures implement the traits
//! from the `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry;
use crate::types::{Aabb, Dimensional, Vec3, Weighted};

/// Validation error for cargo data.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidWeight(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidWeight(msg) => write!(f, "Invalid weight: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Helper function to validate a single dimension.
fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Helper function to validate weight.
fn validate_weight_value(value: f64) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must be positive, got: {}",
            value
        )));
    }
    Ok(())
}

/// Validates item dimensions and weight together.
fn validate_item_params(dims: (f64, f64, f64), weight: f64) -> Result<(), ValidationError> {
    validate_dimension(dims.0, "Length")?;
    validate_dimension(dims.1, "Width")?;
    validate_dimension(dims.2, "Height")?;
    validate_weight_value(weight)?;
    Ok(())
}

/// Geometric shape of a cargo item.
///
/// Every item is packed as its rectangular bounding box; the shape tag only
/// controls the clearance buffers of the collision check and tells the
/// rendering layer which mesh to draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Box,
    Cylinder,
    Sphere,
}

/// Represents a cargo item to be loaded.
///
/// # Fields
/// * `id` - Unique identification number of the item
/// * `label` - Optional display name, passed through untouched
/// * `length`, `width`, `height` - Bounding-box dimensions
/// * `weight` - Weight of the item in kg
/// * `shape` - Shape tag, defaults to `box` when absent in the input
/// * `color` - Optional display color, passed through untouched
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CargoItem {
    pub id: usize,
    #[serde(default)]
    #[schema(nullable = true, example = "Umzugskarton")]
    pub label: Option<String>,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    #[schema(nullable = true, example = "hsl(210, 100%, 50%)")]
    pub color: Option<String>,
}

impl CargoItem {
    /// Creates a new cargo item with validation.
    ///
    /// # Parameters
    /// * `id` - Unique ID
    /// * `dims` - Dimensions as (length, width, height)
    /// * `weight` - Weight in kg
    ///
    /// # Returns
    /// `Ok(CargoItem)` for valid values, otherwise `Err(ValidationError)`
    ///
    /// # Examples
    /// ```
    /// use pack_my_van::model::CargoItem;
    ///
    /// let item = CargoItem::new(1, (50.0, 50.0, 50.0), 10.0);
    /// assert!(item.is_ok());
    ///
    /// let invalid = CargoItem::new(1, (-50.0, 50.0, 50.0), 10.0);
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(id: usize, dims: (f64, f64, f64), weight: f64) -> Result<Self, ValidationError> {
        validate_item_params(dims, weight)?;
        Ok(Self {
            id,
            label: None,
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight,
            shape: Shape::default(),
            color: None,
        })
    }

    /// Sets the shape tag.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Attaches display metadata (label and color).
    pub fn with_meta(mut self, label: Option<String>, color: Option<String>) -> Self {
        self.label = label;
        self.color = color;
        self
    }

    /// Returns the dimensions as (length, width, height).
    #[inline]
    pub fn dims(&self) -> (f64, f64, f64) {
        (self.length, self.width, self.height)
    }

    /// Calculates the bounding-box volume of the item.
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Returns the oriented extents for a rotation index (0-5).
    ///
    /// The result is (extent along X, vertical extent, extent along Z) in
    /// the cargo frame.
    #[inline]
    pub fn rotated_dims(&self, rotation: usize) -> Vec3 {
        geometry::rotated_dims(self.dims(), rotation)
    }
}

/// Implementation of the Dimensional trait for CargoItem.
impl Dimensional for CargoItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Implementation of the Weighted trait for CargoItem.
impl Weighted for CargoItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A placed item with its position in the cargo hold.
///
/// # Fields
/// * `item` - The original cargo item
/// * `position` - Center of the oriented bounding box, in the cargo frame
/// * `rotation` - Orientation index (0-5)
#[derive(Clone, Debug)]
pub struct PlacedItem {
    pub item: CargoItem,
    pub position: Vec3,
    pub rotation: usize,
}

impl PlacedItem {
    /// Creates a new placed item.
    pub fn new(item: CargoItem, position: Vec3, rotation: usize) -> Self {
        Self {
            item,
            position,
            rotation,
        }
    }

    /// Returns the oriented extents of this placement.
    #[inline]
    pub fn dims(&self) -> Vec3 {
        self.item.rotated_dims(self.rotation)
    }

    /// Returns the Y coordinate of the bottom face.
    #[inline]
    pub fn bottom_y(&self) -> f64 {
        self.position.y - self.dims().y / 2.0
    }

    /// Returns the Y coordinate of the top face.
    #[inline]
    pub fn top_y(&self) -> f64 {
        self.position.y + self.dims().y / 2.0
    }

    /// Calculates the bounding box of the placement.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_and_dims(self.position, self.dims())
    }
}

/// Implementation of the Dimensional trait for PlacedItem.
impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.dims()
    }
}

/// Implementation of the Weighted trait for PlacedItem.
impl Weighted for PlacedItem {
    fn weight(&self) -> f64 {
        self.item.weight
    }
}

/// Represents the loading space of the vehicle.
///
/// The weight limit is carried for the calling layer's capacity reporting;
/// the packing computation itself arranges items purely geometrically.
///
/// # Fields
/// * `width`, `height`, `depth` - Interior dimensions
/// * `max_weight` - Maximum payload in kg
#[derive(Clone, Copy, Debug)]
pub struct CargoHold {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub max_weight: f64,
}

impl CargoHold {
    /// Creates a new cargo hold with validation.
    ///
    /// # Parameters
    /// * `dims` - Interior dimensions as (width, height, depth)
    /// * `max_weight` - Maximum payload
    ///
    /// # Returns
    /// `Ok(CargoHold)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(dims: (f64, f64, f64), max_weight: f64) -> Result<Self, ValidationError> {
        validate_dimension(dims.0, "Hold width")?;
        validate_dimension(dims.1, "Hold height")?;
        validate_dimension(dims.2, "Hold depth")?;
        validate_weight_value(max_weight)?;

        Ok(Self {
            width: dims.0,
            height: dims.1,
            depth: dims.2,
            max_weight,
        })
    }

    /// Calculates the interior volume.
    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }

    /// Returns the Y coordinate of the cargo floor.
    ///
    /// The hold is centered on the origin in X and Z; vertically it spans
    /// `[-height/2, height/2]`.
    #[inline]
    pub fn floor_y(&self) -> f64 {
        -self.height / 2.0
    }

    /// Returns the interior size in the cargo frame.
    ///
    /// X spans the depth, Y the height, Z the width. Orientation 0 of an
    /// item maps its length along X, which is the convention the rendering
    /// layer draws in.
    #[inline]
    pub fn frame_size(&self) -> Vec3 {
        Vec3::new(self.depth, self.height, self.width)
    }

    /// Returns the bounding box of the interior in the cargo frame.
    #[inline]
    pub fn interior_aabb(&self) -> Aabb {
        let size = self.frame_size();
        Aabb::from_corner_and_dims(size.half() * -1.0, size)
    }
}

/// Implementation of the Dimensional trait for CargoHold.
impl Dimensional for CargoHold {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    #[test]
    fn item_validation_rejects_bad_values() {
        assert!(CargoItem::new(1, (10.0, 20.0, 30.0), 5.0).is_ok());
        assert!(CargoItem::new(1, (0.0, 20.0, 30.0), 5.0).is_err());
        assert!(CargoItem::new(1, (10.0, -20.0, 30.0), 5.0).is_err());
        assert!(CargoItem::new(1, (10.0, 20.0, f64::NAN), 5.0).is_err());
        assert!(CargoItem::new(1, (10.0, 20.0, 30.0), 0.0).is_err());
        assert!(CargoItem::new(1, (10.0, 20.0, 30.0), f64::INFINITY).is_err());
    }

    #[test]
    fn hold_validation_rejects_bad_values() {
        assert!(CargoHold::new((180.0, 180.0, 300.0), 1500.0).is_ok());
        assert!(CargoHold::new((0.0, 180.0, 300.0), 1500.0).is_err());
        assert!(CargoHold::new((180.0, 180.0, 300.0), -5.0).is_err());
    }

    #[test]
    fn shape_defaults_to_box_in_json() {
        let item: CargoItem = serde_json::from_str(
            r#"{"id": 1, "length": 10.0, "width": 20.0, "height": 30.0, "weight": 5.0}"#,
        )
        .expect("Should parse valid JSON");
        assert_eq!(item.shape, Shape::Box);
        assert!(item.label.is_none());
        assert!(item.color.is_none());

        let cylinder: CargoItem = serde_json::from_str(
            r#"{"id": 2, "length": 10.0, "width": 10.0, "height": 30.0, "weight": 5.0, "shape": "cylinder"}"#,
        )
        .expect("Should parse valid JSON");
        assert_eq!(cylinder.shape, Shape::Cylinder);
    }

    #[test]
    fn hold_frame_is_centered_with_floor_below() {
        let hold = CargoHold::new((180.0, 180.0, 300.0), 1500.0).unwrap();
        assert!((hold.floor_y() + 90.0).abs() < EPSILON_GENERAL);
        assert_eq!(hold.frame_size(), Vec3::new(300.0, 180.0, 180.0));

        let interior = hold.interior_aabb();
        assert_eq!(interior.min, Vec3::new(-150.0, -90.0, -90.0));
        assert_eq!(interior.max, Vec3::new(150.0, 90.0, 90.0));
    }

    #[test]
    fn placed_item_faces_and_aabb() {
        let item = CargoItem::new(1, (50.0, 40.0, 20.0), 8.0).unwrap();
        let placed = PlacedItem::new(item, Vec3::new(0.0, -80.0, 0.0), 0);

        // Orientation 0: length along X, height up, width along Z.
        assert_eq!(placed.dims(), Vec3::new(50.0, 20.0, 40.0));
        assert!((placed.bottom_y() + 90.0).abs() < EPSILON_GENERAL);
        assert!((placed.top_y() + 70.0).abs() < EPSILON_GENERAL);
        assert_eq!(placed.aabb().min, Vec3::new(-25.0, -90.0, -20.0));
    }

    #[test]
    fn item_volume_uses_bounding_box() {
        let item = CargoItem::new(1, (10.0, 20.0, 30.0), 5.0)
            .unwrap()
            .with_shape(Shape::Cylinder);
        assert!((item.volume() - 6000.0).abs() < EPSILON_GENERAL);
        assert!((Dimensional::volume(&item) - 6000.0).abs() < EPSILON_GENERAL);
    }
}
