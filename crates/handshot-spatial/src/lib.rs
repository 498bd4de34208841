//! handshot-spatial: geometry for the shared world-origin coordinate space
//!
//! Every anchor pose the sensor platform reports is a rigid transform
//! (rotation + translation, no scale or shear). This crate provides:
//! - points, vectors and unit quaternions
//! - a column-major rigid [`Matrix4`] with pure helpers to compose transforms
//!   and pull their translation/rotation apart
//! - axis-aligned bounds for collision geometry
//!
//! Uses a right-handed coordinate system:
//! - X: Right (+) / Left (-)
//! - Y: Up (+) / Down (-)
//! - Z: Backward (+) / Forward (-)

mod bounds;
mod matrix;
mod point3d;
mod quaternion;
mod vector3d;

pub use bounds::Bounds;
pub use matrix::{compose, rotation, translation, Matrix4};
pub use point3d::Point3D;
pub use quaternion::Quaternion;
pub use vector3d::Vector3D;
