//! Collision-shape generation from reconstructed mesh geometry

use async_trait::async_trait;
use handshot_spatial::{Bounds, Point3D};

use crate::anchor::MeshGeometry;

/// Triangles whose doubled area falls below this are treated as degenerate
const DEGENERATE_AREA_EPSILON: f32 = 1e-12;

/// Reasons raw geometry cannot become a collision shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Mesh geometry has no vertices or faces")]
    Empty,

    #[error("Vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },

    #[error("Face {face} references vertex {index} but only {vertex_count} exist")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Every triangle in the mesh is degenerate")]
    Degenerate,
}

/// Static triangle mesh ready for collision
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMeshShape {
    pub vertices: Vec<Point3D>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    StaticMesh(StaticMeshShape),
    Sphere { radius: f32 },
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Shape::StaticMesh(mesh) => mesh.triangles.len(),
            Shape::Sphere { .. } => 0,
        }
    }
}

/// Turns raw reconstructed geometry into a static collision shape
#[async_trait]
pub trait ShapeGenerator: Send + Sync {
    async fn generate_static_mesh(&self, geometry: &MeshGeometry) -> Result<Shape, GeometryError>;
}

/// Validating triangle-mesh builder
#[derive(Debug, Clone, Copy, Default)]
pub struct TriangleMeshGenerator;

impl TriangleMeshGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`ShapeGenerator::generate_static_mesh`]
    pub fn build(&self, geometry: &MeshGeometry) -> Result<StaticMeshShape, GeometryError> {
        if geometry.vertices.is_empty() || geometry.faces.is_empty() {
            return Err(GeometryError::Empty);
        }

        let vertices: Vec<Point3D> = geometry
            .vertices
            .iter()
            .map(|v| Point3D::from_array(*v))
            .collect();
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::NonFiniteVertex { index });
        }

        let vertex_count = vertices.len();
        let mut triangles = Vec::with_capacity(geometry.faces.len());
        for (face, tri) in geometry.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(GeometryError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }

            let [a, b, c] = (*tri).map(|i| vertices[i as usize]);
            let doubled_area = (b - a).cross(&(c - a)).magnitude_squared();
            if doubled_area > DEGENERATE_AREA_EPSILON {
                triangles.push(*tri);
            }
        }

        if triangles.is_empty() {
            return Err(GeometryError::Degenerate);
        }

        let bounds = Bounds::from_points(vertices.iter().copied()).ok_or(GeometryError::Empty)?;
        Ok(StaticMeshShape {
            vertices,
            triangles,
            bounds,
        })
    }
}

#[async_trait]
impl ShapeGenerator for TriangleMeshGenerator {
    async fn generate_static_mesh(&self, geometry: &MeshGeometry) -> Result<Shape, GeometryError> {
        self.build(geometry).map(Shape::StaticMesh)
    }
}
