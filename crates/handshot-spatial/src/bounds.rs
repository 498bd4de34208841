//! Axis-aligned bounding volumes for collision geometry

use super::Point3D;

/// Axis-aligned box in the local space of whatever owns it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3D,
    pub max: Point3D,
}

impl Bounds {
    pub fn new(min: Point3D, max: Point3D) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, `None` for an empty set
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3D>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| Self {
            min: Point3D::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
            max: Point3D::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let b = Bounds::from_points([
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(2.0, -1.0, 0.5),
            Point3D::new(-1.0, 3.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.min, Point3D::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Point3D::new(2.0, 3.0, 0.5));
    }

    #[test]
    fn test_empty_has_no_bounds() {
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }
}
