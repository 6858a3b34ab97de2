//! Triangle mesh interface and a plain indexed implementation.
//!
//! The ray tracing layer never stores geometry itself. It hands the vertex
//! and index buffers of a `TriangleMesh` to the acceleration engine and later
//! asks the same mesh to turn a primitive id and barycentric pair back into
//! a world position and a face normal.

use tinyray_math::{Aabb, Vec2, Vec3};

/// Geometry a `Raytracer` can register and reconstruct hits on.
///
/// Barycentric coordinates follow the engine convention: a point is
/// `(1 - u - v) * v0 + u * v1 + v * v2` for triangle `(v0, v1, v2)`.
pub trait TriangleMesh: Send + Sync {
    /// Vertex positions.
    fn vertices(&self) -> &[Vec3];

    /// Triangle indices (every 3 indices form a triangle).
    fn indices(&self) -> &[u32];

    /// World position of a point on triangle `primitive_id`.
    fn compute_position(&self, primitive_id: u32, barycentric: Vec2) -> Vec3;

    /// Unit face normal of triangle `primitive_id`.
    fn face_normal(&self, primitive_id: u32) -> Vec3;

    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    fn face_count(&self) -> usize {
        self.indices().len() / 3
    }
}

/// A mesh consisting of vertex positions, triangle indices and per-face normals.
///
/// Face normals follow the right-hand rule on the declared winding:
/// `normalize((v1 - v0) x (v2 - v0))`.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    indices: Vec<u32>,

    /// One unit normal per triangle
    face_normals: Vec<Vec3>,

    /// Axis-aligned bounding box
    bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    ///
    /// Face normals are computed eagerly. Triangles referencing missing
    /// vertices, or with zero area, get a `+Y` normal and a warning; the
    /// ray tracer rejects meshes with bad indices at registration.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Self::compute_bounds(&positions);
        let face_normals = Self::compute_face_normals(&positions, &indices);
        Self {
            positions,
            indices,
            face_normals,
            bounds,
        }
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        if positions.is_empty() {
            return Aabb::EMPTY;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for pos in positions {
            min = min.min(*pos);
            max = max.max(*pos);
        }

        Aabb::from_points(min, max)
    }

    fn compute_face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
        let vertex_count = positions.len();

        indices
            .chunks_exact(3)
            .enumerate()
            .map(|(face, tri)| {
                let i0 = tri[0] as usize;
                let i1 = tri[1] as usize;
                let i2 = tri[2] as usize;

                if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                    log::warn!(
                        "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                        i0,
                        i1,
                        i2,
                        vertex_count
                    );
                    return Vec3::Y;
                }

                let edge1 = positions[i1] - positions[i0];
                let edge2 = positions[i2] - positions[i0];
                let normal = edge1.cross(edge2);

                match normal.try_normalize() {
                    Some(n) => n,
                    None => {
                        log::warn!("Degenerate triangle {} has no face normal", face);
                        Vec3::Y
                    }
                }
            })
            .collect()
    }

    /// Per-face unit normals, indexed by primitive id.
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.face_normals.len()
    }

    /// The three corner positions of a triangle.
    pub fn triangle(&self, primitive_id: u32) -> [Vec3; 3] {
        let base = primitive_id as usize * 3;
        [
            self.positions[self.indices[base] as usize],
            self.positions[self.indices[base + 1] as usize],
            self.positions[self.indices[base + 2] as usize],
        ]
    }
}

impl TriangleMesh for Mesh {
    fn vertices(&self) -> &[Vec3] {
        &self.positions
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn compute_position(&self, primitive_id: u32, barycentric: Vec2) -> Vec3 {
        let [v0, v1, v2] = self.triangle(primitive_id);
        (1.0 - barycentric.x - barycentric.y) * v0 + barycentric.x * v1 + barycentric.y * v2
    }

    fn face_normal(&self, primitive_id: u32) -> Vec3 {
        self.face_normals[primitive_id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit quad at y=0 spanning x,z in [-1, 1].
    fn quad(indices: Vec<u32>) -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
            ],
            indices,
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = quad(vec![0, 1, 2, 0, 2, 3]);

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.center(), Vec3::ZERO);
    }

    #[test]
    fn test_face_normals_follow_winding() {
        let down = quad(vec![0, 1, 2, 0, 2, 3]);
        for n in down.face_normals() {
            assert!((*n - Vec3::NEG_Y).length() < 1e-6);
        }

        let up = quad(vec![0, 2, 1, 0, 3, 2]);
        for n in up.face_normals() {
            assert!((*n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_compute_position_corners() {
        let mesh = quad(vec![0, 1, 2, 0, 2, 3]);

        assert_eq!(mesh.compute_position(0, Vec2::ZERO), Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(mesh.compute_position(0, Vec2::new(1.0, 0.0)), Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(mesh.compute_position(1, Vec2::new(0.0, 1.0)), Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(mesh.compute_position(0, Vec2::new(0.0, 0.5)), Vec3::ZERO);
    }

    #[test]
    fn test_invalid_and_degenerate_faces_fall_back_to_up() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0], vec![0, 1, 2, 0, 1, 7]);

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face_normal(0), Vec3::Y);
        assert_eq!(mesh.face_normal(1), Vec3::Y);
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::new(
            vec![Vec3::new(-1.0, -2.0, -3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::ZERO],
            vec![0, 1, 2],
        );

        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds().max, Vec3::new(4.0, 5.0, 6.0));
    }
}
