//! Ray and shadow-ray queries over triangle meshes.
//!
//! `tinyray` sits between a renderer and a BVH ray engine. Meshes are
//! registered once, the scene is committed, and afterwards any number of
//! threads can trace rays and test visibility. Hits come back with the mesh
//! they landed on, the world position, the face normal and an error bound.
//! That bound is used to start secondary rays just off the surface so they
//! never re-hit it.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use tinyray::{Mesh, Ray, Raytracer, Vec3};
//!
//! let floor = Arc::new(Mesh::new(
//!     vec![
//!         Vec3::new(-1.0, 0.0, -1.0),
//!         Vec3::new(1.0, 0.0, -1.0),
//!         Vec3::new(1.0, 0.0, 1.0),
//!         Vec3::new(-1.0, 0.0, 1.0),
//!     ],
//!     vec![0, 2, 1, 0, 3, 2],
//! ));
//!
//! let mut tracer = Raytracer::new();
//! tracer.add_mesh(floor).unwrap();
//! tracer.commit();
//!
//! let hit = tracer.trace(&Ray::new_simple(Vec3::new(0.2, 3.0, 0.1), Vec3::NEG_Y));
//! assert!(hit.is_valid());
//! assert!(tracer.leaves_scene(&hit, Vec3::Y));
//! ```

mod error;
mod hit;
mod knn;
pub mod offset;
mod raytracer;
mod registry;
mod stats;

pub use error::{Result, TinyrayError};
pub use hit::Hit;
pub use knn::{KnnAccelerator, KnnCache};
pub use offset::{
    error_offset, make_background_shadow_ray, make_shadow_ray, make_shadow_ray_to_point,
    offset_point, spawn_ray, SHADOW_EPSILON,
};
pub use raytracer::{live_instances, Raytracer};
pub use stats::Stats;

pub use tinyray_accel::{
    AccelError, AccelerationScene, BuildQuality, BvhScene, GeometryId, Neighbor, RawHit,
    SceneConfig,
};
#[cfg(feature = "embree")]
pub use tinyray_accel::EmbreeScene;
pub use tinyray_core::{Mesh, TriangleMesh};
pub use tinyray_math::{Interval, Ray, ShadowRay, Vec2, Vec3};
