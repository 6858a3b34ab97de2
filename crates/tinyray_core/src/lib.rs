//! tinyray core - Mesh types consumed by the ray tracing layer.
//!
//! This crate provides:
//!
//! - **`TriangleMesh`**: the interface a caller's mesh must expose to be
//!   registered with a `Raytracer` and to reconstruct hit points
//! - **`Mesh`**: a plain indexed triangle mesh implementing it
//!
//! # Example
//!
//! ```
//! use tinyray_core::{Mesh, TriangleMesh};
//! use tinyray_math::{Vec2, Vec3};
//!
//! let mesh = Mesh::new(
//!     vec![Vec3::ZERO, Vec3::X, Vec3::Z],
//!     vec![0, 1, 2],
//! );
//! let centroid = mesh.compute_position(0, Vec2::splat(1.0 / 3.0));
//! assert!((centroid - Vec3::new(1.0 / 3.0, 0.0, 1.0 / 3.0)).length() < 1e-6);
//! ```

pub mod mesh;

pub use mesh::{Mesh, TriangleMesh};
