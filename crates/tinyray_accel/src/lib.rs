//! Acceleration engines for tinyray.
//!
//! Every engine implements [`AccelerationScene`]: triangle meshes are added
//! while the scene is mutable, [`AccelerationScene::finalize`] builds the
//! hierarchy once, and afterwards the scene answers closest-hit and
//! occlusion queries from any number of threads.
//!
//! - [`BvhScene`] - pure Rust median-split BVH, always available
//! - `EmbreeScene` - Intel Embree 4 via FFI, behind the `embree` feature
//! - [`PointBvh`] - nearest-neighbour queries over point sets

mod bvh;
mod config;
mod error;
mod point_bvh;
mod scene;
mod triangle;

#[cfg(feature = "embree")]
mod embree;

pub use bvh::BvhScene;
pub use config::{BuildQuality, SceneConfig};
pub use error::{AccelError, Result};
pub use point_bvh::{Neighbor, PointBvh};
pub use scene::{AccelerationScene, GeometryId, RawHit, INVALID_GEOMETRY_ID};

#[cfg(feature = "embree")]
pub use embree::EmbreeScene;
