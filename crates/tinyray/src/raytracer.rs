//! Mesh registration, scene lifecycle and ray queries.

use crate::offset::{
    error_offset, make_background_shadow_ray, make_shadow_ray, make_shadow_ray_to_point,
};
use crate::registry::MeshRegistry;
use crate::stats::{Statistics, Stats};
use crate::{Hit, Result, TinyrayError};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tinyray_accel::{AccelerationScene, BvhScene, GeometryId, RawHit, SceneConfig};
use tinyray_core::TriangleMesh;
use tinyray_math::{as_flat_floats, Interval, Ray, ShadowRay, Vec3};

/// Ray tracers currently holding an unreleased scene.
static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// Number of `Raytracer`s in this process whose scene has not been released.
///
/// Meant for leak checks in tests and diagnostics.
pub fn live_instances() -> usize {
    LIVE_INSTANCES.load(Ordering::SeqCst)
}

/// Ray tracing queries over a set of registered meshes.
///
/// Usage is two-phase. First meshes are added with [`add_mesh`] and the
/// scene is built with [`commit`]; both take `&mut self`. Afterwards the
/// query methods take `&self` and may be called from many threads at once.
/// No locking is added on top of the engine: concurrent queries are only as
/// safe as the engine's read-only queries, which both bundled engines
/// support.
///
/// Misuse (querying before `commit`, adding after it, using a released
/// tracer) panics.
///
/// [`add_mesh`]: Raytracer::add_mesh
/// [`commit`]: Raytracer::commit
pub struct Raytracer<M, S = BvhScene>
where
    S: AccelerationScene,
{
    /// `None` once released
    scene: Option<S>,
    meshes: MeshRegistry<M>,
    committed: bool,
    stats: Statistics,
}

impl<M: TriangleMesh> Raytracer<M, BvhScene> {
    /// Ray tracer on the software BVH with the default config.
    pub fn new() -> Self {
        Self::with_scene(BvhScene::default())
    }

    /// Ray tracer on the software BVH.
    pub fn with_config(config: &SceneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_scene(BvhScene::new(config)))
    }
}

impl<M: TriangleMesh> Default for Raytracer<M, BvhScene> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embree")]
impl<M: TriangleMesh> Raytracer<M, tinyray_accel::EmbreeScene> {
    /// Ray tracer on Intel Embree.
    pub fn with_embree(config: &SceneConfig) -> Result<Self> {
        Ok(Self::with_scene(tinyray_accel::EmbreeScene::new(config)?))
    }
}

impl<M: TriangleMesh, S: AccelerationScene> Raytracer<M, S> {
    /// Take ownership of an empty engine scene.
    pub fn with_scene(scene: S) -> Self {
        LIVE_INSTANCES.fetch_add(1, Ordering::SeqCst);
        Self {
            scene: Some(scene),
            meshes: MeshRegistry::new(),
            committed: false,
            stats: Statistics::default(),
        }
    }

    fn scene(&self) -> &S {
        match &self.scene {
            Some(scene) => scene,
            None => panic!("ray tracer used after release"),
        }
    }

    fn scene_mut(&mut self) -> &mut S {
        match &mut self.scene {
            Some(scene) => scene,
            None => panic!("ray tracer used after release"),
        }
    }

    /// The scene, checked to be ready for queries.
    fn committed_scene(&self) -> &S {
        assert!(self.committed, "scene must be committed before tracing");
        self.scene()
    }

    /// Register a mesh with the engine.
    ///
    /// # Errors
    /// `InvalidMesh` if the index buffer is not whole triangles or references
    /// missing vertices. Nothing is registered in that case.
    ///
    /// # Panics
    /// After `commit`.
    pub fn add_mesh(&mut self, mesh: Arc<M>) -> Result<GeometryId> {
        assert!(!self.committed, "cannot add meshes after the scene is committed");
        validate_mesh(mesh.as_ref())?;

        let id = self
            .scene_mut()
            .add_triangle_mesh(as_flat_floats(mesh.vertices()), mesh.indices());

        log::debug!(
            "Registered mesh as geometry {}: {} vertices, {} triangles",
            id,
            mesh.vertex_count(),
            mesh.face_count()
        );

        self.meshes.insert(id, mesh);
        Ok(id)
    }

    /// Build the acceleration structure. After this only queries are allowed.
    pub fn commit(&mut self) {
        assert!(!self.committed, "scene committed twice");
        if self.meshes.is_empty() {
            log::warn!("Committing a scene without meshes");
        }
        self.scene_mut().finalize();
        self.committed = true;

        log::info!(
            "Committed scene: {} meshes, {} triangles",
            self.meshes.len(),
            self.meshes.iter().map(|(_, m)| m.face_count()).sum::<usize>()
        );
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn is_released(&self) -> bool {
        self.scene.is_none()
    }

    /// Number of registered meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// The mesh registered under `id`.
    pub fn mesh(&self, id: GeometryId) -> Option<&M> {
        self.meshes.get(id)
    }

    /// Closest hit along `ray`, starting at `ray.min_distance`.
    pub fn trace(&self, ray: &Ray) -> Hit<'_, M> {
        let raw = self
            .committed_scene()
            .trace_single(ray, Interval::from_min(ray.min_distance));

        let hit = self.reconstruct(&raw);
        self.stats.record_ray(hit.is_valid());
        hit
    }

    /// Trace many rays in parallel. Equivalent to calling `trace` on each.
    pub fn trace_batch(&self, rays: &[Ray]) -> Vec<Hit<'_, M>> {
        rays.par_iter().map(|ray| self.trace(ray)).collect()
    }

    fn reconstruct(&self, raw: &RawHit) -> Hit<'_, M> {
        if raw.is_miss() {
            return Hit::miss();
        }

        let mesh = match self.meshes.get(raw.geometry_id) {
            Some(mesh) => mesh,
            None => panic!(
                "engine reported geometry id {} which has no registered mesh",
                raw.geometry_id
            ),
        };

        let position = mesh.compute_position(raw.primitive_id, raw.barycentric);
        Hit {
            barycentric: raw.barycentric,
            distance: raw.distance,
            mesh: Some(mesh),
            primitive_id: raw.primitive_id,
            position,
            normal: mesh.face_normal(raw.primitive_id),
            error_offset: error_offset(position, raw.distance),
        }
    }

    /// Whether anything lies on `shadow` within its distance bounds.
    pub fn is_occluded(&self, shadow: &ShadowRay) -> bool {
        let occluded = self
            .committed_scene()
            .is_occluded(&shadow.ray, shadow.range());

        self.stats.record_shadow_ray(occluded);
        occluded
    }

    /// Test many shadow rays in parallel.
    pub fn is_occluded_batch(&self, shadows: &[ShadowRay]) -> Vec<bool> {
        shadows
            .par_iter()
            .map(|shadow| self.is_occluded(shadow))
            .collect()
    }

    /// Whether the segment between two surface points is blocked.
    pub fn is_occluded_between(&self, from: &Hit<'_, M>, to: &Hit<'_, M>) -> bool {
        self.is_occluded(&make_shadow_ray(from, to))
    }

    /// Whether the segment from a surface point to `target` is blocked.
    pub fn is_occluded_point(&self, from: &Hit<'_, M>, target: Vec3) -> bool {
        self.is_occluded(&make_shadow_ray_to_point(from, target))
    }

    /// Whether a ray leaving `from` in `direction` escapes the scene.
    pub fn leaves_scene(&self, from: &Hit<'_, M>, direction: Vec3) -> bool {
        !self.is_occluded(&make_background_shadow_ray(from, direction))
    }

    /// Counters since construction or the last `reset_stats`.
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Free the engine scene.
    ///
    /// Only the first call (or the drop, whichever comes first) frees
    /// anything; later calls do nothing.
    pub fn release(&mut self) {
        if let Some(scene) = self.scene.take() {
            drop(scene);
            LIVE_INSTANCES.fetch_sub(1, Ordering::SeqCst);
            log::debug!("Released ray tracer: {}", self.stats.snapshot());
        }
    }
}

impl<M, S: AccelerationScene> Drop for Raytracer<M, S> {
    fn drop(&mut self) {
        if self.scene.take().is_some() {
            LIVE_INSTANCES.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn validate_mesh<M: TriangleMesh>(mesh: &M) -> Result<()> {
    let indices = mesh.indices();
    if indices.len() % 3 != 0 {
        return Err(TinyrayError::InvalidMesh {
            reason: format!("index count {} is not a multiple of 3", indices.len()),
        });
    }

    let vertex_count = mesh.vertex_count();
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(TinyrayError::InvalidMesh {
            reason: format!("index {} out of range for {} vertices", bad, vertex_count),
        });
    }

    if indices.is_empty() {
        log::warn!("Registering a mesh without triangles");
    }
    Ok(())
}
