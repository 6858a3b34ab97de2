//! Intel Embree 4 engine.
//!
//! Hand-written declarations for the handful of `rtc*` entry points a
//! triangle-only scene needs: build, closest hit and occlusion. Linking is
//! set up by `build.rs` when the `embree` feature is on.

use crate::{
    AccelError, AccelerationScene, BuildQuality, GeometryId, RawHit, Result, SceneConfig,
    INVALID_GEOMETRY_ID,
};
use std::ffi::c_void;
use tinyray_math::{Interval, Ray, Vec2};

#[allow(non_camel_case_types)]
type RTCDevice = *mut c_void;

#[allow(non_camel_case_types)]
type RTCScene = *mut c_void;

#[allow(non_camel_case_types)]
type RTCGeometry = *mut c_void;

// rtcore_geometry.h
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCGeometryType {
    Triangle = 0,
}

// RTCBufferType
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCBufferType {
    Index = 0,
    Vertex = 1,
}

// rtcore_common.h: FLOAT3 and UINT3 are the base format + 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCFormat {
    UInt3 = 0x5003,
    Float3 = 0x9003,
}

// rtcore_scene.h
const RTC_SCENE_FLAG_NONE: u32 = 0;
const RTC_SCENE_FLAG_ROBUST: u32 = 1 << 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCBuildQuality {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl From<BuildQuality> for RTCBuildQuality {
    fn from(quality: BuildQuality) -> Self {
        match quality {
            BuildQuality::Low => RTCBuildQuality::Low,
            BuildQuality::Medium => RTCBuildQuality::Medium,
            BuildQuality::High => RTCBuildQuality::High,
        }
    }
}

/// Layout of `RTCRay`.
#[repr(C, align(16))]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
struct RTCRay {
    org_x: f32,
    org_y: f32,
    org_z: f32,
    tnear: f32,

    dir_x: f32,
    dir_y: f32,
    dir_z: f32,
    time: f32,

    tfar: f32,
    mask: u32,
    id: u32,
    flags: u32,
}

/// Layout of `RTCHit` for builds with one instance level.
#[repr(C, align(16))]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
struct RTCHit {
    ng_x: f32,
    ng_y: f32,
    ng_z: f32,

    u: f32,
    v: f32,

    prim_id: u32,
    geom_id: u32,
    inst_id: [u32; 1],
    // Only written by Embree builds with instance array support
    inst_prim_id: [u32; 1],
}

/// Layout of `RTCRayHit`, in/out argument of `rtcIntersect1`.
#[repr(C, align(16))]
#[derive(Debug, Copy, Clone)]
struct RTCRayHit {
    ray: RTCRay,
    hit: RTCHit,
}

#[link(name = "embree4")]
extern "C" {
    fn rtcNewDevice(config: *const std::ffi::c_char) -> RTCDevice;
    fn rtcReleaseDevice(device: RTCDevice);
    fn rtcGetDeviceError(device: RTCDevice) -> i32;

    fn rtcNewScene(device: RTCDevice) -> RTCScene;
    fn rtcReleaseScene(scene: RTCScene);
    fn rtcCommitScene(scene: RTCScene);
    fn rtcSetSceneFlags(scene: RTCScene, flags: u32);
    fn rtcSetSceneBuildQuality(scene: RTCScene, quality: RTCBuildQuality);

    fn rtcNewGeometry(device: RTCDevice, geom_type: RTCGeometryType) -> RTCGeometry;
    fn rtcReleaseGeometry(geom: RTCGeometry);
    fn rtcCommitGeometry(geom: RTCGeometry);
    fn rtcAttachGeometry(scene: RTCScene, geom: RTCGeometry) -> u32;

    fn rtcSetSharedGeometryBuffer(
        geom: RTCGeometry,
        buffer_type: RTCBufferType,
        slot: u32,
        format: RTCFormat,
        ptr: *const c_void,
        byte_offset: usize,
        byte_stride: usize,
        item_count: usize,
    );

    fn rtcIntersect1(
        scene: RTCScene,
        rayhit: *mut RTCRayHit,
        args: *const c_void,
    );

    fn rtcOccluded1(
        scene: RTCScene,
        ray: *mut RTCRay,
        args: *const c_void,
    );
}

/// Name of an `RTCError` code.
fn error_name(code: i32) -> &'static str {
    match code {
        1 => "RTC_ERROR_UNKNOWN",
        2 => "RTC_ERROR_INVALID_ARGUMENT",
        3 => "RTC_ERROR_INVALID_OPERATION",
        4 => "RTC_ERROR_OUT_OF_MEMORY",
        5 => "RTC_ERROR_UNSUPPORTED_CPU",
        6 => "RTC_ERROR_CANCELLED",
        _ => "UNKNOWN_ERROR",
    }
}

impl RTCRay {
    fn from_ray(ray: &Ray, range: Interval) -> Self {
        Self {
            org_x: ray.origin.x,
            org_y: ray.origin.y,
            org_z: ray.origin.z,
            tnear: range.min,

            dir_x: ray.direction.x,
            dir_y: ray.direction.y,
            dir_z: ray.direction.z,
            time: 0.0,

            tfar: range.max,
            mask: 0xFFFFFFFF,
            id: 0,
            flags: 0,
        }
    }
}

impl RTCRayHit {
    fn from_ray(ray: &Ray, range: Interval) -> Self {
        Self {
            ray: RTCRay::from_ray(ray, range),
            hit: RTCHit {
                ng_x: 0.0,
                ng_y: 0.0,
                ng_z: 0.0,
                u: 0.0,
                v: 0.0,
                prim_id: INVALID_GEOMETRY_ID,
                geom_id: INVALID_GEOMETRY_ID,
                inst_id: [INVALID_GEOMETRY_ID],
                inst_prim_id: [INVALID_GEOMETRY_ID],
            },
        }
    }
}

/// Vertex and index data of one attached mesh (Embree holds pointers to it).
struct GeometryBuffers {
    _vertices: Vec<f32>,
    _indices: Vec<u32>,
}

/// Acceleration engine backed by Intel Embree 4.
///
/// Geometry ids are whatever `rtcAttachGeometry` returns.
pub struct EmbreeScene {
    device: RTCDevice,
    scene: RTCScene,

    // Shared with Embree, which reads them until the scene is released
    buffers: Vec<GeometryBuffers>,

    finalized: bool,
}

impl EmbreeScene {
    /// Create a device and an empty scene.
    ///
    /// # Errors
    /// Fails if Embree cannot create a device (missing CPU support, bad config).
    pub fn new(config: &SceneConfig) -> Result<Self> {
        unsafe {
            let device = rtcNewDevice(std::ptr::null());
            if device.is_null() {
                return Err(AccelError::Device("failed to create Embree device".to_string()));
            }

            let err = rtcGetDeviceError(device);
            if err != 0 {
                rtcReleaseDevice(device);
                return Err(AccelError::Device(format!(
                    "Embree device error: {} ({})",
                    err,
                    error_name(err)
                )));
            }

            let scene = rtcNewScene(device);
            if scene.is_null() {
                rtcReleaseDevice(device);
                return Err(AccelError::Device("failed to create Embree scene".to_string()));
            }

            let flags = if config.robust {
                RTC_SCENE_FLAG_ROBUST
            } else {
                RTC_SCENE_FLAG_NONE
            };
            rtcSetSceneFlags(scene, flags);
            rtcSetSceneBuildQuality(scene, config.build_quality.into());

            log::debug!(
                "Embree scene created (quality {:?}, robust {})",
                config.build_quality,
                config.robust
            );

            Ok(Self {
                device,
                scene,
                buffers: Vec::new(),
                finalized: false,
            })
        }
    }

    fn check_device(&self, context: &str) {
        let err = unsafe { rtcGetDeviceError(self.device) };
        if err != 0 {
            panic!("Embree error {}: {} ({})", context, err, error_name(err));
        }
    }
}

impl AccelerationScene for EmbreeScene {
    fn add_triangle_mesh(&mut self, vertices: &[f32], indices: &[u32]) -> GeometryId {
        assert!(!self.finalized, "cannot add geometry to a finalized scene");

        // Embree reads the last vertex with a 16 byte load, so pad by one float
        let mut vertex_data = Vec::with_capacity(vertices.len() + 1);
        vertex_data.extend_from_slice(vertices);
        vertex_data.push(0.0);
        let index_data = indices.to_vec();

        unsafe {
            let geom = rtcNewGeometry(self.device, RTCGeometryType::Triangle);
            if geom.is_null() {
                panic!("rtcNewGeometry returned null");
            }

            rtcSetSharedGeometryBuffer(
                geom,
                RTCBufferType::Vertex,
                0, // slot
                RTCFormat::Float3,
                vertex_data.as_ptr() as *const c_void,
                0,                 // byte offset
                12,                // stride: 3 * f32 = 12 bytes per vertex
                vertices.len() / 3, // vertex count
            );
            self.check_device("after setting vertex buffer");

            rtcSetSharedGeometryBuffer(
                geom,
                RTCBufferType::Index,
                0, // slot
                RTCFormat::UInt3,
                index_data.as_ptr() as *const c_void,
                0,                 // byte offset
                12,                // stride: 3 * u32 = 12 bytes per triangle
                indices.len() / 3, // triangle count
            );
            self.check_device("after setting index buffer");

            rtcCommitGeometry(geom);
            let geom_id = rtcAttachGeometry(self.scene, geom);
            rtcReleaseGeometry(geom);
            self.check_device("after attaching geometry");

            self.buffers.push(GeometryBuffers {
                _vertices: vertex_data,
                _indices: index_data,
            });

            log::debug!(
                "Attached Embree geometry {}: {} vertices, {} triangles",
                geom_id,
                vertices.len() / 3,
                indices.len() / 3
            );

            geom_id
        }
    }

    fn finalize(&mut self) {
        assert!(!self.finalized, "scene finalized twice");
        unsafe {
            rtcCommitScene(self.scene);
        }
        self.check_device("after committing scene");
        self.finalized = true;
    }

    fn trace_single(&self, ray: &Ray, range: Interval) -> RawHit {
        assert!(self.finalized, "scene must be finalized before tracing");

        let mut rayhit = RTCRayHit::from_ray(ray, range);
        unsafe {
            rtcIntersect1(self.scene, &mut rayhit, std::ptr::null());
        }

        if rayhit.hit.geom_id == INVALID_GEOMETRY_ID {
            return RawHit::MISS;
        }

        RawHit {
            distance: rayhit.ray.tfar,
            barycentric: Vec2::new(rayhit.hit.u, rayhit.hit.v),
            geometry_id: rayhit.hit.geom_id,
            primitive_id: rayhit.hit.prim_id,
        }
    }

    fn is_occluded(&self, ray: &Ray, range: Interval) -> bool {
        assert!(self.finalized, "scene must be finalized before tracing");

        let mut rtc_ray = RTCRay::from_ray(ray, range);
        unsafe {
            rtcOccluded1(self.scene, &mut rtc_ray, std::ptr::null());
        }

        // Embree sets tfar to -inf when an occluder is found
        rtc_ray.tfar == f32::NEG_INFINITY
    }
}

impl Drop for EmbreeScene {
    fn drop(&mut self) {
        unsafe {
            rtcReleaseScene(self.scene);
            rtcReleaseDevice(self.device);
        }
    }
}

// SAFETY: the handles are only mutated through `&mut self`. Embree allows
// concurrent rtcIntersect1/rtcOccluded1 calls on a committed scene, and the
// shared buffers outlive the scene because `drop` releases it first.
unsafe impl Send for EmbreeScene {}
unsafe impl Sync for EmbreeScene {}
