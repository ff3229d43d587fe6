//! Vector and matrix primitives
//!
//! The simulation works in double precision on the x/z plane of a 3D world.
//! glam provides the vector and matrix types; this module adds the handful of
//! conversions the rest of the workspace shares (world ↔ grid coordinates and
//! the matrices a render collaborator needs).

pub use glam::{DMat4, DQuat, DVec2, DVec3, Mat4, Vec3};

/// Project a world-space vector onto the simulation plane (x, z)
#[inline]
pub fn planar(v: DVec3) -> DVec2 {
    DVec2::new(v.x, v.z)
}

/// Lift a planar vector back into world space with y = 0
#[inline]
pub fn from_planar(v: DVec2) -> DVec3 {
    DVec3::new(v.x, 0.0, v.y)
}

/// Continuous grid coordinate of a world-space position.
///
/// The grid is centred on the origin, so world `(-w/2, -h/2)` maps to grid
/// `(0, 0)`.
#[inline]
pub fn grid_coordinate(position: DVec3, width: usize, height: usize) -> DVec2 {
    DVec2::new(
        position.x + width as f64 / 2.0,
        position.z + height as f64 / 2.0,
    )
}

/// Split a continuous coordinate into its cell index and fractional offset.
///
/// Uses `floor`, so the fraction is always in `[0, 1)` and negative
/// coordinates land in negative cells.
#[inline]
pub fn split_cell(coord: f64) -> (i64, f64) {
    let cell = coord.floor();
    (cell as i64, coord - cell)
}

/// Model matrix placing a unit sphere at `position`, scaled to `radius`
pub fn model_matrix(position: DVec3, radius: f64) -> DMat4 {
    DMat4::from_scale_rotation_translation(DVec3::splat(radius), DQuat::IDENTITY, position)
}

/// Right-handed perspective view-projection for a camera at `eye` looking at `target`
pub fn view_projection(
    eye: DVec3,
    target: DVec3,
    fov_y: f64,
    aspect: f64,
    near: f64,
    far: f64,
) -> DMat4 {
    DMat4::perspective_rh(fov_y, aspect, near, far) * DMat4::look_at_rh(eye, target, DVec3::Y)
}

/// Column-major f32 layout for uniform buffers
pub fn to_gpu_matrix(m: DMat4) -> [[f32; 4]; 4] {
    m.as_mat4().to_cols_array_2d()
}
