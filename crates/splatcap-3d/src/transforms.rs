use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Length scale from engine units (centimeters) to COLMAP units (meters).
pub const CM_TO_METERS: f64 = 0.01;

/// Length scale from COLMAP units (meters) to engine units (centimeters).
pub const METERS_TO_CM: f64 = 100.0;

// engine (X forward, Y right, Z up) -> COLMAP (X right, Y down, Z forward)
// colmap.x = engine.y, colmap.y = -engine.z, colmap.z = engine.x
const AXIS_SWAP: DMat3 = DMat3::from_cols(
    DVec3::new(0.0, 0.0, 1.0),
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(0.0, -1.0, 0.0),
);

// Maps the COLMAP camera frame (+Z look) onto the engine camera frame (+X look) after the
// axis swap. The camera-local remap is the same permutation as the world remap, so the
// conjugated rotation is already aligned and this is the identity.
const CAMERA_LOOK_CORRECTION: DMat3 = DMat3::IDENTITY;

/// An engine orientation expressed as pitch, yaw and roll in degrees.
///
/// Pitch rotates around the right axis (positive looks up), yaw around the up axis and
/// roll around the forward axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    /// Rotation around the right axis in degrees.
    pub pitch: f64,
    /// Rotation around the up axis in degrees.
    pub yaw: f64,
    /// Rotation around the forward axis in degrees.
    pub roll: f64,
}

impl Rotator {
    /// The identity orientation.
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    /// Create a new rotator from pitch, yaw and roll in degrees.
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Orientation looking along `direction` with zero roll.
    pub fn from_direction(direction: DVec3) -> Self {
        let horizontal = (direction.x * direction.x + direction.y * direction.y).sqrt();
        Self {
            pitch: direction.z.atan2(horizontal).to_degrees(),
            yaw: direction.y.atan2(direction.x).to_degrees(),
            roll: 0.0,
        }
    }

    /// Rotation matrix whose columns are the local forward, right and up axes.
    pub fn to_matrix(&self) -> DMat3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        DMat3::from_cols(
            DVec3::new(cp * cy, cp * sy, sp),
            DVec3::new(sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp),
            DVec3::new(-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp),
        )
    }

    /// Recover pitch, yaw and roll from a rotation matrix built by [`Rotator::to_matrix`].
    pub fn from_matrix(m: &DMat3) -> Self {
        let x_axis = m.x_axis;
        let y_axis = m.y_axis;
        let z_axis = m.z_axis;

        let mut rotator = Self {
            pitch: x_axis
                .z
                .atan2((x_axis.x * x_axis.x + x_axis.y * x_axis.y).sqrt())
                .to_degrees(),
            yaw: x_axis.y.atan2(x_axis.x).to_degrees(),
            roll: 0.0,
        };

        let zero_roll_right = rotator.to_matrix().y_axis;
        rotator.roll = z_axis
            .dot(zero_roll_right)
            .atan2(y_axis.dot(zero_roll_right))
            .to_degrees();
        rotator
    }

    /// Unit quaternion of the orientation.
    pub fn to_quat(&self) -> DQuat {
        DQuat::from_mat3(&self.to_matrix()).normalize()
    }

    /// Orientation of a unit quaternion.
    pub fn from_quat(q: DQuat) -> Self {
        Self::from_matrix(&DMat3::from_quat(q.normalize()))
    }

    /// Unit vector the orientation looks along.
    pub fn forward(&self) -> DVec3 {
        self.to_matrix().x_axis
    }

    /// Unit up vector of the orientation.
    pub fn up(&self) -> DVec3 {
        self.to_matrix().z_axis
    }

    /// Wrap every angle into the range (-180, 180].
    pub fn normalized(&self) -> Self {
        Self {
            pitch: normalize_axis(self.pitch),
            yaw: normalize_axis(self.yaw),
            roll: normalize_axis(self.roll),
        }
    }

    /// Compare two orientations per axis modulo 360 degrees.
    pub fn equals(&self, other: &Self, tolerance: f64) -> bool {
        normalize_axis(self.pitch - other.pitch).abs() <= tolerance
            && normalize_axis(self.yaw - other.yaw).abs() <= tolerance
            && normalize_axis(self.roll - other.roll).abs() <= tolerance
    }
}

fn normalize_axis(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// An engine pose: position in centimeters plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Position in engine units.
    pub position: DVec3,
    /// Orientation in engine convention.
    pub rotation: Rotator,
}

impl Transform {
    /// Create a new transform.
    pub fn new(position: DVec3, rotation: Rotator) -> Self {
        Self { position, rotation }
    }
}

/// Convert an engine position (cm, Z-up, left-handed) to COLMAP (m, Y-down, right-handed).
pub fn position_to_colmap(position: DVec3) -> DVec3 {
    AXIS_SWAP * position * CM_TO_METERS
}

/// Convert a COLMAP position back to engine units.
pub fn position_from_colmap(position: DVec3) -> DVec3 {
    AXIS_SWAP.transpose() * position * METERS_TO_CM
}

/// Convert an engine direction to COLMAP. No scale is applied and the result is unit length.
///
/// A zero vector stays zero.
pub fn direction_to_colmap(direction: DVec3) -> DVec3 {
    (AXIS_SWAP * direction).normalize_or_zero()
}

/// Convert a COLMAP direction back to an engine direction of unit length.
pub fn direction_from_colmap(direction: DVec3) -> DVec3 {
    (AXIS_SWAP.transpose() * direction).normalize_or_zero()
}

/// Homogeneous matrix mapping engine positions to COLMAP positions, scale included.
pub fn engine_to_colmap_matrix() -> DMat4 {
    DMat4::from_mat3(AXIS_SWAP * CM_TO_METERS)
}

/// Homogeneous matrix mapping COLMAP positions to engine positions, scale included.
pub fn colmap_to_engine_matrix() -> DMat4 {
    DMat4::from_mat3(AXIS_SWAP.transpose() * METERS_TO_CM)
}

/// Convert an engine camera orientation to a COLMAP world-to-camera quaternion.
pub fn rotation_to_colmap(rotation: &Rotator) -> DQuat {
    camera_to_world_colmap(&rotation.to_matrix()).inverse().normalize()
}

/// Convert an engine camera quaternion to a COLMAP world-to-camera quaternion.
pub fn quat_to_colmap(rotation: DQuat) -> DQuat {
    camera_to_world_colmap(&DMat3::from_quat(rotation.normalize()))
        .inverse()
        .normalize()
}

/// Convert a COLMAP world-to-camera quaternion back to an engine camera orientation.
pub fn rotation_from_colmap(rotation: DQuat) -> Rotator {
    let camera_to_world = DMat3::from_quat(rotation.normalize().inverse());
    let aligned = camera_to_world * CAMERA_LOOK_CORRECTION.transpose();
    Rotator::from_matrix(&(AXIS_SWAP.transpose() * aligned * AXIS_SWAP))
}

fn camera_to_world_colmap(engine_rotation: &DMat3) -> DQuat {
    let conjugated = AXIS_SWAP * *engine_rotation * AXIS_SWAP.transpose();
    DQuat::from_mat3(&(conjugated * CAMERA_LOOK_CORRECTION))
}

/// Convert an engine camera pose into COLMAP position (camera center in meters) and
/// world-to-camera rotation.
pub fn camera_to_colmap(camera: &Transform) -> (DVec3, DQuat) {
    (
        position_to_colmap(camera.position),
        rotation_to_colmap(&camera.rotation),
    )
}

/// World-to-camera translation `t = R * (-C)` for a COLMAP rotation and camera center.
pub fn camera_translation(rotation: DQuat, center: DVec3) -> DVec3 {
    DMat3::from_quat(rotation) * -center
}

/// Recover the camera center `C = -R^T * t` from a COLMAP world-to-camera pose.
pub fn camera_center(rotation: DQuat, translation: DVec3) -> DVec3 {
    DMat3::from_quat(rotation).transpose() * -translation
}

/// Convert an engine position to the 3DGS PLY frame, which is the COLMAP frame.
pub fn position_to_ply(position: DVec3) -> DVec3 {
    position_to_colmap(position)
}

/// Convert an engine orientation to the local frame of a gaussian in the PLY frame.
///
/// Unlike camera rotations this is a plain change of basis with no world-to-camera inversion.
pub fn rotation_to_ply(rotation: &Rotator) -> DQuat {
    let conjugated = AXIS_SWAP * rotation.to_matrix() * AXIS_SWAP.transpose();
    DQuat::from_mat3(&conjugated).normalize()
}

/// Convert an engine scale to the PLY frame. Axes are permuted without sign change.
pub fn scale_to_ply(scale: DVec3) -> DVec3 {
    DVec3::new(scale.y, scale.z, scale.x) * CM_TO_METERS
}
