use maths_rs::prelude::*;

pub fn create_ortho_matrix(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4f {
    Mat4f::from((
        Vec4f::new(2.0 / (right - left), 0.0, 0.0, (right + left) / (left - right)),
        Vec4f::new(0.0, 2.0 / (top - bottom), 0.0, (top + bottom) / (bottom - top)),
        Vec4f::new(0.0, 0.0, 1.0 / (far - near), -near / (far - near)),
        Vec4f::new(0.0, 0.0, 0.0, 1.0),
    ))
}

fn create_perspective_matrix_internal_lh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4f {
    Mat4f::from((
        Vec4f::new((2.0 * near) / (right - left), 0.0, (right + left) / (right - left), 0.0),
        Vec4f::new(0.0, (2.0 * near) / (top - bottom), (top + bottom) / (top - bottom), 0.0),
        Vec4f::new(0.0, 0.0, (-far - near) / (far - near), (-(2.0 * near) * far) / (far - near)),
        Vec4f::new(0.0, 0.0, -1.0, 0.0),
    ))
}

pub fn create_perspective_projection_lh_yup(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4f {
    let tfov = f32::tan(fov * 0.5);
    let right = tfov * aspect * near;
    let left = -right;
    let top = tfov * near;
    let bottom = -top;
    create_perspective_matrix_internal_lh(left, right, top, bottom, near, far)
}

/// View matrix looking from `eye` towards `at`.
pub fn create_look_at_matrix(eye: Vec3f, at: Vec3f, up: Vec3f) -> Mat4f {
    let fwd = normalize(at - eye);
    let side = normalize(cross(fwd, up));
    let upv = cross(side, fwd);
    Mat4f::from((
        Vec4f::new(side.x, side.y, side.z, -dot(side, eye)),
        Vec4f::new(upv.x, upv.y, upv.z, -dot(upv, eye)),
        Vec4f::new(-fwd.x, -fwd.y, -fwd.z, dot(fwd, eye)),
        Vec4f::new(0.0, 0.0, 0.0, 1.0),
    ))
}

/// View matrix for one face of a cubemap rendered from `eye`; face order is
/// +x, -x, +y, -y, +z, -z matching the render target array slices.
pub fn create_cubemap_face_view(face: usize, eye: Vec3f) -> Mat4f {
    let targets = [
        vec3f(1.0, 0.0, 0.0),
        vec3f(-1.0, 0.0, 0.0),
        vec3f(0.0, 1.0, 0.0),
        vec3f(0.0, -1.0, 0.0),
        vec3f(0.0, 0.0, 1.0),
        vec3f(0.0, 0.0, -1.0),
    ];
    let ups = [
        vec3f(0.0, 1.0, 0.0),
        vec3f(0.0, 1.0, 0.0),
        vec3f(0.0, 0.0, -1.0),
        vec3f(0.0, 0.0, 1.0),
        vec3f(0.0, 1.0, 0.0),
        vec3f(0.0, 1.0, 0.0),
    ];
    create_look_at_matrix(eye, eye + targets[face], ups[face])
}

/// Focus point orbit camera; left drag rotates, right drag dollies and middle
/// drag pans. Rotations are held in degrees.
pub struct OrbitCamera {
    pub focus: Vec3f,
    pub rot: Vec2f,
    pub zoom: f32,
}

impl OrbitCamera {
    pub fn new(focus: Vec3f, rot: Vec2f, zoom: f32) -> Self {
        OrbitCamera { focus, rot, zoom }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rot.y -= dx * 0.25;
        self.rot.x -= dy * 0.25;
        self.rot.x = f32::max(f32::min(self.rot.x, 89.0), -89.0);
    }

    pub fn dolly(&mut self, delta: f32) {
        self.zoom = f32::max(self.zoom + delta, 0.1);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        let world = self.get_world_matrix();
        let right = world.get_column(0).xyz();
        let up = world.get_column(1).xyz();
        self.focus -= right * dx;
        self.focus += up * dy;
    }

    fn get_world_matrix(&self) -> Mat4f {
        let mat_rot_x = Mat4f::from_x_rotation(f32::deg_to_rad(self.rot.x));
        let mat_rot_y = Mat4f::from_y_rotation(f32::deg_to_rad(self.rot.y));
        let translate_zoom = Mat4f::from_translation(vec3f(0.0, 0.0, self.zoom));
        let translate_focus = Mat4f::from_translation(self.focus);
        translate_focus * mat_rot_y * mat_rot_x * translate_zoom
    }

    pub fn get_view_matrix(&self) -> Mat4f {
        self.get_world_matrix().inverse()
    }

    pub fn get_position(&self) -> Vec3f {
        self.get_world_matrix().get_column(3).xyz()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maths_rs::prelude::*;

    #[test]
    fn orbit_position_sits_at_zoom_distance() {
        let cam = OrbitCamera::new(Vec3f::zero(), Vec2f::zero(), 10.0);
        let pos = cam.get_position();
        assert!(f32::abs(maths_rs::length(pos) - 10.0) < 0.001);
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut cam = OrbitCamera::new(Vec3f::zero(), Vec2f::zero(), 5.0);
        cam.rotate(0.0, -100000.0);
        assert!(cam.rot.x <= 89.0);
        cam.rotate(0.0, 100000.0);
        assert!(cam.rot.x >= -89.0);
    }

    #[test]
    fn dolly_never_crosses_the_focus() {
        let mut cam = OrbitCamera::new(Vec3f::zero(), Vec2f::zero(), 1.0);
        cam.dolly(-100.0);
        assert!(cam.zoom > 0.0);
    }

    #[test]
    fn look_at_origin_from_z_is_identity_rotation() {
        let view = create_look_at_matrix(Vec3f::zero(), vec3f(0.0, 0.0, -1.0), vec3f(0.0, 1.0, 0.0));
        let v = view * vec4f(1.0, 2.0, -3.0, 1.0);
        assert!(f32::abs(v.x - 1.0) < 0.001);
        assert!(f32::abs(v.y - 2.0) < 0.001);
        assert!(f32::abs(v.z - -3.0) < 0.001);
    }

    #[test]
    fn cubemap_faces_look_down_each_axis() {
        // a point down the +x axis lands in front of the camera on face 0
        let view = create_cubemap_face_view(0, Vec3f::zero());
        let v = view * vec4f(5.0, 0.0, 0.0, 1.0);
        assert!(v.z < 0.0);
        // and behind it on the -x face
        let view = create_cubemap_face_view(1, Vec3f::zero());
        let v = view * vec4f(5.0, 0.0, 0.0, 1.0);
        assert!(v.z > 0.0);
    }

    #[test]
    fn ortho_maps_extents_to_clip_corners() {
        let proj = create_ortho_matrix(-640.0, 640.0, -360.0, 360.0, -1.0, 1.0);
        let v = proj * vec4f(640.0, 360.0, 0.0, 1.0);
        assert!(f32::abs(v.x - 1.0) < 0.001);
        assert!(f32::abs(v.y - 1.0) < 0.001);
    }
}
