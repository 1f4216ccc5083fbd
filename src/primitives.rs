use maths_rs::prelude::*;

#[cfg(target_os = "windows")]
use crate::gfx;

/// Vertex layout for lit meshes, matches the POSITION/NORMAL input layouts.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Vertex3D {
    pub position: Vec3f,
    pub normal: Vec3f,
}

/// Vertex layout for textured geometry, matches the POSITION/TEXCOORD input layouts.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VertexUV {
    pub position: Vec3f,
    pub texcoord: Vec2f,
}

/// kappa, distance of the control points for a cubic bezier approximation of a quarter circle.
const CUBIC_CIRCLE_KAPPA: f32 = 0.5522847498;

/// Creates an indexed uv-sphere with smooth normals.
pub fn create_sphere_vertices(segments: usize, radius: f32) -> (Vec<Vertex3D>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let rows = segments + 1;
    for y in 0..rows {
        let theta = f32::pi() * y as f32 / segments as f32;
        for x in 0..rows {
            let phi = f32::tau() * x as f32 / segments as f32;
            let n = vec3f(
                f32::cos(phi) * f32::sin(theta),
                f32::cos(theta),
                f32::sin(phi) * f32::sin(theta),
            );
            vertices.push(Vertex3D {
                position: n * radius,
                normal: n,
            });
        }
    }

    for y in 0..segments {
        for x in 0..segments {
            let v0 = (y * rows + x) as u32;
            let v1 = v0 + 1;
            let v2 = v0 + rows as u32;
            let v3 = v2 + 1;
            indices.extend_from_slice(&[v0, v1, v2, v2, v1, v3]);
        }
    }

    (vertices, indices)
}

/// Creates an indexed cube with hard edged face normals.
pub fn create_cube_vertices(half_extent: f32) -> (Vec<Vertex3D>, Vec<u32>) {
    // face normal, right axis, up axis
    let faces = [
        (vec3f(0.0, 0.0, 1.0), vec3f(1.0, 0.0, 0.0), vec3f(0.0, 1.0, 0.0)),
        (vec3f(0.0, 0.0, -1.0), vec3f(-1.0, 0.0, 0.0), vec3f(0.0, 1.0, 0.0)),
        (vec3f(1.0, 0.0, 0.0), vec3f(0.0, 0.0, -1.0), vec3f(0.0, 1.0, 0.0)),
        (vec3f(-1.0, 0.0, 0.0), vec3f(0.0, 0.0, 1.0), vec3f(0.0, 1.0, 0.0)),
        (vec3f(0.0, 1.0, 0.0), vec3f(1.0, 0.0, 0.0), vec3f(0.0, 0.0, -1.0)),
        (vec3f(0.0, -1.0, 0.0), vec3f(1.0, 0.0, 0.0), vec3f(0.0, 0.0, 1.0)),
    ];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (normal, right, up) in faces {
        let base = vertices.len() as u32;
        let corners = [
            normal - right - up,
            normal + right - up,
            normal + right + up,
            normal - right + up,
        ];
        for corner in corners {
            vertices.push(Vertex3D {
                position: corner * half_extent,
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }

    (vertices, indices)
}

/// Creates a flat grid of `divide` x `divide` quad patches covering `edge` units,
/// centred on the origin, 4 control point indices per patch.
pub fn create_ground_patch_vertices(edge: f32, divide: usize) -> (Vec<VertexUV>, Vec<u32>) {
    let rows = (divide + 1) as u32;
    let mut vertices = Vec::new();
    for z in 0..divide + 1 {
        for x in 0..divide + 1 {
            let px = edge * x as f32 / divide as f32;
            let pz = edge * z as f32 / divide as f32;
            vertices.push(VertexUV {
                position: vec3f(px - edge * 0.5, 0.0, pz - edge * 0.5),
                texcoord: vec2f(px / edge, pz / edge),
            });
        }
    }

    let mut indices = Vec::new();
    for z in 0..divide as u32 {
        for x in 0..divide as u32 {
            let v0 = x + rows * z;
            let v1 = v0 + 1;
            indices.extend_from_slice(&[v0 + rows, v1 + rows, v0, v1]);
        }
    }

    (vertices, indices)
}

// control points of a circle of 4 cubic bezier arcs, 4 points per arc with
// shared endpoints
fn cubic_circle_arcs(radius: f32) -> [[Vec2f; 4]; 4] {
    let k = CUBIC_CIRCLE_KAPPA * radius;
    let r = radius;
    [
        [vec2f(r, 0.0), vec2f(r, k), vec2f(k, r), vec2f(0.0, r)],
        [vec2f(0.0, r), vec2f(-k, r), vec2f(-r, k), vec2f(-r, 0.0)],
        [vec2f(-r, 0.0), vec2f(-r, -k), vec2f(-k, -r), vec2f(0.0, -r)],
        [vec2f(0.0, -r), vec2f(k, -r), vec2f(r, -k), vec2f(r, 0.0)],
    ]
}

/// Creates the control mesh of a torus out of 16 bicubic bezier patches, the
/// tensor product of two 4-arc circle approximations. 16 control points per
/// patch, u runs around the major ring and v around the cross section.
pub fn create_bezier_torus_patches(radius: f32, section_radius: f32) -> (Vec<Vec3f>, Vec<u32>) {
    let major = cubic_circle_arcs(1.0);
    let minor = cubic_circle_arcs(section_radius);

    let mut control_points = Vec::new();
    let mut indices = Vec::new();
    for maj_arc in &major {
        for min_arc in &minor {
            let base = control_points.len() as u32;
            // row per cross section control point, column per ring control point
            for m in min_arc {
                for q in maj_arc {
                    let ring = radius + m.x;
                    control_points.push(vec3f(q.x * ring, m.y, q.y * ring));
                }
            }
            for i in 0..16 {
                indices.push(base + i);
            }
        }
    }

    (control_points, indices)
}

/// Creates a screen space quad centred at `centre` in ortho projected units,
/// indexed as a 4 vertex triangle strip.
pub fn create_screen_quad_vertices(centre: Vec2f, half_width: f32, half_height: f32) -> (Vec<VertexUV>, Vec<u32>) {
    let vertices = vec![
        VertexUV {
            position: vec3f(centre.x - half_width, centre.y + half_height, 0.0),
            texcoord: vec2f(0.0, 0.0),
        },
        VertexUV {
            position: vec3f(centre.x + half_width, centre.y + half_height, 0.0),
            texcoord: vec2f(1.0, 0.0),
        },
        VertexUV {
            position: vec3f(centre.x - half_width, centre.y - half_height, 0.0),
            texcoord: vec2f(0.0, 1.0),
        },
        VertexUV {
            position: vec3f(centre.x + half_width, centre.y - half_height, 0.0),
            texcoord: vec2f(1.0, 1.0),
        },
    ];
    (vertices, vec![0, 1, 2, 3])
}

/// Create an indexed unit sphere mesh instance.
#[cfg(target_os = "windows")]
pub fn create_sphere_mesh(dev: &mut gfx::Device, segments: usize) -> Result<gfx::Mesh, crate::Error> {
    let (vertices, indices) = create_sphere_vertices(segments, 1.0);
    dev.create_mesh(&vertices, &indices)
}

/// Create an indexed unit cube mesh instance.
#[cfg(target_os = "windows")]
pub fn create_cube_mesh(dev: &mut gfx::Device) -> Result<gfx::Mesh, crate::Error> {
    let (vertices, indices) = create_cube_vertices(1.0);
    dev.create_mesh(&vertices, &indices)
}

/// Create a ground grid of quad patches for tessellation.
#[cfg(target_os = "windows")]
pub fn create_ground_patch_mesh(dev: &mut gfx::Device, edge: f32, divide: usize) -> Result<gfx::Mesh, crate::Error> {
    let (vertices, indices) = create_ground_patch_vertices(edge, divide);
    dev.create_mesh(&vertices, &indices)
}

/// Create the bezier patch torus for tessellation.
#[cfg(target_os = "windows")]
pub fn create_bezier_torus_mesh(dev: &mut gfx::Device, radius: f32, section_radius: f32) -> Result<gfx::Mesh, crate::Error> {
    let (control_points, indices) = create_bezier_torus_patches(radius, section_radius);
    dev.create_mesh(&control_points, &indices)
}

/// Create a textured screen space quad.
#[cfg(target_os = "windows")]
pub fn create_screen_quad_mesh(dev: &mut gfx::Device, centre: Vec2f, half_width: f32, half_height: f32) -> Result<gfx::Mesh, crate::Error> {
    let (vertices, indices) = create_screen_quad_vertices(centre, half_width, half_height);
    dev.create_mesh(&vertices, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maths_rs::prelude::*;

    #[test]
    fn sphere_counts_and_unit_normals() {
        let segments = 16;
        let (vertices, indices) = create_sphere_vertices(segments, 2.0);
        assert_eq!(vertices.len(), (segments + 1) * (segments + 1));
        assert_eq!(indices.len(), segments * segments * 6);
        for v in &vertices {
            assert!(f32::abs(length(v.normal) - 1.0) < 0.001);
            assert!(f32::abs(length(v.position) - 2.0) < 0.001);
        }
        for i in &indices {
            assert!((*i as usize) < vertices.len());
        }
    }

    #[test]
    fn cube_has_six_faceted_faces() {
        let (vertices, indices) = create_cube_vertices(1.0);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            // every corner of a unit cube is distance sqrt(3) from the centre
            assert!(f32::abs(length(v.position) - f32::sqrt(3.0)) < 0.001);
            assert!(f32::abs(length(v.normal) - 1.0) < 0.001);
        }
    }

    #[test]
    fn ground_grid_is_centred_quad_patches() {
        let divide = 10;
        let edge = 200.0;
        let (vertices, indices) = create_ground_patch_vertices(edge, divide);
        assert_eq!(vertices.len(), (divide + 1) * (divide + 1));
        // 4 control points per cell
        assert_eq!(indices.len(), divide * divide * 4);
        for v in &vertices {
            assert!(v.position.x >= -edge * 0.5 - 0.001 && v.position.x <= edge * 0.5 + 0.001);
            assert!(v.position.z >= -edge * 0.5 - 0.001 && v.position.z <= edge * 0.5 + 0.001);
            assert!(v.texcoord.x >= 0.0 && v.texcoord.x <= 1.0);
        }
    }

    #[test]
    fn bezier_torus_patch_counts() {
        let (control_points, indices) = create_bezier_torus_patches(10.0, 2.0);
        assert_eq!(control_points.len(), 16 * 16);
        assert_eq!(indices.len(), 16 * 16);
        // control points stay inside the outer ring bound
        for p in &control_points {
            let ring = f32::sqrt(p.x * p.x + p.z * p.z);
            assert!(ring <= 10.0 + 2.0 * (1.0 + CUBIC_CIRCLE_KAPPA) + 0.001);
            assert!(f32::abs(p.y) <= 2.0 + 0.001);
        }
    }

    #[test]
    fn screen_quad_uv_corners() {
        let (vertices, indices) = create_screen_quad_vertices(vec2f(100.0, 0.0), 240.0, 135.0);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(vertices[0].texcoord.x, 0.0);
        assert_eq!(vertices[3].texcoord.y, 1.0);
        assert!(f32::abs(vertices[0].position.x - -140.0) < 0.001);
    }
}
