//! Immutable per-frame vertex data with a precomputed tangent basis

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::AnimationError;
use crate::assets::MeshData;
use crate::foundation::math::{Vec2, Vec3};
use crate::scene::AABB;

/// Interleaved vertex layout handed to the GPU for one keyframe
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct KeyframeVertex {
    /// Position
    pub position: [f32; 3],
    /// Texture coordinate
    pub uv: [f32; 2],
    /// Normal
    pub normal: [f32; 3],
    /// Tangent (+U direction)
    pub tangent: [f32; 3],
    /// Bitangent (+V direction)
    pub bitangent: [f32; 3],
}

/// One vertex snapshot of an animated mesh
///
/// All attribute arrays share one length; the tangent frame at every vertex
/// is orthonormal with `cross(normal, tangent) == bitangent`.
#[derive(Debug, Clone)]
pub struct Keyframe {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    bitangents: Vec<Vec3>,
    bounds: AABB,
}

impl Keyframe {
    /// Build a keyframe from an unindexed triangle stream
    pub fn new(positions: Vec<Vec3>, uvs: Vec<Vec2>, normals: Vec<Vec3>) -> Result<Self, AnimationError> {
        let count = positions.len();
        if count == 0 {
            return Err(AnimationError::EmptyMesh);
        }
        if normals.len() != count {
            return Err(AnimationError::AttributeCountMismatch { attribute: "normal", expected: count, found: normals.len() });
        }
        if uvs.len() != count {
            return Err(AnimationError::AttributeCountMismatch { attribute: "uv", expected: count, found: uvs.len() });
        }
        if count % 3 != 0 {
            return Err(AnimationError::NotTriangles(count));
        }

        let (flat_tangents, flat_bitangents) = triangle_gradients(&positions, &uvs);
        let (tangents, bitangents) = if is_flat_shaded(&normals) {
            (flat_tangents, flat_bitangents)
        } else {
            (
                average_shared(&positions, &flat_tangents),
                average_shared(&positions, &flat_bitangents),
            )
        };

        let (tangents, bitangents): (Vec<Vec3>, Vec<Vec3>) = normals
            .iter()
            .zip(tangents.iter().zip(&bitangents))
            .map(|(n, (t, b))| orthonormal_frame(n, t, b))
            .unzip();

        let bounds = AABB::from_points(&positions).ok_or(AnimationError::EmptyMesh)?;

        Ok(Self { positions, uvs, normals, tangents, bitangents, bounds })
    }

    /// Build a keyframe from a parsed mesh
    pub fn from_mesh(mesh: &MeshData) -> Result<Self, AnimationError> {
        Self::new(mesh.positions.clone(), mesh.uvs.clone(), mesh.normals.clone())
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Box around all positions
    pub fn bounding_box(&self) -> AABB {
        self.bounds
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Texture coordinates
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Normals
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Unit tangents
    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    /// Unit bitangents
    pub fn bitangents(&self) -> &[Vec3] {
        &self.bitangents
    }

    /// Interleaved copy of every vertex
    pub fn vertices(&self) -> Vec<KeyframeVertex> {
        (0..self.vertex_count())
            .map(|i| KeyframeVertex {
                position: self.positions[i].into(),
                uv: self.uvs[i].into(),
                normal: self.normals[i].into(),
                tangent: self.tangents[i].into(),
                bitangent: self.bitangents[i].into(),
            })
            .collect()
    }

    /// Raw bytes of [`Keyframe::vertices`], ready for a vertex buffer upload
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vertices()).to_vec()
    }
}

/// Per-triangle tangent and bitangent from the UV/position gradient
///
/// Solves `[dp1 dp2] = [T B] * [duv1 duv2]`. Triangles whose UVs are
/// collinear produce zero vectors and are repaired by `orthonormal_frame`.
fn triangle_gradients(positions: &[Vec3], uvs: &[Vec2]) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut tangents = Vec::with_capacity(positions.len());
    let mut bitangents = Vec::with_capacity(positions.len());

    for (p, st) in positions.chunks_exact(3).zip(uvs.chunks_exact(3)) {
        let q1 = p[1] - p[0];
        let q2 = p[2] - p[0];
        let st1 = st[1] - st[0];
        let st2 = st[2] - st[0];

        let det = st1.x * st2.y - st1.y * st2.x;
        let (tangent, bitangent) = if det.abs() > f32::EPSILON {
            ((q1 * st2.y - q2 * st1.y) / det, (q2 * st1.x - q1 * st2.x) / det)
        } else {
            (Vec3::zeros(), Vec3::zeros())
        };

        for _ in 0..3 {
            tangents.push(tangent);
            bitangents.push(bitangent);
        }
    }

    (tangents, bitangents)
}

/// A mesh is flat-shaded as soon as one triangle carries three identical normals
fn is_flat_shaded(normals: &[Vec3]) -> bool {
    normals.chunks_exact(3).any(|n| n[0] == n[1] && n[1] == n[2])
}

fn position_key(p: &Vec3) -> [u32; 3] {
    // +0.0 folds -0.0 onto 0.0 so bitwise keys match float equality
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

/// Sum of `values` over all vertices sharing an exactly equal position
fn average_shared(positions: &[Vec3], values: &[Vec3]) -> Vec<Vec3> {
    let mut sums: HashMap<[u32; 3], Vec3> = HashMap::new();
    for (p, v) in positions.iter().zip(values) {
        *sums.entry(position_key(p)).or_insert_with(Vec3::zeros) += v;
    }
    positions
        .iter()
        .map(|p| sums.get(&position_key(p)).copied().unwrap_or_else(Vec3::zeros))
        .collect()
}

fn any_perpendicular(n: &Vec3) -> Vec3 {
    let helper = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    (helper - n * n.dot(&helper)).normalize()
}

/// Gram-Schmidt the tangent against the normal, fix handedness, rebuild the bitangent
fn orthonormal_frame(normal: &Vec3, tangent: &Vec3, bitangent: &Vec3) -> (Vec3, Vec3) {
    let n = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);

    let mut t = (tangent - n * n.dot(tangent))
        .try_normalize(1e-6)
        .unwrap_or_else(|| any_perpendicular(&n));
    if n.cross(&t).dot(bitangent) < 0.0 {
        t = -t;
    }

    (t, n.cross(&t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(Keyframe::new(vec![], vec![], vec![]).unwrap_err(), AnimationError::EmptyMesh);

        let three = vec![Vec3::zeros(); 3];
        let uvs = vec![Vec2::zeros(); 3];
        assert!(matches!(
            Keyframe::new(three.clone(), uvs.clone(), vec![Vec3::z(); 2]),
            Err(AnimationError::AttributeCountMismatch { attribute: "normal", .. })
        ));
        assert!(matches!(
            Keyframe::new(three.clone(), vec![Vec2::zeros(); 4], vec![Vec3::z(); 3]),
            Err(AnimationError::AttributeCountMismatch { attribute: "uv", .. })
        ));
        assert_eq!(
            Keyframe::new(vec![Vec3::zeros(); 4], vec![Vec2::zeros(); 4], vec![Vec3::z(); 4]).unwrap_err(),
            AnimationError::NotTriangles(4)
        );
    }

    #[test]
    fn test_cube_frames_survive_byte_round_trip() {
        let keyframe = Keyframe::from_mesh(&MeshData::cube(1.0)).unwrap();
        let bytes = keyframe.vertex_bytes();
        let stride = std::mem::size_of::<KeyframeVertex>();
        assert_eq!(bytes.len(), stride * 36);

        let reloaded: Vec<KeyframeVertex> = bytes.chunks_exact(stride).map(bytemuck::pod_read_unaligned).collect();
        assert_eq!(reloaded, keyframe.vertices());

        for v in &reloaded {
            let n = Vec3::from(v.normal);
            let t = Vec3::from(v.tangent);
            let b = Vec3::from(v.bitangent);
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(b.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(t.dot(&n), 0.0, epsilon = 1e-5);
            assert_relative_eq!(b.dot(&n), 0.0, epsilon = 1e-5);
            assert_relative_eq!(t.dot(&b), 0.0, epsilon = 1e-5);
            assert!(n.cross(&t).dot(&b) > 0.0);
        }
    }

    #[test]
    fn test_cube_tangent_follows_u() {
        let keyframe = Keyframe::from_mesh(&MeshData::cube(1.0)).unwrap();
        // +Z face is the fifth face, U runs along +X
        assert_relative_eq!(keyframe.tangents()[24], Vec3::x(), epsilon = 1e-5);
        assert_relative_eq!(keyframe.bitangents()[24], Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_shared_positions_are_averaged_on_smooth_meshes() {
        // Two triangles meeting at the origin, one mapped with U along +X,
        // the other with U along +Y. Normals differ per corner, so the mesh is smooth.
        let tilt = Vec3::new(0.0, 0.1, 1.0).normalize();
        let positions = vec![
            Vec3::zeros(), Vec3::x(), Vec3::y(),
            Vec3::zeros(), Vec3::y(), -Vec3::x(),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0),
        ];
        let normals = vec![Vec3::z(), tilt, Vec3::z(), Vec3::z(), Vec3::z(), tilt];

        let keyframe = Keyframe::new(positions, uvs, normals).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_relative_eq!(keyframe.tangents()[0], expected, epsilon = 1e-5);
        assert_relative_eq!(keyframe.tangents()[3], expected, epsilon = 1e-5);
    }

    #[test]
    fn test_flat_mesh_skips_averaging() {
        let positions = vec![
            Vec3::zeros(), Vec3::x(), Vec3::y(),
            Vec3::zeros(), Vec3::y(), -Vec3::x(),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0),
        ];
        let keyframe = Keyframe::new(positions, uvs, vec![Vec3::z(); 6]).unwrap();
        assert_relative_eq!(keyframe.tangents()[0], Vec3::x(), epsilon = 1e-5);
        assert_relative_eq!(keyframe.tangents()[3], Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_collinear_uvs_still_give_a_frame() {
        let keyframe = Keyframe::new(
            vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
            vec![Vec2::zeros(); 3],
            vec![Vec3::z(); 3],
        )
        .unwrap();
        let t = keyframe.tangents()[0];
        assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(t.dot(&Vec3::z()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_bounding_box() {
        let keyframe = Keyframe::from_mesh(&MeshData::cube(0.5)).unwrap();
        assert_eq!(keyframe.bounding_box(), AABB::new(Vec3::repeat(-0.5), Vec3::repeat(0.5)));
    }
}
