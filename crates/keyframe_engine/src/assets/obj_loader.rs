//! OBJ file loader
//!
//! Produces a flat, unindexed triangle stream: every three consecutive
//! vertices form one triangle, which is what keyframes are built from.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::SplitWhitespace;

use thiserror::Error;

use crate::foundation::math::{Vec2, Vec3};

/// OBJ parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A number or index failed to parse
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based source line
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Structurally valid text that does not describe a mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Unindexed triangle soup with per-corner attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Corner positions, three per triangle
    pub positions: Vec<Vec3>,
    /// Corner texture coordinates
    pub uvs: Vec<Vec2>,
    /// Corner normals
    pub normals: Vec<Vec3>,
}

impl MeshData {
    /// Number of corners in the stream
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn push(&mut self, position: Vec3, uv: Vec2, normal: Vec3) {
        self.positions.push(position);
        self.uvs.push(uv);
        self.normals.push(normal);
    }

    /// Axis-aligned cube of the given half size, two triangles per face
    ///
    /// Each face maps the full `[0,1]²` texture square with +U along the
    /// face's first tangent direction.
    pub fn cube(half: f32) -> Self {
        // (normal, u direction, v direction)
        let faces = [
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
        ];

        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let corner = |s: f32, t: f32| (normal + u * (2.0 * s - 1.0) + v * (2.0 * t - 1.0)) * half;
            let quad = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
            for (s, t) in quad {
                mesh.push(corner(s, t), Vec2::new(s, t), normal);
            }
        }
        mesh
    }
}

/// Loader for Wavefront OBJ text
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file into a triangle stream
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjError> {
        let reader = BufReader::new(File::open(path)?);
        Self::parse(reader)
    }

    /// Parse OBJ text already in memory
    pub fn parse_str(source: &str) -> Result<MeshData, ObjError> {
        Self::parse(source.as_bytes())
    }

    fn parse<R: BufRead>(reader: R) -> Result<MeshData, ObjError> {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut tex_coords = Vec::new();
        let mut mesh = MeshData::default();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let mut parts = line.split_whitespace();

            match parts.next() {
                Some("v") => positions.push(Vec3::from(parse_floats::<3>(&mut parts, line_no)?)),
                Some("vn") => normals.push(Vec3::from(parse_floats::<3>(&mut parts, line_no)?)),
                Some("vt") => tex_coords.push(Vec2::from(parse_floats::<2>(&mut parts, line_no)?)),
                Some("f") => {
                    let mut corners = Vec::new();
                    for vertex_data in parts {
                        let mut indices = vertex_data.split('/');
                        let pos_idx = parse_index(indices.next(), line_no)?
                            .ok_or_else(|| parse_error(line_no, "face corner without position"))?;
                        let tex_idx = parse_index(indices.next(), line_no)?;
                        let normal_idx = parse_index(indices.next(), line_no)?;

                        let position = lookup(&positions, pos_idx, "position", line_no)?;
                        let tex_coord = match tex_idx {
                            Some(i) => lookup(&tex_coords, i, "texture coordinate", line_no)?,
                            None => Vec2::zeros(),
                        };
                        let normal = match normal_idx {
                            Some(i) => lookup(&normals, i, "normal", line_no)?,
                            None => Vec3::y(),
                        };
                        corners.push((position, tex_coord, normal));
                    }

                    if corners.len() < 3 {
                        return Err(ObjError::InvalidFormat(format!("face with fewer than 3 corners on line {line_no}")));
                    }

                    // Fan triangulation
                    for i in 1..corners.len() - 1 {
                        for (position, uv, normal) in [corners[0], corners[i], corners[i + 1]] {
                            mesh.push(position, uv, normal);
                        }
                    }
                }
                _ => {}
            }
        }

        if mesh.positions.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }

        Ok(mesh)
    }
}

fn parse_error(line: usize, message: &str) -> ObjError {
    ObjError::ParseError { line, message: message.to_string() }
}

fn parse_floats<const N: usize>(parts: &mut SplitWhitespace<'_>, line: usize) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in &mut values {
        *value = parts
            .next()
            .ok_or_else(|| parse_error(line, "missing component"))?
            .parse()
            .map_err(|_| parse_error(line, "invalid number"))?;
    }
    Ok(values)
}

fn lookup<T: Copy>(values: &[T], index: usize, kind: &str, line: usize) -> Result<T, ObjError> {
    values
        .get(index)
        .copied()
        .ok_or_else(|| ObjError::InvalidFormat(format!("{kind} index out of bounds on line {line}")))
}

/// OBJ indices are 1-based; an empty slot (`1//3`) means "absent"
fn parse_index(field: Option<&str>, line: usize) -> Result<Option<usize>, ObjError> {
    match field {
        None | Some("") => Ok(None),
        Some(text) => match text.parse::<usize>() {
            Ok(0) | Err(_) => Err(parse_error(line, "invalid index")),
            Ok(index) => Ok(Some(index - 1)),
        },
    }
}
