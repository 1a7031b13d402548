//! Wavefront OBJ meshes
//!
//! Supports the subset produced by common exporters for triangulated
//! geometry: `v`, `vt`, `vn` and `f` statements. Face corners may be written
//! as `v`, `v/t`, `v//n` or `v/t/n`, with 1-based or negative (relative)
//! indices. Every distinct (v, t, n) corner becomes one output vertex.

use crate::data::{AssetData, Mesh};
use crate::handler::AssetHandler;
use crate::{AssetKind, DecodeError};
use glam::{Vec2, Vec3};
use latch_core::collections::RobinHoodMap;
use std::path::Path;
use std::str::SplitWhitespace;

pub struct ObjHandler;

impl AssetHandler for ObjHandler {
    fn kind(&self) -> AssetKind {
        AssetKind::Mesh
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<AssetData, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| DecodeError::malformed(1, "file is not valid UTF-8"))?;
        let mesh = parse_obj(text)?;
        tracing::debug!(
            "Decoded mesh {}: {} vertices, {} triangles",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(AssetData::Mesh(mesh))
    }
}

/// Zero-based references of one face corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

struct Face {
    line: usize,
    corners: [Corner; 3],
}

pub fn parse_obj(text: &str) -> Result<Mesh, DecodeError> {
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut normals = Vec::new();
    let mut faces = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("");
        let mut fields = content.split_whitespace();

        match fields.next() {
            Some("v") => {
                let [x, y, z] = parse_floats::<3>(fields, line)?;
                positions.push(Vec3::new(x, y, z));
            }
            Some("vt") => {
                let [u, v] = parse_floats::<2>(fields, line)?;
                uvs.push(Vec2::new(u, v));
            }
            Some("vn") => {
                let [x, y, z] = parse_floats::<3>(fields, line)?;
                normals.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let refs: Vec<&str> = fields.collect();
                if refs.len() != 3 {
                    return Err(DecodeError::malformed(
                        line,
                        format!("only triangles are supported, face has {} corners", refs.len()),
                    ));
                }
                let mut corners = [Corner {
                    position: 0,
                    uv: None,
                    normal: None,
                }; 3];
                for (corner, token) in corners.iter_mut().zip(refs) {
                    *corner = parse_corner(token, line, positions.len(), uvs.len(), normals.len())?;
                }
                faces.push(Face { line, corners });
            }
            // o, g, s, usemtl, mtllib and blank lines
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(DecodeError::MissingData { what: "vertices" });
    }
    if faces.is_empty() {
        return Err(DecodeError::MissingData { what: "faces" });
    }

    build_mesh(&positions, &uvs, &normals, &faces)
}

fn build_mesh(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    faces: &[Face],
) -> Result<Mesh, DecodeError> {
    let first = faces[0].corners[0];
    let with_uvs = first.uv.is_some();
    let with_normals = first.normal.is_some();

    let mut mesh = Mesh::default();
    let mut unique: RobinHoodMap<Corner, u32> = RobinHoodMap::new();

    for face in faces {
        for corner in face.corners {
            if corner.uv.is_some() != with_uvs || corner.normal.is_some() != with_normals {
                return Err(DecodeError::malformed(face.line, "faces mix corner formats"));
            }

            if let Some(&index) = unique.get(&corner) {
                mesh.indices.push(index);
                continue;
            }

            let position = *positions
                .get(corner.position)
                .ok_or_else(|| out_of_range(face.line, "vertex"))?;
            mesh.positions.push(position);
            if let Some(uv) = corner.uv {
                mesh.uvs
                    .push(*uvs.get(uv).ok_or_else(|| out_of_range(face.line, "texture coordinate"))?);
            }
            if let Some(normal) = corner.normal {
                mesh.normals
                    .push(*normals.get(normal).ok_or_else(|| out_of_range(face.line, "normal"))?);
            }

            let index = (mesh.positions.len() - 1) as u32;
            unique.add(corner, index).map_err(|_| {
                DecodeError::malformed(face.line, "corner deduplication failed")
            })?;
            mesh.indices.push(index);
        }
    }

    Ok(mesh)
}

fn parse_floats<const N: usize>(
    fields: SplitWhitespace<'_>,
    line: usize,
) -> Result<[f32; N], DecodeError> {
    let mut values = [0.0f32; N];
    let mut count = 0;
    for field in fields {
        // extra components (w, vt's third value) are ignored
        if count == N {
            break;
        }
        values[count] = field
            .parse()
            .map_err(|_| DecodeError::malformed(line, format!("invalid number '{field}'")))?;
        count += 1;
    }
    if count < N {
        return Err(DecodeError::malformed(
            line,
            format!("expected {N} components, found {count}"),
        ));
    }
    Ok(values)
}

fn parse_corner(
    token: &str,
    line: usize,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<Corner, DecodeError> {
    let mut parts = token.split('/');
    let position = match parts.next() {
        Some(raw) if !raw.is_empty() => resolve_index(raw, position_count, line)?,
        _ => return Err(DecodeError::malformed(line, format!("invalid face corner '{token}'"))),
    };
    let uv = match parts.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, uv_count, line)?),
        _ => None,
    };
    let normal = match parts.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, normal_count, line)?),
        _ => None,
    };
    if parts.next().is_some() {
        return Err(DecodeError::malformed(line, format!("invalid face corner '{token}'")));
    }

    Ok(Corner {
        position,
        uv,
        normal,
    })
}

/// Convert a 1-based or negative OBJ index into a 0-based one. Positive
/// indices are range-checked once the whole file has been read.
fn resolve_index(raw: &str, defined_so_far: usize, line: usize) -> Result<usize, DecodeError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| DecodeError::malformed(line, format!("invalid index '{raw}'")))?;

    match value {
        0 => Err(DecodeError::malformed(line, "index 0 is not valid in OBJ")),
        v if v > 0 => Ok((v - 1) as usize),
        v => {
            let back = v.unsigned_abs() as usize;
            defined_so_far
                .checked_sub(back)
                .ok_or_else(|| DecodeError::malformed(line, format!("relative index {v} out of range")))
        }
    }
}

fn out_of_range(line: usize, what: &str) -> DecodeError {
    DecodeError::malformed(line, format!("{what} index out of range"))
}
