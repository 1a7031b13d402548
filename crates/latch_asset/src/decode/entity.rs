//! Entity descriptor files (`.ent`)
//!
//! ```text
//! #version 1
//! position 0.0, 1.5, -3.0;
//! rotation 0, 0, 0, 1;
//! mesh cube.obj;
//! texture player.bmp;
//! ```
//!
//! The version line is mandatory. Statements end with `;` and may span
//! lines. Omitted fields keep the `EntityData` defaults.

use crate::data::{AssetData, EntityData};
use crate::handler::AssetHandler;
use crate::{AssetKind, DecodeError};
use glam::{Quat, Vec3};
use std::path::Path;

const SUPPORTED_VERSION: i64 = 1;

pub struct EntityHandler;

impl AssetHandler for EntityHandler {
    fn kind(&self) -> AssetKind {
        AssetKind::Entity
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<AssetData, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| DecodeError::malformed(1, "file is not valid UTF-8"))?;
        let entity = parse_entity(text)?;
        tracing::debug!("Decoded entity {} at {}", path.display(), entity.position);
        Ok(AssetData::Entity(entity))
    }
}

pub fn parse_entity(text: &str) -> Result<EntityData, DecodeError> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or(DecodeError::MissingData {
            what: "version declaration",
        })?;
    parse_version(lines[header], header + 1)?;

    let mut entity = EntityData::default();
    let body = lines[header + 1..].join("\n");
    let mut line = header + 2;
    let mut statements = body.split(';').peekable();

    while let Some(statement) = statements.next() {
        let leading = statement.len() - statement.trim_start().len();
        let start_line = line + statement[..leading].matches('\n').count();
        line += statement.matches('\n').count();

        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        if statements.peek().is_none() {
            return Err(DecodeError::malformed(start_line, "missing ';' after statement"));
        }
        apply_statement(&mut entity, statement, start_line)?;
    }

    Ok(entity)
}

fn parse_version(header: &str, line: usize) -> Result<(), DecodeError> {
    let declaration = header
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| DecodeError::malformed(line, "expected version declaration"))?;

    let mut fields = declaration.split_whitespace();
    if fields.next() != Some("version") {
        return Err(DecodeError::malformed(line, "expected version declaration"));
    }
    let found: i64 = fields
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| DecodeError::malformed(line, "expected version number"))?;
    if fields.next().is_some() {
        return Err(DecodeError::malformed(line, "unexpected tokens after version"));
    }

    if found != SUPPORTED_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found,
            expected: SUPPORTED_VERSION,
        });
    }
    Ok(())
}

fn apply_statement(entity: &mut EntityData, statement: &str, line: usize) -> Result<(), DecodeError> {
    let (identifier, args) = statement
        .split_once(char::is_whitespace)
        .map(|(identifier, args)| (identifier, args.trim()))
        .unwrap_or((statement, ""));

    match identifier {
        "position" => {
            let [x, y, z] = parse_floats::<3>(args, line)?;
            entity.position = Vec3::new(x, y, z);
        }
        "scale" => {
            let [x, y, z] = parse_floats::<3>(args, line)?;
            entity.scale = Vec3::new(x, y, z);
        }
        "rotation" => {
            let [x, y, z, w] = parse_floats::<4>(args, line)?;
            let rotation = Quat::from_xyzw(x, y, z, w);
            if rotation.length_squared() <= f32::EPSILON {
                return Err(DecodeError::malformed(line, "rotation must not be zero"));
            }
            entity.rotation = rotation.normalize();
        }
        "mesh" => entity.mesh = Some(parse_name(args, line)?),
        "texture" => entity.textures.push(parse_name(args, line)?),
        other => {
            return Err(DecodeError::malformed(line, format!("unknown identifier: {other}")));
        }
    }
    Ok(())
}

fn parse_floats<const N: usize>(args: &str, line: usize) -> Result<[f32; N], DecodeError> {
    let fields: Vec<&str> = args.split(',').map(str::trim).collect();
    if fields.len() != N {
        return Err(DecodeError::malformed(
            line,
            format!("expected {N} comma-separated values, found {}", fields.len()),
        ));
    }

    let mut values = [0.0f32; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field
            .parse()
            .map_err(|_| DecodeError::malformed(line, format!("invalid number '{field}'")))?;
    }
    Ok(values)
}

fn parse_name(args: &str, line: usize) -> Result<String, DecodeError> {
    let name = args.trim_matches('"');
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(DecodeError::malformed(line, "expected a single asset name"));
    }
    Ok(name.to_string())
}
