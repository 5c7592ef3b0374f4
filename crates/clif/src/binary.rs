//! Binary geometry decoder.
//!
//! The geometry section is a stream of little-endian 16-bit opcodes, each
//! followed by a fixed-width payload. Short records use 16-bit unsigned
//! fields throughout; long records use 32-bit signed integers for IDs and
//! counts and 32-bit floats for coordinates. The stream runs to end of input.

use std::fmt;

use clif_math::to_mm;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::model::{check_layer_z, Geometry, GeometryBuilder, LayerCommand};
use crate::options::DecodeOptions;
use crate::primitives::{point_from_raw, PointHatch};
use crate::shape::{Direction, Hatch, PolyLine};

/// Binary record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Line break artifact; no payload.
    NewLine,
    /// Layer with a 32-bit float Z.
    LayerLong,
    /// Layer with a 16-bit unsigned Z.
    LayerShort,
    /// Polyline with 16-bit fields.
    PolyLineShort,
    /// Polyline with 32-bit fields.
    PolyLineLong,
    /// Hatch with 16-bit fields.
    HatchShort,
    /// Hatch with 32-bit fields.
    HatchLong,
}

impl Opcode {
    /// Map a raw opcode to its record kind.
    pub fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            10 => Self::NewLine,
            127 => Self::LayerLong,
            128 => Self::LayerShort,
            129 => Self::PolyLineShort,
            130 => Self::PolyLineLong,
            131 => Self::HatchShort,
            132 => Self::HatchLong,
            _ => return None,
        })
    }

    /// Raw opcode value.
    pub fn code(self) -> u16 {
        match self {
            Self::NewLine => 10,
            Self::LayerLong => 127,
            Self::LayerShort => 128,
            Self::PolyLineShort => 129,
            Self::PolyLineLong => 130,
            Self::HatchShort => 131,
            Self::HatchLong => 132,
        }
    }

    /// Record name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::NewLine => "NewLine",
            Self::LayerLong => "LayerLong",
            Self::LayerShort => "LayerShort",
            Self::PolyLineShort => "PolyLineShort",
            Self::PolyLineLong => "PolyLineLong",
            Self::HatchShort => "HatchShort",
            Self::HatchLong => "HatchLong",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Field widths of one record family.
#[derive(Clone, Copy)]
enum Width {
    Short,
    Long,
}

impl Width {
    fn bytes(self) -> usize {
        match self {
            Width::Short => 2,
            Width::Long => 4,
        }
    }

    fn read_int(self, cursor: &mut ByteCursor<'_>, context: &str) -> Result<i64> {
        Ok(match self {
            Width::Short => i64::from(cursor.read_u16(context)?),
            Width::Long => i64::from(cursor.read_i32(context)?),
        })
    }

    fn read_real(self, cursor: &mut ByteCursor<'_>, context: &str) -> Result<f64> {
        Ok(match self {
            Width::Short => f64::from(cursor.read_u16(context)?),
            Width::Long => f64::from(cursor.read_f32(context)?),
        })
    }
}

/// Decode opcodes from `cursor` until end of input.
pub(crate) fn decode_geometry(
    cursor: &mut ByteCursor<'_>,
    units: f64,
    options: &DecodeOptions,
) -> Result<Geometry> {
    let mut builder = GeometryBuilder::new();
    let mut layer: Option<(f64, LayerCommand)> = None;

    while !cursor.is_eof() {
        let offset = cursor.position();
        let code = cursor.read_u16("opcode")?;
        let opcode = Opcode::from_u16(code).ok_or_else(|| {
            DecodeError::format(
                format!("opcode {code}"),
                format!("unrecognized opcode at byte {offset}"),
            )
        })?;
        let name = opcode.name();

        match opcode {
            Opcode::NewLine => tracing::trace!(offset, "newline opcode"),
            Opcode::LayerLong => {
                let z = f64::from(cursor.read_f32(name)?);
                check_finite(name, z)?;
                let z = check_layer_z(name, to_mm(z, units))?;
                layer = Some((z, LayerCommand::LayerLong));
            }
            Opcode::LayerShort => {
                let z = f64::from(cursor.read_u16(name)?);
                let z = check_layer_z(name, to_mm(z, units))?;
                layer = Some((z, LayerCommand::LayerShort));
            }
            Opcode::PolyLineShort | Opcode::PolyLineLong => {
                let width = width_of(opcode);
                let (z, command) = current_layer(name, layer)?;
                let (model_id, polyline) = read_polyline(cursor, name, width, units, options)?;
                builder.add_polyline(model_id, z, command, polyline);
            }
            Opcode::HatchShort | Opcode::HatchLong => {
                let width = width_of(opcode);
                let (z, command) = current_layer(name, layer)?;
                let (model_id, hatch) = read_hatch(cursor, name, width, units, options)?;
                builder.add_hatch(model_id, z, command, hatch);
            }
        }
    }

    Ok(builder.finish())
}

fn width_of(opcode: Opcode) -> Width {
    match opcode {
        Opcode::PolyLineLong | Opcode::HatchLong => Width::Long,
        _ => Width::Short,
    }
}

fn current_layer(name: &str, layer: Option<(f64, LayerCommand)>) -> Result<(f64, LayerCommand)> {
    layer.ok_or_else(|| DecodeError::format(name, "record before any layer opcode"))
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DecodeError::format(name, format!("non-finite value {value}")))
    }
}

fn read_model_id(cursor: &mut ByteCursor<'_>, name: &str, width: Width) -> Result<i32> {
    let id = width.read_int(cursor, name)?;
    i32::try_from(id).map_err(|_| DecodeError::format(name, format!("invalid model id {id}")))
}

/// Read a point or segment count and make sure its payload is present.
fn read_count(
    cursor: &mut ByteCursor<'_>,
    name: &str,
    width: Width,
    fields_per_item: usize,
    options: &DecodeOptions,
) -> Result<usize> {
    let raw = width.read_int(cursor, name)?;
    if raw <= 0 {
        return Err(DecodeError::format(name, format!("invalid count {raw}")));
    }
    let n = usize::try_from(raw)
        .map_err(|_| DecodeError::format(name, format!("invalid count {raw}")))?;
    options.check_count(name, n)?;

    let needed = n * fields_per_item * width.bytes();
    if cursor.remaining() < needed {
        return Err(DecodeError::format(
            name,
            format!(
                "unexpected end of input: {n} items need {needed} bytes, {} left",
                cursor.remaining()
            ),
        ));
    }
    Ok(n)
}

fn read_polyline(
    cursor: &mut ByteCursor<'_>,
    name: &str,
    width: Width,
    units: f64,
    options: &DecodeOptions,
) -> Result<(i32, PolyLine)> {
    let model_id = read_model_id(cursor, name, width)?;
    let code = width.read_int(cursor, name)?;
    let direction = Direction::from_code(code)
        .ok_or_else(|| DecodeError::format(name, format!("invalid direction {code}")))?;
    let n = read_count(cursor, name, width, 2, options)?;

    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        let x = width.read_real(cursor, name)?;
        let y = width.read_real(cursor, name)?;
        check_finite(name, x)?;
        check_finite(name, y)?;
        points.push(point_from_raw(x, y, units));
    }

    Ok((model_id, PolyLine::new(points, direction, units)))
}

fn read_hatch(
    cursor: &mut ByteCursor<'_>,
    name: &str,
    width: Width,
    units: f64,
    options: &DecodeOptions,
) -> Result<(i32, Hatch)> {
    let model_id = read_model_id(cursor, name, width)?;
    let n = read_count(cursor, name, width, 4, options)?;

    let mut segments = Vec::with_capacity(n);
    for _ in 0..n {
        let mut quad = [0.0; 4];
        for value in &mut quad {
            *value = width.read_real(cursor, name)?;
            check_finite(name, *value)?;
        }
        segments.push(PointHatch::from_raw(quad, units));
    }

    Ok((model_id, Hatch::new(segments)))
}
