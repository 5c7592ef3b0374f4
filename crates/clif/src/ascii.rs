//! ASCII geometry decoder.
//!
//! Records are lines between `$$GEOMETRYSTART` and `$$GEOMETRYEND`:
//!
//! ```text
//! $$LAYER/z
//! $$POLYLINE/id,dir,n,x1,y1,...,xn,yn
//! $$HATCHES/id,n,xs1,xe1,ys1,ye1,...
//! ```
//!
//! A `$$LAYER` record sets the Z for the polyline and hatch records that
//! follow it. All values are raw and are scaled to millimeters here, once.

use std::str::Split;

use clif_math::to_mm;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::model::{check_layer_z, Geometry, GeometryBuilder, LayerCommand};
use crate::options::{DecodeOptions, UnknownRecordPolicy};
use crate::primitives::{point_from_raw, PointHatch};
use crate::shape::{Direction, Hatch, PolyLine};
use crate::tokens::{self, split_declaration};

/// Decode the ASCII geometry section starting at `cursor`.
pub(crate) fn decode_geometry(
    cursor: &mut ByteCursor<'_>,
    units: f64,
    options: &DecodeOptions,
) -> Result<Geometry> {
    expect_start(cursor)?;

    let mut builder = GeometryBuilder::new();
    let mut current_z: Option<f64> = None;

    while let Some(line) = next_line(cursor) {
        let (keyword, value) = split_declaration(line);
        if keyword.is_empty() {
            continue;
        }
        let value = value.unwrap_or_default();
        match keyword {
            k if k == tokens::GEOMETRY_END.as_bytes() => return Ok(builder.finish()),
            k if k == tokens::LAYER.as_bytes() => {
                let mut fields = Fields::new(tokens::LAYER, value)?;
                let z = fields.next_f64("z")?;
                fields.finish()?;
                current_z = Some(check_layer_z(tokens::LAYER, to_mm(z, units))?);
            }
            k if k == tokens::POLYLINE.as_bytes() => {
                let z = layer_z(tokens::POLYLINE, current_z)?;
                let (model_id, polyline) = parse_polyline(value, units, options)?;
                builder.add_polyline(model_id, z, LayerCommand::Ascii, polyline);
            }
            k if k == tokens::HATCHES.as_bytes() => {
                let z = layer_z(tokens::HATCHES, current_z)?;
                let (model_id, hatch) = parse_hatch(value, units, options)?;
                builder.add_hatch(model_id, z, LayerCommand::Ascii, hatch);
            }
            other => {
                let keyword = String::from_utf8_lossy(other);
                match options.unknown_records {
                    UnknownRecordPolicy::Reject => {
                        return Err(DecodeError::format(keyword, "unrecognized geometry record"));
                    }
                    UnknownRecordPolicy::Skip => {
                        tracing::warn!(%keyword, "skipping unrecognized geometry record");
                    }
                }
            }
        }
    }

    Err(DecodeError::format(
        tokens::GEOMETRY_END,
        "end of input before end of geometry",
    ))
}

fn next_line<'a>(cursor: &mut ByteCursor<'a>) -> Option<&'a [u8]> {
    let line = cursor.take_line()?;
    cursor.skip_terminator();
    Some(line)
}

/// Skip blank lines and consume `$$GEOMETRYSTART`.
fn expect_start(cursor: &mut ByteCursor<'_>) -> Result<()> {
    while let Some(line) = next_line(cursor) {
        let (keyword, _) = split_declaration(line);
        if keyword.is_empty() {
            continue;
        }
        if keyword == tokens::GEOMETRY_START.as_bytes() {
            return Ok(());
        }
        return Err(DecodeError::format(
            tokens::GEOMETRY_START,
            format!(
                "expected start of geometry, found '{}'",
                String::from_utf8_lossy(keyword)
            ),
        ));
    }
    Err(DecodeError::format(
        tokens::GEOMETRY_START,
        "missing start of geometry",
    ))
}

fn layer_z(token: &str, current_z: Option<f64>) -> Result<f64> {
    current_z.ok_or_else(|| DecodeError::format(token, "record before any $$LAYER"))
}

fn parse_polyline(value: &[u8], units: f64, options: &DecodeOptions) -> Result<(i32, PolyLine)> {
    let mut fields = Fields::new(tokens::POLYLINE, value)?;
    let model_id = fields.next_i32("id")?;
    let code = fields.next_i64("dir")?;
    let direction = Direction::from_code(code).ok_or_else(|| {
        DecodeError::format(tokens::POLYLINE, format!("invalid direction {code}"))
    })?;
    let n = fields.next_count(options)?;

    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        let x = fields.next_f64("x")?;
        let y = fields.next_f64("y")?;
        points.push(point_from_raw(x, y, units));
    }
    fields.finish()?;

    Ok((model_id, PolyLine::new(points, direction, units)))
}

fn parse_hatch(value: &[u8], units: f64, options: &DecodeOptions) -> Result<(i32, Hatch)> {
    let mut fields = Fields::new(tokens::HATCHES, value)?;
    let model_id = fields.next_i32("id")?;
    let n = fields.next_count(options)?;

    let mut segments = Vec::with_capacity(n);
    for _ in 0..n {
        let quad = [
            fields.next_f64("xs")?,
            fields.next_f64("xe")?,
            fields.next_f64("ys")?,
            fields.next_f64("ye")?,
        ];
        segments.push(PointHatch::from_raw(quad, units));
    }
    fields.finish()?;

    Ok((model_id, Hatch::new(segments)))
}

/// Comma-separated record arguments.
struct Fields<'a> {
    token: &'static str,
    parts: Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn new(token: &'static str, value: &'a [u8]) -> Result<Self> {
        let text = std::str::from_utf8(value)
            .map_err(|_| DecodeError::format(token, "record is not valid text"))?;
        Ok(Self {
            token,
            parts: text.split(','),
        })
    }

    fn next_str(&mut self, name: &str) -> Result<&'a str> {
        self.parts
            .next()
            .map(str::trim)
            .ok_or_else(|| DecodeError::format(self.token, format!("missing {name}")))
    }

    fn next_f64(&mut self, name: &str) -> Result<f64> {
        let s = self.next_str(name)?;
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(DecodeError::format(
                self.token,
                format!("invalid {name} '{s}'"),
            )),
        }
    }

    fn next_i64(&mut self, name: &str) -> Result<i64> {
        let s = self.next_str(name)?;
        s.parse::<i64>()
            .map_err(|_| DecodeError::format(self.token, format!("invalid {name} '{s}'")))
    }

    fn next_i32(&mut self, name: &str) -> Result<i32> {
        let s = self.next_str(name)?;
        s.parse::<i32>()
            .map_err(|_| DecodeError::format(self.token, format!("invalid {name} '{s}'")))
    }

    /// Point or segment count: positive and within the configured cap.
    fn next_count(&mut self, options: &DecodeOptions) -> Result<usize> {
        let s = self.next_str("n")?;
        let n = s
            .parse::<usize>()
            .map_err(|_| DecodeError::format(self.token, format!("invalid count '{s}'")))?;
        if n == 0 {
            return Err(DecodeError::format(self.token, "count must be positive"));
        }
        options.check_count(self.token, n)?;
        Ok(n)
    }

    /// Fail if arguments remain after the declared ones.
    fn finish(mut self) -> Result<()> {
        let extra = self.parts.by_ref().count();
        if extra > 0 {
            return Err(DecodeError::format(
                self.token,
                format!("{extra} values beyond the declared count"),
            ));
        }
        Ok(())
    }
}
