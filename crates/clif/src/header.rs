//! Header section decoder.
//!
//! The header is a run of text lines from the start of the file up to
//! `$$HEADEREND`. Each declaration has the form `TOKEN/value[,value...]`,
//! or just `TOKEN` for flags. Required: the file type flag, `$$UNITS` and
//! `$$VERSION`. Everything else is optional but must be well formed when
//! present.

use chrono::NaiveDate;
use clif_math::{to_mm, Point3};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::primitives::{Dimension, FileType, Label, UserData};
use crate::tokens::{self, split_declaration};

/// Decoded header declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Encoding of the geometry section.
    pub file_type: FileType,
    /// Millimeters per raw unit; always positive.
    pub units: f64,
    /// Format version (the declared integer divided by 100).
    pub version: f64,
    /// Build date.
    pub date: Option<NaiveDate>,
    /// Part bounding box (mm).
    pub dimension: Option<Dimension>,
    /// Declared layer count. Advisory only.
    pub layers: Option<u32>,
    /// Alignment flag.
    pub align: bool,
    /// Model labels in declaration order.
    pub labels: Vec<Label>,
    /// Vendor payload.
    pub user_data: Option<UserData>,
}

impl Header {
    /// Text of the first label declared for `model_id`.
    pub fn label_for(&self, model_id: i32) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.id == model_id)
            .map(|l| l.text.as_str())
    }
}

/// Read the header, leaving `cursor` just past `$$HEADEREND` and its line
/// terminator.
pub(crate) fn decode_header(cursor: &mut ByteCursor<'_>) -> Result<Header> {
    let lines = read_section(cursor)?;
    let header = parse_declarations(&lines)?;
    tracing::debug!(
        file_type = %header.file_type,
        units = header.units,
        version = header.version,
        labels = header.labels.len(),
        "decoded header"
    );
    Ok(header)
}

/// Collect the raw lines before `$$HEADEREND`.
fn read_section<'a>(cursor: &mut ByteCursor<'a>) -> Result<Vec<&'a [u8]>> {
    let end = tokens::HEADER_END.as_bytes();
    let mut lines = Vec::new();
    loop {
        // The marker may be followed directly by binary data, so it is
        // matched as a prefix rather than as a whole line.
        if cursor.starts_with(end) {
            cursor.take(end.len());
            skip_end_terminator(cursor);
            return Ok(lines);
        }
        match cursor.take_line() {
            Some(line) => {
                lines.push(line);
                cursor.skip_terminator();
            }
            None => {
                return Err(DecodeError::format(
                    tokens::HEADER_END,
                    "end of input before end of header",
                ))
            }
        }
    }
}

/// Consume the terminator after `$$HEADEREND`.
///
/// A `\n` followed by a zero byte is the binary NewLine opcode (10 as a
/// little-endian u16), which belongs to the geometry stream.
fn skip_end_terminator(cursor: &mut ByteCursor<'_>) {
    if cursor.peek() == Some(b'\r') {
        cursor.advance();
    }
    if cursor.peek() == Some(b'\n') && cursor.peek_at(1) != Some(0) {
        cursor.advance();
    }
}

/// Declarations grouped by keyword, in file order.
#[derive(Default)]
struct Declarations<'a> {
    ascii: usize,
    binary: usize,
    align: bool,
    units: Vec<&'a [u8]>,
    version: Vec<&'a [u8]>,
    date: Vec<&'a [u8]>,
    dimension: Vec<&'a [u8]>,
    layers: Vec<&'a [u8]>,
    labels: Vec<&'a [u8]>,
    user_data: Vec<&'a [u8]>,
}

fn parse_declarations(lines: &[&[u8]]) -> Result<Header> {
    let mut decl = Declarations::default();

    for line in lines {
        let (keyword, value) = split_declaration(line);
        if keyword.is_empty() {
            continue;
        }
        let value = value.unwrap_or_default();
        match keyword {
            k if k == tokens::HEADER_START.as_bytes() => {}
            k if k == tokens::ASCII.as_bytes() => decl.ascii += 1,
            k if k == tokens::BINARY.as_bytes() => decl.binary += 1,
            k if k == tokens::ALIGN.as_bytes() => decl.align = true,
            k if k == tokens::UNITS.as_bytes() => decl.units.push(value),
            k if k == tokens::VERSION.as_bytes() => decl.version.push(value),
            k if k == tokens::DATE.as_bytes() => decl.date.push(value),
            k if k == tokens::DIMENSION.as_bytes() => decl.dimension.push(value),
            k if k == tokens::LAYERS.as_bytes() => decl.layers.push(value),
            k if k == tokens::LABEL.as_bytes() => decl.labels.push(value),
            k if k == tokens::USERDATA.as_bytes() => decl.user_data.push(value),
            other => {
                tracing::debug!(
                    keyword = %String::from_utf8_lossy(other),
                    "ignoring unknown header line"
                );
            }
        }
    }

    let file_type = match (decl.ascii > 0, decl.binary > 0) {
        (true, false) => FileType::Ascii,
        (false, true) => FileType::Binary,
        (true, true) => {
            return Err(DecodeError::format(
                "$$ASCII/$$BINARY",
                "both file types declared",
            ))
        }
        (false, false) => {
            return Err(DecodeError::format(
                "$$ASCII/$$BINARY",
                "missing file type declaration",
            ))
        }
    };

    let units = parse_f64(tokens::UNITS, required(tokens::UNITS, &decl.units)?)?;
    if units <= 0.0 {
        return Err(DecodeError::format(
            tokens::UNITS,
            format!("units must be positive, got {units}"),
        ));
    }

    let version = parse_f64(tokens::VERSION, required(tokens::VERSION, &decl.version)?)? / 100.0;

    let date = optional(tokens::DATE, &decl.date)?
        .map(parse_date)
        .transpose()?;

    let dimension = optional(tokens::DIMENSION, &decl.dimension)?
        .map(|value| parse_dimension(value, units))
        .transpose()?;

    let layers = optional(tokens::LAYERS, &decl.layers)?
        .map(|value| {
            as_str(tokens::LAYERS, value)?.parse::<u32>().map_err(|e| {
                DecodeError::format(tokens::LAYERS, format!("invalid layer count: {e}"))
            })
        })
        .transpose()?;

    let labels = decl
        .labels
        .iter()
        .map(|value| parse_label(value))
        .collect::<Result<Vec<_>>>()?;

    let user_data = optional(tokens::USERDATA, &decl.user_data)?
        .map(parse_user_data)
        .transpose()?;

    Ok(Header {
        file_type,
        units,
        version,
        date,
        dimension,
        layers,
        align: decl.align,
        labels,
        user_data,
    })
}

fn optional<'a>(token: &str, values: &[&'a [u8]]) -> Result<Option<&'a [u8]>> {
    match values {
        [] => Ok(None),
        [value] => Ok(Some(*value)),
        _ => Err(DecodeError::format(
            token,
            format!("declared {} times, expected once", values.len()),
        )),
    }
}

fn required<'a>(token: &str, values: &[&'a [u8]]) -> Result<&'a [u8]> {
    optional(token, values)?
        .ok_or_else(|| DecodeError::format(token, "missing required declaration"))
}

fn as_str<'a>(token: &str, value: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(value)
        .map(str::trim)
        .map_err(|_| DecodeError::format(token, "value is not valid text"))
}

fn parse_f64(token: &str, value: &[u8]) -> Result<f64> {
    let s = as_str(token, value)?;
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DecodeError::format(token, format!("invalid number '{s}'"))),
    }
}

fn parse_date(value: &[u8]) -> Result<NaiveDate> {
    let s = as_str(tokens::DATE, value)?;
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::format(
            tokens::DATE,
            format!("expected ddmmyy, got '{s}'"),
        ));
    }
    NaiveDate::parse_from_str(s, "%d%m%y")
        .map_err(|e| DecodeError::format(tokens::DATE, format!("invalid date '{s}': {e}")))
}

fn parse_dimension(value: &[u8], units: f64) -> Result<Dimension> {
    let s = as_str(tokens::DIMENSION, value)?;
    let coords = s
        .split(',')
        .map(|part| parse_f64(tokens::DIMENSION, part.as_bytes()))
        .collect::<Result<Vec<f64>>>()?;
    let &[x1, y1, z1, x2, y2, z2] = coords.as_slice() else {
        return Err(DecodeError::format(
            tokens::DIMENSION,
            format!("expected 6 values, got {}", coords.len()),
        ));
    };
    let point = |x, y, z| Point3::new(to_mm(x, units), to_mm(y, units), to_mm(z, units));
    Dimension::new(point(x1, y1, z1), point(x2, y2, z2))
        .map_err(|e| DecodeError::format(tokens::DIMENSION, e.to_string()))
}

fn parse_label(value: &[u8]) -> Result<Label> {
    let s = as_str(tokens::LABEL, value)?;
    let (id, text) = s
        .split_once(',')
        .ok_or_else(|| DecodeError::format(tokens::LABEL, format!("expected id,text, got '{s}'")))?;
    let id = id
        .trim()
        .parse::<i32>()
        .map_err(|e| DecodeError::format(tokens::LABEL, format!("invalid label id: {e}")))?;
    Ok(Label {
        id,
        text: text.to_string(),
    })
}

fn parse_user_data(value: &[u8]) -> Result<UserData> {
    let mut parts = value.splitn(3, |&b| b == b',');
    let (Some(uid), Some(length), Some(data)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DecodeError::format(
            tokens::USERDATA,
            "expected uid,length,data",
        ));
    };
    let uid = as_str(tokens::USERDATA, uid)?.to_string();
    let length = as_str(tokens::USERDATA, length)?
        .parse::<usize>()
        .map_err(|e| DecodeError::format(tokens::USERDATA, format!("invalid length: {e}")))?;
    Ok(UserData {
        uid,
        length,
        data: data.to_vec(),
    })
}
