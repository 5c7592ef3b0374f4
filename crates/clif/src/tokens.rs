//! Keywords of the CLI text encoding.

/// Start of the header section.
pub const HEADER_START: &str = "$$HEADERSTART";
/// End of the header section.
pub const HEADER_END: &str = "$$HEADEREND";
/// Geometry section is text.
pub const ASCII: &str = "$$ASCII";
/// Geometry section is an opcode stream.
pub const BINARY: &str = "$$BINARY";
/// Millimeters per raw unit.
pub const UNITS: &str = "$$UNITS";
/// Format version × 100.
pub const VERSION: &str = "$$VERSION";
/// Model label, `id,text`.
pub const LABEL: &str = "$$LABEL";
/// Build date, `ddmmyy`.
pub const DATE: &str = "$$DATE";
/// Bounding box, `x1,y1,z1,x2,y2,z2`.
pub const DIMENSION: &str = "$$DIMENSION";
/// Alignment flag (presence only).
pub const ALIGN: &str = "$$ALIGN";
/// Declared layer count.
pub const LAYERS: &str = "$$LAYERS";
/// Vendor payload, `uid,length,data`.
pub const USERDATA: &str = "$$USERDATA";

/// Start of the ASCII geometry section.
pub const GEOMETRY_START: &str = "$$GEOMETRYSTART";
/// End of the ASCII geometry section.
pub const GEOMETRY_END: &str = "$$GEOMETRYEND";
/// Layer record, `z`.
pub const LAYER: &str = "$$LAYER";
/// Polyline record, `id,dir,n,x1,y1,...`.
pub const POLYLINE: &str = "$$POLYLINE";
/// Hatch record, `id,n,xs1,xe1,ys1,ye1,...`.
pub const HATCHES: &str = "$$HATCHES";

/// Split a `TOKEN/value` line into its keyword and optional value bytes.
///
/// Surrounding whitespace is removed from both parts.
pub fn split_declaration(line: &[u8]) -> (&[u8], Option<&[u8]>) {
    match line.iter().position(|&b| b == b'/') {
        Some(slash) => (line[..slash].trim_ascii(), Some(line[slash + 1..].trim_ascii())),
        None => (line.trim_ascii(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_declaration() {
        assert_eq!(
            split_declaration(b"$$UNITS/0.005 "),
            (&b"$$UNITS"[..], Some(&b"0.005"[..]))
        );
        assert_eq!(split_declaration(b" $$ASCII\t"), (&b"$$ASCII"[..], None));
        assert_eq!(
            split_declaration(b"$$LABEL/1,part/a"),
            (&b"$$LABEL"[..], Some(&b"1,part/a"[..]))
        );
    }
}
