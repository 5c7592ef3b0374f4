//! Decode entry points: header first, then the geometry decoder selected by
//! the declared file type.

use std::path::Path;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::file::File;
use crate::header::{decode_header, Header};
use crate::model::Geometry;
use crate::options::DecodeOptions;
use crate::primitives::FileType;
use crate::{ascii, binary};

/// Decode a CLI file from a path with default options.
///
/// # Arguments
///
/// * `path` - Path to the `.cli` file
///
/// # Returns
///
/// The decoded file, or the first I/O or format error encountered.
pub fn decode(path: impl AsRef<Path>) -> Result<File> {
    Decoder::default().decode(path)
}

/// Decode a CLI file from a byte buffer with default options.
///
/// # Arguments
///
/// * `data` - Raw file contents
pub fn decode_from_buffer(data: &[u8]) -> Result<File> {
    Decoder::default().decode_from_buffer(data)
}

/// Decoder with explicit [`DecodeOptions`].
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    /// Create a decoder with the given options.
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode the file at `path`.
    pub fn decode(&self, path: impl AsRef<Path>) -> Result<File> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "read file");
        self.decode_from_buffer(&data)
    }

    /// Decode a file held in memory.
    pub fn decode_from_buffer(&self, data: &[u8]) -> Result<File> {
        self.options.validate()?;

        let mut cursor = ByteCursor::new(data);
        let header = decode_header(&mut cursor)?;
        let geometry = match header.file_type {
            FileType::Ascii => ascii::decode_geometry(&mut cursor, header.units, &self.options)?,
            FileType::Binary => binary::decode_geometry(&mut cursor, header.units, &self.options)?,
        };

        if self.options.check_layer_count {
            check_layer_count(&header, &geometry);
        }
        tracing::info!(
            file_type = %header.file_type,
            "Decoded {} models, {} layers",
            geometry.models().len(),
            geometry.layer_count()
        );
        Ok(File::new(header, geometry))
    }
}

/// The declared count is advisory; a mismatch is only reported.
fn check_layer_count(header: &Header, geometry: &Geometry) {
    let Some(declared) = header.layers else {
        return;
    };
    let decoded = geometry.layer_count();
    if declared as usize != decoded {
        tracing::warn!(declared, decoded, "declared layer count does not match");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_FILE: &str = "$$HEADERSTART\n\
                              $$ASCII\n\
                              $$UNITS/1\n\
                              $$VERSION/200\n\
                              $$LAYERS/5\n\
                              $$HEADEREND\n\
                              $$GEOMETRYSTART\n\
                              $$LAYER/0.0\n\
                              $$POLYLINE/1,1,3,0,0,1,0,0,1\n\
                              $$GEOMETRYEND\n";

    #[test]
    fn test_dispatch_ascii() {
        let file = decode_from_buffer(ASCII_FILE.as_bytes()).unwrap();
        assert_eq!(file.header().file_type, FileType::Ascii);
        assert_eq!(file.models().len(), 1);
    }

    #[test]
    fn test_layer_count_mismatch_is_not_an_error() {
        let decoder = Decoder::new(DecodeOptions {
            check_layer_count: true,
            ..Default::default()
        });
        let file = decoder.decode_from_buffer(ASCII_FILE.as_bytes()).unwrap();
        assert_eq!(file.header().layers, Some(5));
        assert_eq!(file.geometry().layer_count(), 1);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let decoder = Decoder::new(DecodeOptions {
            max_points_per_record: 0,
            ..Default::default()
        });
        let err = decoder.decode_from_buffer(ASCII_FILE.as_bytes()).unwrap_err();
        assert_eq!(err.declaration(), Some("options"));
    }

    #[test]
    fn test_missing_path() {
        let err = decode("/nonexistent/dir/part.cli").unwrap_err();
        assert!(!err.is_format());
    }
}
