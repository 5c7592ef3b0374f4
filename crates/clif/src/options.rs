//! Decode options.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// What to do with an ASCII geometry record whose keyword is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRecordPolicy {
    /// Fail the decode with a format error.
    #[default]
    Reject,
    /// Log a warning and continue with the next record.
    Skip,
}

/// Decoding parameters.
///
/// The defaults decode strictly. Binary opcodes are always strict regardless
/// of [`DecodeOptions::unknown_records`]: an unknown opcode has no known
/// payload length, so nothing after it can be trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Policy for unrecognized ASCII geometry records.
    pub unknown_records: UnknownRecordPolicy,
    /// Warn when the declared `$$LAYERS` count disagrees with the decoded layers.
    pub check_layer_count: bool,
    /// Upper bound on the point or segment count declared by a single record.
    pub max_points_per_record: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            unknown_records: UnknownRecordPolicy::Reject,
            check_layer_count: true,
            max_points_per_record: 10_000_000,
        }
    }
}

impl DecodeOptions {
    /// Validate options.
    pub fn validate(&self) -> Result<()> {
        if self.max_points_per_record == 0 {
            return Err(DecodeError::format(
                "options",
                "max_points_per_record must be positive",
            ));
        }
        Ok(())
    }

    /// Check a declared record count against the configured cap.
    pub(crate) fn check_count(&self, declaration: &str, count: usize) -> Result<()> {
        if count > self.max_points_per_record as usize {
            return Err(DecodeError::format(
                declaration,
                format!(
                    "declared count {count} exceeds limit {}",
                    self.max_points_per_record
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let options = DecodeOptions::default();
        assert_eq!(options.unknown_records, UnknownRecordPolicy::Reject);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        let options = DecodeOptions {
            max_points_per_record: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_count_cap() {
        let options = DecodeOptions {
            max_points_per_record: 4,
            ..Default::default()
        };
        assert!(options.check_count("$$POLYLINE", 4).is_ok());
        let err = options.check_count("$$POLYLINE", 5).unwrap_err();
        assert_eq!(err.declaration(), Some("$$POLYLINE"));
    }
}
