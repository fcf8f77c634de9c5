use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ByteSizeError {
    #[error("empty byte-size value")]
    Empty,

    #[error("invalid number in byte-size '{0}'")]
    InvalidNumber(String),

    #[error("unrecognized unit in byte-size '{0}' (expected B, KB, MB, GB, TB or PB)")]
    UnknownUnit(String),

    #[error("byte-size '{0}' is out of range")]
    OutOfRange(String),
}

const UNITS: [(&str, u64); 6] = [
    ("B", 1),
    ("KB", 1 << 10),
    ("MB", 1 << 20),
    ("GB", 1 << 30),
    ("TB", 1 << 40),
    ("PB", 1 << 50),
];

/// Parses a human-readable size such as `500MB`, `1.5 GB` or `1024`.
///
/// Units are 1024-based and case-insensitive; a bare number is bytes.
pub fn parse_byte_size(input: &str) -> Result<u64, ByteSizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ByteSizeError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let unit = unit.trim().to_ascii_uppercase();

    let value: f64 = number
        .parse()
        .map_err(|_| ByteSizeError::InvalidNumber(input.to_string()))?;

    let multiplier = if unit.is_empty() {
        1
    } else {
        UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, m)| *m)
            .ok_or_else(|| ByteSizeError::UnknownUnit(input.to_string()))?
    };

    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(ByteSizeError::OutOfRange(input.to_string()));
    }
    Ok(bytes as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_byte_size("500MB"), Ok(500 * 1024 * 1024));
        assert_eq!(parse_byte_size("1 KB"), Ok(1024));
        assert_eq!(parse_byte_size("2gb"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_byte_size("1.5KB"), Ok(1536));
        assert_eq!(parse_byte_size("42"), Ok(42));
        assert_eq!(parse_byte_size("42B"), Ok(42));
        assert_eq!(parse_byte_size("1PB"), Ok(1 << 50));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_byte_size("  "), Err(ByteSizeError::Empty));
        assert!(matches!(
            parse_byte_size("MB"),
            Err(ByteSizeError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_byte_size("1.2.3MB"),
            Err(ByteSizeError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_byte_size("10XB"),
            Err(ByteSizeError::UnknownUnit(_))
        ));
    }
}
