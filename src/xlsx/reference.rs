//! A1-style cell references.

/// Rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns in a worksheet (`A` through `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// Split an A1 reference such as `"AB12"` into zero-based (row, column).
///
/// `$` anchors are ignored. Returns `None` for anything that is not a
/// column-letters-then-row-digits reference.
pub fn parse_reference(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(split);

    let col = column_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS || col >= MAX_COLUMNS {
        return None;
    }
    Some((row - 1, col))
}

/// Convert column letters (`"A"`, `"Z"`, `"AA"`) to a zero-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    Some(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("xfd"), Some(16383));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference("A1"), Some((0, 0)));
        assert_eq!(parse_reference("C7"), Some((6, 2)));
        assert_eq!(parse_reference("$AB$12"), Some((11, 27)));
        assert_eq!(parse_reference("A0"), None);
        assert_eq!(parse_reference("12"), None);
        assert_eq!(parse_reference("B"), None);
        assert_eq!(parse_reference("XFD1048576"), Some((1_048_575, 16_383)));
        assert_eq!(parse_reference("A1048577"), None);
        assert_eq!(parse_reference("XFE1"), None);
        assert_eq!(parse_reference("A4294967296"), None);
    }
}
