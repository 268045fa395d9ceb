//! Input validation for accounts and sample submissions.
//!
//! Functions return `Ok(())` or a human-readable message that handlers pass
//! straight back to the client.

use validator::ValidateEmail;

/// Minimum password length accepted at signup and password change.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Separator used by list-valued settings (`tumor_types`, `sources`, ...).
pub const LIST_SEPARATOR: char = ';';

/// Bytes per megabyte for the configured upload limits.
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Validate an email address.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.validate_email() {
        Ok(())
    } else {
        Err("Please enter a valid email address.".to_string())
    }
}

/// Validate that a password has at least [`MIN_PASSWORD_LENGTH`] characters
/// including a lower-case letter, an upper-case letter and a digit.
pub fn validate_password(password: &str) -> Result<(), String> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(format!(
            "Password must contain at least {MIN_PASSWORD_LENGTH} characters, \
             including lower-case, upper-case and a number"
        ))
    }
}

/// Split a `;`-separated settings value into trimmed, non-empty entries.
pub fn parse_list(raw: &str) -> Vec<&str> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check `value` against a `;`-separated list of allowed values.
///
/// An empty list allows anything except an empty value.
pub fn check_allowed(field: &str, value: &str, allowed: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("Missing {field}"));
    }
    let allowed = parse_list(allowed);
    if allowed.is_empty() || allowed.contains(&value) {
        Ok(())
    } else {
        Err(format!("Invalid {field} '{value}'"))
    }
}

/// Check an upload's size against a limit in megabytes. A limit of zero or
/// less disables the check.
pub fn check_file_size(label: &str, size_bytes: usize, max_mb: i32) -> Result<(), String> {
    if max_mb <= 0 {
        return Ok(());
    }
    let limit = u64::from(max_mb.unsigned_abs()) * BYTES_PER_MB;
    if size_bytes as u64 > limit {
        return Err(format!("{label} file too large (maximum {max_mb}MB)"));
    }
    Ok(())
}

/// Return the required columns missing from a CSV file's header row.
///
/// `required` is a `;`-separated list; header cells are comma-separated and
/// compared after trimming whitespace and surrounding quotes.
pub fn missing_csv_columns<'a>(csv: &[u8], required: &'a str) -> Vec<&'a str> {
    let header = csv
        .split(|b| *b == b'\n')
        .next()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    let columns: Vec<&str> = header
        .split(',')
        .map(|c| c.trim().trim_matches('"'))
        .collect();
    parse_list(required)
        .into_iter()
        .filter(|r| !columns.contains(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("joe.bloggs@embl.de").is_ok());
        assert!(validate_email("@embl.de").is_err());
        assert!(validate_email("joe").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("abcABC123").is_ok());
        for bad in ["", "abc123A", "passwordpassword", "abc12345678", "ASDASDFGK!(*&@"] {
            let msg = validate_password(bad).unwrap_err();
            assert!(msg.contains("Password"), "{bad} should be rejected");
        }
    }

    #[test]
    fn list_parsing_skips_blanks() {
        assert_eq!(parse_list(" a; b ;;c;"), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn allowed_values() {
        assert!(check_allowed("tumor type", "lung", "lung;skin").is_ok());
        assert!(check_allowed("tumor type", "bone", "lung;skin").is_err());
        assert!(check_allowed("tumor type", "anything", "").is_ok());
        assert_eq!(
            check_allowed("source", " ", "").unwrap_err(),
            "Missing source"
        );
    }

    #[test]
    fn file_size_limits() {
        assert!(check_file_size("h5", 1024, 1).is_ok());
        assert!(check_file_size("h5", 2 * 1024 * 1024, 1).is_err());
        assert!(check_file_size("h5", usize::MAX, 0).is_ok());
    }

    #[test]
    fn csv_columns() {
        let csv = b"barcode,\"cdr3\", count\n1,2,3\n";
        assert!(missing_csv_columns(csv, "barcode;cdr3;count").is_empty());
        assert_eq!(missing_csv_columns(csv, "barcode;clonotype"), vec!["clonotype"]);
        assert!(missing_csv_columns(b"", "").is_empty());
    }
}
