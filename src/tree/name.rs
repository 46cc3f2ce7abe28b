//! Crate name segments
//!
//! A crate name is its ancestor chain joined with [`DELIMITER`]. A segment may
//! contain a lone `%` anywhere (`100% Pure`, `Top 100%`) but never the
//! delimiter itself. The one ambiguous shape is a `%` touching a delimiter:
//! `A%` followed by `%%B` reads back as `A%%%B`, which splits two ways. Stored
//! names containing `%%%` are rejected, and a child cannot be joined where it
//! would produce one.

use crate::error::TreeError;
use crate::record::DELIMITER;

const PERCENT: char = '%';

/// Join a parent name and a child segment. An empty parent is the store root.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", parent, DELIMITER, segment)
    }
}

/// Prefix every descendant of `parent` starts with.
pub fn child_prefix(parent: &str) -> String {
    if parent.is_empty() {
        String::new()
    } else {
        format!("{}{}", parent, DELIMITER)
    }
}

/// Check one segment.
pub fn validate_segment(segment: &str) -> Result<(), TreeError> {
    if segment.is_empty() {
        return Err(TreeError::InvariantViolation(
            "crate name has an empty segment".to_string(),
        ));
    }
    if segment.contains(DELIMITER) {
        return Err(TreeError::InvariantViolation(format!(
            "segment {:?} contains the delimiter {:?}",
            segment, DELIMITER
        )));
    }
    Ok(())
}

/// Check a segment that crates will be joined below.
pub fn validate_parent_segment(segment: &str) -> Result<(), TreeError> {
    validate_segment(segment)?;
    if segment.ends_with(PERCENT) {
        return Err(TreeError::InvariantViolation(format!(
            "segment {:?} ends with {:?} and cannot hold child crates",
            segment, PERCENT
        )));
    }
    Ok(())
}

/// Check a full stored name.
pub fn validate_name(name: &str) -> Result<(), TreeError> {
    let ambiguous = format!("{}{}", DELIMITER, PERCENT);
    let reason = if name.is_empty() {
        "empty name"
    } else if name.starts_with(DELIMITER) {
        "leading delimiter"
    } else if name.ends_with(DELIMITER) {
        "trailing delimiter"
    } else if name.contains(ambiguous.as_str()) {
        "ambiguous delimiter"
    } else {
        return Ok(());
    };
    Err(TreeError::InvariantViolation(format!(
        "crate {:?}: {}",
        name, reason
    )))
}

/// Split a stored name into its segments.
pub fn split(name: &str) -> Result<Vec<&str>, TreeError> {
    validate_name(name)?;
    Ok(name.split(DELIMITER).collect())
}

/// The segment `name` adds below `parent`, if it is a direct child name.
pub fn child_segment<'a>(parent: &str, name: &'a str) -> Result<&'a str, TreeError> {
    let prefix = child_prefix(parent);
    let segment = name.strip_prefix(prefix.as_str()).ok_or_else(|| {
        TreeError::InvariantViolation(format!(
            "crate {:?} is not named below {:?}",
            name, parent
        ))
    })?;
    validate_segment(segment).map_err(|_| {
        TreeError::InvariantViolation(format!(
            "crate {:?} is not a direct child of {:?}",
            name, parent
        ))
    })?;
    if !parent.is_empty() && (parent.ends_with(PERCENT) || segment.starts_with(PERCENT)) {
        return Err(TreeError::InvariantViolation(format!(
            "crate {:?} would make the delimiter ambiguous below {:?}",
            name, parent
        )));
    }
    Ok(segment)
}

/// Final segment of a name.
pub fn last_segment(name: &str) -> &str {
    name.rsplit(DELIMITER).next().unwrap_or(name)
}
