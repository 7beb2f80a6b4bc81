use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapNameError {
    #[error("map name must not be empty")]
    Empty,
    #[error("map name must not contain path separators")]
    PathSeparator,
    #[error("map name must not contain '..'")]
    ParentTraversal,
    #[error("map name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Map names are bare file stems: the loader adds directory and extension.
pub fn validate_map_name(name: &str) -> Result<(), MapNameError> {
    if name.is_empty() {
        return Err(MapNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(MapNameError::PathSeparator);
    }
    if name.contains("..") {
        return Err(MapNameError::ParentTraversal);
    }
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(MapNameError::InvalidCharacter { character: ch });
    }
    Ok(())
}
