use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
    #[error("asset key must name a .png file")]
    NotPng,
}

/// Frame image keys are relative paths below the asset directory, spelled
/// the same on every platform.
pub(crate) fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || "_/-.".contains(*ch)))
    {
        return Err(AssetKeyError::InvalidCharacter { character });
    }
    if !key.ends_with(".png") {
        return Err(AssetKeyError::NotPng);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_keys() {
        for key in ["hero.png", "hero/walk_down_0.png", "ui/icons/a-b.png"] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        let cases = [
            ("", AssetKeyError::Empty),
            ("/hero.png", AssetKeyError::LeadingSlash),
            (r"hero\a.png", AssetKeyError::Backslash),
            ("a/../b.png", AssetKeyError::ParentTraversal),
            ("Hero.png", AssetKeyError::InvalidCharacter { character: 'H' }),
            ("hero.bmp", AssetKeyError::NotPng),
        ];
        for (key, expected) in cases {
            assert_eq!(validate_asset_key(key), Err(expected), "key={key}");
        }
    }
}
