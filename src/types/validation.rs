//! Input validation for content, tags and level names.

use serde::{Deserialize, Serialize};

use super::error::{MemoryError, MemoryResult};
use super::{
    MemoryLevel, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_TAG_COUNT, DEFAULT_MAX_TAG_LENGTH,
};

/// The three configurable input limits of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum content length in bytes.
    pub max_content_length: usize,
    /// Maximum length of one tag in bytes.
    pub max_tag_length: usize,
    /// Maximum number of tags on one memory.
    pub max_tag_count: usize,
}

impl ValidationLimits {
    /// Reject limits that would make every insert fail.
    pub fn check(&self) -> MemoryResult<()> {
        if self.max_content_length == 0 || self.max_tag_length == 0 || self.max_tag_count == 0 {
            return Err(MemoryError::InvalidContent(format!(
                "validation limits must be positive: {self:?}"
            )));
        }
        Ok(())
    }

    /// Validate content and tags against these limits.
    pub fn validate(&self, content: &str, tags: &[String]) -> MemoryResult<()> {
        validate_content(content, self.max_content_length)?;
        validate_tags(tags, self.max_tag_length, self.max_tag_count)
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
            max_tag_count: DEFAULT_MAX_TAG_COUNT,
        }
    }
}

/// Reject empty content and content longer than `max_len` bytes.
pub fn validate_content(content: &str, max_len: usize) -> MemoryResult<()> {
    if content.is_empty() {
        return Err(MemoryError::InvalidContent(
            "content must not be empty".to_string(),
        ));
    }
    if content.len() > max_len {
        return Err(MemoryError::InvalidContent(format!(
            "content length {} exceeds maximum {}",
            content.len(),
            max_len
        )));
    }
    Ok(())
}

/// Check tag count, then each tag in order for emptiness, length and charset.
/// The first violation found is reported.
pub fn validate_tags(tags: &[String], max_tag_len: usize, max_tag_count: usize) -> MemoryResult<()> {
    if tags.len() > max_tag_count {
        return Err(MemoryError::InvalidTags(format!(
            "{} tags exceeds maximum {}",
            tags.len(),
            max_tag_count
        )));
    }
    for tag in tags {
        if tag.is_empty() {
            return Err(MemoryError::InvalidTags("tag must not be empty".to_string()));
        }
        if tag.len() > max_tag_len {
            return Err(MemoryError::InvalidTags(format!(
                "tag {:?} length {} exceeds maximum {}",
                tag,
                tag.len(),
                max_tag_len
            )));
        }
        if let Some(bad) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(MemoryError::InvalidTags(format!(
                "tag {tag:?} contains invalid character {bad:?}"
            )));
        }
    }
    Ok(())
}

/// Parse a level name. Unknown names reuse the content error kind.
pub fn validate_level(name: &str) -> MemoryResult<MemoryLevel> {
    MemoryLevel::from_name(name)
        .ok_or_else(|| MemoryError::InvalidContent(format!("unknown memory level {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryErrorKind;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_boundary() {
        assert!(validate_content(&"a".repeat(10), 10).is_ok());
        let err = validate_content(&"a".repeat(11), 10).unwrap_err();
        assert_eq!(err.kind(), MemoryErrorKind::InvalidContent);
        assert!(validate_content("", 10).is_err());
    }

    #[test]
    fn tag_count_boundary() {
        let three = tags(&["a", "b", "c"]);
        assert!(validate_tags(&three, 10, 3).is_ok());
        let err = validate_tags(&three, 10, 2).unwrap_err();
        assert_eq!(err.kind(), MemoryErrorKind::InvalidTags);
    }

    #[test]
    fn tag_length_boundary() {
        assert!(validate_tags(&tags(&["abcde"]), 5, 10).is_ok());
        assert!(validate_tags(&tags(&["abcdef"]), 5, 10).is_err());
    }

    #[test]
    fn tag_charset() {
        assert!(validate_tags(&tags(&["rust_lang", "web-dev", "A1"]), 20, 10).is_ok());
        for bad in ["has space", "dot.ted", "emoji🙂", "slash/"] {
            let err = validate_tags(&tags(&[bad]), 20, 10).unwrap_err();
            assert_eq!(err.kind(), MemoryErrorKind::InvalidTags, "{bad}");
        }
        assert!(validate_tags(&tags(&[""]), 20, 10).is_err());
    }

    #[test]
    fn first_violation_is_reported() {
        let err = validate_tags(&tags(&["ok", "bad tag", ""]), 20, 10).unwrap_err();
        assert!(err.detail().contains("bad tag"));
    }

    #[test]
    fn zero_limits_rejected() {
        assert!(ValidationLimits::default().check().is_ok());
        let limits = ValidationLimits {
            max_tag_count: 0,
            ..ValidationLimits::default()
        };
        assert!(limits.check().is_err());
    }

    #[test]
    fn level_spellings() {
        assert_eq!(validate_level("ShortTerm").unwrap(), MemoryLevel::ShortTerm);
        assert_eq!(validate_level("MEDIUM").unwrap(), MemoryLevel::MediumTerm);
        assert_eq!(validate_level("lt").unwrap(), MemoryLevel::LongTerm);
        assert_eq!(validate_level("long-term").unwrap(), MemoryLevel::LongTerm);
        let err = validate_level("forever").unwrap_err();
        assert_eq!(err.kind(), MemoryErrorKind::InvalidContent);
    }
}
