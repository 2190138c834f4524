//! Object identifiers and URLs.

use std::fmt;
use std::str::FromStr;

use crate::error::ObjstoError;

/// Identifier of a stored object, written as `{bucket}/{key}`.
///
/// Bucket names cannot contain `/`, so the identifier is split on the first
/// separator only and the key may itself contain slashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    bucket: String,
    key: String,
}

impl ObjectId {
    /// Create an identifier from its parts.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket part.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key part.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Split into `(bucket, key)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.bucket, self.key)
    }
}

impl FromStr for ObjectId {
    type Err = ObjstoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('/')
            .map(|(bucket, key)| Self::new(bucket, key))
            .ok_or_else(|| ObjstoError::InvalidObjectId(s.to_owned()))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Build the path-style URL of an object.
///
/// # Examples
///
/// ```
/// use objsto_core::object_url;
///
/// assert_eq!(object_url("http://s3.local", "b", "k"), "http://s3.local/b/k");
/// assert_eq!(object_url("http://s3.local/", "b", "k"), "http://s3.local/b/k");
/// ```
#[must_use]
pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    let sep = if endpoint.ends_with('/') { "" } else { "/" };
    format!("{endpoint}{sep}{bucket}/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_object_id() {
        let id: ObjectId = "bucket/key.txt".parse().unwrap();
        assert_eq!(id.bucket(), "bucket");
        assert_eq!(id.key(), "key.txt");
    }

    #[test]
    fn test_should_keep_slashes_in_key() {
        let id: ObjectId = "bucket/dir/sub/file".parse().unwrap();
        assert_eq!(id.bucket(), "bucket");
        assert_eq!(id.key(), "dir/sub/file");
        assert_eq!(id.to_string(), "bucket/dir/sub/file");
    }

    #[test]
    fn test_should_reject_id_without_separator() {
        let err = "just-a-bucket".parse::<ObjectId>().unwrap_err();
        assert_eq!(err, ObjstoError::InvalidObjectId("just-a-bucket".to_owned()));
    }

    #[test]
    fn test_should_build_url_with_single_separator() {
        assert_eq!(
            object_url("https://hel.example.com", "assets", "a/b.png"),
            "https://hel.example.com/assets/a/b.png"
        );
        assert_eq!(
            object_url("https://hel.example.com/", "assets", "b.png"),
            "https://hel.example.com/assets/b.png"
        );
    }
}
