//! `StoragePath` (spec.md §6): `protocol://bucket/path` string form.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub protocol: String,
    pub bucket: String,
    pub path: String,
}

impl StoragePath {
    /// Parses `protocol://bucket/path`. Returns `None` on malformed input
    /// (spec.md §6: "parser returns null on malformed input").
    pub fn parse(s: &str) -> Option<Self> {
        let (protocol, rest) = s.split_once("://")?;
        if protocol.is_empty() {
            return None;
        }
        let (bucket, path) = rest.split_once('/')?;
        if bucket.is_empty() {
            return None;
        }
        Some(StoragePath { protocol: protocol.to_string(), bucket: bucket.to_string(), path: path.to_string() })
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}", self.protocol, self.bucket, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_path() {
        let p = StoragePath::parse("s3://my-bucket/a/b/c.txt").unwrap();
        assert_eq!(p.protocol, "s3");
        assert_eq!(p.bucket, "my-bucket");
        assert_eq!(p.path, "a/b/c.txt");
    }

    #[test]
    fn round_trips_through_display() {
        let p = StoragePath::parse("gs://bucket/key").unwrap();
        assert_eq!(p.to_string(), "gs://bucket/key");
    }

    #[test]
    fn rejects_missing_scheme_separator() {
        assert!(StoragePath::parse("not-a-path").is_none());
    }

    #[test]
    fn rejects_missing_path_segment() {
        assert!(StoragePath::parse("s3://bucket-only").is_none());
    }

    #[test]
    fn rejects_empty_bucket() {
        assert!(StoragePath::parse("s3:///path").is_none());
    }
}
