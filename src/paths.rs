//! Mapping of logical certificate keys to KV v2 paths.
//!
//! KV v2 splits every secret across two endpoint families: `data/` for the
//! versioned payload and `metadata/` for version bookkeeping and listing.
//! All path assembly lives here so the rest of the engine deals only in
//! logical keys.

/// Pure mapper from logical keys to remote paths under a mount and prefix.
#[derive(Debug, Clone)]
pub struct PathMapper {
    mount: String,
    prefix: String,
}

impl PathMapper {
    /// Create a mapper for the given secrets mount and key prefix.
    /// Surrounding slashes are normalized away.
    #[must_use]
    pub fn new(mount: &str, prefix: &str) -> Self {
        Self {
            mount: mount.trim_matches('/').to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Path of the versioned payload for `key`:
    /// `<mount>/data/<prefix>/<key>`.
    #[must_use]
    pub fn data_path(&self, key: &str) -> String {
        self.join("data", key)
    }

    /// Path of the version metadata for `key`:
    /// `<mount>/metadata/<prefix>/<key>`.
    #[must_use]
    pub fn metadata_path(&self, key: &str) -> String {
        self.join("metadata", key)
    }

    /// Path used with Vault's list operation to enumerate the immediate
    /// children of `prefix`. Listing is a metadata-side operation.
    #[must_use]
    pub fn list_path(&self, prefix: &str) -> String {
        self.join("metadata", prefix)
    }

    fn join(&self, family: &str, key: &str) -> String {
        let key = key.trim_matches('/');
        [self.mount.as_str(), family, self.prefix.as_str(), key]
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_and_metadata_paths() {
        let paths = PathMapper::new("secrets/production", "engineering/certificates");
        assert_eq!(
            paths.data_path("foo.bar.com"),
            "secrets/production/data/engineering/certificates/foo.bar.com"
        );
        assert_eq!(
            paths.metadata_path("foo.bar.com"),
            "secrets/production/metadata/engineering/certificates/foo.bar.com"
        );
    }

    #[test]
    fn test_list_path_is_metadata_side() {
        let paths = PathMapper::new("secrets", "certificates");
        assert_eq!(paths.list_path("staging/"), "secrets/metadata/certificates/staging");
        assert_eq!(paths.list_path(""), "secrets/metadata/certificates");
    }

    #[test]
    fn test_empty_prefix() {
        let paths = PathMapper::new("secrets", "");
        assert_eq!(paths.data_path("foo"), "secrets/data/foo");
        assert_eq!(paths.list_path(""), "secrets/metadata");
    }

    #[test]
    fn test_slash_normalization() {
        let paths = PathMapper::new("/secrets/", "/certificates/");
        assert_eq!(paths.data_path("/a/b/"), "secrets/data/certificates/a/b");
    }

    #[test]
    fn test_nested_keys() {
        let paths = PathMapper::new("kv", "certs");
        assert_eq!(
            paths.data_path("staging/abc456/test1.whatever.com"),
            "kv/data/certs/staging/abc456/test1.whatever.com"
        );
    }
}
