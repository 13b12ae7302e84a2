//! Property-based tests for path mapping, configuration validation, and
//! lock staleness.

use chrono::Utc;
use proptest::prelude::*;
use secrecy::SecretString;
use std::time::Duration;
use uuid::Uuid;

use vault_cert_storage::{LockRecord, PathMapper, StorageConfig};

// Path segments as they appear in certificate keys: domain labels, cache
// directories, and the like.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,12}"
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Both path families are rooted at the mount, carry the key verbatim,
    /// and never contain empty segments.
    #[test]
    fn prop_paths_are_well_formed(
        mount in segment(),
        prefix in segment(),
        key in key_strategy(),
    ) {
        let paths = PathMapper::new(&mount, &prefix);
        let data = paths.data_path(&key);
        let metadata = paths.metadata_path(&key);

        let data_prefix = format!("{}/data/", mount);
        let metadata_prefix = format!("{}/metadata/", mount);
        prop_assert!(data.starts_with(&data_prefix));
        prop_assert!(metadata.starts_with(&metadata_prefix));
        prop_assert!(data.ends_with(&key));
        prop_assert!(metadata.ends_with(&key));
        prop_assert!(!data.contains("//"));
        prop_assert!(!metadata.contains("//"));

        // The two families differ only in the family segment.
        prop_assert_eq!(data.replacen("/data/", "/metadata/", 1), metadata);
    }

    /// Listing is a metadata-side operation on the same path.
    #[test]
    fn prop_list_path_is_the_metadata_path(
        mount in segment(),
        prefix in segment(),
        key in key_strategy(),
    ) {
        let paths = PathMapper::new(&mount, &prefix);
        prop_assert_eq!(paths.list_path(&key), paths.metadata_path(&key));
    }

    /// Path mapping ignores surrounding slashes on every input.
    #[test]
    fn prop_paths_normalize_slashes(
        mount in segment(),
        prefix in segment(),
        key in key_strategy(),
    ) {
        let plain = PathMapper::new(&mount, &prefix);
        let slashed = PathMapper::new(&format!("/{mount}/"), &format!("/{prefix}/"));
        prop_assert_eq!(
            plain.data_path(&key),
            slashed.data_path(&format!("/{key}/"))
        );
    }

    /// Validation accepts a configuration iff it carries exactly one
    /// authentication mode.
    #[test]
    fn prop_exactly_one_auth_mode_validates(
        has_token in any::<bool>(),
        has_role in any::<bool>(),
        has_secret in any::<bool>(),
    ) {
        let mut config = StorageConfig::new(
            "https://vault.example.org:8201".parse::<url::Url>().unwrap(),
            "secrets",
        );
        if has_token {
            config = config.with_token("s.token");
        }
        if has_role {
            config.approle_role_id = Some(SecretString::from("role".to_string()));
        }
        if has_secret {
            config.approle_secret_id = Some(SecretString::from("secret".to_string()));
        }

        let valid = (has_token && !has_role && !has_secret)
            || (!has_token && has_role && has_secret);
        prop_assert_eq!(config.validate().is_ok(), valid);
    }

    /// Staleness tracks record age against the timeout.
    #[test]
    fn prop_staleness_tracks_record_age(
        age_secs in 0u64..7200,
        timeout_secs in 1u64..3600,
    ) {
        let record = LockRecord {
            key: "example.com".to_string(),
            owner: Uuid::new_v4(),
            acquired: Utc::now() - chrono::Duration::seconds(age_secs as i64),
        };

        if age_secs > timeout_secs {
            prop_assert!(record.is_stale(Duration::from_secs(timeout_secs)));
        } else if age_secs + 2 < timeout_secs {
            prop_assert!(!record.is_stale(Duration::from_secs(timeout_secs)));
        }
        // Within a couple of seconds of the boundary the clock moves
        // underneath the check; no assertion there.
    }
}
