//! Cluster version map.
//!
//! Binds OCP version floors to remote configuration artifacts. The map file
//! is a JSON array of `[version, relative_artifact_path]` pairs:
//!
//! ```json
//! [
//!   ["1.0.0", "experimental_1.json"],
//!   ["4.17.0-0", "experimental_2.json"]
//! ]
//! ```
//!
//! A query resolves to the entry with the greatest version less than or
//! equal to it. Versions compare with semver precedence, so prereleases sort
//! below their release (`4.17.0-0 < 4.17.0`) and build metadata is ignored
//! (`4.17.0+abc` is the `4.17.0` floor).

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use semver::Version;
use tracing::{debug, error, info};

use crate::cache::{DiskFileStore, FileStore, ResourceCache};
use crate::error::{ServiceError, ServiceResult};

/// One row of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Lowest version served by this artifact.
    pub version: Version,

    /// Artifact path relative to the cohort root.
    pub artifact: String,
}

/// Validated, strictly ascending version table.
#[derive(Debug, Clone)]
pub struct VersionMap {
    root: PathBuf,
    entries: Vec<VersionEntry>,
}

impl VersionMap {
    /// Build a map whose artifacts live under `root` on the local filesystem.
    pub fn build(root: impl Into<PathBuf>, raw_entries: &[Vec<String>]) -> ServiceResult<Self> {
        Self::build_with_store(root, raw_entries, &DiskFileStore)
    }

    /// Build a map, probing artifact existence through `store`.
    ///
    /// Fails with `ConfigInvalid` when the list is empty, a row is not a
    /// pair, a version does not parse, a path escapes `root`, an artifact
    /// is missing, or the versions are not strictly ascending.
    pub fn build_with_store(
        root: impl Into<PathBuf>,
        raw_entries: &[Vec<String>],
        store: &dyn FileStore,
    ) -> ServiceResult<Self> {
        let root = root.into();

        if raw_entries.is_empty() {
            error!(root = %root.display(), "cluster map is empty");
            return Err(ServiceError::config_invalid(format!(
                "cluster map for '{}' is empty",
                root.display()
            )));
        }

        let mut entries = Vec::with_capacity(raw_entries.len());
        for row in raw_entries {
            let [version, artifact] = row.as_slice() else {
                error!(len = row.len(), row = ?row, "unexpected cluster map row length");
                return Err(ServiceError::config_invalid(format!(
                    "cluster map row {:?} must have exactly two fields",
                    row
                )));
            };

            let parsed = Version::parse(version).map_err(|e| {
                error!(version = %version, error = %e, "invalid semver in cluster map");
                ServiceError::config_invalid(format!("invalid version '{}': {}", version, e))
            })?;

            if !is_local(artifact) {
                error!(artifact = %artifact, "artifact path escapes the cohort root");
                return Err(ServiceError::config_invalid(format!(
                    "artifact path '{}' is not local",
                    artifact
                )));
            }

            let full_path = root.join(artifact);
            if !store.exists(&full_path) {
                error!(path = %full_path.display(), "remote configuration couldn't be accessed");
                return Err(ServiceError::config_invalid(format!(
                    "remote configuration '{}' does not exist",
                    full_path.display()
                )));
            }

            entries.push(VersionEntry {
                version: parsed,
                artifact: artifact.clone(),
            });
        }

        let versions: Vec<&Version> = entries.iter().map(|e| &e.version).collect();
        if versions.windows(2).any(|w| w[0].cmp_precedence(w[1]) == Ordering::Greater) {
            let mut sorted = versions.clone();
            sorted.sort_by(|a, b| a.cmp_precedence(b));
            error!(versions = ?versions, sorted = ?sorted, "cluster map is not sorted");
            return Err(ServiceError::config_invalid("cluster map is not sorted"));
        }
        // Build metadata does not take part in precedence, so `1.0.0+a` and
        // `1.0.0+b` are the same floor.
        if let Some(pair) = versions
            .windows(2)
            .find(|w| w[0].cmp_precedence(w[1]) == Ordering::Equal)
        {
            error!(first = %pair[0], second = %pair[1], "duplicate version in cluster map");
            return Err(ServiceError::config_invalid(format!(
                "duplicate version '{}' in cluster map",
                pair[1]
            )));
        }

        Ok(Self { root, entries })
    }

    /// Read `<root>/<mapping_file>` through `cache` and build the map.
    pub fn load(
        root: impl Into<PathBuf>,
        mapping_file: &str,
        cache: &ResourceCache,
    ) -> ServiceResult<Self> {
        let root = root.into();
        let mapping_path = root.join(mapping_file);

        let data = cache.get(&mapping_path).ok_or_else(|| {
            ServiceError::config_invalid(format!(
                "cannot find cluster map '{}'",
                mapping_path.display()
            ))
        })?;

        let raw: Vec<Vec<String>> = serde_json::from_slice(&data).map_err(|e| {
            error!(path = %mapping_path.display(), error = %e, "cannot load cluster map");
            ServiceError::config_invalid(format!(
                "cannot parse cluster map '{}': {}",
                mapping_path.display(),
                e
            ))
        })?;

        let map = Self::build_with_store(root, &raw, cache.store())?;
        info!(path = %mapping_path.display(), entries = map.len(), "the cluster map is valid");
        Ok(map)
    }

    /// Artifact for `query`, using inclusive floor semantics.
    pub fn resolve(&self, query: &Version) -> ServiceResult<&str> {
        let idx = self
            .entries
            .partition_point(|e| e.version.cmp_precedence(query) != Ordering::Greater);
        if idx == 0 {
            return Err(ServiceError::not_found(format!(
                "version {} is below the known range (lowest is {})",
                query, self.entries[0].version
            )));
        }

        let entry = &self.entries[idx - 1];
        debug!(query = %query, floor = %entry.version, artifact = %entry.artifact, "resolved version");
        Ok(&entry.artifact)
    }

    /// Full path of an artifact under this map's root.
    pub fn artifact_path(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; construction rejects empty maps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest version served.
    pub fn first_version(&self) -> &Version {
        &self.entries[0].version
    }

    /// Highest floor in the map.
    pub fn last_version(&self) -> &Version {
        &self.entries[self.entries.len() - 1].version
    }
}

/// Whether `path` stays inside the directory it is joined to.
///
/// Rejects empty and absolute paths and any `..` that climbs above the
/// starting directory.
fn is_local(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    let mut depth: usize = 0;
    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return false,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::Normal(_) => depth += 1,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::MemoryStore;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::sync::Arc;

    const ROOT: &str = "/remote/stable";

    fn rows(pairs: &[(&str, &str)]) -> Vec<Vec<String>> {
        pairs
            .iter()
            .map(|(v, p)| vec![v.to_string(), p.to_string()])
            .collect()
    }

    fn store_with(files: &[&str]) -> MemoryStore {
        files.iter().fold(MemoryStore::default(), |store, f| {
            store.with_file(Path::new(ROOT).join(f), b"{}")
        })
    }

    fn abc_map() -> VersionMap {
        let store = store_with(&["a.json", "b.json", "c.json"]);
        VersionMap::build_with_store(
            ROOT,
            &rows(&[("1.0.0", "a.json"), ("2.0.0", "b.json"), ("3.0.0", "c.json")]),
            &store,
        )
        .unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn build_err(pairs: &[(&str, &str)], files: &[&str]) -> ServiceError {
        VersionMap::build_with_store(ROOT, &rows(pairs), &store_with(files)).unwrap_err()
    }

    #[test]
    fn test_resolve_floor_scenario() {
        let map = abc_map();
        assert_eq!(map.resolve(&v("1.5.0")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("2.0.0")).unwrap(), "b.json");
        assert_eq!(map.resolve(&v("3.5.0")).unwrap(), "c.json");

        let err = map.resolve(&v("0.1.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_resolve_exact_boundaries_map_to_themselves() {
        let map = abc_map();
        for entry in map.entries() {
            assert_eq!(map.resolve(&entry.version).unwrap(), entry.artifact);
        }
        assert_eq!(map.resolve(&v("1.0.0")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("3.0.0")).unwrap(), "c.json");
    }

    #[test]
    fn test_resolve_just_below_boundary_uses_previous() {
        let map = abc_map();
        assert_eq!(map.resolve(&v("1.99.99")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("2.0.0-rc.1")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("99.0.0")).unwrap(), "c.json");
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        assert!(v("4.17.0-0") < v("4.17.0"));
        assert!(v("4.17.0-0") > v("4.16.99"));
        assert!(v("4.17.0-0.nightly-2024-01-01") < v("4.17.0"));
        assert!(v("4.17.0-0") < v("4.17.0-0.nightly"));
    }

    #[test]
    fn test_prerelease_boundary() {
        let store = store_with(&["old.json", "new.json"]);
        let map = VersionMap::build_with_store(
            ROOT,
            &rows(&[("1.0.0", "old.json"), ("4.17.0-0", "new.json")]),
            &store,
        )
        .unwrap();

        assert_eq!(map.resolve(&v("4.16.9")).unwrap(), "old.json");
        assert_eq!(map.resolve(&v("4.17.0-0")).unwrap(), "new.json");
        assert_eq!(map.resolve(&v("4.17.0-0.nightly-2024-05-01-000000")).unwrap(), "new.json");
        assert_eq!(map.resolve(&v("4.17.0")).unwrap(), "new.json");
        assert_eq!(map.resolve(&v("4.17.0-rc.1")).unwrap(), "new.json");
    }

    #[test]
    fn test_build_rejects_empty() {
        let err = build_err(&[], &[]);
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_build_rejects_wrong_field_count() {
        let store = store_with(&["a.json"]);
        let three = vec![vec!["1.0.0".to_string(), "a.json".to_string(), "x".to_string()]];
        let one = vec![vec!["1.0.0".to_string()]];

        for raw in [three, one] {
            let err = VersionMap::build_with_store(ROOT, &raw, &store).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        }
    }

    #[test]
    fn test_build_rejects_bad_version() {
        let err = build_err(&[("1.0", "a.json")], &["a.json"]);
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("1.0"));
    }

    #[test]
    fn test_build_rejects_non_local_paths() {
        for path in ["../a.json", "/etc/passwd", "x/../../a.json", ""] {
            let err = build_err(&[("1.0.0", path)], &["a.json"]);
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "path {:?}", path);
        }
    }

    #[test]
    fn test_build_rejects_missing_artifact() {
        let err = build_err(&[("1.0.0", "a.json"), ("2.0.0", "missing.json")], &["a.json"]);
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_build_rejects_unsorted() {
        let err = build_err(
            &[("2.0.0", "b.json"), ("1.0.0", "a.json")],
            &["a.json", "b.json"],
        );
        assert!(err.to_string().contains("not sorted"));

        // Prerelease placed after its release is out of order.
        let err = build_err(
            &[("4.17.0", "b.json"), ("4.17.0-0", "a.json")],
            &["a.json", "b.json"],
        );
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let err = build_err(
            &[("1.0.0", "a.json"), ("1.0.0", "b.json")],
            &["a.json", "b.json"],
        );
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_build_metadata_does_not_move_the_floor() {
        let store = store_with(&["a.json", "b.json"]);
        let map = VersionMap::build_with_store(
            ROOT,
            &rows(&[("1.0.0+build.1", "a.json"), ("2.0.0", "b.json")]),
            &store,
        )
        .unwrap();

        assert_eq!(map.resolve(&v("1.0.0")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("1.0.0+other")).unwrap(), "a.json");
        assert_eq!(map.resolve(&v("2.0.0+build.9")).unwrap(), "b.json");
        assert_eq!(
            map.resolve(&v("1.0.0-rc.1+build.1")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_build_rejects_duplicates_differing_in_build_metadata() {
        let err = build_err(
            &[("1.0.0+a", "a.json"), ("1.0.0+b", "b.json")],
            &["a.json", "b.json"],
        );
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("duplicate"));

        // Reversed, the pair is still equal in precedence, not out of order.
        let err = build_err(
            &[("1.0.0+b", "b.json"), ("1.0.0+a", "a.json")],
            &["a.json", "b.json"],
        );
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_build_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("configs")).unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("configs/b.json"), "{}").unwrap();

        let map = VersionMap::build(
            dir.path(),
            &rows(&[("1.0.0", "a.json"), ("2.0.0", "configs/b.json")]),
        )
        .unwrap();
        assert_eq!(map.root(), dir.path());
        assert_eq!(map.resolve(&v("2.1.0")).unwrap(), "configs/b.json");

        let err = VersionMap::build(
            dir.path(),
            &rows(&[("1.0.0", "a.json"), ("2.0.0", "configs/missing.json")]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("missing.json"));

        // A directory is not an artifact.
        let err = VersionMap::build(dir.path(), &rows(&[("1.0.0", "configs")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_is_local() {
        assert!(is_local("a.json"));
        assert!(is_local("dir/a.json"));
        assert!(is_local("./a.json"));
        assert!(is_local("dir/../a.json"));
        assert!(!is_local(""));
        assert!(!is_local(".."));
        assert!(!is_local("../a.json"));
        assert!(!is_local("/abs/a.json"));
    }

    #[test]
    fn test_load_through_cache() {
        let store = Arc::new(
            store_with(&["a.json", "b.json"]).with_file(
                Path::new(ROOT).join("cluster_version_mapping.json"),
                br#"[["1.0.0", "a.json"], ["2.0.0", "b.json"]]"#,
            ),
        );
        let cache = ResourceCache::new(store.clone());

        let map = VersionMap::load(ROOT, "cluster_version_mapping.json", &cache).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.first_version(), &v("1.0.0"));
        assert_eq!(map.last_version(), &v("2.0.0"));
        assert_eq!(map.artifact_path("b.json"), Path::new(ROOT).join("b.json"));
        assert!(cache.contains(&Path::new(ROOT).join("cluster_version_mapping.json")));
        // Validation probes existence only; artifacts are not read.
        assert!(!cache.contains(&Path::new(ROOT).join("a.json")));
    }

    #[test]
    fn test_load_missing_or_malformed_map() {
        let cache = ResourceCache::new(Arc::new(store_with(&[])));
        let err = VersionMap::load(ROOT, "cluster_version_mapping.json", &cache).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let store = store_with(&["a.json"]).with_file(
            Path::new(ROOT).join("cluster_version_mapping.json"),
            br#"[["1.0.0", 7]]"#,
        );
        let cache = ResourceCache::new(Arc::new(store));
        let err = VersionMap::load(ROOT, "cluster_version_mapping.json", &cache).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    proptest! {
        #[test]
        fn prop_resolve_is_inclusive_floor(
            floors in prop::collection::btree_set((0u64..8, 0u64..8, 0u64..8), 1..8),
            query in (0u64..10, 0u64..10, 0u64..10),
        ) {
            let floors: Vec<_> = floors.into_iter().collect();
            let pairs: Vec<Vec<String>> = floors
                .iter()
                .enumerate()
                .map(|(i, (ma, mi, pa))| vec![format!("{}.{}.{}", ma, mi, pa), format!("{}.json", i)])
                .collect();
            let files: Vec<String> = (0..floors.len()).map(|i| format!("{}.json", i)).collect();
            let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
            let map = VersionMap::build_with_store(ROOT, &pairs, &store_with(&file_refs)).unwrap();

            let query = Version::new(query.0, query.1, query.2);
            let expected = map
                .entries()
                .iter()
                .rev()
                .find(|e| e.version.cmp_precedence(&query) != Ordering::Greater)
                .map(|e| e.artifact.clone());

            match expected {
                Some(artifact) => prop_assert_eq!(map.resolve(&query).unwrap(), artifact.as_str()),
                None => prop_assert_eq!(map.resolve(&query).unwrap_err().kind(), ErrorKind::NotFound),
            }
        }
    }
}
