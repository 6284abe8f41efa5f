//! Compiled grammar cache.
//!
//! Building the English grammars is expensive, so compiled artifacts are
//! memoized per process and, when a cache directory is configured, written
//! to disk with `bincode`. Files carry a header with a format version and the
//! crate version; any mismatch is treated as a miss.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::fst::CompiledFst;
use crate::tagged::SemioticClass;
use crate::{CasePolicy, NormalizeError};

const MAGIC: [u8; 4] = *b"TNFG";
const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Verbalize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Verbalize => "verbalize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrammarKey {
    pub stage: Stage,
    pub case_policy: CasePolicy,
    pub deterministic: bool,
}

impl GrammarKey {
    /// e.g. `_cased_en_tn_classify_true_deterministic.bin`
    pub fn file_name(&self) -> String {
        format!(
            "_{}_en_tn_{}_{}_deterministic.bin",
            self.case_policy.as_str(),
            self.stage.as_str(),
            self.deterministic
        )
    }
}

/// What a cache entry holds: the sentence classifier, or one verbalizer per
/// class along with the scanner that bounds their negative weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrammarArtifact {
    Classify(Arc<CompiledFst>),
    Verbalize {
        fsts: BTreeMap<SemioticClass, Arc<CompiledFst>>,
        floor: Arc<CompiledFst>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: [u8; 4],
    format_version: u32,
    crate_version: String,
    key: GrammarKey,
}

impl ArtifactHeader {
    fn current(key: GrammarKey) -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            key,
        }
    }

    fn matches(&self, key: &GrammarKey) -> bool {
        self.magic == MAGIC
            && self.format_version == FORMAT_VERSION
            && self.crate_version == env!("CARGO_PKG_VERSION")
            && &self.key == key
    }
}

/// Process-scoped grammar store with optional on-disk persistence.
pub struct GrammarCache {
    cache_dir: Option<PathBuf>,
    overwrite: bool,
    loaded: Mutex<HashMap<GrammarKey, Arc<GrammarArtifact>>>,
}

impl Default for GrammarCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl GrammarCache {
    /// Memoize in this process only.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            overwrite: false,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Persist artifacts under `dir`. With `overwrite`, existing files are
    /// ignored and rebuilt.
    pub fn on_disk(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            cache_dir: Some(dir.into()),
            overwrite,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn artifact_path(&self, key: &GrammarKey) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(key.file_name()))
    }

    /// Return the artifact for `key`, building it with `build` on a miss.
    ///
    /// The memo lock is not held while building; if two callers race, the
    /// first result stored wins and both get it.
    pub fn load_or_build<F>(
        &self,
        key: GrammarKey,
        build: F,
    ) -> Result<Arc<GrammarArtifact>, NormalizeError>
    where
        F: FnOnce() -> Result<GrammarArtifact, NormalizeError>,
    {
        if let Some(hit) = self.memo().get(&key) {
            return Ok(Arc::clone(hit));
        }

        let path = self.artifact_path(&key);
        let from_disk = match &path {
            Some(path) if !self.overwrite && path.exists() => match read_artifact(path, &key) {
                Ok(Some(artifact)) => {
                    log::info!("Loaded {} grammar from {}", key.stage.as_str(), path.display());
                    Some(artifact)
                }
                Ok(None) => {
                    log::info!("Stale grammar artifact at {}, rebuilding", path.display());
                    None
                }
                Err(e) => {
                    log::warn!("Unreadable grammar artifact at {}: {e}", path.display());
                    None
                }
            },
            _ => None,
        };

        let artifact = match from_disk {
            Some(artifact) => artifact,
            None => {
                log::info!(
                    "Building {} grammar ({}, deterministic={})",
                    key.stage.as_str(),
                    key.case_policy.as_str(),
                    key.deterministic
                );
                let artifact = build()?;
                if let Some(path) = &path {
                    match write_artifact(path, &key, &artifact) {
                        Ok(()) => log::info!("Cached grammar at {}", path.display()),
                        Err(e) => log::warn!("Failed to cache grammar at {}: {e}", path.display()),
                    }
                }
                artifact
            }
        };

        let mut memo = self.memo();
        let entry = memo.entry(key).or_insert_with(|| Arc::new(artifact));
        Ok(Arc::clone(entry))
    }

    /// Forget everything memoized in this process. Files on disk stay.
    pub fn clear(&self) {
        self.memo().clear();
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, HashMap<GrammarKey, Arc<GrammarArtifact>>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `Ok(None)` when the file belongs to another version or key.
fn read_artifact(path: &Path, key: &GrammarKey) -> Result<Option<GrammarArtifact>, NormalizeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let header: ArtifactHeader = bincode::deserialize_from(&mut reader)?;
    if !header.matches(key) {
        return Ok(None);
    }
    Ok(Some(bincode::deserialize_from(&mut reader)?))
}

fn write_artifact(
    path: &Path,
    key: &GrammarKey,
    artifact: &GrammarArtifact,
) -> Result<(), NormalizeError> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &ArtifactHeader::current(*key))?;
        bincode::serialize_into(&mut writer, artifact)?;
        std::io::Write::flush(&mut writer)?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::fst::Fst;

    fn key() -> GrammarKey {
        GrammarKey {
            stage: Stage::Classify,
            case_policy: CasePolicy::Cased,
            deterministic: true,
        }
    }

    fn artifact(text: &str) -> Result<GrammarArtifact, NormalizeError> {
        Ok(GrammarArtifact::Classify(Arc::new(Fst::accep(text).compile()?)))
    }

    #[test]
    fn file_name_is_keyed() {
        assert_eq!(key().file_name(), "_cased_en_tn_classify_true_deterministic.bin");
    }

    #[test]
    fn memo_hit_skips_builder() {
        let cache = GrammarCache::in_memory();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            artifact("a")
        };
        let first = cache.load_or_build(key(), build).unwrap();
        let second = cache.load_or_build(key(), build).unwrap();
        assert_eq!(builds.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn disk_hit_skips_builder() {
        let dir = tempfile::tempdir().unwrap();
        let built = GrammarCache::on_disk(dir.path(), false)
            .load_or_build(key(), || artifact("a"))
            .unwrap();
        assert!(dir.path().join(key().file_name()).exists());

        let builds = Cell::new(0);
        let loaded = GrammarCache::on_disk(dir.path(), false)
            .load_or_build(key(), || {
                builds.set(builds.get() + 1);
                artifact("b")
            })
            .unwrap();
        assert_eq!(builds.get(), 0);
        assert_eq!(*loaded, *built);
    }

    #[test]
    fn overwrite_forces_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        GrammarCache::on_disk(dir.path(), false)
            .load_or_build(key(), || artifact("a"))
            .unwrap();

        let builds = Cell::new(0);
        let rebuilt = GrammarCache::on_disk(dir.path(), true)
            .load_or_build(key(), || {
                builds.set(builds.get() + 1);
                artifact("b")
            })
            .unwrap();
        assert_eq!(builds.get(), 1);
        assert_eq!(*rebuilt, artifact("b").unwrap());
    }

    #[test]
    fn corrupt_file_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(key().file_name()), b"not a grammar").unwrap();
        let builds = Cell::new(0);
        GrammarCache::on_disk(dir.path(), false)
            .load_or_build(key(), || {
                builds.set(builds.get() + 1);
                artifact("a")
            })
            .unwrap();
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn build_errors_are_not_memoized() {
        let cache = GrammarCache::in_memory();
        let failed = cache.load_or_build(key(), || {
            Err(NormalizeError::GrammarBuild("bad table".into()))
        });
        assert!(failed.is_err());
        let builds = Cell::new(0);
        cache
            .load_or_build(key(), || {
                builds.set(builds.get() + 1);
                artifact("a")
            })
            .unwrap();
        assert_eq!(builds.get(), 1);
    }
}
