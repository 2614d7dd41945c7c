use crate::error::{Error, Result};
use crate::progress::ProgressRecord;
use crate::serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// The only user the games currently know about.
pub const DEFAULT_USER: &str = "child_1";

type Document = BTreeMap<String, ProgressRecord>;

// What may be found on disk. Older builds stored one flat record for everyone.
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Users(Document),
    Legacy(ProgressRecord),
}

/// Progress for every user, kept in a single JSON file.
///
/// Each operation reads the whole file and writes it back whole. Writes land in a
/// temporary sibling that is renamed over the original, and operations on the same
/// `ProgressStore` run one at a time. Separate processes sharing the file still race.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored record, or an empty one when the user or the file is missing.
    pub fn load(&self, user: &str) -> Result<ProgressRecord> {
        let _guard = self.exclusive();
        let record = self.read()?.remove(user).unwrap_or_default();
        tracing::debug!(path = %self.path.display(), user, stars = record.stars, "loaded progress");
        Ok(record)
    }

    /// Replace the user's record. The badge is recomputed from the stars first; the
    /// record actually written is returned.
    pub fn save(&self, user: &str, record: ProgressRecord) -> Result<ProgressRecord> {
        self.update(user, |current| *current = record)
    }

    /// Read-modify-write of one user's record.
    pub fn update<F>(&self, user: &str, change: F) -> Result<ProgressRecord>
    where
        F: FnOnce(&mut ProgressRecord),
    {
        let _guard = self.exclusive();
        let mut document = self.read()?;
        let mut record = document.remove(user).unwrap_or_default();
        change(&mut record);
        let record = record.with_badge_recomputed();
        document.insert(user.to_string(), record.clone());
        self.write(&document)?;
        tracing::info!(
            path = %self.path.display(),
            user,
            stars = record.stars,
            badge_unlocked = record.badge_unlocked,
            "saved progress"
        );
        Ok(record)
    }

    pub fn award_star(&self, user: &str, activity: &str) -> Result<ProgressRecord> {
        self.update(user, |record| record.award_star(activity))
    }

    pub fn award_quiz_point(&self, user: &str, activity: &str) -> Result<ProgressRecord> {
        self.update(user, |record| record.award_quiz_point(activity))
    }

    pub fn record_quiz(
        &self,
        user: &str,
        activity: &str,
        score: u32,
        out_of: u32,
    ) -> Result<ProgressRecord> {
        self.update(user, |record| record.record_quiz(activity, score, out_of))
    }

    fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<Document> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(Error::io(&self.path)(e)),
        };
        let stored = serde_json::from_str(&contents).map_err(|source| Error::CorruptStore {
            path: self.path.clone(),
            source,
        })?;
        Ok(match stored {
            Stored::Users(document) => document,
            Stored::Legacy(record) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "found single-record progress file, reading it as '{}'",
                    DEFAULT_USER
                );
                Document::from([(DEFAULT_USER.to_string(), record.with_badge_recomputed())])
            }
        })
    }

    fn write(&self, document: &Document) -> Result<()> {
        let mut json = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        document.serialize(&mut serializer)?;

        let tmp_path = self.tmp_path();
        let written = std::fs::File::create(&tmp_path)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .and_then(|_| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(Error::io(&self.path)(e));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "progress.json".to_string());
        self.path
            .with_file_name(format!(".{}.{:016x}.tmp", name, rand::random::<u64>()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rayon::prelude::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("kidplay-{:016x}", rand::random::<u64>()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn file(&self, name: &str) -> PathBuf {
            self.0.join(name)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn record(activity: &str, quiz_score: u32, stars: u32) -> ProgressRecord {
        ProgressRecord {
            last_activity: activity.to_string(),
            quiz_score,
            stars,
            badge_unlocked: stars >= 5,
        }
    }

    #[test]
    fn test_fresh_store_loads_default() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        let loaded = store.load("anyone").unwrap();
        assert_eq!(0, loaded.stars);
        assert!(!loaded.badge_unlocked);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        let saved = record("Emotion Quiz", 3, 6);
        assert_eq!(saved, store.save(DEFAULT_USER, saved.clone()).unwrap());
        assert_eq!(saved, store.load(DEFAULT_USER).unwrap());
        assert_eq!(ProgressRecord::default(), store.load("child_2").unwrap());
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        let saved = record("Quiz", 2, 1);
        store.save(DEFAULT_USER, saved.clone()).unwrap();
        let first = std::fs::read_to_string(store.path()).unwrap();
        store.save(DEFAULT_USER, saved.clone()).unwrap();
        assert_eq!(first, std::fs::read_to_string(store.path()).unwrap());
        assert_eq!(saved, store.load(DEFAULT_USER).unwrap());
    }

    #[test]
    fn test_save_replaces_whole_record_and_keeps_other_users() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        store.save("child_1", record("Quiz", 2, 3)).unwrap();
        store.save("child_2", record("Matching Game", 0, 1)).unwrap();
        store
            .save("child_1", ProgressRecord { stars: 1, ..Default::default() })
            .unwrap();

        let child_1 = store.load("child_1").unwrap();
        assert_eq!(0, child_1.quiz_score);
        assert_eq!("", child_1.last_activity);
        assert_eq!(record("Matching Game", 0, 1), store.load("child_2").unwrap());
    }

    #[test]
    fn test_save_enforces_badge() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        let wrong = ProgressRecord {
            stars: 9,
            badge_unlocked: false,
            ..Default::default()
        };
        assert!(store.save(DEFAULT_USER, wrong).unwrap().badge_unlocked);
        assert!(store.load(DEFAULT_USER).unwrap().badge_unlocked);
    }

    #[test]
    fn test_award_star_protocol() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        for expected in 1..=6 {
            let record = store.award_star(DEFAULT_USER, "Matching Game").unwrap();
            assert_eq!(expected, record.stars);
            assert_eq!(record.stars >= 5, record.badge_unlocked);
            assert_eq!(record, store.load(DEFAULT_USER).unwrap());
        }
    }

    #[test]
    fn test_record_quiz_protocol() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        store.record_quiz(DEFAULT_USER, "Quiz", 1, 2).unwrap();
        let record = store.record_quiz(DEFAULT_USER, "Quiz", 2, 2).unwrap();
        assert_eq!(2, record.quiz_score);
        assert_eq!(1, record.stars);
    }

    #[test]
    fn test_award_quiz_point_protocol() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        store.award_quiz_point(DEFAULT_USER, "Quiz").unwrap();
        let record = store.award_quiz_point(DEFAULT_USER, "Quiz").unwrap();
        assert_eq!(2, record.quiz_score);
        assert_eq!(2, record.stars);
        assert_eq!(record, store.load(DEFAULT_USER).unwrap());
    }

    #[test]
    fn test_concurrent_awards_are_not_lost() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        (0..24).into_par_iter().for_each(|_| {
            store.award_star(DEFAULT_USER, "Color Match").unwrap();
        });
        assert_eq!(24, store.load(DEFAULT_USER).unwrap().stars);
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("progress.json"));
        store.save(DEFAULT_USER, record("Quiz", 2, 5)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            serde_json::json!({
                "child_1": {
                    "last_activity": "Quiz",
                    "quiz_score": 2,
                    "stars": 5,
                    "badge_unlocked": true
                }
            }),
            value
        );
        let leftovers = std::fs::read_dir(&dir.0).unwrap().count();
        assert_eq!(1, leftovers);
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_left_alone() {
        let dir = TempDir::new();
        let path = dir.file("progress.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ProgressStore::open(&path);

        assert!(matches!(store.load(DEFAULT_USER), Err(Error::CorruptStore { .. })));
        assert!(matches!(
            store.award_star(DEFAULT_USER, "Quiz"),
            Err(Error::CorruptStore { .. })
        ));
        assert_eq!("{not json", std::fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = TempDir::new();
        let path = dir.file("progress.json");
        std::fs::write(&path, r#"[1, 2, 3]"#).unwrap();
        let store = ProgressStore::open(&path);
        assert!(matches!(store.load(DEFAULT_USER), Err(Error::CorruptStore { .. })));
    }

    #[test]
    fn test_legacy_flat_file_reads_as_default_user() {
        let dir = TempDir::new();
        let path = dir.file("progress.json");
        std::fs::write(&path, r#"{"stars": 6, "badge_unlocked": false}"#).unwrap();
        let store = ProgressStore::open(&path);

        let legacy = store.load(DEFAULT_USER).unwrap();
        assert_eq!(6, legacy.stars);
        assert!(legacy.badge_unlocked);
        assert_eq!(ProgressRecord::default(), store.load("child_2").unwrap());

        store.award_star(DEFAULT_USER, "Face Match").unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(7, value["child_1"]["stars"]);
    }

    #[test]
    fn test_partial_records_load_with_badge_recomputed_on_write() {
        let dir = TempDir::new();
        let path = dir.file("progress.json");
        std::fs::write(
            &path,
            r#"{"child_1": {"last_activity": "Quiz", "quiz_score": 2, "stars": 4}}"#,
        )
        .unwrap();
        let store = ProgressStore::open(&path);
        assert_eq!(record("Quiz", 2, 4), store.load(DEFAULT_USER).unwrap());
        assert!(store.award_star(DEFAULT_USER, "Quiz").unwrap().badge_unlocked);
    }

    #[test]
    fn test_missing_directory_is_an_io_error() {
        let dir = TempDir::new();
        let store = ProgressStore::open(dir.file("nope").join("progress.json"));
        assert!(matches!(
            store.save(DEFAULT_USER, ProgressRecord::default()),
            Err(Error::Io { .. })
        ));
    }
}
