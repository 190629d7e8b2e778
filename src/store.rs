//! On-disk résumé library: one JSON file per résumé in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::Section;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub name: String,
    pub modules: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    pub fn new(id: impl Into<String>, name: impl Into<String>, document: &Document) -> Self {
        let now = Utc::now();
        Resume {
            id: id.into(),
            name: name.into(),
            modules: document.sections().to_vec(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild the document, validating it like an import.
    pub fn document(&self) -> Result<Document> {
        Document::from_sections(self.modules.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResumeSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ResumeStore {
    dir: PathBuf,
}

fn check_id(id: &str) -> Result<()> {
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::InvariantViolation(format!("invalid resume id {id:?}")))
    }
}

impl ResumeStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(ResumeStore { dir })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        check_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn read(path: &Path) -> Result<Resume> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Insert or update. An existing record keeps its creation time; the update
    /// time is always refreshed. Returns the record as stored.
    pub fn save(&self, mut resume: Resume) -> Result<Resume> {
        let path = self.path_for(&resume.id)?;
        let now = Utc::now();
        match Self::read(&path) {
            Ok(existing) => resume.created_at = existing.created_at,
            Err(_) => resume.created_at = now,
        }
        resume.updated_at = now;

        // write-then-rename so a crash never leaves a truncated record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&resume)?)?;
        fs::rename(&tmp, &path)?;
        log::debug!("store: saved {} ({})", resume.id, path.display());
        Ok(resume)
    }

    pub fn load(&self, id: &str) -> Result<Resume> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        Self::read(&path)
    }

    /// All résumés, most recently updated first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<ResumeSummary>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(r) => out.push(ResumeSummary {
                    id: r.id,
                    name: r.name,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                }),
                Err(e) => log::warn!("store: skipping {}: {e}", path.display()),
            }
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every stored résumé.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path()).unwrap();
        let saved = store.save(Resume::new("r1", "Mine", &Document::starter())).unwrap();
        let loaded = store.load("r1").unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.document().unwrap(), Document::starter());
    }

    #[test]
    fn update_keeps_creation_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path()).unwrap();
        let first = store.save(Resume::new("r1", "Mine", &Document::new())).unwrap();
        let mut changed = first.clone();
        changed.name = "Renamed".into();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        let second = store.save(changed).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.load("r1").unwrap().name, "Renamed");
    }

    #[test]
    fn list_is_newest_first_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path()).unwrap();
        store.save(Resume::new("old", "Old", &Document::new())).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.save(Resume::new("new", "New", &Document::new())).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path()).unwrap();
        store.save(Resume::new("a", "A", &Document::new())).unwrap();
        store.save(Resume::new("b", "B", &Document::new())).unwrap();
        store.delete("a").unwrap();
        assert!(matches!(store.load("a"), Err(Error::NotFound(_))));
        assert!(matches!(store.delete("a"), Err(Error::NotFound(_))));
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn ids_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path()).unwrap();
        assert!(store.load("../etc/passwd").is_err());
        assert!(store.save(Resume::new("a/b", "x", &Document::new())).is_err());
    }
}
