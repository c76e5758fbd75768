//! Persistence of finished assessments and max force tests behind
//! `AssessmentRepository`.
//!
//! The engine never touches storage; callers inject a repository wherever a
//! record is saved, listed or deleted.

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::atomic::write_atomic;
use crate::error::{GripError, Result};
use crate::record::{AssessmentRecord, Hand, MaxForceRecord};

/// Two lists of records keyed by id: critical force assessments and max force tests.
pub trait AssessmentRepository {
    /// Append `record`, replacing any stored record with the same id.
    fn save(&mut self, record: AssessmentRecord) -> Result<()>;

    /// Remove the record with `id`. Returns false if there was none.
    fn delete(&mut self, id: Uuid) -> Result<bool>;

    /// Every stored record in insertion order.
    fn list(&self) -> Result<Vec<AssessmentRecord>>;

    fn get(&self, id: Uuid) -> Result<Option<AssessmentRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Append a max force test, replacing any stored test with the same id.
    fn save_max_force(&mut self, record: MaxForceRecord) -> Result<()>;

    /// Remove the max force test with `id`. Returns false if there was none.
    fn delete_max_force(&mut self, id: Uuid) -> Result<bool>;

    fn list_max_force(&self) -> Result<Vec<MaxForceRecord>>;

    fn get_max_force(&self, id: Uuid) -> Result<Option<MaxForceRecord>> {
        Ok(self.list_max_force()?.into_iter().find(|r| r.id == id))
    }
}

trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for AssessmentRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for MaxForceRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

fn upsert<T: Keyed>(records: &mut Vec<T>, record: T) {
    match records.iter_mut().find(|r| r.key() == record.key()) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

fn remove<T: Keyed>(records: &mut Vec<T>, id: Uuid) -> bool {
    let before = records.len();
    records.retain(|r| r.key() != id);
    records.len() != before
}

/// Everything a repository holds.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Records {
    #[serde(default)]
    assessments: Vec<AssessmentRecord>,
    #[serde(default)]
    max_force: Vec<MaxForceRecord>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    records: Records,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn save(&mut self, record: AssessmentRecord) -> Result<()> {
        upsert(&mut self.records.assessments, record);
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        Ok(remove(&mut self.records.assessments, id))
    }

    fn list(&self) -> Result<Vec<AssessmentRecord>> {
        Ok(self.records.assessments.clone())
    }

    fn save_max_force(&mut self, record: MaxForceRecord) -> Result<()> {
        upsert(&mut self.records.max_force, record);
        Ok(())
    }

    fn delete_max_force(&mut self, id: Uuid) -> Result<bool> {
        Ok(remove(&mut self.records.max_force, id))
    }

    fn list_max_force(&self) -> Result<Vec<MaxForceRecord>> {
        Ok(self.records.max_force.clone())
    }
}

/// Records persisted as one pretty-printed JSON object
/// (`{"assessments": [...], "max_force": [...]}`), rewritten atomically on
/// every change. A missing file is an empty repository.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    records: Records,
}

impl JsonFileRepository {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Records = match std::fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Records::default(),
            Ok(s) => serde_json::from_str(&s)
                .map_err(|e| eyre::Report::new(GripError::Storage(e.to_string())))
                .wrap_err_with(|| format!("parse assessments file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Records::default(),
            Err(e) => {
                return Err(eyre::Report::new(GripError::Io(e.to_string()))
                    .wrap_err(format!("read assessments file {}", path.display())));
            }
        };
        tracing::debug!(
            path = %path.display(),
            assessments = records.assessments.len(),
            max_force = records.max_force.len(),
            "repository opened"
        );
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.records)
            .map_err(|e| eyre::Report::new(GripError::Storage(e.to_string())))?;
        write_atomic(&self.path, &bytes)
            .map_err(|e| eyre::Report::new(GripError::Io(e.to_string())))
            .wrap_err_with(|| format!("write assessments file {}", self.path.display()))
    }
}

impl AssessmentRepository for JsonFileRepository {
    fn save(&mut self, record: AssessmentRecord) -> Result<()> {
        tracing::info!(id = %record.id, hand = %record.hand, "saving assessment");
        upsert(&mut self.records.assessments, record);
        self.persist()
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        if !remove(&mut self.records.assessments, id) {
            return Ok(false);
        }
        self.persist()?;
        tracing::info!(%id, "assessment deleted");
        Ok(true)
    }

    fn list(&self) -> Result<Vec<AssessmentRecord>> {
        Ok(self.records.assessments.clone())
    }

    fn save_max_force(&mut self, record: MaxForceRecord) -> Result<()> {
        tracing::info!(id = %record.id, hand = %record.hand, "saving max force test");
        upsert(&mut self.records.max_force, record);
        self.persist()
    }

    fn delete_max_force(&mut self, id: Uuid) -> Result<bool> {
        if !remove(&mut self.records.max_force, id) {
            return Ok(false);
        }
        self.persist()?;
        tracing::info!(%id, "max force test deleted");
        Ok(true)
    }

    fn list_max_force(&self) -> Result<Vec<MaxForceRecord>> {
        Ok(self.records.max_force.clone())
    }
}

/// Records for one hand, oldest first.
pub fn history<R: AssessmentRepository + ?Sized>(repo: &R, hand: Hand) -> Result<Vec<AssessmentRecord>> {
    let mut out: Vec<_> = repo.list()?.into_iter().filter(|r| r.hand == hand).collect();
    out.sort_by_key(|r| r.date);
    Ok(out)
}

/// Max force tests for one hand, oldest first.
pub fn max_force_history<R: AssessmentRepository + ?Sized>(
    repo: &R,
    hand: Hand,
) -> Result<Vec<MaxForceRecord>> {
    let mut out: Vec<_> = repo
        .list_max_force()?
        .into_iter()
        .filter(|r| r.hand == hand)
        .collect();
    out.sort_by_key(|r| r.date);
    Ok(out)
}
