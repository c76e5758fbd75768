//! Whole-repository export and import.

use std::path::Path;

use chrono::{DateTime, Utc};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::atomic::write_atomic;
use crate::error::{GripError, Result};
use crate::record::{AssessmentRecord, MaxForceRecord};
use crate::store::AssessmentRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub assessments: Vec<AssessmentRecord>,
    #[serde(default)]
    pub max_force: Vec<MaxForceRecord>,
    pub export_date: DateTime<Utc>,
}

impl Backup {
    pub fn from_repo<R: AssessmentRepository + ?Sized>(repo: &R) -> Result<Self> {
        Ok(Self {
            assessments: repo.list()?,
            max_force: repo.list_max_force()?,
            export_date: Utc::now(),
        })
    }

    /// Records of both kinds.
    pub fn len(&self) -> usize {
        self.assessments.len() + self.max_force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| eyre::Report::new(GripError::Storage(e.to_string())))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| eyre::Report::new(GripError::Storage(e.to_string())))
            .wrap_err("parse backup")
    }

    /// Save every record whose id is not already in `repo`. Returns how many were
    /// added, counting both kinds.
    pub fn merge_into<R: AssessmentRepository + ?Sized>(self, repo: &mut R) -> Result<usize> {
        let existing: std::collections::HashSet<_> = repo.list()?.into_iter().map(|r| r.id).collect();
        let mut added = 0;
        for record in self.assessments {
            if existing.contains(&record.id) {
                tracing::debug!(id = %record.id, "skipping existing assessment");
                continue;
            }
            repo.save(record)?;
            added += 1;
        }
        let existing: std::collections::HashSet<_> =
            repo.list_max_force()?.into_iter().map(|r| r.id).collect();
        for record in self.max_force {
            if existing.contains(&record.id) {
                tracing::debug!(id = %record.id, "skipping existing max force test");
                continue;
            }
            repo.save_max_force(record)?;
            added += 1;
        }
        Ok(added)
    }
}

/// Write a backup of `repo` to `path`. Returns the number of records exported (both kinds).
pub fn export_to<R: AssessmentRepository + ?Sized>(repo: &R, path: &Path) -> Result<usize> {
    let backup = Backup::from_repo(repo)?;
    let json = backup.to_json()?;
    write_atomic(path, json.as_bytes())
        .map_err(|e| eyre::Report::new(GripError::Io(e.to_string())))
        .wrap_err_with(|| format!("write backup {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        assessments = backup.assessments.len(),
        max_force = backup.max_force.len(),
        "backup exported"
    );
    Ok(backup.len())
}

/// Merge the backup at `path` into `repo`. Returns the number of records added.
pub fn import_from<R: AssessmentRepository + ?Sized>(repo: &mut R, path: &Path) -> Result<usize> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| eyre::Report::new(GripError::Io(e.to_string())))
        .wrap_err_with(|| format!("read backup {}", path.display()))?;
    let added = Backup::from_json(&s)?.merge_into(repo)?;
    tracing::info!(path = %path.display(), added, "backup imported");
    Ok(added)
}
