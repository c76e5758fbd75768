//! Commands over the saved record store: history, show, delete, backup and recompute.

use std::path::Path;

use grip_core::store::{history, max_force_history};
use grip_core::{
    AssessmentRecord, AssessmentRepository, GripError, Hand, JsonFileRepository, MaxForceRecord,
};
use serde_json::json;
use uuid::Uuid;

use crate::cli::json_mode;

fn open_store(cfg: &grip_config::Config) -> eyre::Result<JsonFileRepository> {
    JsonFileRepository::open(cfg.storage.path_or_default())
}

fn summary_json(r: &AssessmentRecord) -> serde_json::Value {
    json!({
        "id": r.id,
        "date": r.date,
        "hand": r.hand,
        "bodyweight": r.bodyweight,
        "completed_cycles": r.completed_cycles,
        "critical_force": r.critical_force,
        "w_prime": r.w_prime,
        "relative_critical_force": r.relative_critical_force(),
    })
}

fn summary_line(r: &AssessmentRecord) -> String {
    let rel = r
        .relative_critical_force()
        .map(|x| format!(" ({:.1} % bw)", x * 100.0))
        .unwrap_or_default();
    format!(
        "{}  {}  {:<5}  CF {:>6.2} kg{rel}  W′ {:>7.1} kg·s  cycles {:>2}",
        r.date.format("%Y-%m-%d %H:%M"),
        r.id,
        r.hand,
        r.critical_force,
        r.w_prime,
        r.completed_cycles
    )
}

fn max_force_json(r: &MaxForceRecord) -> serde_json::Value {
    json!({ "id": r.id, "date": r.date, "hand": r.hand, "max_force": r.max_force })
}

fn max_force_line(r: &MaxForceRecord) -> String {
    format!(
        "{}  {}  {:<5}  max {:>6.2} kg",
        r.date.format("%Y-%m-%d %H:%M"),
        r.id,
        r.hand,
        r.max_force
    )
}

pub fn run_history(
    cfg: &grip_config::Config,
    hand: Option<Hand>,
    max_force: bool,
) -> eyre::Result<()> {
    let repo = open_store(cfg)?;
    if max_force {
        return print_max_force_history(&repo, hand);
    }
    let records = match hand {
        Some(h) => history(&repo, h)?,
        None => {
            let mut all = repo.list()?;
            all.sort_by_key(|r| r.date);
            all
        }
    };
    if json_mode() {
        for r in &records {
            println!("{}", summary_json(r));
        }
    } else if records.is_empty() {
        println!("No saved assessments.");
    } else {
        for r in &records {
            println!("{}", summary_line(r));
        }
    }
    Ok(())
}

fn print_max_force_history(repo: &JsonFileRepository, hand: Option<Hand>) -> eyre::Result<()> {
    let records = match hand {
        Some(h) => max_force_history(repo, h)?,
        None => {
            let mut all = repo.list_max_force()?;
            all.sort_by_key(|r| r.date);
            all
        }
    };
    if json_mode() {
        for r in &records {
            println!("{}", max_force_json(r));
        }
    } else if records.is_empty() {
        println!("No saved max force tests.");
    } else {
        for r in &records {
            println!("{}", max_force_line(r));
        }
    }
    Ok(())
}

fn require(repo: &JsonFileRepository, id: Uuid) -> eyre::Result<AssessmentRecord> {
    repo.get(id)?
        .ok_or_else(|| eyre::Report::new(GripError::NotFound(id)))
}

pub fn run_show(cfg: &grip_config::Config, id: Uuid) -> eyre::Result<()> {
    let repo = open_store(cfg)?;
    let Some(r) = repo.get(id)? else {
        let m = repo
            .get_max_force(id)?
            .ok_or_else(|| eyre::Report::new(GripError::NotFound(id)))?;
        if json_mode() {
            println!("{}", max_force_json(&m));
        } else {
            println!("{}", max_force_line(&m));
        }
        return Ok(());
    };
    if json_mode() {
        let mut v = summary_json(&r);
        v["cycles"] = r
            .cycles
            .iter()
            .map(|c| json!({ "cycle": c.cycle_number, "average_force": c.average_force, "samples": c.samples.len() }))
            .collect();
        v["peak_force"] = json!(r.peak_force());
        println!("{v}");
        return Ok(());
    }
    println!("{}", summary_line(&r));
    println!("  bodyweight {:.1} kg, peak {:.2} kg, {} samples", r.bodyweight, r.peak_force(), r.all_samples.len());
    for c in &r.cycles {
        println!(
            "  cycle {:>2}: {:>6.2} kg avg over {} samples",
            c.cycle_number,
            c.average_force,
            c.samples.len()
        );
    }
    Ok(())
}

pub fn run_delete(cfg: &grip_config::Config, id: Uuid) -> eyre::Result<()> {
    let mut repo = open_store(cfg)?;
    if !repo.delete(id)? && !repo.delete_max_force(id)? {
        return Err(eyre::Report::new(GripError::NotFound(id)));
    }
    if json_mode() {
        println!("{}", json!({ "deleted": id }));
    } else {
        println!("Deleted {id}");
    }
    Ok(())
}

pub fn run_export(cfg: &grip_config::Config, out: &Path) -> eyre::Result<()> {
    let repo = open_store(cfg)?;
    let n = grip_core::backup::export_to(&repo, out)?;
    if json_mode() {
        println!("{}", json!({ "exported": n, "path": out }));
    } else {
        println!("Exported {n} records to {}", out.display());
    }
    Ok(())
}

pub fn run_import(cfg: &grip_config::Config, file: &Path) -> eyre::Result<()> {
    let mut repo = open_store(cfg)?;
    let n = grip_core::backup::import_from(&mut repo, file)?;
    if json_mode() {
        println!("{}", json!({ "imported": n, "path": file }));
    } else {
        println!("Imported {n} new records from {}", file.display());
    }
    Ok(())
}

pub fn run_recompute(cfg: &grip_config::Config, id: Uuid) -> eyre::Result<()> {
    let mut repo = open_store(cfg)?;
    let mut r = require(&repo, id)?;
    let (cf_before, wp_before) = (r.critical_force, r.w_prime);
    r.recompute(cfg.protocol.cf_window);
    tracing::info!(%id, cf_before, cf = r.critical_force, wp_before, wp = r.w_prime, "recomputed");
    repo.save(r.clone())?;
    if json_mode() {
        println!("{}", summary_json(&r));
    } else {
        println!(
            "CF {:.2} -> {:.2} kg, W′ {:.1} -> {:.1} kg·s (window {})",
            cf_before, r.critical_force, wp_before, r.w_prime, cfg.protocol.cf_window
        );
    }
    Ok(())
}
