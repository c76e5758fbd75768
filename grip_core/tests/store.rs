use chrono::{Duration, TimeZone, Utc};
use grip_core::backup::{self, Backup};
use grip_core::store::{history, max_force_history};
use grip_core::{
    AssessmentOutcome, AssessmentRecord, AssessmentRepository, Cycle, Hand, JsonFileRepository,
    MaxForceRecord, MemoryRepository, Sample,
};

fn record(hand: Hand, day: i64, avg: f64) -> AssessmentRecord {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let samples = vec![Sample::new(avg, t0), Sample::new(avg, t0 + Duration::seconds(1))];
    let outcome = AssessmentOutcome {
        cycles: vec![Cycle::new(1, samples.clone())],
        completed_cycles: 1,
        all_samples: samples,
        last_force: avg,
        finished_early: false,
    };
    let mut r = AssessmentRecord::from_outcome(outcome, hand, 70.0, 6);
    r.date = t0 + Duration::days(day);
    r
}

#[test]
fn memory_repository_save_get_delete() {
    let mut repo = MemoryRepository::new();
    let r = record(Hand::Left, 0, 20.0);
    let id = r.id;
    repo.save(r.clone()).unwrap();
    assert_eq!(repo.get(id).unwrap(), Some(r));
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn save_with_known_id_replaces() {
    let mut repo = MemoryRepository::new();
    let mut r = record(Hand::Right, 0, 20.0);
    repo.save(r.clone()).unwrap();
    r.bodyweight = 64.0;
    repo.save(r.clone()).unwrap();
    let all = repo.list().unwrap();
    assert_eq!(all.len(), 1);
    assert!((all[0].bodyweight - 64.0).abs() < f64::EPSILON);
}

#[test]
fn history_filters_by_hand_and_sorts_by_date() {
    let mut repo = MemoryRepository::new();
    repo.save(record(Hand::Left, 5, 21.0)).unwrap();
    repo.save(record(Hand::Right, 1, 30.0)).unwrap();
    repo.save(record(Hand::Left, 2, 19.0)).unwrap();
    let left = history(&repo, Hand::Left).unwrap();
    assert_eq!(left.len(), 2);
    assert!(left[0].date < left[1].date);
    assert!((left[0].critical_force - 19.0).abs() < 1e-12);
}

#[test]
fn json_file_repository_round_trips_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("assessments.json");
    let r = record(Hand::Left, 0, 22.5);
    {
        let mut repo = JsonFileRepository::open(&path).unwrap();
        assert!(repo.list().unwrap().is_empty());
        repo.save(r.clone()).unwrap();
    }
    let repo = JsonFileRepository::open(&path).unwrap();
    let back = repo.get(r.id).unwrap().unwrap();
    assert_eq!(back, r);
    assert_eq!(back.all_samples.len(), 2);
    assert_eq!(back.cycles[0].samples[1].timestamp, r.cycles[0].samples[1].timestamp);
    assert!(!path.with_extension("json.new").exists());
}

#[test]
fn corrupt_file_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assessments.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonFileRepository::open(&path).unwrap_err();
    assert!(err.downcast_ref::<grip_core::GripError>().is_some());
}

#[test]
fn backup_import_skips_known_ids() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("backup.json");

    let mut src = MemoryRepository::new();
    let shared = record(Hand::Left, 0, 20.0);
    src.save(shared.clone()).unwrap();
    src.save(record(Hand::Right, 1, 25.0)).unwrap();
    assert_eq!(backup::export_to(&src, &out).unwrap(), 2);

    let text = std::fs::read_to_string(&out).unwrap();
    let parsed = Backup::from_json(&text).unwrap();
    assert_eq!(parsed.assessments.len(), 2);
    assert!(text.contains("export_date"));

    let mut dst = MemoryRepository::new();
    dst.save(shared).unwrap();
    assert_eq!(backup::import_from(&mut dst, &out).unwrap(), 1);
    assert_eq!(dst.list().unwrap().len(), 2);
    assert_eq!(backup::import_from(&mut dst, &out).unwrap(), 0);
}

fn max_force(hand: Hand, day: i64, kg: f64) -> MaxForceRecord {
    let mut r = MaxForceRecord::new(hand, kg);
    r.date = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::days(day);
    r
}

#[test]
fn max_force_tests_live_beside_assessments() {
    let mut repo = MemoryRepository::new();
    let a = record(Hand::Left, 0, 20.0);
    let m = max_force(Hand::Left, 0, 42.0);
    repo.save(a.clone()).unwrap();
    repo.save_max_force(m.clone()).unwrap();

    assert_eq!(repo.list().unwrap().len(), 1);
    assert_eq!(repo.get_max_force(m.id).unwrap(), Some(m.clone()));
    // ids are per kind
    assert!(!repo.delete(m.id).unwrap());
    assert!(!repo.delete_max_force(a.id).unwrap());
    assert!(repo.delete_max_force(m.id).unwrap());
    assert!(repo.list_max_force().unwrap().is_empty());
    assert_eq!(repo.list().unwrap(), vec![a]);
}

#[test]
fn max_force_history_filters_and_sorts() {
    let mut repo = MemoryRepository::new();
    repo.save_max_force(max_force(Hand::Right, 3, 45.0)).unwrap();
    repo.save_max_force(max_force(Hand::Right, 1, 40.0)).unwrap();
    repo.save_max_force(max_force(Hand::Left, 2, 38.0)).unwrap();
    let right = max_force_history(&repo, Hand::Right).unwrap();
    assert_eq!(right.len(), 2);
    assert!((right[0].max_force - 40.0).abs() < f64::EPSILON);
    assert!(right[0].date < right[1].date);
}

#[test]
fn json_file_repository_keeps_max_force_tests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assessments.json");
    let m = max_force(Hand::Right, 0, 47.25);
    {
        let mut repo = JsonFileRepository::open(&path).unwrap();
        repo.save(record(Hand::Left, 0, 20.0)).unwrap();
        repo.save_max_force(m.clone()).unwrap();
    }
    let repo = JsonFileRepository::open(&path).unwrap();
    assert_eq!(repo.list().unwrap().len(), 1);
    assert_eq!(repo.list_max_force().unwrap(), vec![m]);
}

#[test]
fn backup_carries_max_force_tests() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("backup.json");

    let mut src = MemoryRepository::new();
    src.save(record(Hand::Left, 0, 20.0)).unwrap();
    let m = max_force(Hand::Left, 1, 44.0);
    src.save_max_force(m.clone()).unwrap();
    assert_eq!(backup::export_to(&src, &out).unwrap(), 2);

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(Backup::from_json(&text).unwrap().max_force, vec![m.clone()]);

    let mut dst = MemoryRepository::new();
    dst.save_max_force(m).unwrap();
    assert_eq!(backup::import_from(&mut dst, &out).unwrap(), 1);
    assert_eq!(dst.list_max_force().unwrap().len(), 1);
    assert_eq!(dst.list().unwrap().len(), 1);
}

#[test]
fn backup_without_max_force_section_still_imports() {
    let mut src = MemoryRepository::new();
    src.save(record(Hand::Right, 0, 30.0)).unwrap();
    let mut v: serde_json::Value =
        serde_json::from_str(&Backup::from_repo(&src).unwrap().to_json().unwrap()).unwrap();
    v.as_object_mut().unwrap().remove("max_force");

    let parsed = Backup::from_json(&v.to_string()).unwrap();
    assert!(parsed.max_force.is_empty());
    let mut dst = MemoryRepository::new();
    assert_eq!(parsed.merge_into(&mut dst).unwrap(), 1);
}
