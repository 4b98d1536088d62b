// SPDX-License-Identifier: GPL-3.0-only

//! Attendance table persistence across sessions

use chrono::NaiveDate;
use rollcall::attendance::{AttendanceSink, AttendanceTable, JsonAttendanceSink};
use rollcall::constants::UNKNOWN_ATTENDEE;
use rollcall::recognition::ReferenceSet;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
}

#[test]
fn test_sessions_accumulate_in_class_directory() {
    let class_dir = tempfile::tempdir().unwrap();
    let references = ReferenceSet::new(
        vec!["Ada".to_string(), "Bob".to_string()],
        vec![vec![0.0], vec![1.0]],
    )
    .unwrap();
    let sink = JsonAttendanceSink::new(class_dir.path());

    let mut table = AttendanceTable::new();
    table.register(references.names().iter().cloned());
    sink.store(&table).unwrap();

    let mut first = sink.load().unwrap();
    first.mark_session(date(1), ["Ada"]);
    sink.store(&first).unwrap();

    let mut second = sink.load().unwrap();
    second.mark_session(date(2), ["Bob", UNKNOWN_ATTENDEE]);
    sink.store(&second).unwrap();

    let table = sink.load().unwrap();
    assert_eq!(table.dates().len(), 2);
    assert_eq!(table.is_present("Ada", date(1)), Some(true));
    assert_eq!(table.is_present("Ada", date(2)), Some(false));
    assert_eq!(table.is_present("Bob", date(1)), Some(false));
    assert_eq!(table.is_present("Bob", date(2)), Some(true));
    assert_eq!(table.is_present(UNKNOWN_ATTENDEE, date(2)), Some(true));
}

#[test]
fn test_stored_file_is_name_date_map() {
    let class_dir = tempfile::tempdir().unwrap();
    let sink = JsonAttendanceSink::new(class_dir.path());

    let mut table = AttendanceTable::new();
    table.register(["Ada"]);
    table.mark_session(date(3), ["Ada"]);
    sink.store(&table).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sink.path()).unwrap()).unwrap();
    assert_eq!(raw["Ada"]["2024-10-03"], serde_json::Value::Bool(true));
    assert_eq!(raw[UNKNOWN_ATTENDEE]["2024-10-03"], serde_json::Value::Bool(false));
}
