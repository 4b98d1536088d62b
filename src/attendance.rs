// SPDX-License-Identifier: GPL-3.0-only

//! Attendance bookkeeping for a class directory
//!
//! A table of name -> date -> present. Rows are registered from the reference
//! names (plus one row for unmatched faces); each session adds one date column
//! in which every registered row gets a value.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{ATTENDANCE_FILE, UNKNOWN_ATTENDEE};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceTable {
    rows: BTreeMap<String, BTreeMap<NaiveDate, bool>>,
}

impl AttendanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows for `names` and the unknown row. Existing rows keep their
    /// history; new rows start absent on every recorded date.
    pub fn register<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dates = self.dates();
        for name in names
            .into_iter()
            .map(Into::into)
            .chain(std::iter::once(UNKNOWN_ATTENDEE.to_string()))
        {
            self.rows
                .entry(name)
                .or_insert_with(|| dates.iter().map(|date| (*date, false)).collect());
        }
    }

    /// Record one session: every registered row gets `date`, true if its name
    /// is in `present`. Present names without a row are ignored.
    pub fn mark_session<'a, I>(&mut self, date: NaiveDate, present: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: BTreeSet<&str> = present.into_iter().collect();
        for (name, days) in self.rows.iter_mut() {
            let here = present.contains(name.as_str());
            // A second session on the same day never clears an earlier mark
            let entry = days.entry(date).or_insert(false);
            *entry |= here;
        }
        debug!(%date, present = present.len(), "Session marked");
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// All dates with a column, in order
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.rows
            .values()
            .flat_map(|days| days.keys().copied())
            .collect()
    }

    pub fn is_present(&self, name: &str, date: NaiveDate) -> Option<bool> {
        self.rows.get(name)?.get(&date).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain-text grid: one header row of dates, one row per name
    pub fn render(&self) -> String {
        let dates = self.dates();
        let name_width = self
            .rows
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
            .max("NAMES".len());

        let mut out = format!("{:<name_width$}", "NAMES");
        for date in &dates {
            out.push_str(&format!("  {}", date));
        }
        out.push('\n');

        for (name, days) in &self.rows {
            out.push_str(&format!("{:<name_width$}", name));
            for date in &dates {
                let mark = match days.get(date) {
                    Some(true) => "present",
                    Some(false) => "-",
                    None => "",
                };
                out.push_str(&format!("  {:<10}", mark));
            }
            out.push('\n');
        }
        out
    }
}

/// Where attendance tables are persisted
pub trait AttendanceSink {
    fn load(&self) -> AppResult<AttendanceTable>;
    fn store(&self, table: &AttendanceTable) -> AppResult<()>;
}

/// `attendance.json` inside a class directory
#[derive(Debug, Clone)]
pub struct JsonAttendanceSink {
    path: PathBuf,
}

impl JsonAttendanceSink {
    pub fn new(class_dir: &Path) -> Self {
        Self {
            path: class_dir.join(ATTENDANCE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl AttendanceSink for JsonAttendanceSink {
    fn load(&self) -> AppResult<AttendanceTable> {
        if !self.exists() {
            return Err(AppError::Attendance(format!(
                "no attendance file at {}",
                self.path.display()
            )));
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Attendance(format!("{}: {}", self.path.display(), e)))
    }

    fn store(&self, table: &AttendanceTable) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(table)
            .map_err(|e| AppError::Attendance(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), rows = table.rows.len(), "Attendance saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    #[test]
    fn test_register_adds_unknown_row() {
        let mut table = AttendanceTable::new();
        table.register(["ann", "bob"]);
        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec![UNKNOWN_ATTENDEE, "ann", "bob"]);
    }

    #[test]
    fn test_mark_session_fills_every_row() {
        let mut table = AttendanceTable::new();
        table.register(["ann", "bob"]);
        table.mark_session(day(2), ["ann", "stranger"]);

        assert_eq!(table.is_present("ann", day(2)), Some(true));
        assert_eq!(table.is_present("bob", day(2)), Some(false));
        assert_eq!(table.is_present(UNKNOWN_ATTENDEE, day(2)), Some(false));
        assert_eq!(table.is_present("stranger", day(2)), None);
    }

    #[test]
    fn test_same_day_marks_accumulate() {
        let mut table = AttendanceTable::new();
        table.register(["ann"]);
        table.mark_session(day(2), ["ann"]);
        table.mark_session(day(2), std::iter::empty());
        assert_eq!(table.is_present("ann", day(2)), Some(true));
    }

    #[test]
    fn test_late_registration_starts_absent() {
        let mut table = AttendanceTable::new();
        table.register(["ann"]);
        table.mark_session(day(2), ["ann"]);
        table.register(["cat"]);
        assert_eq!(table.is_present("cat", day(2)), Some(false));
    }

    #[test]
    fn test_json_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonAttendanceSink::new(dir.path());
        assert!(sink.load().is_err());

        let mut table = AttendanceTable::new();
        table.register(["ann"]);
        table.mark_session(day(3), ["ann"]);
        sink.store(&table).unwrap();

        assert!(sink.exists());
        assert_eq!(sink.load().unwrap(), table);
    }

    #[test]
    fn test_render_lists_dates() {
        let mut table = AttendanceTable::new();
        table.register(["ann"]);
        table.mark_session(day(4), ["ann"]);
        let text = table.render();
        assert!(text.starts_with("NAMES"));
        assert!(text.contains("2024-09-04"));
        assert!(text.contains("present"));
    }
}
