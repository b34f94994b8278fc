//! Spreadsheet export of one challenge.
//!
//! The workbook is first assembled as plain rows so its content can be
//! inspected without decoding xlsx, then rendered with `rust_xlsxwriter`.

use crate::models::{AppData, Challenge, DayEntry};
use crate::schedule::{date_key, duration_days};
use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("row or column out of range")]
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Empty, Self::Text)
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
}

/// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn timestamp(ts: Option<DateTime<Utc>>) -> Cell {
    ts.map(local_time).into()
}

fn summary_sheet(challenge: &Challenge, downloaded_at: DateTime<Utc>) -> Sheet {
    let row = |key: &str, value: Cell| vec![Cell::from(key), value];
    Sheet {
        name: "Summary",
        rows: vec![
            row("Challenge Title", challenge.title.as_str().into()),
            row("Challenge Code", challenge.code.as_str().into()),
            row("Start Date", date_key(challenge.start_date).into()),
            row("End Date", date_key(challenge.end_date).into()),
            row("Duration", format!("{} Tage", duration_days(challenge)).into()),
            row("Description", challenge.description.as_str().into()),
            row("Start Score", challenge.start_score.into()),
            row("A/B Enabled", challenge.ab_enabled.to_string().into()),
            row("Download Date and Time", local_time(downloaded_at).into()),
        ],
    }
}

/// Entries of the challenge written by its current members.
fn member_entries<'a>(data: &'a AppData, challenge_id: &str) -> Vec<&'a DayEntry> {
    let members: HashSet<&str> = data
        .members_of(challenge_id)
        .into_iter()
        .map(|m| m.user_id.as_str())
        .collect();
    data.challenge_entries(challenge_id)
        .into_iter()
        .filter(|e| members.contains(e.user_id.as_str()))
        .collect()
}

fn members_sheet(data: &AppData, challenge_id: &str) -> Sheet {
    let mut rows = vec![header(&["membershipId", "userId", "joinedAt", "abGroup"])];
    rows.extend(data.members_of(challenge_id).into_iter().map(|m| {
        vec![
            m.id.as_str().into(),
            m.user_id.as_str().into(),
            date_key(m.joined_at.with_timezone(&Local).date_naive()).into(),
            m.ab_group.map(|g| g.as_str().to_string()).into(),
        ]
    }));
    Sheet { name: "Members", rows }
}

fn entries_sheet(entries: &[&DayEntry]) -> Sheet {
    let mut rows = vec![header(&[
        "entryId",
        "userId",
        "date",
        "totalScore",
        "markers",
        "firstAnswerAt",
        "lastAnswerAt",
        "submittedAt",
        "durationMs",
    ])];
    rows.extend(entries.iter().map(|e| {
        vec![
            e.id.as_str().into(),
            e.user_id.as_str().into(),
            date_key(e.date).into(),
            e.total_score.into(),
            e.markers.join(" ").into(),
            timestamp(e.first_answer_at),
            timestamp(e.last_answer_at),
            timestamp(e.submitted_at),
            e.duration_ms.into(),
        ]
    }));
    Sheet { name: "DayEntries", rows }
}

fn entry_actions_sheet(data: &AppData, entries: &[&DayEntry]) -> Sheet {
    let mut rows = vec![header(&[
        "dayEntryId",
        "actionId",
        "actionCode",
        "label",
        "category",
        "weight",
        "polarity",
    ])];
    for entry in entries {
        for action in entry.action_ids.iter().filter_map(|id| data.actions.get(id)) {
            rows.push(vec![
                entry.id.as_str().into(),
                action.id.as_str().into(),
                action.code.as_str().into(),
                action.label.as_str().into(),
                action.category.as_str().into(),
                i64::from(action.weight).into(),
                action.polarity.as_str().into(),
            ]);
        }
    }
    Sheet {
        name: "EntryActions",
        rows,
    }
}

fn header(columns: &[&str]) -> Vec<Cell> {
    columns.iter().map(|c| Cell::from(*c)).collect()
}

pub fn build_sheets(data: &AppData, challenge: &Challenge, downloaded_at: DateTime<Utc>) -> Vec<Sheet> {
    let entries = member_entries(data, &challenge.id);
    vec![
        summary_sheet(challenge, downloaded_at),
        members_sheet(data, &challenge.id),
        entries_sheet(&entries),
        entry_actions_sheet(data, &entries),
    ]
}

pub fn render_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;
        for (r, cells) in sheet.rows.iter().enumerate() {
            let row = u32::try_from(r).map_err(|_| ExportError::OutOfRange)?;
            for (c, cell) in cells.iter().enumerate() {
                let col = u16::try_from(c).map_err(|_| ExportError::OutOfRange)?;
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

pub fn export_file_name(challenge: &Challenge) -> String {
    format!("challenge_{}_export.xlsx", challenge.code)
}
