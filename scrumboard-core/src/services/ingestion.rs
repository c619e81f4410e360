//! Bulk import of work items from CSV, JSON or Excel exports.
//!
//! Pipeline: parse the file into a [`RawTable`], map headers onto task
//! columns through an alias table, coerce dates and numbers, derive cycle
//! time and the criticality timeline, then upsert every row by `task_id` in
//! one transaction.

use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use serde_json::Value as Json;
use tracing::{debug, info, warn};

use crate::db::{Database, ImportedTask};
use crate::error::{ServiceError, ServiceResult};

/// One parsed cell, before it is coerced to a column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// A header row plus data rows, as read from the upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Excel,
}

impl FileFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".csv") {
            Some(Self::Csv)
        } else if name.ends_with(".json") {
            Some(Self::Json)
        } else if name.ends_with(".xlsx") || name.ends_with(".xls") {
            Some(Self::Excel)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Date,
    Integer,
    Real,
}

/// Task columns an import may set directly.
const IMPORT_COLUMNS: &[(&str, Kind)] = &[
    ("task_id", Kind::Text),
    ("work_item_type", Kind::Text),
    ("parent_task_id", Kind::Text),
    ("title", Kind::Text),
    ("description", Kind::Text),
    ("assigned_to", Kind::Text),
    ("state", Kind::Text),
    ("sub_state", Kind::Text),
    ("priority", Kind::Integer),
    ("story_points", Kind::Real),
    ("sprint", Kind::Text),
    ("tags", Kind::Text),
    ("area_path", Kind::Text),
    ("iteration_path", Kind::Text),
    ("activated_date", Kind::Date),
    ("target_date", Kind::Date),
    ("committed_date", Kind::Date),
    ("release_date", Kind::Date),
    ("closed_date", Kind::Date),
    ("cycle_time", Kind::Real),
    ("current_status", Kind::Text),
    ("current_update", Kind::Text),
    ("update_date", Kind::Date),
    ("risk_item", Kind::Text),
    ("carry_forward_reason", Kind::Text),
    ("criticality", Kind::Text),
    ("project_id", Kind::Integer),
    ("sprint_id", Kind::Integer),
];

/// Normalized export header → task column.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("id", "task_id"),
    ("taskid", "task_id"),
    ("task id", "task_id"),
    ("work item id", "task_id"),
    ("title", "title"),
    ("assignedto", "assigned_to"),
    ("assigned to", "assigned_to"),
    ("state", "state"),
    ("sub-state", "sub_state"),
    ("sub state", "sub_state"),
    ("substate", "sub_state"),
    ("iteration path", "iteration_path"),
    ("area path", "area_path"),
    ("work item type", "work_item_type"),
    ("type", "work_item_type"),
    ("parent", "parent_task_id"),
    ("parent id", "parent_task_id"),
    ("story points", "story_points"),
    ("storypoints", "story_points"),
    ("activated date", "activated_date"),
    ("target date", "target_date"),
    ("committed date", "committed_date"),
    ("release date", "release_date"),
    ("closed date", "closed_date"),
    ("cycle time", "cycle_time"),
    ("current status", "current_status"),
    ("currentupdate", "current_update"),
    ("current update", "current_update"),
    ("update date", "update_date"),
    ("riskitem", "risk_item"),
    ("risk item", "risk_item"),
    ("carry forward reason", "carry_forward_reason"),
    ("carryforwardreason", "carry_forward_reason"),
    ("criticality", "criticality"),
];

/// Expected (min, max) days to close, by criticality.
const CRITICALITY_TIMELINES: &[(&str, (i64, i64))] = &[
    ("critical", (10, 15)),
    ("high", (7, 10)),
    ("medium", (5, 7)),
    ("low", (3, 5)),
    ("very low", (1, 3)),
];

const NULL_TOKENS: &[&str] = &["", "nan", "-nan", "na", "n/a", "#n/a", "<na>", "null", "none"];

/// Trim, lowercase, treat `_` as a space and collapse whitespace.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Task column for a header, if it maps to one.
pub fn canonical_column(header: &str) -> Option<&'static str> {
    let key = normalize_header(header);
    if let Some((_, column)) = COLUMN_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some(column);
    }
    let snake = key.replace(' ', "_");
    IMPORT_COLUMNS
        .iter()
        .find(|(name, _)| *name == snake)
        .map(|(name, _)| *name)
}

pub fn expected_timeline(criticality: &str) -> Option<(i64, i64)> {
    let key = criticality.trim().to_lowercase();
    CRITICALITY_TIMELINES
        .iter()
        .find(|(level, _)| *level == key)
        .map(|(_, range)| *range)
}

fn column_kind(column: &str) -> Kind {
    IMPORT_COLUMNS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, kind)| *kind)
        .unwrap_or(Kind::Text)
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn text_cell(raw: &str) -> Cell {
    if NULL_TOKENS.contains(&raw.trim().to_lowercase().as_str()) {
        Cell::Empty
    } else {
        Cell::Text(raw.to_string())
    }
}

impl Cell {
    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(render_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// Lenient date parsing; anything unrecognised is `None`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %I:%M %p",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let two_digit_year = s
        .rsplit('/')
        .next()
        .is_some_and(|y| y.len() == 2 && s.matches('/').count() == 2);
    let formats: &[&str] = if two_digit_year {
        &["%m/%d/%y"]
    } else {
        &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%b %d, %Y", "%d %b %Y"]
    };
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // "2024-03-01 extra" and similar: retry on the first token.
    match s.split_whitespace().next() {
        Some(first) if first != s => parse_date_str(first),
        _ => None,
    }
}

fn coerce(cell: &Cell, kind: Kind) -> Value {
    match kind {
        Kind::Text => cell.as_text().map(Value::Text).unwrap_or(Value::Null),
        Kind::Date => parse_date(cell)
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        Kind::Integer => cell
            .as_f64()
            .map(|n| Value::Integer(n.round() as i64))
            .unwrap_or(Value::Null),
        Kind::Real => cell.as_f64().map(Value::Real).unwrap_or(Value::Null),
    }
}

// Parsers

fn parse_csv(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed CSV row")?;
        rows.push(record.iter().map(text_cell).collect());
    }
    Ok(RawTable { headers, rows })
}

fn json_cell(value: &Json) -> Cell {
    match value {
        Json::Null => Cell::Empty,
        Json::Bool(b) => Cell::Bool(*b),
        Json::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        Json::String(s) => text_cell(s),
        other => Cell::Text(other.to_string()),
    }
}

/// Accepts an array of records, or an object of columns (each an array or
/// an index → value object).
fn parse_json(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let value: Json = serde_json::from_slice(bytes).context("invalid JSON")?;
    let mut table = RawTable::default();

    match value {
        Json::Array(records) => {
            for record in &records {
                let Json::Object(map) = record else {
                    return Err(anyhow!("expected an array of objects"));
                };
                for key in map.keys() {
                    if !table.headers.contains(key) {
                        table.headers.push(key.clone());
                    }
                }
            }
            for record in &records {
                let row = table
                    .headers
                    .iter()
                    .map(|h| record.get(h).map(json_cell).unwrap_or(Cell::Empty))
                    .collect();
                table.rows.push(row);
            }
        }
        Json::Object(columns) => {
            let mut cells: Vec<Vec<Cell>> = Vec::new();
            for (header, column) in &columns {
                let values: Vec<Cell> = match column {
                    Json::Array(items) => items.iter().map(json_cell).collect(),
                    Json::Object(by_index) => {
                        let mut entries: Vec<(&String, &Json)> = by_index.iter().collect();
                        entries.sort_by_key(|(k, _)| k.parse::<usize>().unwrap_or(usize::MAX));
                        entries.into_iter().map(|(_, v)| json_cell(v)).collect()
                    }
                    scalar => vec![json_cell(scalar)],
                };
                table.headers.push(header.clone());
                cells.push(values);
            }
            let len = cells.iter().map(Vec::len).max().unwrap_or(0);
            for i in 0..len {
                table.rows.push(
                    cells
                        .iter()
                        .map(|col| col.get(i).cloned().unwrap_or(Cell::Empty))
                        .collect(),
                );
            }
        }
        _ => return Err(anyhow!("expected a JSON array or object")),
    }
    Ok(table)
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => text_cell(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
    }
}

/// First worksheet; the first row is the header.
fn parse_excel(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("failed to open workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .context("failed to read first worksheet")?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|c| excel_cell(c).as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|row| row.iter().map(excel_cell).collect()).collect();
    Ok(RawTable { headers, rows })
}

/// Parse an upload by its file extension.
pub fn parse_file(bytes: &[u8], filename: &str) -> ServiceResult<RawTable> {
    let format = FileFormat::from_filename(filename)
        .ok_or_else(|| ServiceError::invalid("Only CSV, JSON, or Excel supported"))?;
    let parsed = match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Json => parse_json(bytes),
        FileFormat::Excel => parse_excel(bytes),
    };
    parsed.map_err(|err| ServiceError::invalid(format!("Could not parse {filename}: {err:#}")))
}

/// Turn a parsed table into upsert records, deriving timeline fields.
pub fn prepare_records(table: &RawTable) -> ServiceResult<Vec<ImportedTask>> {
    // (column, index in row); first header wins when two map to the same column.
    let mut mapped: Vec<(&'static str, usize)> = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        match canonical_column(header) {
            Some(column) if !mapped.iter().any(|(c, _)| *c == column) => {
                mapped.push((column, idx));
            }
            Some(column) => debug!(header = %header, column, "ignoring duplicate column"),
            None => debug!(header = %header, "ignoring unmapped column"),
        }
    }

    let Some(&(_, task_id_idx)) = mapped.iter().find(|(c, _)| *c == "task_id") else {
        return Err(ServiceError::invalid(
            "Input data must include TaskID or equivalent column.",
        ));
    };
    let cell_at = |row: &[Cell], idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);
    let find = |column: &str| mapped.iter().find(|(c, _)| *c == column).map(|(_, i)| *i);

    let mut records = Vec::new();
    for (line, row) in table.rows.iter().enumerate() {
        let task_id = cell_at(row, task_id_idx)
            .as_text()
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if task_id.is_empty() || task_id.eq_ignore_ascii_case("nan") {
            warn!(row = line + 1, "skipping import row without a task id");
            continue;
        }

        let mut fields = Vec::new();
        for &(column, idx) in &mapped {
            if column == "task_id" || column == "cycle_time" {
                continue;
            }
            fields.push((column, coerce(&cell_at(row, idx), column_kind(column))));
        }

        let date = |column: &str| find(column).and_then(|i| parse_date(&cell_at(row, i)));
        let cycle_time = find("cycle_time")
            .and_then(|i| cell_at(row, i).as_f64())
            .or_else(|| match (date("activated_date"), date("closed_date")) {
                (Some(activated), Some(closed)) => Some((closed - activated).num_days() as f64),
                _ => None,
            });
        let timeline = find("criticality")
            .and_then(|i| cell_at(row, i).as_text())
            .and_then(|c| expected_timeline(&c));
        let delayed = match (cycle_time, timeline) {
            (Some(cycle), Some((_, max))) => cycle > max as f64,
            _ => false,
        };

        fields.push(("cycle_time", cycle_time.map(Value::Real).unwrap_or(Value::Null)));
        fields.push((
            "expected_timeline_min",
            timeline.map(|(min, _)| Value::Integer(min)).unwrap_or(Value::Null),
        ));
        fields.push((
            "expected_timeline_max",
            timeline.map(|(_, max)| Value::Integer(max)).unwrap_or(Value::Null),
        ));
        fields.push(("delayed", Value::Integer(i64::from(delayed))));

        records.push(ImportedTask { task_id, fields });
    }
    Ok(records)
}

/// Parse and upsert an uploaded file. Returns the number of rows ingested.
pub fn import_bytes(db: &Database, bytes: &[u8], filename: &str) -> ServiceResult<usize> {
    let table = parse_file(bytes, filename)?;
    let records = prepare_records(&table)?;
    let ingested = db.upsert_imported_tasks(&records)?;
    info!(filename, rows = table.rows.len(), ingested, "import finished");
    Ok(ingested)
}

pub fn import_file(db: &Database, path: &Path) -> ServiceResult<usize> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    import_bytes(db, &bytes, &filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn headers_normalize_through_aliases() {
        assert_eq!(normalize_header("  Assigned_To  "), "assigned to");
        assert_eq!(canonical_column("Work Item ID"), Some("task_id"));
        assert_eq!(canonical_column("TaskID"), Some("task_id"));
        assert_eq!(canonical_column("CurrentUpdate"), Some("current_update"));
        assert_eq!(canonical_column("Sub-State"), Some("sub_state"));
        assert_eq!(canonical_column("story_points"), Some("story_points"));
        assert_eq!(canonical_column("Reviewer"), None);
    }

    #[test]
    fn dates_parse_leniently() {
        let cell = |s: &str| Cell::Text(s.to_string());
        assert_eq!(parse_date(&cell("2024-03-05")), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(&cell("3/5/2024")), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(&cell("3/5/24")), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(&cell("3/5/2024 10:15:00 AM")), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(&cell("2024-03-05T08:00:00Z")), Some(date(2024, 3, 5)));
        assert_eq!(parse_date(&cell("next tuesday")), None);
        assert_eq!(parse_date(&Cell::Number(45000.0)), None);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_file(b"irrelevant", "tasks.txt").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "Only CSV, JSON, or Excel supported"));
    }

    #[test]
    fn missing_task_id_column_is_rejected() {
        let table = parse_file(b"Title,State\nA,New\n", "tasks.csv").unwrap();
        let err = prepare_records(&table).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m.contains("TaskID")));
    }

    fn field<'a>(record: &'a ImportedTask, column: &str) -> &'a Value {
        &record.fields.iter().find(|(c, _)| *c == column).unwrap().1
    }

    #[test]
    fn high_criticality_sets_timeline_and_delay() {
        let csv = "ID,Title,Criticality,Activated Date,Closed Date\n\
                   1,On time,High,2024-01-01,2024-01-11\n\
                   2,Late,High,2024-01-01,2024-01-12\n\
                   ,No id,High,,\n";
        let table = parse_file(csv.as_bytes(), "dump.csv").unwrap();
        let records = prepare_records(&table).unwrap();
        assert_eq!(records.len(), 2);

        let on_time = &records[0];
        assert_eq!(on_time.task_id, "1");
        assert_eq!(field(on_time, "expected_timeline_min"), &Value::Integer(7));
        assert_eq!(field(on_time, "expected_timeline_max"), &Value::Integer(10));
        assert_eq!(field(on_time, "cycle_time"), &Value::Real(10.0));
        assert_eq!(field(on_time, "delayed"), &Value::Integer(0));

        let late = &records[1];
        assert_eq!(field(late, "cycle_time"), &Value::Real(11.0));
        assert_eq!(field(late, "delayed"), &Value::Integer(1));
    }

    #[test]
    fn explicit_cycle_time_wins() {
        let csv = "TaskID,Cycle Time,Activated Date,Closed Date,Criticality\n\
                   T-1,2,2024-01-01,2024-01-30,low\n\
                   T-2,nan,2024-01-01,2024-01-03,unknown\n";
        let table = parse_file(csv.as_bytes(), "dump.csv").unwrap();
        let records = prepare_records(&table).unwrap();
        assert_eq!(field(&records[0], "cycle_time"), &Value::Real(2.0));
        assert_eq!(field(&records[0], "delayed"), &Value::Integer(0));
        assert_eq!(field(&records[1], "cycle_time"), &Value::Real(2.0));
        assert_eq!(field(&records[1], "expected_timeline_max"), &Value::Null);
    }

    #[test]
    fn json_records_and_columns_are_accepted() {
        let records = br#"[{"TaskID": 42, "Title": "A"}, {"TaskID": "X-1", "State": "Active"}]"#;
        let table = parse_file(records, "dump.json").unwrap();
        assert_eq!(table.headers, vec!["TaskID", "Title", "State"]);
        let prepared = prepare_records(&table).unwrap();
        assert_eq!(prepared[0].task_id, "42");
        assert_eq!(field(&prepared[1], "title"), &Value::Null);

        let columns = br#"{"TaskID": {"0": "A-1", "1": "A-2"}, "Title": {"0": "x", "1": "y"}}"#;
        let table = parse_file(columns, "dump.json").unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn excel_first_sheet_is_read() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Work Item ID").unwrap();
        sheet.write_string(0, 1, "Priority").unwrap();
        sheet.write_number(1, 0, 17.0).unwrap();
        sheet.write_number(1, 1, 2.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = parse_file(&bytes, "dump.xlsx").unwrap();
        let records = prepare_records(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_id, "17");
        assert_eq!(field(&records[0], "priority"), &Value::Integer(2));
    }

    #[test]
    fn import_upserts_in_one_pass() {
        let db = Database::open_memory().unwrap();
        let first = "ID,Title,State\nT-1,First,New\nT-2,Second,New\n";
        assert_eq!(import_bytes(&db, first.as_bytes(), "a.csv").unwrap(), 2);

        let second = "ID,State\nT-1,Closed\n";
        assert_eq!(import_bytes(&db, second.as_bytes(), "b.csv").unwrap(), 1);

        let t1 = db.get_task_by_task_id("T-1").unwrap().unwrap();
        assert_eq!(t1.state.as_deref(), Some("Closed"));
        assert_eq!(t1.title.as_deref(), Some("First"));
        assert_eq!(db.list_tasks().unwrap().len(), 2);
    }

    #[test]
    fn import_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("backlog.json");
        std::fs::write(&path, r#"[{"Work Item ID": "W-1", "Story Points": "5"}]"#).unwrap();

        let db = Database::open_memory().unwrap();
        assert_eq!(import_file(&db, &path).unwrap(), 1);
        let task = db.get_task_by_task_id("W-1").unwrap().unwrap();
        assert_eq!(task.story_points, Some(5.0));

        let missing = import_file(&db, &dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(ServiceError::Storage(_))));
    }
}
