//! Excel export of the task table.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::db::Database;
use crate::error::ServiceResult;
use crate::models::Task;

pub const EXPORT_FILENAME: &str = "scrum_report.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 19] = [
    "TaskID",
    "Type",
    "Title",
    "AssignedTo",
    "State",
    "Priority",
    "StoryPoints",
    "Sprint",
    "Sub-State",
    "Iteration Path",
    "Activated Date",
    "Target Date",
    "Cycle Time",
    "Current Status",
    "CurrentUpdate",
    "RiskItem",
    "CarryForwardReason",
    "Criticality",
    "Delayed",
];

fn write_opt_str(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
) -> Result<(), XlsxError> {
    if let Some(value) = value {
        sheet.write_string(row, col, value)?;
    }
    Ok(())
}

fn write_opt_num(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> Result<(), XlsxError> {
    if let Some(value) = value {
        sheet.write_number(row, col, value)?;
    }
    Ok(())
}

fn write_task(sheet: &mut Worksheet, row: u32, task: &Task) -> Result<(), XlsxError> {
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());

    sheet.write_string(row, 0, &task.task_id)?;
    write_opt_str(sheet, row, 1, task.work_item_type.as_deref())?;
    write_opt_str(sheet, row, 2, task.title.as_deref())?;
    write_opt_str(sheet, row, 3, task.assigned_to.as_deref())?;
    write_opt_str(sheet, row, 4, task.state.as_deref())?;
    write_opt_num(sheet, row, 5, task.priority.map(|p| p as f64))?;
    write_opt_num(sheet, row, 6, task.story_points)?;
    write_opt_str(sheet, row, 7, task.sprint.as_deref())?;
    write_opt_str(sheet, row, 8, task.sub_state.as_deref())?;
    write_opt_str(sheet, row, 9, task.iteration_path.as_deref())?;
    write_opt_str(sheet, row, 10, date(task.activated_date).as_deref())?;
    write_opt_str(sheet, row, 11, date(task.target_date).as_deref())?;
    write_opt_num(sheet, row, 12, task.cycle_time)?;
    write_opt_str(sheet, row, 13, task.current_status.as_deref())?;
    write_opt_str(sheet, row, 14, task.current_update.as_deref())?;
    write_opt_str(sheet, row, 15, task.risk_item.as_deref())?;
    write_opt_str(sheet, row, 16, task.carry_forward_reason.as_deref())?;
    write_opt_str(sheet, row, 17, task.criticality.as_deref())?;
    sheet.write_boolean(row, 18, task.delayed)?;
    Ok(())
}

/// Render tasks as a single-sheet workbook.
pub fn tasks_to_xlsx(tasks: &[Task]) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (idx, task) in tasks.iter().enumerate() {
        write_task(sheet, idx as u32 + 1, task)?;
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn export_tasks(db: &Database) -> ServiceResult<Vec<u8>> {
    let tasks = db.list_tasks()?;
    let bytes = tasks_to_xlsx(&tasks)?;
    info!(tasks = tasks.len(), bytes = bytes.len(), "exported tasks to xlsx");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateWorkItemInput;
    use crate::services::ingestion::{parse_file, Cell};

    #[test]
    fn export_reads_back_with_import_headers() {
        let db = Database::open_memory().unwrap();
        db.create_work_item(
            "TASK-1",
            CreateWorkItemInput {
                title: "Write docs".into(),
                assigned_to: Some("ada".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let bytes = export_tasks(&db).unwrap();
        let table = parse_file(&bytes, EXPORT_FILENAME).unwrap();
        assert_eq!(table.headers.len(), HEADERS.len());
        assert_eq!(table.headers[0], "TaskID");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Text("TASK-1".into()));
        assert_eq!(table.rows[0][18], Cell::Bool(false));
    }
}
