//! Daily, weekly and monthly summaries over the task table.
//!
//! Every report loads all tasks once and then groups in memory. The
//! `build_*` functions are pure so they can be tested without a database.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::db::Database;
use crate::error::ServiceResult;
use crate::models::Task;

const UNASSIGNED: &str = "Unassigned";
const UNKNOWN_STATE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRef {
    pub task_id: String,
    pub title: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskEntry {
    pub task_id: String,
    pub risk_item: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceRow {
    pub assigned_to: String,
    pub total: usize,
    /// Tasks whose `update_date` is the report day.
    pub updated: usize,
    /// Tasks with any `current_update` text.
    pub has_update: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub status_distribution: BTreeMap<String, usize>,
    pub activated_today: Vec<TaskRef>,
    pub closed_today: Vec<TaskRef>,
    pub risks_last_24h: Vec<RiskEntry>,
    pub compliance: Vec<ComplianceRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Velocity {
    pub committed: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceCycleTime {
    pub assigned_to: Option<String>,
    pub cycle_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    pub carry_forward_reason: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskCount {
    pub iteration_path: String,
    pub risk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine1 {
    pub task_id: String,
    pub title: Option<String>,
    pub assigned_to: Option<String>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
    pub iteration_path: Option<String>,
    pub activated_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub cycle_time: Option<f64>,
    pub current_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine2 {
    pub weekly_update: Option<String>,
    pub risk_item: Option<String>,
    pub carry_forward_reason: Option<String>,
    /// `"Delayed"` or `"On-Time"`.
    pub timeline_compliance: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub line1: SummaryLine1,
    pub line2: SummaryLine2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub velocity: Velocity,
    pub cycle_time_by_resource: Vec<ResourceCycleTime>,
    pub carry_forward_reasons: Vec<ReasonCount>,
    pub risk_heatmap: Vec<RiskCount>,
    pub task_summaries: Vec<TaskSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleTimePoint {
    pub activated_date: Option<NaiveDate>,
    pub cycle_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayPoint {
    pub task_id: String,
    pub delayed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDelta {
    pub task_id: String,
    /// `release_date - committed_date` in days.
    pub release_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineDelta {
    pub task_id: String,
    /// `closed_date - target_date` in days; positive means late.
    pub delta_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePerformance {
    pub assigned_to: String,
    pub avg_cycle_time: Option<f64>,
    pub completed: usize,
    pub delayed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub cycle_time_trend: Vec<CycleTimePoint>,
    pub velocity_trend: Velocity,
    pub delay_trend: Vec<DelayPoint>,
    pub risk_register: Vec<RiskCount>,
    pub carry_forward_trend: Vec<ReasonCount>,
    pub release_reliability: Vec<ReleaseDelta>,
    pub team_performance: Vec<ResourcePerformance>,
    pub completion_rate: f64,
    pub timeline_accuracy: Vec<TimelineDelta>,
}

// Grouping helpers

/// Sort key that puts unassigned tasks after every named assignee.
fn assignee_key(task: &Task) -> (bool, String) {
    match &task.assigned_to {
        Some(name) => (false, name.clone()),
        None => (true, String::new()),
    }
}

fn assignee_label((unassigned, name): (bool, String)) -> String {
    if unassigned {
        UNASSIGNED.to_string()
    } else {
        name
    }
}

fn task_ref(task: &Task) -> TaskRef {
    TaskRef {
        task_id: task.task_id.clone(),
        title: task.title.clone(),
        assigned_to: task.assigned_to.clone(),
    }
}

fn on_or_after(date: Option<NaiveDate>, start: NaiveDate) -> bool {
    date.is_some_and(|d| d >= start)
}

/// Tasks activated or closed on or after `start`. The period end only labels
/// the report; later activity is still counted.
fn since(tasks: &[Task], start: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| on_or_after(t.activated_date, start) || on_or_after(t.closed_date, start))
        .collect()
}

fn velocity(tasks: &[&Task]) -> Velocity {
    Velocity {
        committed: tasks.iter().filter(|t| t.committed_date.is_some()).count(),
        completed: tasks.iter().filter(|t| t.closed_date.is_some()).count(),
    }
}

fn carry_forward_reasons(tasks: &[&Task]) -> Vec<ReasonCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for reason in tasks.iter().filter_map(|t| t.carry_forward_reason.as_deref()) {
        *counts.entry(reason).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(reason, count)| ReasonCount {
            carry_forward_reason: reason.to_string(),
            count,
        })
        .collect()
}

/// Risk items per iteration path. Tasks without a path are not counted.
fn risk_frequency(tasks: &[&Task]) -> Vec<RiskCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.risk_item.is_some()) {
        if let Some(path) = task.iteration_path.as_deref() {
            *counts.entry(path).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(path, risk_count)| RiskCount {
            iteration_path: path.to_string(),
            risk_count,
        })
        .collect()
}

fn release_reliability(tasks: &[&Task]) -> Vec<ReleaseDelta> {
    tasks
        .iter()
        .filter_map(|t| match (t.release_date, t.committed_date) {
            (Some(release), Some(committed)) => Some(ReleaseDelta {
                task_id: t.task_id.clone(),
                release_delta: (release - committed).num_days(),
            }),
            _ => None,
        })
        .collect()
}

fn timeline_accuracy(tasks: &[&Task]) -> Vec<TimelineDelta> {
    tasks
        .iter()
        .filter_map(|t| match (t.closed_date, t.target_date) {
            (Some(closed), Some(target)) => Some(TimelineDelta {
                task_id: t.task_id.clone(),
                delta_days: (closed - target).num_days(),
            }),
            _ => None,
        })
        .collect()
}

/// Share of tasks with a closed date; 0 for an empty set.
fn completion_rate(tasks: &[&Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.closed_date.is_some()).count();
    completed as f64 / tasks.len() as f64
}

fn team_performance(tasks: &[&Task]) -> Vec<ResourcePerformance> {
    #[derive(Default)]
    struct Acc {
        cycle_sum: f64,
        cycle_n: usize,
        completed: usize,
        delayed: usize,
    }

    let mut groups: BTreeMap<(bool, String), Acc> = BTreeMap::new();
    for task in tasks {
        let acc = groups.entry(assignee_key(task)).or_default();
        if let Some(cycle) = task.cycle_time {
            acc.cycle_sum += cycle;
            acc.cycle_n += 1;
        }
        if task.closed_date.is_some() {
            acc.completed += 1;
        }
        if task.delayed {
            acc.delayed += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| ResourcePerformance {
            assigned_to: assignee_label(key),
            avg_cycle_time: (acc.cycle_n > 0).then(|| acc.cycle_sum / acc.cycle_n as f64),
            completed: acc.completed,
            delayed_count: acc.delayed,
        })
        .collect()
}

fn update_compliance(tasks: &[Task], day: NaiveDate) -> Vec<ComplianceRow> {
    let mut groups: BTreeMap<(bool, String), (usize, usize, usize)> = BTreeMap::new();
    for task in tasks {
        let entry = groups.entry(assignee_key(task)).or_default();
        entry.0 += 1;
        if task.update_date == Some(day) {
            entry.1 += 1;
        }
        if task.current_update.is_some() {
            entry.2 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(key, (total, updated, has_update))| ComplianceRow {
            assigned_to: assignee_label(key),
            total,
            updated,
            has_update,
        })
        .collect()
}

// Pure builders

pub fn build_daily_report(tasks: &[Task], day: NaiveDate) -> DailyReport {
    let mut status_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        let state = task.state.as_deref().unwrap_or(UNKNOWN_STATE).to_string();
        *status_distribution.entry(state).or_default() += 1;
    }

    DailyReport {
        date: day,
        status_distribution,
        activated_today: tasks
            .iter()
            .filter(|t| t.activated_date == Some(day))
            .map(task_ref)
            .collect(),
        closed_today: tasks
            .iter()
            .filter(|t| t.closed_date == Some(day))
            .map(task_ref)
            .collect(),
        risks_last_24h: tasks
            .iter()
            .filter_map(|t| {
                t.risk_item.as_ref().map(|risk| RiskEntry {
                    task_id: t.task_id.clone(),
                    risk_item: risk.clone(),
                })
            })
            .collect(),
        compliance: update_compliance(tasks, day),
    }
}

pub fn build_weekly_report(tasks: &[Task], week_start: NaiveDate) -> WeeklyReport {
    let week_end = week_start + Days::new(6);
    let in_week = since(tasks, week_start);

    let task_summaries = in_week
        .iter()
        .map(|t| TaskSummary {
            line1: SummaryLine1 {
                task_id: t.task_id.clone(),
                title: t.title.clone(),
                assigned_to: t.assigned_to.clone(),
                state: t.state.clone(),
                sub_state: t.sub_state.clone(),
                iteration_path: t.iteration_path.clone(),
                activated_date: t.activated_date,
                target_date: t.target_date,
                cycle_time: t.cycle_time,
                current_status: t.current_status.clone(),
            },
            line2: SummaryLine2 {
                weekly_update: t.current_update.clone(),
                risk_item: t.risk_item.clone(),
                carry_forward_reason: t.carry_forward_reason.clone(),
                timeline_compliance: if t.delayed { "Delayed" } else { "On-Time" },
            },
        })
        .collect();

    WeeklyReport {
        week_start,
        week_end,
        velocity: velocity(&in_week),
        cycle_time_by_resource: in_week
            .iter()
            .map(|t| ResourceCycleTime {
                assigned_to: t.assigned_to.clone(),
                cycle_time: t.cycle_time,
            })
            .collect(),
        carry_forward_reasons: carry_forward_reasons(&in_week),
        risk_heatmap: risk_frequency(&in_week),
        task_summaries,
    }
}

/// Last day of the month containing `date`.
fn end_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn build_monthly_report(tasks: &[Task], month_start: NaiveDate) -> MonthlyReport {
    let month_end = end_of_month(month_start);
    let in_month = since(tasks, month_start);

    MonthlyReport {
        month_start,
        month_end,
        cycle_time_trend: in_month
            .iter()
            .map(|t| CycleTimePoint {
                activated_date: t.activated_date,
                cycle_time: t.cycle_time,
            })
            .collect(),
        velocity_trend: velocity(&in_month),
        delay_trend: in_month
            .iter()
            .map(|t| DelayPoint {
                task_id: t.task_id.clone(),
                delayed: t.delayed,
            })
            .collect(),
        risk_register: risk_frequency(&in_month),
        carry_forward_trend: carry_forward_reasons(&in_month),
        release_reliability: release_reliability(&in_month),
        team_performance: team_performance(&in_month),
        completion_rate: completion_rate(&in_month),
        timeline_accuracy: timeline_accuracy(&in_month),
    }
}

// Service entry points

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn get_daily_report(db: &Database, report_date: Option<NaiveDate>) -> ServiceResult<DailyReport> {
    let day = report_date.unwrap_or_else(today);
    let tasks = db.list_tasks()?;
    debug!(%day, tasks = tasks.len(), "building daily report");
    Ok(build_daily_report(&tasks, day))
}

/// `week_start` defaults to Monday of the current week.
pub fn get_weekly_report(db: &Database, week_start: Option<NaiveDate>) -> ServiceResult<WeeklyReport> {
    let week_start = week_start.unwrap_or_else(|| {
        let today = today();
        today - Days::new(u64::from(today.weekday().num_days_from_monday()))
    });
    let tasks = db.list_tasks()?;
    debug!(%week_start, tasks = tasks.len(), "building weekly report");
    Ok(build_weekly_report(&tasks, week_start))
}

/// `month_start` defaults to the first day of the current month.
pub fn get_monthly_report(
    db: &Database,
    month_start: Option<NaiveDate>,
) -> ServiceResult<MonthlyReport> {
    let month_start = month_start.unwrap_or_else(|| {
        let today = today();
        today.with_day(1).unwrap_or(today)
    });
    let tasks = db.list_tasks()?;
    debug!(%month_start, tasks = tasks.len(), "building monthly report");
    Ok(build_monthly_report(&tasks, month_start))
}
