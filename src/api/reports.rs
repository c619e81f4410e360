use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::ApiResult;
use crate::services::reports;
use crate::Database;

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub report_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeeklyQuery {
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub month_start: Option<NaiveDate>,
}

pub async fn daily(
    State(db): State<Database>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(reports::get_daily_report(&db, query.report_date)?))
}

pub async fn weekly(
    State(db): State<Database>,
    Query(query): Query<WeeklyQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(reports::get_weekly_report(&db, query.week_start)?))
}

pub async fn monthly(
    State(db): State<Database>,
    Query(query): Query<MonthlyQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(reports::get_monthly_report(&db, query.month_start)?))
}
