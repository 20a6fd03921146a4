use actix_web::{HttpResponse, Responder, web};

use crate::model::attendance::Action;
use crate::models::{DayQuery, RangeQuery, SubmitRequest};
use crate::service::Tracker;

/// Deduplicated check-ins/check-outs and who is present for one date and period
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    params(DayQuery),
    responses(
        (status = 200, description = "Summary for the date and period", body = crate::models::TodaySummary),
        (status = 422, description = "A log row could not be parsed"),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Attendance"
)]
#[tracing::instrument(skip(tracker))]
pub async fn today(
    tracker: web::Data<Tracker>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    let summary = tracker.today(query.date, query.period).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Today's morning and afternoon check-ins and the students present right now
#[utoipa::path(
    get,
    path = "/api/attendance/current",
    responses(
        (status = 200, description = "Current attendance", body = crate::models::CurrentView),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Attendance"
)]
#[tracing::instrument(skip(tracker))]
pub async fn current(tracker: web::Data<Tracker>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(tracker.current().await?))
}

/// Merged check-in/check-out history over a date range
#[utoipa::path(
    get,
    path = "/api/attendance/timeline",
    params(RangeQuery),
    responses(
        (status = 200, description = "History ordered by last name, first name, date, time", body = crate::models::TimelineResponse),
        (status = 400, description = "date_end before date_start", body = Object, example = json!({
            "error": { "code": "invalid_range", "message": "date_end 2024-09-01 is before date_start 2024-09-05" }
        })),
        (status = 422, description = "A log row could not be parsed"),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Attendance"
)]
#[tracing::instrument(skip(tracker))]
pub async fn timeline(
    tracker: web::Data<Tracker>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(tracker.timeline(&query).await?))
}

/// Check in students for the current period
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body(
        content = SubmitRequest,
        description = "Students to check in",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Rows written and students skipped", body = crate::models::SubmitResult),
        (status = 404, description = "A name is not on the roster", body = Object, example = json!({
            "error": { "code": "unknown_student", "message": "student not on roster: Nobody Here" }
        })),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Attendance"
)]
#[tracing::instrument(skip(tracker))]
pub async fn check_in(
    tracker: web::Data<Tracker>,
    payload: web::Json<SubmitRequest>,
) -> actix_web::Result<impl Responder> {
    submit(&tracker, Action::Checkin, payload.into_inner()).await
}

/// Check out students for the current period
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    request_body(
        content = SubmitRequest,
        description = "Students to check out",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Rows written and students skipped", body = crate::models::SubmitResult),
        (status = 404, description = "A name is not on the roster"),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Attendance"
)]
#[tracing::instrument(skip(tracker))]
pub async fn check_out(
    tracker: web::Data<Tracker>,
    payload: web::Json<SubmitRequest>,
) -> actix_web::Result<impl Responder> {
    submit(&tracker, Action::Checkout, payload.into_inner()).await
}

async fn submit(
    tracker: &Tracker,
    log: Action,
    payload: SubmitRequest,
) -> actix_web::Result<HttpResponse> {
    let result = tracker
        .submit(log, &payload.students, payload.override_time)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}
