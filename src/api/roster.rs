use actix_web::{HttpResponse, Responder, web};

use crate::model::attendance::Action;
use crate::models::BoardQuery;
use crate::service::Tracker;

/// All students on the roster
#[utoipa::path(
    get,
    path = "/api/roster",
    responses(
        (status = 200, description = "Roster", body = crate::models::RosterResponse),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Roster"
)]
#[tracing::instrument(skip(tracker))]
pub async fn list_students(tracker: web::Data<Tracker>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(tracker.roster().await?))
}

/// Check-in or check-out board for the current period
#[utoipa::path(
    get,
    path = "/api/roster/board",
    params(BoardQuery),
    responses(
        (status = 200, description = "Roster marked with who is already recorded", body = crate::models::Board),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Roster"
)]
#[tracing::instrument(skip(tracker))]
pub async fn board(
    tracker: web::Data<Tracker>,
    query: web::Query<BoardQuery>,
) -> actix_web::Result<impl Responder> {
    let log = query.action.unwrap_or(Action::Checkin);
    Ok(HttpResponse::Ok().json(tracker.board(log).await?))
}
