use actix_web::{HttpResponse, Responder, web};

use crate::models::RangeQuery;
use crate::service::Tracker;

/// Staff corrections, one row per named student, sorted by date, student, session and time
#[utoipa::path(
    get,
    path = "/api/corrections",
    params(RangeQuery),
    responses(
        (status = 200, description = "Normalized corrections", body = crate::models::CorrectionsResponse),
        (status = 400, description = "date_end before date_start"),
        (status = 422, description = "A Date or Time cell could not be parsed", body = Object, example = json!({
            "error": { "code": "parse_error", "message": "could not parse sheet data: invalid date 'someday'" }
        })),
        (status = 502, description = "Sheet store unavailable")
    ),
    tag = "Corrections"
)]
#[tracing::instrument(skip(tracker))]
pub async fn list_corrections(
    tracker: web::Data<Tracker>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(tracker.corrections(&query).await?))
}
