use actix_web::{HttpResponse, Responder};

pub mod attendance;
pub mod corrections;
pub mod roster;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({ "status": "ok" }))
    ),
    tag = "Health"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};

    use super::testing::{self, request};
    use crate::routes;

    #[actix_web::test]
    async fn health_is_outside_the_prefix() {
        let (data, _clock) = testing::tracker_data(8, 0).await;
        let app = test::init_service(
            App::new()
                .app_data(data)
                .configure(|cfg| routes::configure(cfg, testing::config())),
        )
        .await;

        let resp = test::call_service(&app, request(test::TestRequest::get().uri("/health")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, request(test::TestRequest::get().uri("/api/health")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
