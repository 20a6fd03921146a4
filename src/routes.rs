use crate::{
    api::{self, attendance, corrections, roster},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.clamp(1, 60_000);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(60_000 / requests_per_min as u64)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst are clamped to non-zero values");
        Governor::new(&cfg)
    }

    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));
    let write_limiter = Arc::new(build_limiter(config.rate_write_per_min));

    cfg.service(web::resource("/health").route(web::get().to(api::health)));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance/today
                    .service(
                        web::resource("/today")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::today)),
                    )
                    // /attendance/current
                    .service(
                        web::resource("/current")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::current)),
                    )
                    // /attendance/timeline
                    .service(
                        web::resource("/timeline")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::timeline)),
                    )
                    // /attendance/checkin
                    .service(
                        web::resource("/checkin")
                            .wrap(write_limiter.clone())
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/checkout
                    .service(
                        web::resource("/checkout")
                            .wrap(write_limiter)
                            .route(web::post().to(attendance::check_out)),
                    ),
            )
            .service(
                web::resource("/corrections")
                    .wrap(read_limiter.clone())
                    .route(web::get().to(corrections::list_corrections)),
            )
            .service(
                web::scope("/roster")
                    .wrap(read_limiter)
                    // /roster
                    .service(web::resource("").route(web::get().to(roster::list_students)))
                    // /roster/board
                    .service(web::resource("/board").route(web::get().to(roster::board))),
            ),
    );
}
