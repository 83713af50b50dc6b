//! HTTP Router (spec.md §4.9, C9): route table and per-scope middleware.
//! Grounded on the teacher's `build_app!` macro (`src/server/mod.rs`),
//! narrowed to a `ServiceConfig`-returning closure — actix-web 4's
//! `.configure()` hook — so `sortbench-server`'s `HttpServer::new` closure
//! stays a thin composition of this plus the outermost metrics wrapper and
//! CORS (see DESIGN.md on that split).
//!
//! Middleware order, outer to inner, per spec.md §4.9: metrics wrapper (app
//! level, in `sortbench-server`) → rate limit → auth (protected routes only)
//! → handler. actix-web executes `.wrap()` calls in reverse registration
//! order, so a scope's rate limit is registered *after* its auth wrap.

use actix_web::web;
use sortbench_common::MAX_BODY_BYTES;

use crate::{auth::RequireApiKey, error::ApiError, handlers, ratelimit::RateLimit, state::AppState};

pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        let rate_limiter = state.rate_limiter.clone();
        let trust_xff = state.settings.trust_xff;
        let api_keys = state.api_keys.clone();

        cfg.app_data(state.clone());
        cfg.app_data(
            web::JsonConfig::default()
                .limit(MAX_BODY_BYTES)
                .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
        );

        cfg.route("/healthz", web::get().to(handlers::ops::healthz));
        cfg.route("/readyz", web::get().to(handlers::ops::readyz));
        cfg.route("/metrics", web::get().to(handlers::ops::metrics));
        cfg.route("/meta", web::get().to(handlers::meta::meta));
        cfg.route("/limits", web::get().to(handlers::ops::limits));

        cfg.service(
            web::scope("/run")
                .wrap(RateLimit::new(rate_limiter.clone(), trust_xff))
                .route("", web::post().to(handlers::run::run)),
        );

        cfg.service(
            web::scope("/jobs")
                .wrap(RequireApiKey::new(api_keys))
                .wrap(RateLimit::new(rate_limiter, trust_xff))
                .route("", web::post().to(handlers::jobs::submit))
                .route("/{id}", web::get().to(handlers::jobs::get))
                .route("/{id}/cancel", web::post().to(handlers::jobs::cancel)),
        );
    }
}
