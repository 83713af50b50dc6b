//! Observability wrapper (spec.md §4.10, C10): the outermost middleware,
//! per §4.9's "metrics wrapper → rate limit → auth → handler" ordering. Tags
//! `requests_total`/`request_duration_seconds` by route and status, the way
//! the teacher's `server::metrics::MetricsWrapper` tags Sync calls by
//! endpoint — adapted from StatsD (`cadence`) counters/timers to the
//! `metrics` crate's counter/histogram macros (see DESIGN.md for the stack
//! swap).

use std::time::Instant;

use actix_web::{
    body::MessageBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::LocalBoxFuture;
use sortbench_common::metrics::names;

#[derive(Clone, Default)]
pub struct MetricsWrapper;

impl<S, B> Transform<S, ServiceRequest> for MetricsWrapper
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = MetricsMiddleware<S>;
    type InitError = ();
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(MetricsMiddleware { service }))
    }
}

pub struct MetricsMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let route = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_owned());
        let start = Instant::now();
        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let elapsed = start.elapsed().as_secs_f64();

            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(e) => e.as_response_error().status_code().as_u16(),
            };

            metrics::counter!(names::REQUESTS_TOTAL, "route" => route.clone(), "status" => status.to_string())
                .increment(1);
            metrics::histogram!(names::REQUEST_DURATION_SECONDS, "route" => route).record(elapsed);

            result
        })
    }
}
