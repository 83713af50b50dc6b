//! Token-bucket rate limiter (spec.md §4.2, C2), grounded on the teacher's
//! `server::metrics::Metrics`/`CollectionCache`-style shape: a coarse lock
//! around the client→bucket map, a fine-grained lock per bucket so refills
//! don't serialize unrelated clients.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::LocalBoxFuture;

use crate::error::ApiError;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// One bucket per client identity; `capacity` tokens max, refilling at
/// `refill_per_minute` tokens/minute. Tokens are continuous — one token
/// costs one admitted request.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Arc<Mutex<Bucket>>>>,
    capacity: f64,
    refill_per_minute: f64,
}

pub enum Admission {
    Admitted,
    Refused { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(capacity: f64, refill_per_minute: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_per_minute,
        }
    }

    fn bucket_for(&self, client: &str) -> Arc<Mutex<Bucket>> {
        let mut buckets = self.buckets.lock().expect("rate limiter map lock poisoned");
        buckets
            .entry(client.to_owned())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Bucket {
                    tokens: self.capacity,
                    last_refill: Instant::now(),
                }))
            })
            .clone()
    }

    pub fn check(&self, client: &str) -> Admission {
        let bucket = self.bucket_for(client);
        let mut bucket = bucket.lock().expect("rate limit bucket lock poisoned");

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * (self.refill_per_minute / 60.0)).min(self.capacity);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Admission::Admitted
        } else {
            let deficit = 1.0 - bucket.tokens;
            let wait_secs = (deficit / (self.refill_per_minute / 60.0)).ceil().max(1.0);
            Admission::Refused {
                retry_after_secs: wait_secs as u64,
            }
        }
    }
}

/// Client identity: the parsed remote address, unless `trust_xff` is set,
/// in which case the first `X-Forwarded-For` entry is honored instead.
/// Never honoring forwarded headers by default prevents trivial spoofing
/// (spec.md §4.2).
pub fn client_identity(req: &ServiceRequest, trust_xff: bool) -> String {
    if trust_xff {
        if let Some(value) = req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').next() {
                let candidate = first.trim();
                if !candidate.is_empty() {
                    return candidate.to_owned();
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    trust_xff: bool,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>, trust_xff: bool) -> Self {
        Self { limiter, trust_xff }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RateLimitMiddleware {
            service,
            limiter: self.limiter.clone(),
            trust_xff: self.trust_xff,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: Arc<RateLimiter>,
    trust_xff: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = client_identity(&req, self.trust_xff);

        match self.limiter.check(&client) {
            Admission::Admitted => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Admission::Refused { retry_after_secs } => {
                let (http_req, _) = req.into_parts();
                let err: actix_web::Error = ApiError::rate_limited(retry_after_secs).into();
                let response = actix_web::HttpResponse::from_error(err).map_into_right_body();
                Box::pin(async move { Ok(ServiceResponse::new(http_req, response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity_then_refuses() {
        let limiter = RateLimiter::new(2.0, 60.0);
        assert!(matches!(limiter.check("a"), Admission::Admitted));
        assert!(matches!(limiter.check("a"), Admission::Admitted));
        assert!(matches!(limiter.check("a"), Admission::Refused { .. }));
    }

    #[test]
    fn buckets_are_independent_per_client() {
        let limiter = RateLimiter::new(1.0, 60.0);
        assert!(matches!(limiter.check("a"), Admission::Admitted));
        assert!(matches!(limiter.check("b"), Admission::Admitted));
    }

    #[test]
    fn refusal_carries_a_positive_retry_after() {
        let limiter = RateLimiter::new(1.0, 60.0);
        let _ = limiter.check("a");
        match limiter.check("a") {
            Admission::Refused { retry_after_secs } => assert!(retry_after_secs >= 1),
            Admission::Admitted => panic!("expected refusal"),
        }
    }
}
