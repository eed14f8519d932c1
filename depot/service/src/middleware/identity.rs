use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use depot_core::identity::{IdentityService, RequestCredentials, Resolution};
use futures_util::future::{LocalBoxFuture, Ready, ok};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Resolves the request principal once per request (Bearer, then X-API-Key,
/// then the `api_key` query parameter) and parks the outcome in the request
/// extensions for the auth extractors.
pub struct DepotIdentity {
    identity: Arc<IdentityService>,
}

impl DepotIdentity {
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }
}

impl<S, B> Transform<S, ServiceRequest> for DepotIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = DepotIdentityMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(DepotIdentityMiddleware {
            service: Rc::new(service),
            identity: self.identity.clone(),
        })
    }
}

pub struct DepotIdentityMiddleware<S> {
    service: Rc<S>,
    identity: Arc<IdentityService>,
}

impl<S, B> Service<ServiceRequest> for DepotIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let identity = self.identity.clone();
        let creds = credentials_from(&req);

        Box::pin(async move {
            let resolution = identity.resolve(&creds).await;
            req.extensions_mut().insert(Rc::new(resolution));
            service.call(req).await
        })
    }
}

fn credentials_from(req: &ServiceRequest) -> RequestCredentials {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let api_key_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    // Package managers that cannot set headers pass `api_key=` instead.
    let api_key_query = req.query_string().split('&').find_map(|pair| {
        pair.strip_prefix("api_key=")
            .map(|value| value.to_string())
            .filter(|value| !value.is_empty())
    });

    RequestCredentials {
        bearer,
        api_key_header,
        api_key_query,
    }
}

/// Shared extension payload type.
pub type AuthResolution = Rc<Resolution>;
