use crate::error::{AppError, AppResult};
use crate::external::{IdentityProvider, VerifiedIdentity};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

/// Header naming the caller while identity verification is switched off.
pub const DEV_EMAIL_HEADER: &str = "X-Dev-Email";

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/health",
                "/consultants",
                "/auth/send-otp",
                "/auth/verify-otp",
            ],
            // admin routes check their own key
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/consultants/", "/admin/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Resolves the caller through the identity provider and stores the
/// [`VerifiedIdentity`] in the request extensions.
pub struct IdentityMiddleware {
    provider: IdentityProvider,
}

impl IdentityMiddleware {
    pub fn new(provider: IdentityProvider) -> Self {
        Self { provider }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            provider: self.provider.clone(),
            public_paths: Rc::new(PublicPaths::new()),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    provider: IdentityProvider,
    public_paths: Rc<PublicPaths>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = header_str(&req, "Authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        let dev_email = header_str(&req, DEV_EMAIL_HEADER).map(str::to_string);

        let service = Rc::clone(&self.service);
        let provider = self.provider.clone();

        Box::pin(async move {
            let identity = provider
                .authenticate(token.as_deref(), dev_email.as_deref())
                .await?;
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

fn header_str<'a>(req: &'a ServiceRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Identity attached by [`IdentityMiddleware`].
pub fn current_identity(req: &HttpRequest) -> AppResult<VerifiedIdentity> {
    req.extensions()
        .get::<VerifiedIdentity>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Unauthorized: No token provided".to_string()))
}
