//! Admin key middleware.
//!
//! Wrap the `/api` scope (or any single route) with [`AdminKeyMiddlewareFactory`]. Requests must carry the configured
//! admin key in the `sf_admin_key` header. Requests without it, or with the wrong value, get a 403 response. If no
//! admin key is configured at all, every request is rejected.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ok, Ready};
use log::*;
use sf_common::Secret;

use crate::errors::ServerError;

pub const ADMIN_KEY_HEADER: &str = "sf_admin_key";

pub struct AdminKeyMiddlewareFactory {
    admin_key: Secret<String>,
}

impl AdminKeyMiddlewareFactory {
    pub fn new(admin_key: Secret<String>) -> Self {
        Self { admin_key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminKeyMiddlewareService { admin_key: self.admin_key.clone(), service: Rc::new(service) })
    }
}

pub struct AdminKeyMiddlewareService<S> {
    admin_key: Secret<String>,
    service: Rc<S>,
}

impl<S> AdminKeyMiddlewareService<S> {
    fn check(&self, req: &ServiceRequest) -> Result<(), ServerError> {
        if self.admin_key.is_unset() {
            warn!("🔐️ Admin request to {} rejected. No admin key is configured.", req.path());
            return Err(ServerError::InsufficientPermissions("The admin API is disabled".into()));
        }
        let supplied = req.headers().get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());
        match supplied {
            Some(key) if key == self.admin_key.reveal() => Ok(()),
            Some(_) => {
                warn!("🔐️ Admin request to {} rejected. The admin key is wrong.", req.path());
                Err(ServerError::InsufficientPermissions("Invalid admin key".into()))
            },
            None => {
                debug!("🔐️ Admin request to {} rejected. No {ADMIN_KEY_HEADER} header.", req.path());
                Err(ServerError::InsufficientPermissions(format!("The {ADMIN_KEY_HEADER} header is required")))
            },
        }
    }
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let checked = self.check(&req);
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            checked?;
            service.call(req).await
        })
    }
}
