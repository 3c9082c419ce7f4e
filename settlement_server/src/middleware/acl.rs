//! Access control list middleware.
//! This middleware can be placed on any route or service.
//!
//! It reads the caller identity from the request headers (see [`crate::auth`]) and checks it against the roles
//! required by the route. If the identity is valid and the caller holds every required role, the [`Caller`] is stored
//! in the request extensions and the request continues. Otherwise the request is refused with a 401 or 403.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    auth::{Caller, Role},
    config::IdentityConfig,
    errors::ServerError,
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) }))
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let identity = req.app_data::<web::Data<IdentityConfig>>().map(|d| d.get_ref());
            let caller = Caller::from_headers(req.headers(), identity).map_err(|e| {
                debug!("🔐️ Request to {} refused. {e}", req.path());
                ServerError::from(e)
            })?;
            caller.require(&required_roles).map_err(|e| {
                info!("🔐️ {} may not call {}. {e}", caller.user_id, req.path());
                ServerError::from(e)
            })?;
            trace!("🔐️ {} authorised for {}", caller.user_id, req.path());
            req.extensions_mut().insert(caller);
            service.call(req).await
        })
    }
}
