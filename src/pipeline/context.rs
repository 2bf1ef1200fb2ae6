use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use std::collections::BTreeMap;
use std::future::{ready, Ready};

use crate::authentication::Identity;

/// A query parameter after pollution handling.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    /// Only produced for allow-listed keys.
    Many(Vec<String>),
}

/// Per-request state threaded through the pipeline stages.
///
/// Stored in the request extensions; each stage reads it, updates it and puts it back.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub cookies: BTreeMap<String, String>,
    /// Parsed JSON body, sanitized once the sanitization stage has run.
    pub body: Option<serde_json::Value>,
    pub query: BTreeMap<String, QueryValue>,
    pub identity: Option<Identity>,
}

impl RequestContext {
    /// Applies `f` to the context attached to `req`, creating an empty one if needed.
    pub fn update<R>(req: &ServiceRequest, f: impl FnOnce(&mut RequestContext) -> R) -> R {
        let mut extensions = req.extensions_mut();
        let mut context = extensions.remove::<RequestContext>().unwrap_or_default();
        let output = f(&mut context);
        extensions.insert(context);
        output
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Lets handlers take `RequestContext` as an argument.
impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<RequestContext, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let context = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(context))
    }
}
