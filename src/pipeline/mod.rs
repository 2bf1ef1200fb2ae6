//! Request pipeline stages, outermost first:
//!
//! 1. [`security_headers`] hardening response headers
//! 2. access log (`tracing_actix_web::TracingLogger`, wired in `startup`)
//! 3. [`error_funnel`] JSON envelope for every error response below it
//! 4. [`credentials`] credentialed CORS for allow-listed origins
//! 5. [`cors_policy`] origin allow-list
//! 6. [`serve_static`] public directory, bypasses everything after it
//! 7. [`parse_cookie_header`]
//! 8. [`parse_json`] JSON bodies, size-capped
//! 9. [`sanitize`] operator-key stripping
//! 10. [`prevent_parameter_pollution`]
//!
//! actix applies `.wrap()` calls inside-out, so `startup` registers them in reverse.

mod context;
mod cookies;
mod cors;
mod credentials;
mod error_funnel;
mod json_body;
mod parameter_pollution;
mod query;
mod sanitize;
mod security_headers;
mod static_files;

pub use context::{QueryValue, RequestContext};
pub use cookies::{parse_cookie_header, parse_cookies};
pub use cors::cors_policy;
pub use credentials::credentials;
pub use error_funnel::{error_funnel, ErrorEnvelope};
pub use json_body::{parse_json, parse_json_body};
pub use parameter_pollution::{collapse_query, prevent_parameter_pollution, CollapsedQuery};
pub use query::OriginalUrl;
pub use sanitize::{is_prohibited_key, sanitize, sanitize_value};
pub use security_headers::{apply_security_headers, security_headers};
pub use static_files::{resolve_static_path, serve_static, PublicDir};
