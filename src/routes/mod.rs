mod auth;
mod forms;
mod health_check;
mod not_found;
mod user;

use actix_web::web;

pub use auth::session;
pub use forms::submit_form;
pub use health_check::health_check;
pub use not_found::not_found;
pub use user::{get_profile, update_profile};

/// Route configurators mounted under the three API prefixes.
///
/// The defaults are thin handlers; deployments with their own login, form or user
/// handlers swap in their own configurators.
#[derive(Clone, Copy)]
pub struct RouteGroups {
    /// Mounted at `/api/v1/auth`, open.
    pub auth: fn(&mut web::ServiceConfig),
    /// Mounted at `/api/v1/forms`, open.
    pub forms: fn(&mut web::ServiceConfig),
    /// Mounted at `/api/v1/user`, behind the authentication gate.
    pub user: fn(&mut web::ServiceConfig),
}

impl Default for RouteGroups {
    fn default() -> Self {
        Self {
            auth: auth::configure,
            forms: forms::configure,
            user: user::configure,
        }
    }
}
