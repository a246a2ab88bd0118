//! Automation for GitHub administrative actions the REST API does not
//! expose, performed by driving the website's HTML forms the way a
//! browser would.
//!
//! The core mechanism is [`session::Session::drive_form`]: fetch a page,
//! pick one form by predicate, merge caller fields over the form's hidden
//! defaults, and submit. Login (password plus TOTP code) builds the
//! authenticated cookie session; every operation in [`api::Api`] is a
//! thin specialization of the primitive.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod otp;
pub mod session;

pub use api::{Api, OrganizationUsage, SecurityFeature};
pub use error::{Error, Result};
pub use session::Session;
