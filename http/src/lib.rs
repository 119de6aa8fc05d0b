#![deny(
    clippy::all,
    clippy::missing_const_for_fn,
    clippy::pedantic,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    unsafe_code,
    unused
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! REST client for the Service: binds requests to their rate-limit bucket,
//! executes them, classifies the response, and retries transport failures,
//! 429s, and 5xx responses up to a configured bound.

pub mod api_error;
pub mod classify;
pub mod client;
pub mod error;
pub mod request;

pub use self::{
    api_error::ApiError,
    client::{Client, ClientBuilder},
    error::{Error, ErrorType},
    request::{Priority, Request},
};

pub use halcyon_http_ratelimiting::request::Method;
