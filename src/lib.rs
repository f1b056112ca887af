//! CourseMart checkout client library
//!
//! Coupon validation, bundle pricing and purchase orchestration for the
//! course marketplace checkout screens.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod notifications;
pub mod services;

pub use auth::{AccessToken, AuthSession, UserProfile};
pub use config::ClientConfig;
pub use errors::ServiceError;
