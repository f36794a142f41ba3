//! Day-scoped nutrition log: a small HTTP service that turns free-text food
//! descriptions into macro estimates and keeps a short per-device history,
//! plus the client-side pieces that talk to it.

pub mod app;
pub mod client;
pub mod config;
pub mod dayclock;
pub mod entries;
pub mod error;
pub mod estimator;
pub mod extractors;
pub mod health;
pub mod parse;
pub mod state;
pub mod store;
pub mod tenant;
