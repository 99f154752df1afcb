//! Aurum Vision API Library
//!
//! Backend for the Aurum Vision website: lead capture, a rule-based FAQ
//! assistant and a diagnostics endpoint.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, routes).
//! - `core`: Domain-layer namespace (knowledge base, services, models, errors).
//! - `config`: Configuration management.
//! - `db`: Database pool and persistence gateway bootstrap.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `knowledge_base`: FAQ table and keyword matcher.
//! - `models`: Collections and request/response models.
//! - `routes`: Router and middleware.
//! - `services`: Chat and lead services.
//! - `store`: Persistence gateway implementations.
//! - `validation`: Request-body validation.

pub mod api;
pub mod core;

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod knowledge_base;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;

pub use routes::{create_rate_limited_router, create_router};
