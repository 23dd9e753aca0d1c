//! # HolisticMatch API Server Library
//!
//! HTTP surface of the HolisticMatch marketplace: sessions, registration,
//! account recovery and professional profiles.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Bearer authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
