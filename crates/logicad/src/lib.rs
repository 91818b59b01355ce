//! Logica daemon - HTTP API for Portuguese / propositional logic translation

pub mod auth;
pub mod config;
pub mod debug_llm;
pub mod routes;
pub mod server;
pub mod service;
