//! Library crate for touchline-back: a youth-soccer game clock and substitution engine
//! behind an HTTP API, exposed for the binaries and tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
