//! Article and review services with a cache-aside consistency layer, a
//! cross-service existence validator and a path-prefix gateway.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
