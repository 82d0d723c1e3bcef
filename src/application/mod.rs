//! Application services: orchestration over repositories, cache and validators.

pub mod error;
pub mod pagination;
pub mod repos;
pub mod resources;
pub mod validation;
