//! Cubage and container placement service.
//!
//! - [`catalog`]: product lookup by normalized code
//! - [`cubage`]: totals, boxable volume and packaging of an order
//! - [`packaging`]: packaging requirement policies
//! - [`placement`]: anchor-point placement of boxes in one container
//! - [`api`]: HTTP endpoints

pub mod api;
pub mod catalog;
pub mod config;
pub mod cubage;
pub mod geometry;
pub mod model;
pub mod packaging;
pub mod placement;
pub mod types;
