//! HTTP API for the AgriConnect marketplace: session handling, the role gate
//! and the Employee, Farmer, GreenTech and public areas.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
