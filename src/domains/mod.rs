//! Domains module containing the collaborators around the permission engine.
//!
//! Each subdomain represents one concern the viewer needs next to the core
//! path checks: where approved directories come from, what happens to source
//! files of old builds and how a file request is finally answered.

pub mod approval;
pub mod retention;
pub mod viewer;
