//! Communities Module
//!
//! Communities ("servers"), their channels, membership rules, and invites.

pub mod db;
pub mod handlers;
pub mod invites;
