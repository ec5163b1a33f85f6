//! Messages Module
//!
//! The message lifecycle: persistence ([`db`]), state rules and
//! authorization ([`engine`]), content sanitization ([`sanitize`]), and
//! the HTTP surface ([`handlers`]).

pub mod db;
pub mod engine;
pub mod handlers;
pub mod sanitize;
