//! AuthCore - A lightweight embedded role-based authorization core implemented in Rust
//!
//! This crate provides the data model and mutation/validation logic for
//! roles and permissions, together with the request-time decision procedure
//! that grants or denies an action. It is designed to be embedded by an
//! outer service layer (HTTP, RPC) that owns authentication and routing.

pub mod api;
pub mod config;
pub mod core;
pub mod storage;
pub mod utils;
