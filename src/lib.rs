//! Client for a distributed arithmetic expression calculator.
//!
//! The service parses, schedules and evaluates expressions on a pool of
//! worker agents; this crate renders its state. It provides the session
//! store, the HTTP gateway, the view router and the view models behind the
//! `daec` command-line client.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod router;
pub mod session;
pub mod views;
