//! Cartwheel server library.
//!
//! The JSON API, the server-rendered storefront, and the storage backends
//! they share. The `cartwheel-server` binary and the integration tests both
//! build the router through [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
