//! slotsync - shared slot editor with live synchronization.
//!
//! Browsers load a page of numbered slots, each holding one value from a
//! fixed label set, and every change one browser makes is pushed to all the
//! others over a WebSocket.
//!
//! - [`store`] holds the canonical slot values.
//! - [`sync`] tracks connections, decodes updates and fans them out.
//! - [`server`] exposes the page, a JSON API and the `/ws` endpoint.
//! - [`config`] parses the command line into a [`config::ServerConfig`].

pub mod config;
pub mod server;
pub mod store;
pub mod sync;
