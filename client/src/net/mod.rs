//! Networking for the IDE client.
//!
//! SYSTEM CONTEXT
//! ==============
//! `collab_client` owns the collaboration websocket, `url` builds its
//! endpoint, and `ide_service` covers the project backend calls made over
//! plain HTTP.

pub mod collab_client;
pub mod ide_service;
pub mod url;

#[cfg(test)]
#[path = "mock_ide_test.rs"]
pub(crate) mod mock_ide;
