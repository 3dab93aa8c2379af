//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own identity, room bookkeeping and chat rules so the
//! route handler can stay focused on protocol translation.

pub mod auth;
pub mod chat;
pub mod room;
