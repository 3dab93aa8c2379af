//! Client-side view-models.
//!
//! DESIGN
//! ======
//! `session` is the collaboration reducer fed by the websocket task.
//! `workspace`, `terminal` and `debug` hold the editor shell's local state
//! and reach the backend only through `IdeService`.

pub mod debug;
pub mod session;
pub mod terminal;
pub mod workspace;
