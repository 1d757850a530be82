//! murmur: a terminal client for a social-networking API.
//!
//! The heart of the crate is [`reconciler::Feed`], a keyed list that grows
//! from cursor-paginated fetches at one end and buffered live arrivals at the
//! other. [`api`] provides the HTTP and Server-Sent Events sources it is fed
//! from; the binary wires both into a ratatui event loop.

pub mod api;
pub mod config;
pub mod keybindings;
pub mod reconciler;
pub mod util;
