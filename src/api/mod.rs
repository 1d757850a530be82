//! Client side of the social API.
//!
//! - `client` - paginated HTTP GETs with retry and a size cap
//! - `models` - the records each listing returns
//! - `resource` - which listing, and how it is laid out
//! - `sse` / `live` - Server-Sent Events for live arrivals

mod client;
mod live;
mod models;
mod resource;
mod sse;

pub use client::{ApiClient, FetchError, PageQuery, ResourceSource};
pub use live::{subscribe, Backoff, LiveEvent, Subscription, INITIAL_RETRY, MAX_RETRY};
pub use models::{Author, Comment, Entry, EntryKind, Notification, Post, UserProfile};
pub use resource::Resource;
pub use sse::{SseDecoder, SseEvent};
