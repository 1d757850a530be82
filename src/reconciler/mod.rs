//! Incremental feed reconciliation.
//!
//! Every list screen in the client (home timeline, notifications, comments,
//! followers/followees, user search) is the same component: an ordered list
//! of keyed items grown by cursor pagination at one end and by live arrivals
//! at the other, with roving keyboard focus over what is rendered.
//!
//! # Module Structure
//!
//! - `types` - `Keyed`, `Page`, `PageSource` and operation results
//! - `feed` - the `Feed` reconciler itself
//! - `state` - key-unique row storage
//! - `queue` - buffered live arrivals
//! - `focus` - roving focus index
//!
//! # Example
//!
//! ```ignore
//! use murmur::reconciler::{Feed, FeedOptions, Nav};
//!
//! let mut feed = Feed::render(first_page, FeedOptions::new(10).render_item(render_post))?;
//! feed.enqueue(live_post);          // "1 new item"
//! feed.flush();                     // merged at the top
//! feed.load_more(&timeline).await;  // older posts appended
//! feed.navigate(Nav::Next);
//! ```

mod feed;
mod focus;
mod queue;
mod state;
mod types;

pub use feed::{Feed, FeedOptions, DEFAULT_SENTINEL_DISTANCE};
pub use focus::{Nav, RovingFocus};
pub use queue::{default_pluralize, LiveQueue};
pub use state::{ListState, Row};
pub use types::{
    Arrival, FeedError, Initial, Keyed, Layout, LoadOutcome, LoadRequest, Page, PageSource,
    Release, Trigger, TriggerMode,
};
