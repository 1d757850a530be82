//! Utility functions for common operations.
//!
//! - **Text processing**: Unicode-aware width, truncation and flattening of
//!   untrusted text into a single terminal line
//! - **Time**: compact relative timestamps for list rows
//!
//! # Examples
//!
//! ```
//! use murmur::util::{display_width, single_line, truncate_to_width};
//!
//! let width = display_width("Hello 世界"); // 10
//! let line = single_line("multi\nline\x1b[1m post");
//! let cut = truncate_to_width(&line, 8);
//! ```

mod text;
mod time;

pub use text::{display_width, single_line, truncate_to_width};
pub use time::format_relative_time;
