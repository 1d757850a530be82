use super::models::EntryKind;
use crate::reconciler::Layout;

/// A listable API resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Timeline,
    Notifications,
    Comments { post_id: String },
    Users { search: Option<String> },
    Followers { username: String },
    Followees { username: String },
}

impl Resource {
    /// Path segments below `/api`, unescaped.
    pub(crate) fn segments(&self) -> Vec<&str> {
        match self {
            Resource::Timeline => vec!["timeline"],
            Resource::Notifications => vec!["notifications"],
            Resource::Comments { post_id } => vec!["posts", post_id.as_str(), "comments"],
            Resource::Users { .. } => vec!["users"],
            Resource::Followers { username } => vec!["users", username.as_str(), "followers"],
            Resource::Followees { username } => vec!["users", username.as_str(), "followees"],
        }
    }

    /// Extra query parameters that identify the listing itself.
    pub(crate) fn filter(&self) -> Option<(&'static str, &str)> {
        match self {
            Resource::Users {
                search: Some(search),
            } if !search.is_empty() => Some(("search", search.as_str())),
            _ => None,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Resource::Timeline => EntryKind::Post,
            Resource::Notifications => EntryKind::Notification,
            Resource::Comments { .. } => EntryKind::Comment,
            Resource::Users { .. } | Resource::Followers { .. } | Resource::Followees { .. } => {
                EntryKind::User
            }
        }
    }

    /// Comment threads read oldest-first; everything else newest-first.
    pub fn layout(&self) -> Layout {
        match self {
            Resource::Comments { .. } => Layout::Reverse,
            _ => Layout::Forward,
        }
    }

    /// Whether the server pushes live arrivals for this resource.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            Resource::Timeline | Resource::Notifications | Resource::Comments { .. }
        )
    }

    pub fn title(&self) -> String {
        match self {
            Resource::Timeline => "Home".to_string(),
            Resource::Notifications => "Notifications".to_string(),
            Resource::Comments { post_id } => format!("Comments on {}", post_id),
            Resource::Users { search: Some(s) } if !s.is_empty() => {
                format!("Users matching \"{}\"", s)
            }
            Resource::Users { .. } => "Users".to_string(),
            Resource::Followers { username } => format!("Followers of @{}", username),
            Resource::Followees { username } => format!("@{} follows", username),
        }
    }

    /// Noun used by the new-items affordance.
    pub fn noun(&self) -> (&'static str, &'static str) {
        match self.kind() {
            EntryKind::Post => ("post", "posts"),
            EntryKind::Comment => ("comment", "comments"),
            EntryKind::Notification => ("notification", "notifications"),
            EntryKind::User => ("user", "users"),
        }
    }

    /// Text shown when the first page is empty.
    pub fn empty_text(&self) -> &'static str {
        match self.kind() {
            EntryKind::Post => "No posts yet. Follow someone to fill your timeline.",
            EntryKind::Comment => "No comments yet.",
            EntryKind::Notification => "You're all caught up.",
            EntryKind::User => "No users found.",
        }
    }
}
