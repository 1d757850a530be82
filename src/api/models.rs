//! Records returned by the social API.
//!
//! Only the fields the terminal client displays are modeled; serde ignores
//! the rest. Every record is keyed by its server id.

use crate::reconciler::{Keyed, Page};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Minimal author info embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub username: String,
    #[serde(default, rename = "avatarURL")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub spoiler_of: Option<String>,
    #[serde(default)]
    pub reactions_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default, rename = "postID")]
    pub post_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub reactions_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub actors: Vec<String>,
    /// "follow", "comment", "post_mention", "comment_mention", ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, rename = "postID")]
    pub post_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub followees_count: u64,
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub followeed: bool,
}

impl Author {
    pub fn display(author: Option<&Author>) -> &str {
        author.map_or("unknown", |a| a.username.as_str())
    }
}

impl Notification {
    /// "alice", "alice and bob", "alice and 3 others".
    pub fn actor_summary(&self) -> String {
        match self.actors.as_slice() {
            [] => "someone".to_string(),
            [one] => one.clone(),
            [first, second] => format!("{} and {}", first, second),
            [first, rest @ ..] => format!("{} and {} others", first, rest.len()),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.kind.as_str() {
            "follow" => "followed you",
            "comment" => "commented on a post",
            "post_mention" => "mentioned you in a post",
            "comment_mention" => "mentioned you in a comment",
            _ => "did something",
        }
    }
}

/// One row in any list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Post(Post),
    Comment(Comment),
    Notification(Notification),
    User(UserProfile),
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Entry::Post(p) => &p.id,
            Entry::Comment(c) => &c.id,
            Entry::Notification(n) => &n.id,
            Entry::User(u) => &u.id,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Entry::Post(p) => Some(p.created_at),
            Entry::Comment(c) => Some(c.created_at),
            Entry::Notification(n) => Some(n.issued_at),
            Entry::User(_) => None,
        }
    }
}

impl Keyed for Entry {
    type Key = String;

    fn key(&self) -> String {
        self.id().to_string()
    }
}

/// Which record type a resource lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Post,
    Comment,
    Notification,
    User,
}

impl EntryKind {
    pub fn decode(self, bytes: &[u8]) -> Result<Entry, serde_json::Error> {
        Ok(match self {
            EntryKind::Post => Entry::Post(serde_json::from_slice(bytes)?),
            EntryKind::Comment => Entry::Comment(serde_json::from_slice(bytes)?),
            EntryKind::Notification => Entry::Notification(serde_json::from_slice(bytes)?),
            EntryKind::User => Entry::User(serde_json::from_slice(bytes)?),
        })
    }

    pub fn decode_page(self, bytes: &[u8]) -> Result<Page<Entry>, serde_json::Error> {
        Ok(match self {
            EntryKind::Post => serde_json::from_slice::<Page<Post>>(bytes)?.map(Entry::Post),
            EntryKind::Comment => {
                serde_json::from_slice::<Page<Comment>>(bytes)?.map(Entry::Comment)
            }
            EntryKind::Notification => {
                serde_json::from_slice::<Page<Notification>>(bytes)?.map(Entry::Notification)
            }
            EntryKind::User => serde_json::from_slice::<Page<UserProfile>>(bytes)?.map(Entry::User),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_post() {
        let json = br#"{
            "id": "p1",
            "content": "hello",
            "user": {"username": "alice", "avatarURL": null},
            "reactionsCount": 3,
            "commentsCount": 1,
            "createdAt": "2024-05-01T10:00:00Z",
            "mine": true
        }"#;
        let entry = EntryKind::Post.decode(json).unwrap();
        let Entry::Post(post) = &entry else {
            panic!("expected post, got {:?}", entry);
        };
        assert_eq!(post.content, "hello");
        assert_eq!(Author::display(post.user.as_ref()), "alice");
        assert_eq!(post.reactions_count, 3);
        assert_eq!(entry.key(), "p1");
    }

    #[test]
    fn test_decode_notification_page() {
        let json = br#"{
            "items": [{
                "id": "n1",
                "actors": ["bob", "carol"],
                "type": "follow",
                "read": false,
                "issuedAt": "2024-05-01T10:00:00Z"
            }],
            "endCursor": "n1"
        }"#;
        let page = EntryKind::Notification.decode_page(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.end_cursor.as_deref(), Some("n1"));
        let Entry::Notification(n) = &page.items[0] else {
            panic!("expected notification");
        };
        assert_eq!(n.actor_summary(), "bob and carol");
        assert_eq!(n.describe(), "followed you");
    }

    #[test]
    fn test_decode_wrong_shape_is_error() {
        assert!(EntryKind::Comment.decode(br#"{"id": 1}"#).is_err());
    }

    #[test]
    fn test_actor_summary_many() {
        let n = Notification {
            id: "n".into(),
            actors: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            kind: "comment".into(),
            post_id: Some("p".into()),
            read: true,
            issued_at: Utc::now(),
        };
        assert_eq!(n.actor_summary(), "a and 3 others");
        assert!(Notification { actors: vec![], ..n }
            .actor_summary()
            .contains("someone"));
    }

    #[test]
    fn test_user_has_no_timestamp() {
        let user = Entry::User(UserProfile {
            id: "u1".into(),
            username: "alice".into(),
            followers_count: 0,
            followees_count: 0,
            following: false,
            followeed: false,
        });
        assert!(user.timestamp().is_none());
    }
}
