//! A feed driven by the real HTTP and SSE sources against a mock server.

use murmur::api::{subscribe, ApiClient, Backoff, Entry, LiveEvent, PageQuery, Resource};
use murmur::reconciler::{Arrival, Feed, FeedOptions, LoadOutcome, Trigger};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_json(id: &str, content: &str) -> String {
    format!(
        r#"{{"id":"{}","content":"{}","createdAt":"2024-05-01T10:00:00Z"}}"#,
        id, content
    )
}

fn page_json(ids: &[&str], start: Option<&str>, end: Option<&str>) -> String {
    let items: Vec<String> = ids.iter().map(|id| post_json(id, "hi")).collect();
    let cursor = |c: Option<&str>| c.map_or("null".to_string(), |c| format!("\"{}\"", c));
    format!(
        r#"{{"items":[{}],"startCursor":{},"endCursor":{}}}"#,
        items.join(","),
        cursor(start),
        cursor(end)
    )
}

fn json(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/json")
        .set_body_string(body)
}

fn options() -> FeedOptions<Entry, String> {
    FeedOptions::new(2).render_item(|e: &Entry| match e {
        Entry::Post(p) => format!("{}: {}", p.id, p.content),
        other => other.id().to_string(),
    })
}

fn ids(feed: &Feed<Entry, String>) -> Vec<String> {
    feed.items().map(|e| e.id().to_string()).collect()
}

#[tokio::test]
async fn timeline_pages_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/timeline"))
        .and(query_param("last", "2"))
        .respond_with(json(page_json(&["p4", "p3"], Some("p4"), Some("p3"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/timeline"))
        .and(query_param("before", "p3"))
        .respond_with(json(page_json(&["p2"], Some("p2"), Some("p2"))))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let first = client
        .fetch_page(&Resource::Timeline, PageQuery::older(None, 2))
        .await
        .unwrap();
    let mut feed = Feed::render(first, options()).unwrap();
    assert_eq!(feed.cursor(), Some("p3"));

    let source = client.source(Resource::Timeline);
    let outcome = feed.load_more(&source).await;
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            added: 1,
            merged: 0,
            no_more: true
        }
    );
    assert_eq!(ids(&feed), vec!["p4", "p3", "p2"]);
    assert_eq!(feed.trigger(), Trigger::Removed);

    // Exhausted: the source is not asked again (verified by `expect(1)`).
    assert_eq!(feed.load_more(&source).await, LoadOutcome::Skipped);
}

#[tokio::test]
async fn comments_load_older_above_with_start_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/p1/comments"))
        .and(query_param("before", "c3"))
        .respond_with(json(
            r#"{"items":[
                {"id":"c1","content":"first","createdAt":"2024-05-01T09:00:00Z"},
                {"id":"c2","content":"second","createdAt":"2024-05-01T09:01:00Z"}
            ],"startCursor":"c1","endCursor":"c2"}"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let resource = Resource::Comments {
        post_id: "p1".into(),
    };
    let initial = resource
        .kind()
        .decode_page(
            br#"{"items":[
                {"id":"c3","createdAt":"2024-05-01T09:02:00Z"},
                {"id":"c4","createdAt":"2024-05-01T09:03:00Z"}
            ],"startCursor":"c3","endCursor":"c4"}"#,
        )
        .unwrap();
    let mut feed = Feed::render(initial, options().layout(resource.layout())).unwrap();

    let outcome = feed.load_more(&client.source(resource)).await;

    assert!(matches!(outcome, LoadOutcome::Loaded { added: 2, .. }));
    assert_eq!(ids(&feed), vec!["c1", "c2", "c3", "c4"]);
    assert_eq!(feed.cursor(), Some("c1"));
}

#[tokio::test]
async fn live_arrivals_merge_or_queue() {
    let server = MockServer::start().await;
    let stream = format!(
        "data: {}\n\ndata: {}\n\n",
        post_json("p3", "edited"),
        post_json("p9", "brand new")
    );
    Mock::given(method("GET"))
        .and(path("/api/timeline"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(stream),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let initial = Resource::Timeline
        .kind()
        .decode_page(page_json(&["p4", "p3"], Some("p4"), Some("p3")).as_bytes())
        .unwrap();
    let mut feed = Feed::render(initial, options()).unwrap();

    let (tx, mut rx) = mpsc::channel(16);
    let backoff = Backoff {
        initial: Duration::from_secs(60),
        max: Duration::from_secs(60),
    };
    let subscription = subscribe(&client, &Resource::Timeline, backoff, tx).unwrap();
    feed.attach(subscription);

    let mut arrivals = Vec::new();
    while arrivals.len() < 2 {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for live event")
            .expect("channel closed");
        if let LiveEvent::Item(entry) = event {
            arrivals.push(feed.enqueue(entry));
        }
    }

    assert_eq!(arrivals[0], Arrival::Merged { index: 1 });
    assert_eq!(arrivals[1], Arrival::Queued { pending: 1 });
    assert_eq!(feed.rows().nth(1).map(String::as_str), Some("p3: edited"));
    assert_eq!(feed.affordance().as_deref(), Some("1 new item"));

    feed.flush();
    assert_eq!(ids(&feed), vec!["p9", "p4", "p3"]);

    // Teardown releases the subscription, which closes the channel.
    feed.teardown();
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}
