//! End-to-end watcher tests.
//!
//! Serves a feed and a receiver on loopback and drives the watcher built
//! from configuration, the same way the binary does.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;

use feedwatch::{Config, CycleOutcome, WatchError, WatchState, Watcher};

/// Mutable feed body and recorded posts shared with the test servers.
#[derive(Clone, Default)]
struct Fixture {
    feed: Arc<Mutex<String>>,
    feed_status: Arc<Mutex<u16>>,
    posts: Arc<Mutex<Vec<String>>>,
    receiver_status: Arc<Mutex<u16>>,
}

impl Fixture {
    fn set_feed(&self, items: &[(&str, u64, &str)]) {
        *self.feed.lock().unwrap() = rss(items);
    }

    fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

fn rss(items: &[(&str, u64, &str)]) -> String {
    let mut body = String::from(
        "\n  <?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel><title>YUY_IX / X</title><link>http://localhost/YUY_IX</link><description>t</description>",
    );
    for (title, id, pub_date) in items {
        body.push_str(&format!(
            "<item><title>{title}</title><link>http://localhost:8080/YUY_IX/status/{id}#m</link><guid>{id}</guid>"
        ));
        if !pub_date.is_empty() {
            body.push_str(&format!("<pubDate>{pub_date}</pubDate>"));
        }
        body.push_str("</item>");
    }
    body.push_str("</channel></rss>");
    body
}

async fn spawn(fixture: Fixture) -> SocketAddr {
    let feed = fixture.clone();
    let receiver = fixture.clone();

    let app = Router::new()
        .route(
            "/YUY_IX/rss",
            get(move || {
                let feed = feed.clone();
                async move {
                    let status = *feed.feed_status.lock().unwrap();
                    let status = StatusCode::from_u16(status).unwrap();
                    let body = feed.feed.lock().unwrap().clone();
                    (status, [(header::CONTENT_TYPE, "application/rss+xml")], body)
                }
            }),
        )
        .route(
            "/",
            post(move |body: String| {
                let receiver = receiver.clone();
                async move {
                    let status = *receiver.receiver_status.lock().unwrap();
                    let status = StatusCode::from_u16(status).unwrap();
                    if status.is_success() {
                        receiver.posts.lock().unwrap().push(body);
                    }
                    status
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn setup(notify_on_prime: bool) -> (Watcher, Fixture, TempDir) {
    let fixture = Fixture::default();
    *fixture.feed_status.lock().unwrap() = 200;
    *fixture.receiver_status.lock().unwrap() = 201;
    let addr = spawn(fixture.clone()).await;

    let temp = TempDir::new().unwrap();
    let toml = format!(
        r#"
[feed]
url = "http://{addr}/YUY_IX/rss"
poll_interval_secs = 1
timeout_secs = 5

[notify]
endpoint = "http://{addr}/"
notify_on_prime = {notify_on_prime}
account = "YUY_IX"

[state]
path = "{}"
"#,
        temp.path().join("last_seen_id.txt").display()
    );
    let config = Config::parse(&toml).unwrap();
    config.validate().unwrap();

    let watcher = Watcher::from_config(&config).unwrap();
    (watcher, fixture, temp)
}

#[tokio::test]
async fn test_prime_then_notify_new_status() {
    let (watcher, fixture, _temp) = setup(false).await;
    fixture.set_feed(&[
        ("first post", 100, "Tue, 11 Jun 2024 10:00:00 GMT"),
        ("RT @other: boosted", 150, "Tue, 11 Jun 2024 11:00:00 GMT"),
    ]);

    assert_eq!(watcher.state(), WatchState::Unprimed);
    assert_eq!(
        watcher.run_cycle().await.unwrap(),
        CycleOutcome::Primed {
            id: 100,
            notified: false
        }
    );
    assert!(fixture.posts().is_empty());

    fixture.set_feed(&[
        ("second post", 101, "Tue, 11 Jun 2024 12:00:00 GMT"),
        ("first post", 100, "Tue, 11 Jun 2024 10:00:00 GMT"),
        ("R to @someone: reply", 160, "Tue, 11 Jun 2024 13:00:00 GMT"),
    ]);

    assert_eq!(
        watcher.run_cycle().await.unwrap(),
        CycleOutcome::Notified {
            id: 101,
            previous: 100
        }
    );
    assert_eq!(fixture.posts(), vec!["https://x.com/YUY_IX/status/101"]);
    assert_eq!(watcher.state(), WatchState::Primed(101));

    // Unchanged feed: nothing more to send
    assert_eq!(watcher.run_cycle().await.unwrap(), CycleOutcome::NoCandidate);
    assert_eq!(fixture.posts().len(), 1);
}

#[tokio::test]
async fn test_prime_with_notify_posts_once() {
    let (watcher, fixture, _temp) = setup(true).await;
    fixture.set_feed(&[("only", 7, "")]);

    assert_eq!(
        watcher.run_cycle().await.unwrap(),
        CycleOutcome::Primed {
            id: 7,
            notified: true
        }
    );
    assert_eq!(fixture.posts(), vec!["https://x.com/YUY_IX/status/7"]);
}

#[tokio::test]
async fn test_receiver_failure_retries_next_cycle() {
    let (watcher, fixture, _temp) = setup(false).await;
    watcher.store().write(10).unwrap();
    fixture.set_feed(&[("new", 11, "")]);
    *fixture.receiver_status.lock().unwrap() = 500;

    assert!(matches!(
        watcher.run_cycle().await.unwrap(),
        CycleOutcome::DeliveryFailed { id: 11, .. }
    ));
    assert_eq!(watcher.store().read(), Some(10));

    *fixture.receiver_status.lock().unwrap() = 201;
    assert_eq!(
        watcher.run_cycle().await.unwrap(),
        CycleOutcome::Notified {
            id: 11,
            previous: 10
        }
    );
}

#[tokio::test]
async fn test_feed_errors_are_typed() {
    let (watcher, fixture, _temp) = setup(false).await;

    *fixture.feed_status.lock().unwrap() = 503;
    let err = watcher.run_cycle().await.unwrap_err();
    assert!(matches!(err, WatchError::Fetch(_)));

    *fixture.feed_status.lock().unwrap() = 200;
    *fixture.feed.lock().unwrap() = "<html>not a feed".to_string();
    let err = watcher.run_cycle().await.unwrap_err();
    assert!(matches!(err, WatchError::Parse(_)));

    assert_eq!(watcher.state(), WatchState::Unprimed);
}

#[tokio::test]
async fn test_run_loop_until_shutdown() {
    let (watcher, fixture, _temp) = setup(false).await;
    watcher.store().write(1).unwrap();
    fixture.set_feed(&[("hello", 2, "")]);

    let shutdown = tokio::time::sleep(Duration::from_millis(300));
    tokio::time::timeout(Duration::from_secs(5), watcher.run(shutdown))
        .await
        .expect("watcher did not stop");

    assert_eq!(fixture.posts(), vec!["https://x.com/YUY_IX/status/2"]);
    assert_eq!(watcher.store().read(), Some(2));
}
