//! End-to-end redirect behaviour over a real TCP listener.

use std::time::Duration;

use reqwest::StatusCode;
use url_redirect::config::{RedirectConfig, RouteConfig};
use url_redirect::lifecycle::startup::{self, StartupError};
use url_redirect::store::{load_entries, RouteStore, StoreError};

mod common;

#[tokio::test]
async fn test_first_seed_path_redirects() {
    let service = common::start_service(common::seed_routes()).await;

    let res = common::client()
        .get(service.url("/dbpathname"))
        .send()
        .await
        .expect("Service unreachable");

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "https://google.com");
    service.shutdown.trigger();
}

#[tokio::test]
async fn test_second_seed_path_redirects() {
    let service = common::start_service(common::seed_routes()).await;

    let res = common::client()
        .get(service.url("/otherdbpath"))
        .send()
        .await
        .expect("Service unreachable");

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "https://google.com/robots.txt");
    service.shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_path_gets_greeting() {
    let service = common::start_service(common::seed_routes()).await;

    let res = common::client()
        .get(service.url("/unknown"))
        .send()
        .await
        .expect("Service unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Hello, world!\n");
    service.shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_requests_share_the_store() {
    let service = common::start_service(common::seed_routes()).await;
    let client = common::client();

    let mut handles = Vec::new();
    for i in 0..32 {
        let client = client.clone();
        let url = if i % 2 == 0 {
            service.url("/dbpathname")
        } else {
            service.url("/elsewhere")
        };
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let expected = if i % 2 == 0 {
            StatusCode::FOUND
        } else {
            StatusCode::OK
        };
        assert_eq!(handle.await.unwrap(), expected);
    }
    service.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let service = common::start_service(common::seed_routes()).await;
    service.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = common::client().get(service.url("/")).send().await;
    assert!(res.is_err(), "Server should not answer after shutdown");
}

#[test]
fn test_reload_overwrites_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.db");

    load_entries(&path, [("/dbpathname", "https://google.com")]).unwrap();
    load_entries(&path, [("/dbpathname", "https://example.org")]).unwrap();

    let values = RouteStore::open(&path)
        .unwrap()
        .lookup(["/dbpathname"])
        .unwrap();
    assert_eq!(values["/dbpathname"], "https://example.org");
}

#[test]
fn test_unopenable_store_fails_startup() {
    let not_a_dir = tempfile::NamedTempFile::new().unwrap();
    let mut config = RedirectConfig::default();
    config.store.path = not_a_dir
        .path()
        .join("routes.db")
        .display()
        .to_string();
    config.routes = vec![RouteConfig::new("/a", "https://example.com")];

    match startup::prepare(config) {
        Err(StartupError::Load(StoreError::OpenFile { .. })) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("startup should fail when the store cannot be created"),
    }
}
