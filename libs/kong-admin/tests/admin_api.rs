//! End-to-end behavior of the admin client against a mock gateway.
//!
//! Covers the wire contract shared by every resource: workspace scoping,
//! authentication, pagination and tag filtering, credential upserts,
//! deterministic ids and error classification.

use std::collections::BTreeSet;

use futures_util::StreamExt;
use httpmock::prelude::*;
use kong_admin::models::{BasicAuth, Consumer, Route, Service};
use kong_admin::{
    CancellationToken, Client, CredentialOptions, ErrorKind, FillId, ListOpt, Range, Version,
};
use serde_json::json;

fn client(server: &MockServer) -> Client {
    Client::new(server.base_url()).unwrap()
}

/// Create a service, then a route attached to it.
#[tokio::test]
async fn service_then_route_in_service() {
    let server = MockServer::start();
    let create_service = server.mock(|when, then| {
        when.method(POST)
            .path("/services")
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json_body(json!({"name": "foo", "host": "u", "port": 42, "path": "/p"}));
        then.status(201).json_body(json!({
            "id": "5e4c2fd3-0c34-4bc0-9d3b-6a43c1f1a2b0",
            "name": "foo", "host": "u", "port": 42, "path": "/p",
            "protocol": "http", "retries": 5, "enabled": true
        }));
    });
    let create_route = server.mock(|when, then| {
        when.method(POST)
            .path("/services/5e4c2fd3-0c34-4bc0-9d3b-6a43c1f1a2b0/routes")
            .json_body(json!({"paths": ["/r"]}));
        then.status(201).json_body(json!({
            "id": "r1",
            "paths": ["/r"],
            "service": {"id": "5e4c2fd3-0c34-4bc0-9d3b-6a43c1f1a2b0"}
        }));
    });

    let client = client(&server);
    let service = client
        .services()
        .create(&Service {
            name: Some("foo".into()),
            host: Some("u".into()),
            port: Some(42),
            path: Some("/p".into()),
            ..Service::default()
        })
        .await
        .unwrap();
    let service_id = service.id.clone().unwrap();
    assert!(!service_id.is_empty());
    assert_eq!(service.retries, Some(5));

    let route = client
        .routes()
        .create_in_service(
            &service_id,
            &Route {
                paths: Some(vec!["/r".into()]),
                ..Route::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        route.service.and_then(|s| s.id).as_deref(),
        Some(service_id.as_str())
    );
    create_service.assert();
    create_route.assert();
}

fn mock_consumer_pages(server: &MockServer) -> [httpmock::Mock<'_>; 3] {
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/consumers")
            .query_param("size", "1")
            .query_param_missing("offset");
        then.status(200).json_body(json!({
            "data": [{"id": "c1", "username": "foo1"}],
            "offset": "o1",
            "next": "/consumers?offset=o1&size=1"
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/consumers")
            .query_param("size", "1")
            .query_param("offset", "o1");
        then.status(200).json_body(json!({
            "data": [{"id": "c2", "username": "foo2"}],
            "offset": "o2"
        }));
    });
    let third = server.mock(|when, then| {
        when.method(GET)
            .path("/consumers")
            .query_param("size", "1")
            .query_param("offset", "o2");
        then.status(200).json_body(json!({
            "data": [{"id": "c3", "username": "foo3"}],
            "offset": null,
            "next": null
        }));
    });
    [first, second, third]
}

/// Feed `next` back into `list` until the cursor runs out.
#[tokio::test]
async fn list_pages_by_cursor() {
    let server = MockServer::start();
    let pages = mock_consumer_pages(&server);
    let client = client(&server);

    let mut usernames = BTreeSet::new();
    let mut opts = Some(ListOpt::new().size(1));
    let mut requests = 0;
    while let Some(current) = opts {
        let (page, next) = client.consumers().list(Some(&current)).await.unwrap();
        requests += 1;
        assert_eq!(page.len(), 1);
        usernames.extend(page.into_iter().filter_map(|c: Consumer| c.username));
        opts = next;
    }

    assert_eq!(requests, 3);
    assert_eq!(
        usernames,
        BTreeSet::from(["foo1".to_owned(), "foo2".to_owned(), "foo3".to_owned()])
    );
    for page in &pages {
        page.assert_calls(1);
    }
}

/// `list_all` issues one request per page and keeps server order.
#[tokio::test]
async fn list_all_walks_every_page_in_order() {
    let server = MockServer::start();
    let pages = mock_consumer_pages(&server);
    let client = client(&server);

    let all = client
        .list_all("/consumers", Some(&ListOpt::new().size(1)), false)
        .await
        .unwrap();
    let names: Vec<_> = all.iter().map(|c| c["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["foo1", "foo2", "foo3"]);
    for page in &pages {
        page.assert_calls(1);
    }

    let typed = client
        .consumers()
        .list_all_with(&ListOpt::new().size(1))
        .await
        .unwrap();
    assert_eq!(typed.len(), 3);
    assert_eq!(typed[2].id.as_deref(), Some("c3"));
}

#[tokio::test]
async fn items_stream_yields_each_record() {
    let server = MockServer::start();
    mock_consumer_pages(&server);
    let client = client(&server);

    let ids: Vec<String> = client
        .items::<Consumer>("/consumers", Some(&ListOpt::new().size(1)))
        .map(|c| c.unwrap().id.unwrap())
        .collect()
        .await;
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
}

/// OR joins tags with `/`, AND with `,`.
#[tokio::test]
async fn tag_filters() {
    let server = MockServer::start();
    let tagged = |tags: &[&str]| {
        json!({"username": tags.join("-"), "tags": tags})
    };
    let any = server.mock(|when, then| {
        when.method(GET).path("/consumers").query_param("tags", "t1/t2");
        then.status(200).json_body(json!({"data": [
            tagged(&["t1", "t2"]), tagged(&["t2", "t3"]), tagged(&["t1", "t3"]),
            tagged(&["t1", "t2"]), tagged(&["t2", "t3"]), tagged(&["t1", "t3"]),
        ]}));
    });
    let all = server.mock(|when, then| {
        when.method(GET).path("/consumers").query_param("tags", "t1,t2");
        then.status(200).json_body(json!({"data": [
            tagged(&["t1", "t2"]), tagged(&["t1", "t2"]),
        ]}));
    });

    let client = client(&server);
    let or = ListOpt::new().tags(["t1", "t2", "t1"]);
    let (found, _) = client.consumers().list(Some(&or)).await.unwrap();
    assert_eq!(found.len(), 6);

    let and = or.match_all_tags(true);
    let (found, _) = client.consumers().list(Some(&and)).await.unwrap();
    assert_eq!(found.len(), 2);

    any.assert();
    all.assert();
}

/// The gateway hashes passwords unless asked not to.
#[tokio::test]
async fn basic_auth_create_then_update_without_hashing() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/consumers/foo/basic-auth")
            .query_param_missing("skip_hash")
            .json_body(json!({"username": "u", "password": "p"}));
        then.status(201).json_body(json!({
            "id": "b1",
            "username": "u",
            "password": "2d8a5c2c4f0e7e4b9e0d3f6a1b5c8d7e6f4a3b2c",
            "consumer": {"id": "c1"}
        }));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/consumers/foo/basic-auth/b1")
            .query_param("skip_hash", "true")
            .json_body(json!({"id": "b1", "username": "u", "password": "p2"}));
        then.status(200).json_body(json!({
            "id": "b1",
            "username": "u",
            "password": "p2",
            "consumer": {"id": "c1"}
        }));
    });

    let client = client(&server);
    let creds = client.basic_auths();
    let created = creds
        .create(
            "foo",
            &BasicAuth {
                username: Some("u".into()),
                password: Some("p".into()),
                ..BasicAuth::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(created.password.as_deref(), Some("p"));

    let updated = creds
        .update_with_options(
            "foo",
            &BasicAuth {
                id: created.id.clone(),
                username: Some("u".into()),
                password: Some("p2".into()),
                ..BasicAuth::default()
            },
            CredentialOptions::skip_hash(),
        )
        .await
        .unwrap();
    assert_eq!(updated.password.as_deref(), Some("p2"));

    let missing_id = creds
        .update("foo", &BasicAuth::default())
        .await
        .unwrap_err();
    assert!(missing_id.is_bad_request());

    create.assert();
    update.assert();
}

#[tokio::test]
async fn credential_with_id_is_upserted() {
    let server = MockServer::start();
    let put = server.mock(|when, then| {
        when.method(PUT).path("/consumers/foo/hmac-auth/h1");
        then.status(200).json_body(json!({"id": "h1", "username": "u", "secret": "s"}));
    });

    let client = client(&server);
    let record = json!({"id": "h1", "username": "u"});
    let response = client
        .credentials()
        .create("hmac-auth", "foo", &record, CredentialOptions::default())
        .await
        .unwrap();
    put.assert();
    let body: serde_json::Value = serde_json::from_slice(&response.data).unwrap();
    assert_eq!(body["secret"], "s");
}

/// The workspace prefix is applied exactly once per request.
#[tokio::test]
async fn workspace_prefix() {
    let server = MockServer::start();
    let scoped = server.mock(|when, then| {
        when.method(GET).path("/team-a/services");
        then.status(200).json_body(json!({"data": [{"id": "s1"}]}));
    });
    let scoped_item = server.mock(|when, then| {
        when.method(GET).path("/team-a/services/s1");
        then.status(200).json_body(json!({"id": "s1"}));
    });

    let client = Client::builder(server.base_url())
        .workspace("team-a")
        .build()
        .unwrap();
    assert_eq!(client.resolve_url("/services").unwrap(), format!("{}/team-a/services", server.base_url()));

    let (services, _) = client.services().list(None).await.unwrap();
    let fetched = client
        .services()
        .get(services[0].id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(fetched.id.as_deref(), Some("s1"));
    scoped.assert_calls(1);
    scoped_item.assert_calls(1);
}

#[tokio::test]
async fn token_user_agent_and_constant_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/")
            .header("kong-admin-token", "tok")
            .header("user-agent", kong_admin::DEFAULT_USER_AGENT)
            .header("x-team", "platform");
        then.status(200).json_body(json!({"version": "3.4.1.0"}));
    });

    let client = Client::builder(server.base_url())
        .auth_token("tok")
        .header("x-team", "platform")
        .build()
        .unwrap();
    let info = client.info().await.unwrap();
    assert!(info.is_enterprise());
    assert!(Range::parse(">=3.4.0 <3.5.0").unwrap().contains(&info.version().unwrap()));
    assert_eq!(info.version().unwrap(), Version::new(3, 4, 1));
    mock.assert();
}

/// Ids computed before create turn the create into a `PUT` upsert.
#[tokio::test]
async fn deterministic_id_upserts() {
    let mut service = Service {
        name: Some("some.service.name".into()),
        url: Some("http://backend:8080".into()),
        ..Service::default()
    };
    service.fill_id(None).unwrap();
    let id = service.id.clone().unwrap();

    let mut again = Service {
        name: Some("some.service.name".into()),
        ..Service::default()
    };
    again.fill_id(None).unwrap();
    assert_eq!(again.id.as_deref(), Some(id.as_str()));

    let mut scoped = again.clone();
    scoped.id = None;
    scoped.fill_id(Some("team-a")).unwrap();
    assert_ne!(scoped.id.as_deref(), Some(id.as_str()));

    let server = MockServer::start();
    let put = server.mock(|when, then| {
        when.method(PUT).path(format!("/services/{id}"));
        then.status(200).json_body(json!({"id": id, "name": "some.service.name"}));
    });
    client(&server).services().create(&service).await.unwrap();
    put.assert();
}

#[tokio::test]
async fn errors_are_classified() {
    let server = MockServer::start();
    for (path, status) in [
        ("/consumers/missing", 404),
        ("/consumers/dupe", 409),
        ("/consumers/locked", 401),
        ("/consumers/forbidden", 403),
        ("/consumers/busy", 429),
        ("/consumers/broken", 500),
        ("/consumers/teapot", 418),
    ] {
        server.mock(move |when, then| {
            when.method(GET).path(path);
            then.status(status)
                .json_body(json!({"message": format!("status {status}")}));
        });
    }
    server.mock(|when, then| {
        when.method(GET).path("/consumers/bare");
        then.status(502).body("<html>bad gateway</html>");
    });

    let client = client(&server);
    let consumers = client.consumers();
    let failure = |key: &'static str| async move { consumers.get(key).await.unwrap_err() };

    let not_found = failure("missing").await;
    assert!(not_found.is_not_found());
    assert_eq!(not_found.message(), "status 404");
    assert!(failure("dupe").await.is_conflict());
    assert!(failure("locked").await.is_unauthorized());
    assert!(failure("forbidden").await.is_forbidden());
    assert_eq!(failure("busy").await.kind(), ErrorKind::RateLimited);
    assert_eq!(failure("broken").await.kind(), ErrorKind::Server);
    assert_eq!(failure("teapot").await.kind(), ErrorKind::Api);

    let bare = failure("bare").await;
    assert_eq!(bare.kind(), ErrorKind::Server);
    assert_eq!(bare.message(), "Bad Gateway");
    assert_eq!(
        bare.raw_body().map(|b| &b[..]),
        Some(&b"<html>bad gateway</html>"[..])
    );

    let unreachable = Client::new("http://127.0.0.1:1").unwrap();
    let err = unreachable.consumers().get("foo").await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.status().is_none());
}

/// A disabled credential endpoint lists as empty only when asked.
#[tokio::test]
async fn not_found_tolerance() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mtls-auths");
        then.status(404).json_body(json!({"message": "Not found"}));
    });

    let client = client(&server);
    assert!(client.mtls_auths().list_all(true).await.unwrap().is_empty());
    assert!(client.mtls_auths().list_all(false).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn cancelled_client_stops_before_next_page() {
    let server = MockServer::start();
    let pages = mock_consumer_pages(&server);

    let token = CancellationToken::new();
    let client = client(&server).with_cancellation(token.clone());
    let mut stream = Box::pin(client.pages::<Consumer>("/consumers", Some(&ListOpt::new().size(1))));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first[0].username.as_deref(), Some("foo1"));
    token.cancel();

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(stream.next().await.is_none());
    pages[0].assert_calls(1);
    pages[1].assert_calls(0);
}
