//! End-to-end behavior of the assembled router, driven without a socket.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

use farmerice::config::Environment;
use farmerice::security::rate_limit::RATE_LIMIT_MESSAGE;

mod common;

use common::{body_bytes, body_json, files_under, multipart_request, spawn_app, spawn_app_with};

#[tokio::test]
async fn health_reports_success() {
    let app = spawn_app().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "FarmeRice API is running");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn readiness_pings_the_store() {
    let app = spawn_app().await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "success");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let app = spawn_app().await;

    for path in ["/nope", "/api/nope", "/api/products/a/b"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], format!("Not Found - {path}"));
    }
}

#[tokio::test]
async fn product_crud_flow() {
    let app = spawn_app().await;

    let response = app
        .send_json(
            "POST",
            "/api/products",
            json!({ "name": "Jasmine Rice", "price": 45, "category": "rice" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["name"], "Jasmine Rice");
    assert!(created["data"]["createdAt"].is_string());

    let response = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["price"], 45);

    let response = app
        .send_json("PUT", &format!("/api/products/{id}"), json!({ "price": 50 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["price"], 50);
    assert_eq!(updated["data"]["name"], "Jasmine Rice");

    let response = app.get("/api/products?category=rice").await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["page"], 1);
    assert_eq!(listing["data"][0]["id"], id.as_str());

    let response = app
        .send(
            Request::delete(format!("/api/products/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Product deleted");

    let response = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Product not found");
}

#[tokio::test]
async fn collections_are_isolated() {
    let app = spawn_app().await;

    app.send_json("POST", "/api/orders", json!({ "total": 10 }))
        .await;

    let listing = body_json(app.get("/api/products").await).await;
    assert_eq!(listing["total"], 0);
    let listing = body_json(app.get("/api/orders").await).await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::post("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let response = app.send_json("POST", "/api/reviews", json!([1, 2])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Request body must be a JSON object"
    );

    let response = app.get("/api/reviews?limit=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_is_not_implemented() {
    let app = spawn_app().await;

    let response = app
        .send_json("POST", "/api/auth/login", json!({ "email": "a@b.c" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = spawn_app().await;

    let response = app.get("/health").await;
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::get("/health")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn api_is_rate_limited_but_health_is_not() {
    let app = spawn_app_with(|config| config.rate_limit.max_requests = 2).await;

    for _ in 0..2 {
        let response = app.get("/api/products").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("ratelimit-remaining"));
    }

    let response = app.get("/api/products").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], RATE_LIMIT_MESSAGE);

    assert_eq!(app.get("/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_upload_image_gets_placeholder() {
    let app = spawn_app().await;

    let response = app.get("/uploads/products/missing.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("<svg"));

    let response = app.get("/uploads/missing.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn existing_upload_is_served_cross_origin() {
    let app = spawn_app().await;
    std::fs::write(app.uploads_dir().join("notes.txt"), "hello farm").unwrap();

    let response = app.get("/uploads/notes.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        response.headers()["cross-origin-resource-policy"],
        "cross-origin"
    );
    assert_eq!(body_bytes(response).await, b"hello farm");
}

#[tokio::test]
async fn upload_stores_allowed_files_only() {
    let app = spawn_app().await;
    let uri = "/api/upload?folder=products";

    let response = app
        .send(multipart_request(uri, &[("image", Some("script.exe"), "fake-bytes".as_bytes())]))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = app
        .send(multipart_request(uri, &[("image", Some("rice.PNG"), "fake-bytes".as_bytes())]))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let url = body["data"][0]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/products/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["data"][0]["originalName"], "rice.PNG");

    let response = app.get(&url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"fake-bytes");

    let stored = url.trim_start_matches("/uploads/");
    let response = app
        .send(
            Request::delete(format!("/api/upload/{stored}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.uploads_dir().join(stored).exists());
}

#[tokio::test]
async fn rejected_upload_leaves_nothing_on_disk() {
    let app = spawn_app().await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            &[
                ("image", Some("ok.png"), "png-bytes".as_bytes()),
                ("image", Some("bad.exe"), "exe-bytes".as_bytes()),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(files_under(&app.uploads_dir()).is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = spawn_app_with(|config| config.uploads.max_file_bytes = 8).await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            &[
                ("image", Some("small.png"), "tiny".as_bytes()),
                ("image", Some("large.png"), "far more than eight bytes".as_bytes()),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["success"], false);
    assert!(files_under(&app.uploads_dir()).is_empty());
}

#[tokio::test]
async fn upload_request_errors() {
    let app = spawn_app().await;

    let response = app
        .send(multipart_request(
            "/api/upload?folder=../etc",
            &[("image", Some("rice.png"), "bytes".as_bytes())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "invalid folder '../etc'");

    let response = app
        .send(multipart_request(
            "/api/upload",
            &[("caption", None, "just text".as_bytes())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded");

    let response = app
        .send(
            Request::delete("/api/upload/products/missing.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "File not found");
}

#[tokio::test]
async fn unsupported_methods_return_json_404() {
    let app = spawn_app().await;

    for (method, path) in [
        ("PATCH", "/api/products/x"),
        ("PATCH", "/api/products"),
        ("GET", "/api/upload"),
        ("POST", "/health"),
    ] {
        let response = app
            .send(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {path}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], format!("Not Found - {path}"));
    }
}

#[tokio::test]
async fn boolean_filters_match() {
    let app = spawn_app().await;

    app.send_json("POST", "/api/products", json!({ "name": "Black rice", "active": true }))
        .await;
    app.send_json("POST", "/api/products", json!({ "name": "Old rice", "active": false }))
        .await;

    let listing = body_json(app.get("/api/products?active=true").await).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["data"][0]["name"], "Black rice");
}

#[tokio::test]
async fn pages_beyond_range_are_rejected() {
    let app = spawn_app().await;
    app.send_json("POST", "/api/products", json!({ "name": "Jasmine Rice" }))
        .await;

    let response = app.get("/api/products?page=1000000000000000000").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "page is out of range");

    let listing = body_json(app.get("/api/products?page=5").await).await;
    assert_eq!(listing["count"], 0);
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn public_assets_are_served_cross_origin() {
    let app = spawn_app().await;
    std::fs::write(app.public_dir().join("terms.txt"), "be kind to farmers").unwrap();

    let response = app.get("/public/terms.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        response.headers()["cross-origin-resource-policy"],
        "cross-origin"
    );
    assert_eq!(body_bytes(response).await, b"be kind to farmers");

    // No placeholder outside of uploads.
    for path in ["/public/missing.txt", "/public/missing.png"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body_json(response).await["message"], format!("Not Found - {path}"));
    }
}

#[tokio::test]
async fn responses_are_gzipped_when_accepted() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::get("/health")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let plain = app.get("/health").await;
    assert!(!plain.headers().contains_key(header::CONTENT_ENCODING));
}

#[tokio::test]
async fn readiness_fails_once_store_is_closed() {
    let app = spawn_app().await;
    app.store.close().await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Service Unavailable");

    // Liveness does not depend on the store.
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn production_serves_frontend_for_unknown_paths() {
    let frontend = tempfile::tempdir().unwrap();
    std::fs::write(
        frontend.path().join("index.html"),
        "<html><body>FarmeRice</body></html>",
    )
    .unwrap();
    let frontend_dir = frontend.path().to_path_buf();

    let app = spawn_app_with(move |config| {
        config.environment = Environment::Production;
        config.static_files.frontend_dir = Some(frontend_dir);
    })
    .await;

    let response = app.get("/shop/products/42").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("FarmeRice"));

    let response = app.get("/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Not Found - /api/nope");
}

#[tokio::test]
async fn production_without_frontend_index_keeps_json_404() {
    let frontend = tempfile::tempdir().unwrap();
    std::fs::write(frontend.path().join("app.js"), "console.log('farm')").unwrap();
    let frontend_dir = frontend.path().to_path_buf();

    let app = spawn_app_with(move |config| {
        config.environment = Environment::Production;
        config.static_files.frontend_dir = Some(frontend_dir);
    })
    .await;

    let response = app.get("/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/shop").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Not Found - /shop");
}
