use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use blockpress::{
    app_state::AppState, cms_interface::create_cms_router,
    infrastructure::sqlite_database::SqliteDatabase,
};

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        Self::with_database(db)
    }

    fn with_database(db: SqliteDatabase) -> Self {
        let state = AppState::with_database(Arc::new(db), 16);
        Self {
            router: create_cms_router(state),
        }
    }

    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, value) = self.request("POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, value);
        value
    }

    async fn published_page(&self, slug: &str) -> i64 {
        let page = self
            .create("/admin/pages", json!({"title": slug, "slug": slug}))
            .await;
        let id = page["id"].as_i64().unwrap();
        let (status, _) = self
            .request("POST", &format!("/admin/pages/{}/publish", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    async fn block(&self, page_id: i64, slug: &str) -> i64 {
        let block = self
            .create(
                "/blocks",
                json!({"title": slug, "slug": slug, "page_id": page_id}),
            )
            .await;
        block["id"].as_i64().unwrap()
    }

    async fn field(&self, block_id: i64, name: &str, field_type: &str, extra: Value) -> i64 {
        let mut body = json!({"block_id": block_id, "name": name, "type": field_type});
        if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
            body.extend(extra);
        }
        let field = self.create("/fields", body).await;
        field["id"].as_i64().unwrap()
    }

    async fn save(&self, page_id: i64, slug: &str, data: Value) -> Value {
        let (status, document) = self
            .request(
                "POST",
                "/documents/save-page",
                Some(json!({"page_id": page_id, "slug": slug, "data": data})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "save failed: {}", document);
        document
    }
}

#[tokio::test]
async fn test_publish_fill_and_reconciled_delete() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    let heading = app.field(hero, "heading", "text", json!({})).await;

    app.save(page_id, "home", json!({"hero": {"heading": "Welcome"}}))
        .await;

    let (status, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"], json!({"hero": {"heading": "Welcome"}}));
    assert_eq!(page["structure"][0]["slug"], json!("hero"));
    assert_eq!(page["structure"][0]["fields"][0]["name"], json!("heading"));

    let (status, deletion) = app
        .request("DELETE", &format!("/fields/{}", heading), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deletion["value_removed"], json!(true));

    let (_, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(page["content"], json!({"hero": {}}));
    assert_eq!(page["structure"][0]["fields"], json!([]));
}

#[tokio::test]
async fn test_default_seeded_value_is_reconciled_on_field_delete() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    let heading = app
        .field(hero, "heading", "text", json!({"default_value": "Welcome"}))
        .await;

    let document = app.save(page_id, "home", json!({})).await;
    assert_eq!(document["data"], json!({"hero": {"heading": "Welcome"}}));

    let (status, _) = app
        .request("DELETE", &format!("/fields/{}", heading), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, documents) = app
        .request("GET", &format!("/documents?page_id={}", page_id), None)
        .await;
    assert_eq!(documents[0]["data"], json!({"hero": {}}));

    let (_, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(page["content"], json!({"hero": {}}));
}

#[tokio::test]
async fn test_save_page_without_slug_or_data() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "heading", "text", json!({"default_value": "Welcome"}))
        .await;

    let (status, document) = app
        .request(
            "POST",
            "/documents/save-page",
            Some(json!({"page_id": page_id, "data": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "save failed: {}", document);
    assert_eq!(document["slug"], json!("home"));
    assert_eq!(document["data"], json!({"hero": {"heading": "Welcome"}}));
}

#[tokio::test]
async fn test_richtext_content_is_not_mistaken_for_media() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "body", "richtext", json!({})).await;

    let body = json!({"blocks": [{"id": "sAmJ3", "data": {"text": "hello"}}]});
    app.save(page_id, "home", json!({"hero": {"body": body.clone()}}))
        .await;

    let (status, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"]["hero"]["body"], body);
}

#[tokio::test]
async fn test_drafts_are_invisible() {
    let app = TestApp::new().await;
    app.create("/admin/pages", json!({"title": "Draft", "slug": "draft"}))
        .await;

    let (status, body) = app.request("GET", "/pages/draft", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(404));

    let (status, _) = app.request("GET", "/pages/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_block_slug_is_a_conflict() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    app.block(page_id, "hero").await;

    let (status, body) = app
        .request(
            "POST",
            "/blocks",
            Some(json!({"title": "Hero again", "slug": "hero", "page_id": page_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("hero"));
}

#[tokio::test]
async fn test_unknown_field_type_is_rejected() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;

    let (status, body) = app
        .request(
            "POST",
            "/fields",
            Some(json!({"block_id": hero, "name": "mood", "type": "emoji"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["type"][0]
        .as_str()
        .unwrap()
        .contains("emoji"));
}

#[tokio::test]
async fn test_missing_values_fall_back_to_defaults() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "title", "text", json!({"default_value": "Untitled"}))
        .await;
    app.field(hero, "subtitle", "text", json!({})).await;

    let (status, defaults) = app
        .request("GET", "/fields/by-block/hero?page_slug=home", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults, json!({"title": "Untitled", "subtitle": null}));

    let document = app
        .save(page_id, "home", json!({"hero": {"subtitle": "Hi"}}))
        .await;
    assert_eq!(
        document["data"],
        json!({"hero": {"title": "Untitled", "subtitle": "Hi"}})
    );
}

#[tokio::test]
async fn test_reconciliation_keeps_sibling_values() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "title", "text", json!({})).await;
    let subtitle = app.field(hero, "subtitle", "text", json!({})).await;
    app.save(page_id, "home", json!({"hero": {"title": "x", "subtitle": "y"}}))
        .await;

    let (status, _) = app
        .request("DELETE", &format!("/fields/{}", subtitle), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, documents) = app
        .request("GET", &format!("/documents?page_id={}", page_id), None)
        .await;
    assert_eq!(documents[0]["data"], json!({"hero": {"title": "x"}}));

    // Gone for good, not just trashed
    let (status, _) = app
        .request("GET", &format!("/fields/{}?with_trashed=true", subtitle), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dangling_media_hydrates_to_null() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "image", "upload", json!({})).await;
    app.field(hero, "cover", "upload", json!({})).await;

    let media = app
        .create(
            "/media",
            json!({"url": "/storage/cover.jpg", "width": 1600, "height": 900}),
        )
        .await;
    let media_id = media["id"].as_i64().unwrap();
    let doomed = app.create("/media", json!({"url": "/storage/old.jpg"})).await;
    let doomed_id = doomed["id"].as_i64().unwrap();

    app.save(
        page_id,
        "home",
        json!({"hero": {"image": doomed_id, "cover": media_id}}),
    )
    .await;
    let (status, _) = app
        .request("DELETE", &format!("/media/{}", doomed_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"]["hero"]["image"], Value::Null);
    assert_eq!(
        page["content"]["hero"]["cover"]["url"],
        json!("/storage/cover.jpg")
    );
    assert_eq!(page["content"]["hero"]["cover"]["width"], json!(1600));

    // The stored document still holds the raw reference
    let (_, documents) = app
        .request("GET", &format!("/documents?page_id={}", page_id), None)
        .await;
    assert_eq!(documents[0]["data"]["hero"]["cover"], json!(media_id));
}

#[tokio::test]
async fn test_block_force_delete_leaves_document_subtree() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;
    app.field(hero, "heading", "text", json!({})).await;
    app.save(page_id, "home", json!({"hero": {"heading": "Welcome"}}))
        .await;

    let (status, _) = app
        .request("DELETE", &format!("/blocks/{}/force", hero), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(page["structure"], json!([]));
    assert_eq!(page["content"], json!({"hero": {"heading": "Welcome"}}));
}

#[tokio::test]
async fn test_trash_and_restore_flow() {
    let app = TestApp::new().await;
    let page_id = app.published_page("home").await;
    let hero = app.block(page_id, "hero").await;

    let (status, _) = app
        .request("DELETE", &format!("/blocks/{}", hero), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, blocks) = app.request("GET", "/blocks?page_slug=home", None).await;
    assert_eq!(blocks, json!([]));

    let (status, restored) = app
        .request("POST", &format!("/blocks/{}/restore", hero), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["deleted_at"], Value::Null);

    let (status, _) = app
        .request("DELETE", &format!("/admin/pages/{}", page_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.request("POST", &format!("/admin/pages/{}/restore", page_id), None)
        .await;
    let (status, _) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_seo_is_part_of_the_public_payload() {
    let app = TestApp::new().await;
    let page_id = app.published_page("about").await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/admin/pages/{}/seo", page_id),
            Some(json!({"title": "About us", "description": "Who we are"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = app.request("GET", "/pages/about", None).await;
    assert_eq!(page["seo"]["title"], json!("About us"));
    assert_eq!(page["content"], Value::Null);
}

#[tokio::test]
async fn test_documents_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("cms.db").display());

    {
        let app = TestApp::with_database(SqliteDatabase::connect(&url, 2).await.unwrap());
        let page_id = app.published_page("home").await;
        let hero = app.block(page_id, "hero").await;
        app.field(hero, "heading", "text", json!({})).await;
        app.save(page_id, "home", json!({"hero": {"heading": "Persisted"}}))
            .await;
    }

    let app = TestApp::with_database(SqliteDatabase::connect(&url, 2).await.unwrap());
    let (status, page) = app.request("GET", "/pages/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"]["hero"]["heading"], json!("Persisted"));
}
