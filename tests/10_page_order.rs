mod common;

use anyhow::Result;
use axum::http::StatusCode;
use navdesk_api::navigation::AssignmentStore;
use serde_json::json;
use uuid::Uuid;

use common::{entry, TestApp};

#[tokio::test]
async fn page_order_of_unknown_role_is_empty() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get(&format!("/api/roles/{}/pages", Uuid::new_v4())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn save_normalizes_gapped_orders() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Dashboard", "Users", "Roles", "Pages"]).await;
    let role = Uuid::new_v4();
    let uri = format!("/api/roles/{}/pages", role);

    let (status, body) = app
        .put(
            &uri,
            json!([
                { "page_id": pages[1].id, "parent_page_id": null, "display_order": 10 },
                { "page_id": pages[0].id, "display_order": 3 },
                { "page_id": pages[2].id, "parent_page_id": pages[1].id, "display_order": 7 },
                { "page_id": pages[3].id, "parent_page_id": pages[1].id, "display_order": 2 },
            ]),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, read) = app.get(&uri).await?;
    assert_eq!(status, StatusCode::OK);
    let saved = &read["data"];
    assert_eq!(saved, &body["data"]);
    assert_eq!(entry(saved, &pages[0])["display_order"], 0);
    assert_eq!(entry(saved, &pages[1])["display_order"], 1);
    assert_eq!(entry(saved, &pages[3])["display_order"], 0);
    assert_eq!(entry(saved, &pages[2])["display_order"], 1);
    assert_eq!(entry(saved, &pages[2])["parent_page_id"], pages[1].id.to_string());
    Ok(())
}

#[tokio::test]
async fn save_rejects_cycles_without_persisting() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["A", "B"]).await;
    let role = Uuid::new_v4();
    let uri = format!("/api/roles/{}/pages", role);

    let (status, body) = app
        .put(
            &uri,
            json!([
                { "page_id": pages[0].id, "parent_page_id": pages[1].id, "display_order": 0 },
                { "page_id": pages[1].id, "parent_page_id": pages[0].id, "display_order": 0 },
            ]),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");
    assert!(body["field_errors"][pages[0].id.to_string()].is_string());

    assert!(app.store.get_by_role(role).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn save_rejects_unknown_and_duplicate_pages() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Home"]).await;
    let stranger = Uuid::new_v4();
    let uri = format!("/api/roles/{}/pages", Uuid::new_v4());

    let (status, body) = app
        .put(
            &uri,
            json!([
                { "page_id": pages[0].id, "display_order": 0 },
                { "page_id": pages[0].id, "display_order": 1 },
                { "page_id": stranger, "parent_page_id": pages[0].id, "display_order": 0 },
            ]),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["field_errors"].as_object().expect("field errors");
    assert!(errors.contains_key(&pages[0].id.to_string()));
    assert!(errors.contains_key(&stranger.to_string()));
    Ok(())
}

#[tokio::test]
async fn read_heals_rows_left_by_upstream_deletes() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Reports", "Daily", "Weekly"]).await;
    let role = Uuid::new_v4();
    let uri = format!("/api/roles/{}/pages", role);

    app.put(
        &uri,
        json!([
            { "page_id": pages[0].id, "display_order": 0 },
            { "page_id": pages[1].id, "parent_page_id": pages[0].id, "display_order": 0 },
            { "page_id": pages[2].id, "display_order": 1 },
        ]),
    )
    .await?;
    app.store.delete_page(pages[0].id).await;

    let (_, read) = app.get(&uri).await?;
    let saved = &read["data"];
    assert_eq!(saved.as_array().map(Vec::len), Some(2));
    assert_eq!(entry(saved, &pages[1])["parent_page_id"], json!(null));
    assert_eq!(entry(saved, &pages[1])["display_order"], 0);
    assert_eq!(entry(saved, &pages[2])["display_order"], 1);
    Ok(())
}
