mod common;

use anyhow::Result;
use axum::http::StatusCode;
use navdesk_api::auth::{generate_jwt, Claims};
use serde_json::json;
use uuid::Uuid;

use common::{tree_ids, TestApp};

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = app.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "navdesk-api");
    Ok(())
}

#[tokio::test]
async fn role_tree_hides_inactive_pages_and_their_submenus() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Users", "Roles", "Grants", "Monitor"]).await;
    let role = Uuid::new_v4();
    app.put(
        &format!("/api/roles/{}/pages", role),
        json!([
            { "page_id": pages[0].id, "display_order": 0 },
            { "page_id": pages[1].id, "display_order": 1 },
            { "page_id": pages[2].id, "parent_page_id": pages[1].id, "display_order": 0 },
            { "page_id": pages[3].id, "display_order": 2 },
        ]),
    )
    .await?;
    app.store.upsert_page(pages[1].clone().inactive()).await;

    let (status, body) = app.get(&format!("/api/roles/{}/tree", role)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        tree_ids(&body["data"]),
        vec![pages[0].id.to_string(), pages[3].id.to_string()]
    );

    // Still assigned, so the page-order view keeps it
    let (_, order) = app.get(&format!("/api/roles/{}/pages", role)).await?;
    assert_eq!(order["data"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn user_navigation_merges_roles() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Home", "Users", "Audit"]).await;
    let (primary, secondary) = (Uuid::new_v4(), Uuid::new_v4());
    let user = Uuid::new_v4();

    app.put(
        &format!("/api/roles/{}/pages", primary),
        json!([
            { "page_id": pages[0].id, "display_order": 0 },
            { "page_id": pages[1].id, "parent_page_id": pages[0].id, "display_order": 0 },
        ]),
    )
    .await?;
    app.put(
        &format!("/api/roles/{}/pages", secondary),
        json!([
            { "page_id": pages[1].id, "display_order": 0 },
            { "page_id": pages[2].id, "display_order": 1 },
        ]),
    )
    .await?;
    app.store.set_roles_for_user(user, vec![primary, secondary]).await;

    let (status, body) = app.get(&format!("/api/users/{}/navigation", user)).await?;
    assert_eq!(status, StatusCode::OK);
    let tree = &body["data"];
    assert_eq!(
        tree_ids(tree),
        vec![pages[0].id.to_string(), pages[2].id.to_string()]
    );
    assert_eq!(tree_ids(&tree[0]["children"]), vec![pages[1].id.to_string()]);
    Ok(())
}

#[tokio::test]
async fn own_navigation_requires_bearer_token() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Home"]).await;
    let role = Uuid::new_v4();
    let user = Uuid::new_v4();
    app.put(
        &format!("/api/roles/{}/pages", role),
        json!([{ "page_id": pages[0].id, "display_order": 0 }]),
    )
    .await?;
    app.store.set_roles_for_user(user, vec![role]).await;

    let (status, body) = app.get("/api/navigation").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get_with_token("/api/navigation", "garbage").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = generate_jwt(&Claims::new(user, "operator"))?;
    let (status, body) = app.get_with_token("/api/navigation", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree_ids(&body["data"]), vec![pages[0].id.to_string()]);
    Ok(())
}

#[tokio::test]
async fn user_navigation_keeps_pages_granted_under_a_relocated_parent() -> Result<()> {
    let app = TestApp::new();
    let pages = app.seed_pages(&["Home", "Reports", "Daily"]).await;
    let (viewer, analyst) = (Uuid::new_v4(), Uuid::new_v4());
    let user = Uuid::new_v4();

    app.put(
        &format!("/api/roles/{}/pages", viewer),
        json!([
            { "page_id": pages[0].id, "display_order": 0 },
            { "page_id": pages[1].id, "parent_page_id": pages[0].id, "display_order": 0 },
        ]),
    )
    .await?;
    app.put(
        &format!("/api/roles/{}/pages", analyst),
        json!([
            { "page_id": pages[1].id, "display_order": 0 },
            { "page_id": pages[2].id, "parent_page_id": pages[1].id, "display_order": 0 },
        ]),
    )
    .await?;
    app.store.set_roles_for_user(user, vec![viewer, analyst]).await;

    let (status, body) = app.get(&format!("/api/users/{}/navigation", user)).await?;
    assert_eq!(status, StatusCode::OK);
    let tree = &body["data"];
    assert_eq!(tree_ids(tree), vec![pages[0].id.to_string()]);
    let reports = &tree[0]["children"];
    assert_eq!(tree_ids(reports), vec![pages[1].id.to_string()]);
    assert_eq!(tree_ids(&reports[0]["children"]), vec![pages[2].id.to_string()]);
    Ok(())
}
