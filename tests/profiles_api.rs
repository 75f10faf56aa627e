//! Profile lifecycle tests: identity-keyed upsert, duplicate-signup
//! collapsing, access control and the seller upgrade path.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{signup_user, TestApp};

#[tokio::test]
async fn upsert_creates_then_updates() {
    let app = TestApp::new();
    let token = app.token("user-1", "user@test.local");

    let (status, body) = app
        .post(
            "/auth/user",
            Some(&token),
            json!({ "display_name": "Pat" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["firebase_uid"], "user-1");
    assert_eq!(body["data"]["email"], "user@test.local");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["display_name"], "Pat");

    let (status, body) = app
        .post(
            "/auth/user",
            Some(&token),
            json!({ "display_name": "Pat Q." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "Pat Q.");
    assert_eq!(app.profiles.profile_count(), 1);
}

#[tokio::test]
async fn seller_signup_records_seller_info() {
    let app = TestApp::new();
    let token = app.token("seller-1", "seller@test.local");

    let (status, body) = app
        .post(
            "/auth/user",
            Some(&token),
            json!({
                "role": "seller",
                "seller_info": { "company_name": "Test Events LLC" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "seller");
    assert_eq!(body["data"]["seller_info"]["company_name"], "Test Events LLC");
}

#[tokio::test]
async fn admin_role_cannot_be_self_assigned() {
    let app = TestApp::new();
    let token = app.token("user-1", "user@test.local");

    let (status, body) = app
        .post("/auth/user", Some(&token), json!({ "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(app.profiles.profile_count(), 0);
}

#[tokio::test]
async fn concurrent_signups_collapse_to_one_profile() {
    let app = TestApp::new();
    let token = app.token("user-1", "user@test.local");

    // A sign-in auto-create racing a seller signup for the same identity.
    let plain = app.post("/auth/user", Some(&token), json!({}));
    let seller = app.post(
        "/auth/user",
        Some(&token),
        json!({
            "role": "seller",
            "seller_info": { "company_name": "Test Events LLC" }
        }),
    );
    let ((s1, _), (s2, _)) = tokio::join!(plain, seller);
    assert!(s1.is_success());
    assert!(s2.is_success());

    assert_eq!(app.profiles.profile_count(), 1);
    let (_, body) = app.get("/auth/profile/user-1", Some(&token)).await;
    // Whichever request ran second saw the existing profile; the seller
    // request either created it or upgraded it.
    assert_eq!(body["data"]["role"], "seller");
}

#[tokio::test]
async fn profiles_are_private_to_their_identity() {
    let app = TestApp::new();
    let alice = signup_user(&app, "user-1", "alice@test.local").await;
    signup_user(&app, "user-2", "bob@test.local").await;

    let (status, body) = app.get("/auth/profile/user-1", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@test.local");

    let (status, _) = app.get("/auth/profile/user-2", Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(
            "/auth/profile/user-2",
            Some(&alice),
            json!({ "display_name": "hijack" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn upgrade_to_seller_changes_role_in_place() {
    let app = TestApp::new();
    let token = signup_user(&app, "user-1", "user@test.local").await;

    let (status, body) = app
        .put(
            "/auth/upgrade-to-seller/user-1",
            Some(&token),
            json!({ "company_name": "Fresh Seller Co" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "seller");
    assert_eq!(body["data"]["seller_info"]["company_name"], "Fresh Seller Co");
    assert_eq!(app.profiles.profile_count(), 1);
}

#[tokio::test]
async fn upgrade_without_a_profile_is_not_found() {
    let app = TestApp::new();
    let token = app.token("ghost", "ghost@test.local");

    let (status, _) = app
        .put(
            "/auth/upgrade-to-seller/ghost",
            Some(&token),
            json!({ "company_name": "Nobody Inc" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_keeps_unset_fields() {
    let app = TestApp::new();
    let token = app.token("user-1", "user@test.local");
    app.post(
        "/auth/user",
        Some(&token),
        json!({ "display_name": "Pat", "profile_picture": "https://cdn.test.local/p.png" }),
    )
    .await;

    let (status, body) = app
        .put(
            "/auth/profile/user-1",
            Some(&token),
            json!({ "display_name": "Patricia" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "Patricia");
    assert_eq!(
        body["data"]["profile_picture"],
        "https://cdn.test.local/p.png"
    );
}
