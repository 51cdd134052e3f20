mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn tokens_are_required_and_checked() {
    let app = TestApp::new().await;

    let res = app.call(Method::GET, "/api/dashboard", None, &[], None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], "UNAUTHORIZED");

    let res = app.get("/api/dashboard", "not-a-jwt").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call(Method::GET, "/api/admin/tenants", None, &[("authorization", "Basic abc")], None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tiers_do_not_cross() {
    let app = TestApp::new().await;
    let store = app.active_store("tiered").await;
    let landlord = app.landlord_token().await;

    // Store accounts never reach the landlord tier
    let res = app.get("/api/admin/tenants", &store.admin_token).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.get("/api/admin/plans", &store.admin_token).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // The landlord has no tenant, so the dashboard tier is closed to it
    let res = app.get("/api/products", &landlord).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Session routes are shared
    let res = app.get("/api/auth/whoami", &store.admin_token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["user"]["role"], "tenant_admin");
    assert_eq!(res.data()["tenant"]["subdomain"], "tiered");
    assert!(res.data()["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn suspended_store_loses_dashboard() {
    let app = TestApp::new().await;
    let store = app.active_store("paused").await;
    let landlord = app.landlord_token().await;

    let res = app
        .put(
            &format!("/api/admin/tenants/{}", store.tenant_id),
            &landlord,
            json!({ "status": "suspended" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = app.get("/api/dashboard", &store.admin_token).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app
        .call(Method::GET, "/store/products", None, &[("x-tenant-subdomain", "paused")], None)
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn subdomains_are_validated_on_provisioning() {
    let app = TestApp::new().await;
    app.active_store("taken").await;
    let landlord = app.landlord_token().await;

    let provision = |subdomain: &'static str| {
        json!({
            "name": "Another",
            "subdomain": subdomain,
            "contact_email": "someone@another.test",
            "admin_password": "admin-password",
        })
    };

    let res = app.post("/api/admin/tenants", &landlord, provision("taken")).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.post("/api/admin/tenants", &landlord, provision("admin")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.post("/api/admin/tenants", &landlord, provision("Bad_Name!")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn team_management_is_admin_only() {
    let app = TestApp::new().await;
    let store = app.active_store("team").await;

    let res = app
        .post(
            "/api/users",
            &store.admin_token,
            json!({ "email": "clerk@team.test", "name": "Clerk", "password": "clerk-password", "role": "tenant_staff" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let clerk_id = res.data()["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/users",
            &store.admin_token,
            json!({ "email": "boss@team.test", "name": "Boss", "password": "boss-password", "role": "landlord" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/users",
            &store.admin_token,
            json!({ "email": "clerk@team.test", "name": "Again", "password": "clerk-password", "role": "tenant_staff" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // Staff can run the shop but not the team
    let clerk = app.token("clerk@team.test", "clerk-password").await;
    assert_eq!(app.get("/api/products", &clerk).await.status, StatusCode::OK);
    assert_eq!(app.get("/api/users", &clerk).await.status, StatusCode::FORBIDDEN);

    let team = app.get("/api/users", &store.admin_token).await;
    assert_eq!(team.data().as_array().unwrap().len(), 2);

    // Deactivation takes effect on the next request, token or not
    let res = app
        .call(Method::DELETE, &format!("/api/users/{}", clerk_id), Some(&store.admin_token), &[], None)
        .await;
    assert!(res.status.is_success(), "{}", res.body);
    assert_eq!(app.get("/api/products", &clerk).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("clerk@team.test", "clerk-password").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let app = TestApp::new().await;
    let store = app.active_store("selfie").await;
    let whoami = app.get("/api/auth/whoami", &store.admin_token).await;
    let me = whoami.data()["user"]["id"].as_str().unwrap().to_string();

    let res = app
        .put(&format!("/api/users/{}", me), &store.admin_token, json!({ "role": "tenant_staff" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .put(&format!("/api/users/{}", me), &store.admin_token, json!({ "is_active": false }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .put(&format!("/api/users/{}", me), &store.admin_token, json!({ "name": "Renamed" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "Renamed");
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let app = TestApp::new().await;
    let store = app.active_store("secure").await;

    let res = app
        .put(
            "/api/auth/password",
            &store.admin_token,
            json!({ "current_password": "wrong-password", "new_password": "fresh-password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .put(
            "/api/auth/password",
            &store.admin_token,
            json!({ "current_password": "admin-password", "new_password": "short" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .put(
            "/api/auth/password",
            &store.admin_token,
            json!({ "current_password": "admin-password", "new_password": "fresh-password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    assert_eq!(app.login("admin@secure.test", "admin-password").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("admin@secure.test", "fresh-password").await.status, StatusCode::OK);
}

#[tokio::test]
async fn landlord_account_administration() {
    let app = TestApp::new().await;
    let first = app.active_store("acct-one").await;
    app.active_store("acct-two").await;
    let landlord = app.landlord_token().await;

    let res = app
        .get(&format!("/api/admin/users?tenant_id={}", first.tenant_id), &landlord)
        .await;
    let users = res.data().as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "admin@acct-one.test");
    let admin_id = users[0]["id"].as_str().unwrap().to_string();

    let res = app
        .put(&format!("/api/admin/users/{}", admin_id), &landlord, json!({ "is_active": false }))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(app.get("/api/dashboard", &first.admin_token).await.status, StatusCode::UNAUTHORIZED);

    let whoami = app.get("/api/auth/whoami", &landlord).await;
    let me = whoami.data()["user"]["id"].as_str().unwrap().to_string();
    let res = app
        .put(&format!("/api/admin/users/{}", me), &landlord, json!({ "is_active": false }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notifications_can_be_marked_read() {
    let app = TestApp::new().await;
    let store = app.active_store("alerts").await;

    for subject in ["One", "Two"] {
        app.call(
            Method::POST,
            "/store/tickets",
            None,
            &[("x-tenant-subdomain", "alerts")],
            Some(json!({ "subject": subject, "message": "hello", "email": "c@example.com" })),
        )
        .await;
    }

    let unread = app.get("/api/notifications?unread=true", &store.admin_token).await;
    let items = unread.data().as_array().unwrap().clone();
    assert!(items.len() >= 2);

    let id = items[0]["id"].as_str().unwrap();
    let res = app
        .call(
            Method::POST,
            &format!("/api/notifications/{}/read", id),
            Some(&store.admin_token),
            &[],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let after = app.get("/api/notifications?unread=true", &store.admin_token).await;
    assert_eq!(after.data().as_array().unwrap().len(), items.len() - 1);

    let res = app
        .call(Method::POST, "/api/notifications/read-all", Some(&store.admin_token), &[], None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["updated"], (items.len() - 1) as u64);

    let after = app.get("/api/notifications?unread=true", &store.admin_token).await;
    assert!(after.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn custom_domains_need_a_provider() {
    let app = TestApp::new().await;
    let store = app.active_store("no-dns").await;

    let res = app.get("/api/domain", &store.admin_token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["domain"].is_null());

    let res = app
        .put("/api/domain", &store.admin_token, json!({ "domain": "shop.example.com" }))
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    let res = app
        .put("/api/domain", &store.admin_token, json!({ "domain": "no-dns.localhost" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
