mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn customer_ticket_round_trip() {
    let app = TestApp::new().await;
    let store = app.active_store("helpdesk").await;

    let res = app
        .call(
            Method::POST,
            "/store/tickets",
            None,
            &[("x-tenant-subdomain", "helpdesk")],
            Some(json!({
                "subject": "Where is my parcel?",
                "message": "Ordered last week, nothing yet.",
                "email": "Customer@Example.com",
                "name": "Casey",
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let ticket_id = res.data()["id"].as_str().unwrap().to_string();
    assert_eq!(res.data()["status"], "open");
    assert_eq!(res.data()["requester_email"], "customer@example.com");
    assert_eq!(res.data()["messages"].as_array().unwrap().len(), 1);

    // Store contact is emailed and the dashboard gets a notification
    assert!(app.outbox.messages().iter().any(|m| m.to == "owner@helpdesk.test"));
    let notes = app.get("/api/notifications", &store.admin_token).await;
    assert!(notes.data().as_array().unwrap().iter().any(|n| n["kind"] == "ticket"));

    let list = app.get("/api/tickets?status=open", &store.admin_token).await;
    assert_eq!(list.data().as_array().unwrap().len(), 1);

    // First staff reply moves the ticket along and mails the customer
    let reply = app
        .post(
            &format!("/api/tickets/{}/messages", ticket_id),
            &store.admin_token,
            json!({ "message": "It ships tomorrow." }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.data()["is_staff"], true);
    assert!(app.outbox.messages().iter().any(|m| m.to == "customer@example.com"));

    let thread = app.get(&format!("/api/tickets/{}", ticket_id), &store.admin_token).await;
    assert_eq!(thread.data()["status"], "in_progress");
    assert_eq!(thread.data()["messages"].as_array().unwrap().len(), 2);

    let closed = app
        .put(
            &format!("/api/tickets/{}", ticket_id),
            &store.admin_token,
            json!({ "status": "closed" }),
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.data()["status"], "closed");

    let late = app
        .post(
            &format!("/api/tickets/{}/messages", ticket_id),
            &store.admin_token,
            json!({ "message": "One more thing" }),
        )
        .await;
    assert_eq!(late.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storefront_ticket_requires_contact_address() {
    let app = TestApp::new().await;
    app.active_store("noreply").await;

    let res = app
        .call(
            Method::POST,
            "/store/tickets",
            None,
            &[("x-tenant-subdomain", "noreply")],
            Some(json!({ "subject": "Hi", "message": "Hello", "email": "not-an-address" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["email"].is_string());

    let res = app
        .call(
            Method::POST,
            "/store/tickets",
            None,
            &[("x-tenant-subdomain", "noreply")],
            Some(json!({ "subject": "  ", "message": "Hello", "email": "a@b.co" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_tickets_are_isolated() {
    let app = TestApp::new().await;
    let first = app.active_store("first-desk").await;
    let second = app.active_store("second-desk").await;

    let res = app
        .call(
            Method::POST,
            "/store/tickets",
            None,
            &[("x-tenant-subdomain", "first-desk")],
            Some(json!({ "subject": "Refund", "message": "Please", "email": "buyer@example.com" })),
        )
        .await;
    let ticket_id = res.data()["id"].as_str().unwrap().to_string();

    let other = app.get(&format!("/api/tickets/{}", ticket_id), &second.admin_token).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
    let list = app.get("/api/tickets", &second.admin_token).await;
    assert!(list.data().as_array().unwrap().is_empty());

    let own = app.get(&format!("/api/tickets/{}", ticket_id), &first.admin_token).await;
    assert_eq!(own.status, StatusCode::OK);
}

#[tokio::test]
async fn platform_support_between_store_and_landlord() {
    let app = TestApp::new().await;
    let store = app.active_store("needs-help").await;
    let bystander = app.active_store("bystander").await;
    let landlord = app.landlord_token().await;

    let res = app
        .post(
            "/api/support",
            &store.admin_token,
            json!({ "subject": "Billing question", "message": "Can I switch plans?", "priority": "high" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let ticket_id = res.data()["id"].as_str().unwrap().to_string();
    assert_eq!(res.data()["requester_email"], "admin@needs-help.test");
    assert!(app
        .outbox
        .messages()
        .iter()
        .any(|m| m.to == app.state.config.email.platform_address));

    // Store tickets and platform tickets do not mix
    let store_side = app.get("/api/tickets", &store.admin_token).await;
    assert!(store_side.data().as_array().unwrap().is_empty());
    let hidden = app.get(&format!("/api/support/{}", ticket_id), &bystander.admin_token).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    let inbox = app
        .get(&format!("/api/admin/tickets?tenant_id={}", store.tenant_id), &landlord)
        .await;
    assert_eq!(inbox.status, StatusCode::OK);
    let tickets = inbox.data().as_array().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["priority"], "high");

    let reply = app
        .post(
            &format!("/api/admin/tickets/{}/messages", ticket_id),
            &landlord,
            json!({ "message": "Yes, from the subscription page." }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert!(app.outbox.messages().iter().any(|m| m.to == "admin@needs-help.test"));

    let thread = app.get(&format!("/api/support/{}", ticket_id), &store.admin_token).await;
    assert_eq!(thread.data()["status"], "in_progress");
    let messages = thread.data()["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["is_staff"], true);

    let follow_up = app
        .post(
            &format!("/api/support/{}/messages", ticket_id),
            &store.admin_token,
            json!({ "message": "Thanks!" }),
        )
        .await;
    assert_eq!(follow_up.status, StatusCode::CREATED);
    assert_eq!(follow_up.data()["is_staff"], false);
}
