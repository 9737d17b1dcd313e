mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::*;
use serde_json::Value;

fn ids(listing: &[Value]) -> Vec<i64> {
    listing.iter().map(|f| f["id"].as_i64().unwrap()).collect()
}

fn can_download(listing: &[Value], id: i64) -> bool {
    listing
        .iter()
        .find(|f| f["id"] == id)
        .and_then(|f| f["canDownload"].as_bool())
        .unwrap()
}

#[tokio::test]
async fn test_list_requires_identity() {
    let app = setup(true).await;
    let server = app.server();

    let response = server.get("/api/files").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_annotates_instead_of_filtering() {
    let app = setup(true).await;
    let server = app.server();

    let response = server
        .get("/api/files")
        .authorization_bearer(app.token_for(COLLEAGUE))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let listing: Vec<Value> = response.json();
    // Newest first
    assert_eq!(
        ids(&listing),
        vec![PROJECT_FILE, PUBLIC_CYRILLIC_FILE, PUBLIC_MISSING_FILE, DEPARTMENT_FILE, PERSONAL_FILE]
    );

    assert!(!can_download(&listing, PERSONAL_FILE));
    assert!(can_download(&listing, DEPARTMENT_FILE));
    assert!(can_download(&listing, PUBLIC_MISSING_FILE));
    assert!(can_download(&listing, PUBLIC_CYRILLIC_FILE));
    assert!(!can_download(&listing, PROJECT_FILE));
}

#[tokio::test]
async fn test_list_flags_depend_on_requester() {
    let app = setup(true).await;
    let server = app.server();

    let owner: Vec<Value> = server
        .get("/api/files")
        .authorization_bearer(app.token_for(OWNER))
        .await
        .json();
    assert!(can_download(&owner, PERSONAL_FILE));
    assert!(can_download(&owner, DEPARTMENT_FILE));

    let outsider: Vec<Value> = server
        .get("/api/files")
        .authorization_bearer(app.token_for(NO_DEPARTMENT))
        .await
        .json();
    assert!(!can_download(&outsider, PERSONAL_FILE));
    assert!(!can_download(&outsider, DEPARTMENT_FILE));
    assert!(!can_download(&outsider, PROJECT_FILE));
    assert!(can_download(&outsider, PUBLIC_CYRILLIC_FILE));
}

#[tokio::test]
async fn test_list_is_ordered_by_created_at_descending() {
    let app = setup(true).await;
    let server = app.server();

    let listing: Vec<Value> = server
        .get("/api/files")
        .authorization_bearer(app.token_for(OWNER))
        .await
        .json();

    let created: Vec<DateTime<Utc>> = listing
        .iter()
        .map(|f| f["createdAt"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(created.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let app = setup(true).await;
    let server = app.server();
    let token = app.token_for(COLLEAGUE);

    let first: Vec<Value> = server.get("/api/files").authorization_bearer(&token).await.json();
    let second: Vec<Value> = server.get("/api/files").authorization_bearer(&token).await.json();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_list_filters() {
    let app = setup(true).await;
    let server = app.server();
    let token = app.token_for(OWNER);

    let by_owner: Vec<Value> = server
        .get("/api/files")
        .add_query_param("ownerId", OTHER_DEPARTMENT)
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(ids(&by_owner), vec![PROJECT_FILE, PUBLIC_CYRILLIC_FILE]);

    // Department filter applies to the owner's department
    let by_department: Vec<Value> = server
        .get("/api/files")
        .add_query_param("departmentId", WARD)
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(ids(&by_department), vec![PUBLIC_MISSING_FILE, DEPARTMENT_FILE, PERSONAL_FILE]);

    let by_project: Vec<Value> = server
        .get("/api/files")
        .add_query_param("projectId", 1)
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(ids(&by_project), vec![PROJECT_FILE]);
    assert!(!can_download(&by_project, PROJECT_FILE));
}

#[tokio::test]
async fn test_list_row_shape() {
    let app = setup(true).await;
    let server = app.server();

    let listing: Vec<Value> = server
        .get("/api/files")
        .add_query_param("ownerId", OWNER)
        .authorization_bearer(app.token_for(OWNER))
        .await
        .json();
    let personal = listing.iter().find(|f| f["id"] == PERSONAL_FILE).unwrap();

    assert_eq!(personal["name"], "Orders.txt");
    assert_eq!(personal["mimeType"], "text/plain");
    assert_eq!(personal["accessLevel"], "personal");
    assert_eq!(personal["ownerId"], OWNER);
    assert_eq!(personal["ownerDepartmentId"], WARD);
    assert_eq!(personal["path"], "files/WARD/personal.txt");
    assert_eq!(personal["canDownload"], true);
    assert!(personal["projectId"].is_null());
    assert!(personal["project"].is_null());

    let owner = &personal["owner"];
    assert_eq!(owner["id"], OWNER);
    assert_eq!(owner["fullName"], format!("User {}", OWNER));
    assert_eq!(owner["jobTitle"], "Officer");
    assert_eq!(owner["departmentId"], WARD);
    assert_eq!(owner["department"]["name"], "Ward service");
    assert_eq!(owner["department"]["code"], "WARD");
    assert!(owner.get("email").is_none());
    assert!(owner.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_list_row_carries_project_summary() {
    let app = setup(true).await;
    let server = app.server();

    let listing: Vec<Value> = server
        .get("/api/files")
        .add_query_param("projectId", 1)
        .authorization_bearer(app.token_for(OTHER_DEPARTMENT))
        .await
        .json();
    let plan = &listing[0];

    assert_eq!(plan["id"], PROJECT_FILE);
    assert_eq!(plan["projectId"], 1);
    assert_eq!(plan["project"]["id"], 1);
    assert_eq!(plan["project"]["name"], "Video surveillance");
    assert_eq!(plan["project"]["code"], "CCTV");
    assert_eq!(plan["owner"]["department"]["code"], "CCTV");
    assert_eq!(plan["canDownload"], true);
}

#[tokio::test]
async fn test_list_empty_filters_are_ignored() {
    let app = setup(true).await;
    let server = app.server();
    let token = app.token_for(OWNER);

    let response = server
        .get("/api/files?ownerId=&departmentId=&projectId=")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let listing: Vec<Value> = response.json();
    assert_eq!(listing.len(), 5);

    let response = server
        .get(&format!("/api/files?ownerId=&departmentId={}", CCTV))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(ids(&response.json::<Vec<Value>>()), vec![PROJECT_FILE, PUBLIC_CYRILLIC_FILE]);
}
