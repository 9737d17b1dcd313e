#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use portal_files::api;
use portal_files::auth::{extractors::AppState, password::hash_password};
use portal_files::models::{AccessLevel, FileRecord, GlobalRole, User};
use portal_files::repositories::test_record_store::TestRecordStore;
use portal_files::test_utils::{create_test_app_state, create_test_database, test_config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "mytpass123";

pub const WARD: i64 = 5;
pub const CCTV: i64 = 6;

// Users
pub const OWNER: i64 = 10;
pub const STRANGER: i64 = 11;
pub const COLLEAGUE: i64 = 20;
pub const OTHER_DEPARTMENT: i64 = 21;
pub const NO_DEPARTMENT: i64 = 22;
pub const PLAINTEXT_USER: i64 = 30;

// Files
pub const PERSONAL_FILE: i64 = 1;
pub const DEPARTMENT_FILE: i64 = 2;
pub const PUBLIC_MISSING_FILE: i64 = 3;
pub const PUBLIC_CYRILLIC_FILE: i64 = 4;
pub const PROJECT_FILE: i64 = 5;

pub const PERSONAL_CONTENT: &str = "personal orders for the ward";
pub const ROSTER_CONTENT: &str = "# Post roster\nnight: block C\n";
pub const CAMERAS_CONTENT: &str = "cam-01 gate\ncam-02 yard\n";
pub const UNREGISTERED_CONTENT: &str = "left on disk without a record";
pub const SECRET_CONTENT: &str = "outside the storage root";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<TestRecordStore>,
    pub storage_root: PathBuf,
    // Keeps the directory alive for the duration of the test
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn server(&self) -> TestServer {
        let app = api::create_router().with_state(self.state.clone());
        TestServer::new(app).expect("Failed to create test server")
    }

    pub fn token_for(&self, user_id: i64) -> String {
        self.state
            .jwt_service
            .create_token_for_user(user_id, GlobalRole::User.to_string())
            .expect("Failed to create token")
    }
}

pub async fn setup(allow_unregistered: bool) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage_root = temp_dir.path().join("storage");

    write_file(&storage_root, "files/WARD/personal.txt", PERSONAL_CONTENT).await;
    write_file(&storage_root, "files/WARD/roster.md", ROSTER_CONTENT).await;
    write_file(&storage_root, "files/CCTV/Список камер.txt", CAMERAS_CONTENT).await;
    write_file(&storage_root, "files/CCTV/plan.txt", "project plan").await;
    write_file(&storage_root, "files/CCTV/unregistered.txt", UNREGISTERED_CONTENT).await;
    tokio::fs::write(temp_dir.path().join("secret.txt"), SECRET_CONTENT)
        .await
        .expect("Failed to write secret file");

    let pool = create_test_database().await.expect("Failed to create test database");
    let store = Arc::new(TestRecordStore::new(pool));
    seed(&store).await;

    let config = test_config(&storage_root, allow_unregistered);
    let state = create_test_app_state(store.clone(), config).expect("Failed to create app state");

    TestApp { state, store, storage_root, temp_dir }
}

async fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.expect("Failed to create directories");
    }
    tokio::fs::write(path, content).await.expect("Failed to write file");
}

async fn seed(store: &TestRecordStore) {
    store.create_department(WARD, "Ward service", "WARD").await.unwrap();
    store.create_department(CCTV, "Video monitoring", "CCTV").await.unwrap();
    store.create_project(1, "Video surveillance", "CCTV", Some(CCTV)).await.unwrap();

    let password_hash = hash_password(PASSWORD).expect("Failed to hash password");
    let users = [
        (OWNER, "owner@myt.local", Some(WARD), password_hash.clone()),
        (STRANGER, "stranger@myt.local", Some(CCTV), password_hash.clone()),
        (COLLEAGUE, "colleague@myt.local", Some(WARD), password_hash.clone()),
        (OTHER_DEPARTMENT, "cctv@myt.local", Some(CCTV), password_hash.clone()),
        (NO_DEPARTMENT, "nobody@myt.local", None, password_hash.clone()),
        // Stored value equals the password itself
        (PLAINTEXT_USER, "plain@myt.local", Some(WARD), PASSWORD.to_string()),
    ];
    for (id, email, department_id, password_hash) in users {
        store
            .create_user(&User {
                id,
                email: email.to_string(),
                full_name: format!("User {}", id),
                job_title: Some("Officer".to_string()),
                department_id,
                password_hash,
                global_role: GlobalRole::User,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let files = [
        (PERSONAL_FILE, OWNER, "Orders.txt", "text/plain", AccessLevel::Personal, None, "files/WARD/personal.txt", 1),
        (DEPARTMENT_FILE, OWNER, "Post roster.md", "text/markdown", AccessLevel::Department, None, "files/WARD/roster.md", 2),
        (PUBLIC_MISSING_FILE, OWNER, "Gone.txt", "text/plain", AccessLevel::Public, None, "files/WARD/gone.txt", 3),
        (PUBLIC_CYRILLIC_FILE, OTHER_DEPARTMENT, "Список камер.txt", "text/plain", AccessLevel::Public, None, "files/CCTV/Список камер.txt", 4),
        (PROJECT_FILE, OTHER_DEPARTMENT, "Plan.txt", "text/plain", AccessLevel::Department, Some(1), "files/CCTV/plan.txt", 5),
    ];
    for (id, owner_id, name, mime_type, access_level, project_id, path, day) in files {
        store
            .create_file(&FileRecord {
                id,
                owner_id,
                owner_department_id: None,
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                size_bytes: 0,
                access_level,
                project_id,
                path: path.to_string(),
                created_at: Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap(),
            })
            .await
            .unwrap();
    }
}
