use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<i64>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub global_role: GlobalRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn requester(&self) -> Requester {
        Requester { id: self.id, department_id: self.department_id }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    Admin,
    User,
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalRole::Admin => write!(f, "admin"),
            GlobalRole::User => write!(f, "user"),
        }
    }
}

impl FromStr for GlobalRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(GlobalRole::Admin),
            "user" => Ok(GlobalRole::User),
            other => Err(anyhow::anyhow!("Unknown role: {}", other)),
        }
    }
}

/// Identity attached to an inbound request. Anonymous requests carry no
/// requester at all (`Option<Requester>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: i64,
    pub department_id: Option<i64>,
}
