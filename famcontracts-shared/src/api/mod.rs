use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::domain::{
    ContractId, ContractStatus, Reward, RewardStatus, TaskStatus, User, UserId,
};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

/// Path prefix appended after the configured base URL. The base already
/// ends in `/api`, so nothing extra is needed.
pub const API_PREFIX: &str = "";

// Auth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
    pub user: User,
}

// Contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskReq {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContractReq {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub child_id: UserId,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<NewTaskReq>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContractReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

// Tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskReq {
    pub contract_id: ContractId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

// Rewards (standalone resource)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRewardReq {
    pub contract_id: ContractId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRewardReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RewardStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDto {
    pub id: String,
    pub contract_id: ContractId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "points_cost")]
    pub points: i32,
    pub status: RewardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

// Settings
/// Profile edits. Absent fields are left as they are on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UpdateProfileReq {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordReq {
    pub current_password: String,
    pub new_password: String,
}

/// Error payload. The backend is inconsistent about which field it fills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.error.filter(|m| !m.trim().is_empty()))
    }
}

/// Extracts a human-readable message from a raw error response body.
pub fn error_message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

/// Unwraps `{"<key>": value}` envelopes; bare values pass through.
pub fn unwrap_envelope(value: serde_json::Value, key: &str) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key(key) => {
            map.remove(key).unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_message_then_error() {
        assert_eq!(
            error_message_from_body(r#"{"message":"bad creds","error":"x"}"#).as_deref(),
            Some("bad creds")
        );
        assert_eq!(
            error_message_from_body(r#"{"error":"not found"}"#).as_deref(),
            Some("not found")
        );
        assert_eq!(error_message_from_body(r#"{"message":""}"#), None);
        assert_eq!(error_message_from_body("<html>"), None);
    }

    #[test]
    fn envelope_is_optional() {
        let wrapped = json!({"contracts": [1, 2], "total": 2});
        assert_eq!(unwrap_envelope(wrapped, "contracts"), json!([1, 2]));
        let bare = json!([3]);
        assert_eq!(unwrap_envelope(bare, "contracts"), json!([3]));
    }

    #[test]
    fn update_requests_only_carry_set_fields() {
        let req = UpdateTaskReq {
            status: Some(TaskStatus::Failed),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"status": "failed"}));

        let profile = UpdateProfileReq {
            phone: Some("+100".into()),
            ..Default::default()
        };
        assert!(!profile.is_empty());
        assert_eq!(serde_json::to_value(&profile).unwrap(), json!({"phone": "+100"}));
        assert!(UpdateProfileReq::default().is_empty());
    }

    #[test]
    fn reward_list_decodes_every_backend_status() {
        let list: Vec<RewardDto> = serde_json::from_value(json!([
            {"id": "r1", "contract_id": "c1", "title": "Cinema", "points_cost": 10, "status": "available"},
            {"id": "r2", "contract_id": "c1", "title": "Ice cream", "points": 2, "status": "used"},
            {"id": "r3", "contract_id": "c2", "title": "Zoo", "points": 5, "status": "expired"}
        ]))
        .unwrap();
        let statuses: Vec<RewardStatus> = list.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![RewardStatus::Available, RewardStatus::Claimed, RewardStatus::Expired]
        );
        assert_eq!(list[2].status.to_string(), "expired");
    }
}
