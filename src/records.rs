use crate::services::{Record, StudioError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    /// ISO `YYYY-MM-DD`.
    pub publish_date: String,
    pub author: String,
}

impl Record for BlogPost {
    const KIND: &'static str = "blog_post";
    const FIELDS: &'static [&'static str] = &["title", "excerpt", "content", "publish_date", "author"];
    const REQUIRED: &'static [&'static str] = &["title", "excerpt", "content", "publish_date", "author"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
        }
    }

    /// Badge text shown next to a request.
    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::New => "Новая",
            ContactStatus::Read => "Прочитана",
            ContactStatus::Replied => "Отвечено",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = StudioError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(ContactStatus::New),
            "read" => Ok(ContactStatus::Read),
            "replied" => Ok(ContactStatus::Replied),
            other => Err(StudioError::Validation(format!("status: {other}"))),
        }
    }
}

fn submitted_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default = "submitted_now")]
    pub created_at: String,
}

impl Record for ContactRequest {
    const KIND: &'static str = "contact_request";
    const FIELDS: &'static [&'static str] = &["name", "email", "message"];
    const REQUIRED: &'static [&'static str] = &["name", "email", "message"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAttachment {
    pub id: i64,
    pub file_url: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Record for PortfolioAttachment {
    const KIND: &'static str = "portfolio_attachment";
    const FIELDS: &'static [&'static str] = &["file_name", "file_url", "file_type", "description"];
    const REQUIRED: &'static [&'static str] = &["file_name", "file_url"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: i64,
    pub category: String,
    pub client: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owned by the item; gone when the item is removed.
    #[serde(default)]
    pub attachments: Vec<PortfolioAttachment>,
}

impl Record for PortfolioItem {
    const KIND: &'static str = "portfolio_item";
    const FIELDS: &'static [&'static str] = &["category", "client", "image_url", "description"];
    const REQUIRED: &'static [&'static str] = &["category", "client", "image_url"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Icon name, resolved by the client.
    pub icon: String,
}

impl Record for Service {
    const KIND: &'static str = "service";
    const FIELDS: &'static [&'static str] = &["title", "description", "icon"];
    const REQUIRED: &'static [&'static str] = &["title", "description", "icon"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub experience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Record for TeamMember {
    const KIND: &'static str = "team_member";
    const FIELDS: &'static [&'static str] = &["name", "role", "experience", "bio"];
    const REQUIRED: &'static [&'static str] = &["name", "role", "experience"];

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_status_parses_wire_names() {
        assert_eq!("read".parse::<ContactStatus>().unwrap(), ContactStatus::Read);
        assert!("Read".parse::<ContactStatus>().is_err());
        assert_eq!(ContactStatus::default(), ContactStatus::New);
        assert_eq!(ContactStatus::Replied.label(), "Отвечено");
    }

    #[test]
    fn contact_defaults_fill_status_and_timestamp() {
        let request: ContactRequest = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Ольга",
            "email": "olga@example.com",
            "message": "Здравствуйте"
        }))
        .unwrap();
        assert_eq!(request.status, ContactStatus::New);
        assert_eq!(request.created_at.len(), "2024-01-20T10:30:00".len());
    }

    #[test]
    fn portfolio_item_without_attachments_deserializes() {
        let item: PortfolioItem = serde_json::from_value(serde_json::json!({
            "id": 1,
            "category": "UI/UX",
            "client": "StartUp Inc",
            "image_url": "https://example.com/a.jpg"
        }))
        .unwrap();
        assert!(item.attachments.is_empty());
        assert!(item.description.is_none());
    }
}
