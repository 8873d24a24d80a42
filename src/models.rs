// Data models for the contacts / tasks backend

use crate::record::Record;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Collection name of the categories document. Categories are read-only and
/// passed through byte for byte, so there is no record type for them.
pub const CATEGORIES: &str = "categories";

/// Address book entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(rename = "ID_contact", alias = "id")]
    pub id: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub email: String,
    /// Older clients send phone numbers as JSON numbers
    #[serde(deserialize_with = "string_or_number")]
    pub phone: String,
}

/// Board task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    #[serde(rename = "ID_task", alias = "id")]
    pub id: String,
    pub status: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "assigned", alias = "assignee")]
    pub assignee: String,
    #[serde(rename = "prio", alias = "priority")]
    pub priority: String,
    #[serde(alias = "dueDate")]
    pub due_date: String,
    pub category: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subtask {
    #[serde(rename = "subtaskId", alias = "id", deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub checked: bool,
}

impl Record for Contact {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn collection_name() -> &'static str {
        "contacts"
    }

    fn id_prefix() -> &'static str {
        "cont"
    }

    fn id_keys() -> &'static [&'static str] {
        &["ID_contact", "id"]
    }

    fn label() -> &'static str {
        "Contact"
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn id_prefix() -> &'static str {
        "tk"
    }

    fn id_keys() -> &'static [&'static str] {
        &["ID_task", "id"]
    }

    fn label() -> &'static str {
        "Task"
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
