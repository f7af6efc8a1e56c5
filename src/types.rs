//! Payload types exchanged with the console service.
//!
//! The client core treats these as opaque payloads: they are serialized into
//! request bodies and deserialized out of envelope `data`, nothing more. Field
//! names follow the service's camelCase wire format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which transport strategy an [`ApiClient`](crate::ApiClient) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppMode {
    /// Simulated in-memory backend
    #[default]
    Test,
    /// Real network endpoint
    Prod,
}

impl AppMode {
    /// Wire representation (`"TEST"` or `"PROD"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Test => "TEST",
            AppMode::Prod => "PROD",
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TEST" => Ok(AppMode::Test),
            "PROD" => Ok(AppMode::Prod),
            other => Err(format!("unknown app mode: {other}")),
        }
    }
}

/// Kind of a table collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// Plain data table
    Base,
    /// Table backing user authentication
    Auth,
    /// Read-only SQL view
    View,
}

/// Access rule expressions for each table operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    pub list: String,
    pub get: String,
    pub add: String,
    pub update: String,
    pub delete: String,
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub primary_key: bool,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_file: Option<bool>,
}

impl TableField {
    /// A non-nullable, non-key column.
    pub fn required(name: &str, field_type: &str) -> Self {
        TableField {
            name: name.to_string(),
            field_type: field_type.to_string(),
            primary_key: false,
            nullable: false,
            unique: None,
            is_file: None,
        }
    }

    /// The `id` primary key column.
    pub fn primary(name: &str) -> Self {
        TableField {
            primary_key: true,
            ..TableField::required(name, "string")
        }
    }

    /// Mark the column nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Table metadata as listed by `GET /api/v1/tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: TableType,
    pub created: String,
    pub updated: String,
    #[serde(default)]
    pub rules: TableRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Schema patch body for `PATCH /api/v1/tables/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableField>,
}

/// Body for `POST /api/v1/tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTable {
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: TableType,
    #[serde(default)]
    pub rules: TableRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub created: String,
    pub updated: String,
}

/// Global application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub app_name: String,
    pub version: String,
    pub base_url: String,
    pub max_file_size: String,
    pub session_timeout: u64,
    #[serde(default)]
    pub maintenance_mode: bool,
}

/// Result of `POST /api/v1/admins/auth-with-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Admin,
}

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Wire representation, also used as the `level` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// A service log line as returned by `GET /api/v1/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_mode_wire_format() {
        assert_eq!(serde_json::to_string(&AppMode::Prod).unwrap(), "\"PROD\"");
        assert_eq!("TEST".parse::<AppMode>().unwrap(), AppMode::Test);
        assert!("test".parse::<AppMode>().is_err());
        assert_eq!(AppMode::default(), AppMode::Test);
    }

    #[test]
    fn test_log_level_as_str_matches_serde() {
        for level in [LogLevel::Info, LogLevel::Warning, LogLevel::Error] {
            let wire = serde_json::to_value(level).unwrap();
            assert_eq!(wire, level.as_str());
        }
    }

    #[test]
    fn test_table_field_wire_names() {
        let field = TableField::primary("id");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["primaryKey"], true);
        assert!(json.get("isFile").is_none());
    }

    #[test]
    fn test_table_metadata_without_fields() {
        let json = serde_json::json!({
            "id": "3",
            "name": "active_users_view",
            "type": "view",
            "created": "2024-02-01T10:00:00Z",
            "updated": "2024-02-01T10:00:00Z",
            "rules": {"list": "", "get": "", "add": "", "update": "", "delete": ""},
            "sql": "SELECT 1"
        });
        let table: TableMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(table.table_type, TableType::View);
        assert!(table.fields.is_none());
    }
}
