//! In-memory collections behind the simulated backend.
//!
//! The store is an explicit object rather than module-level state: each test
//! builds its own, and clones share one underlying registry.

use crate::types::{
    Admin, AppSettings, LogEntry, LogLevel, TableField, TableMetadata, TableRules, TableType,
};
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Fields the store owns; request bodies cannot overwrite them.
const RESERVED_FIELDS: [&str; 3] = ["id", "created", "updated"];

/// Admin fields that are accepted on input but never stored.
const SECRET_FIELDS: [&str; 2] = ["password", "passwordConfirm"];

/// A logical resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `/api/v1/tables`
    Tables,
    /// `/api/v1/admins`
    Admins,
}

impl Collection {
    /// Singular noun used in error messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Collection::Tables => "table",
            Collection::Admins => "admin",
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<Collection, Vec<Map<String, Value>>>,
    settings: Map<String, Value>,
    logs: Vec<Value>,
    /// Highest id ever handed out per collection
    high_water: HashMap<Collection, u64>,
}

/// Thread-safe registry of simulated resources.
///
/// # Examples
///
/// ```
/// use console_client::transport::{Collection, SimulatedStore};
/// use serde_json::json;
///
/// let store = SimulatedStore::seeded();
/// let created = store.insert(Collection::Tables, json!({"name": "orders", "type": "base"})).unwrap();
/// assert_eq!(store.get(Collection::Tables, created["id"].as_str().unwrap()), Some(created));
/// ```
#[derive(Clone, Default)]
pub struct SimulatedStore {
    state: Arc<RwLock<StoreState>>,
}

impl SimulatedStore {
    /// An empty store with default settings.
    pub fn empty() -> Self {
        let store = SimulatedStore::default();
        store.state.write().settings = to_object(&default_settings());
        store
    }

    /// A store pre-populated with the demo tables, admins, settings and logs.
    pub fn seeded() -> Self {
        let store = SimulatedStore::empty();
        {
            let mut state = store.state.write();
            state
                .collections
                .insert(Collection::Tables, seed_tables().iter().map(to_object).collect());
            state
                .collections
                .insert(Collection::Admins, seed_admins().iter().map(to_object).collect());
            state.logs = seed_logs()
                .iter()
                .filter_map(|l| serde_json::to_value(l).ok())
                .collect();
        }
        store
    }

    // ========== Collections ==========

    /// All records of a collection, in insertion order.
    pub fn list(&self, collection: Collection) -> Vec<Value> {
        let state = self.state.read();
        state
            .collections
            .get(&collection)
            .map(|items| items.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// A single record by id.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        let state = self.state.read();
        state
            .collections
            .get(&collection)?
            .iter()
            .find(|item| item_id(item) == Some(id))
            .cloned()
            .map(Value::Object)
    }

    /// Insert a record, assigning `id`, `created` and `updated`.
    ///
    /// Returns `None` when `body` is not a JSON object.
    pub fn insert(&self, collection: Collection, body: Value) -> Option<Value> {
        let Value::Object(mut fields) = body else {
            return None;
        };
        strip_fields(collection, &mut fields);

        let mut guard = self.state.write();
        let state = &mut *guard;
        let items = state.collections.entry(collection).or_default();
        let high_water = state.high_water.entry(collection).or_insert(0);
        let id = next_id(items).max(*high_water + 1);
        *high_water = id;

        let now = timestamp();
        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(id.to_string()));
        record.extend(fields);
        record.insert("created".to_string(), Value::String(now.clone()));
        record.insert("updated".to_string(), Value::String(now));

        items.push(record.clone());
        Some(Value::Object(record))
    }

    /// Merge `patch` into a record and bump `updated`.
    ///
    /// Returns `None` when the record does not exist or `patch` is not an object.
    pub fn update(&self, collection: Collection, id: &str, patch: Value) -> Option<Value> {
        let Value::Object(mut fields) = patch else {
            return None;
        };
        strip_fields(collection, &mut fields);

        let mut state = self.state.write();
        let item = state
            .collections
            .get_mut(&collection)?
            .iter_mut()
            .find(|item| item_id(item) == Some(id))?;

        item.extend(fields);
        item.insert("updated".to_string(), Value::String(timestamp()));
        Some(Value::Object(item.clone()))
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&self, collection: Collection, id: &str) -> bool {
        let mut state = self.state.write();
        let Some(items) = state.collections.get_mut(&collection) else {
            return false;
        };
        let before = items.len();
        items.retain(|item| item_id(item) != Some(id));
        items.len() != before
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        let state = self.state.read();
        state.collections.get(&collection).map_or(0, Vec::len)
    }

    // ========== Settings and logs ==========

    /// Current settings object.
    pub fn settings(&self) -> Value {
        Value::Object(self.state.read().settings.clone())
    }

    /// Merge `patch` into the settings. Returns `None` if `patch` is not an object.
    pub fn update_settings(&self, patch: Value) -> Option<Value> {
        let Value::Object(fields) = patch else {
            return None;
        };
        let mut state = self.state.write();
        state.settings.extend(fields);
        Some(Value::Object(state.settings.clone()))
    }

    /// Log entries matching an optional level and a case-insensitive search
    /// over `message` and `source`. A level of `"all"` matches everything.
    pub fn logs(&self, level: Option<&str>, search: Option<&str>) -> Vec<Value> {
        let level = level.filter(|l| !l.is_empty() && *l != "all");
        let search = search.map(str::to_lowercase).filter(|s| !s.is_empty());

        let state = self.state.read();
        state
            .logs
            .iter()
            .filter(|entry| level.map_or(true, |l| entry["level"] == l))
            .filter(|entry| {
                search.as_deref().map_or(true, |needle| {
                    ["message", "source"].iter().any(|field| {
                        entry[*field]
                            .as_str()
                            .is_some_and(|s| s.to_lowercase().contains(needle))
                    })
                })
            })
            .cloned()
            .collect()
    }
}

fn item_id(item: &Map<String, Value>) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// One past the largest numeric id currently present.
fn next_id(items: &[Map<String, Value>]) -> u64 {
    items
        .iter()
        .filter_map(|item| item_id(item)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

fn strip_fields(collection: Collection, fields: &mut Map<String, Value>) {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    if collection == Collection::Admins {
        for key in SECRET_FIELDS {
            fields.remove(key);
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

// ========== Seed data ==========

fn default_settings() -> AppSettings {
    AppSettings {
        app_name: "Console".to_string(),
        version: "1.0.0".to_string(),
        base_url: "https://api.example.com".to_string(),
        max_file_size: "10MB".to_string(),
        session_timeout: 3600,
        maintenance_mode: false,
    }
}

fn rules(list: &str, get: &str, add: &str, update: &str, delete: &str) -> TableRules {
    TableRules {
        list: list.to_string(),
        get: get.to_string(),
        add: add.to_string(),
        update: update.to_string(),
        delete: delete.to_string(),
    }
}

fn seed_tables() -> Vec<TableMetadata> {
    vec![
        TableMetadata {
            id: "1".to_string(),
            name: "users".to_string(),
            table_type: TableType::Auth,
            created: "2024-01-15T10:00:00Z".to_string(),
            updated: "2024-01-15T10:00:00Z".to_string(),
            rules: rules(
                "auth.id != None",
                "auth.id == record.id",
                "True",
                "auth.id == record.id",
                "auth.role == 'admin'",
            ),
            fields: Some(vec![
                TableField::primary("id"),
                TableField::required("email", "string"),
                TableField::required("password", "string"),
                TableField::required("created", "datetime"),
                TableField::required("updated", "datetime"),
            ]),
            sql: None,
        },
        TableMetadata {
            id: "2".to_string(),
            name: "products".to_string(),
            table_type: TableType::Base,
            created: "2024-01-20T10:00:00Z".to_string(),
            updated: "2024-01-20T10:00:00Z".to_string(),
            rules: rules(
                "True",
                "True",
                "auth.id != None",
                "auth.id != None",
                "auth.role == 'admin'",
            ),
            fields: Some(vec![
                TableField::primary("id"),
                TableField::required("name", "string"),
                TableField::required("price", "double"),
                TableField::required("category", "string").nullable(),
                TableField::required("created", "datetime"),
                TableField::required("updated", "datetime"),
            ]),
            sql: None,
        },
        TableMetadata {
            id: "3".to_string(),
            name: "active_users_view".to_string(),
            table_type: TableType::View,
            created: "2024-02-01T10:00:00Z".to_string(),
            updated: "2024-02-01T10:00:00Z".to_string(),
            rules: rules("auth.role == 'admin'", "auth.role == 'admin'", "", "", ""),
            fields: None,
            sql: Some(
                "SELECT id, email, created FROM users WHERE updated > NOW() - INTERVAL 30 DAY"
                    .to_string(),
            ),
        },
    ]
}

/// Email of the seeded admin accepted by the simulated credential exchange.
pub(crate) const SEED_ADMIN_EMAIL: &str = "admin@example.com";

fn seed_admins() -> Vec<Admin> {
    vec![
        Admin {
            id: "1".to_string(),
            email: SEED_ADMIN_EMAIL.to_string(),
            created: "2024-01-01T10:00:00Z".to_string(),
            updated: "2024-01-01T10:00:00Z".to_string(),
        },
        Admin {
            id: "2".to_string(),
            email: "john.admin@example.com".to_string(),
            created: "2024-01-15T10:00:00Z".to_string(),
            updated: "2024-01-15T10:00:00Z".to_string(),
        },
    ]
}

fn log(id: &str, timestamp: &str, level: LogLevel, message: &str, source: &str, details: &str) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        timestamp: timestamp.to_string(),
        level,
        message: message.to_string(),
        source: source.to_string(),
        details: Some(details.to_string()),
    }
}

fn seed_logs() -> Vec<LogEntry> {
    vec![
        log(
            "1",
            "2024-01-15T10:30:00Z",
            LogLevel::Info,
            "User login successful",
            "auth",
            "User admin@example.com logged in from IP 192.168.1.1",
        ),
        log(
            "2",
            "2024-01-15T10:25:00Z",
            LogLevel::Warning,
            "Rate limit approaching",
            "api",
            "API rate limit at 80% for endpoint /api/v1/tables",
        ),
        log(
            "3",
            "2024-01-15T10:20:00Z",
            LogLevel::Error,
            "Database connection failed",
            "database",
            "Connection timeout after 30 seconds",
        ),
        log(
            "4",
            "2024-01-15T10:15:00Z",
            LogLevel::Info,
            "Table created successfully",
            "database",
            "New table 'products' created with 5 columns",
        ),
        log(
            "5",
            "2024-01-15T10:10:00Z",
            LogLevel::Info,
            "Backup completed",
            "system",
            "Daily backup completed successfully (2.3GB)",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seeded_counts() {
        let store = SimulatedStore::seeded();
        assert_eq!(store.count(Collection::Tables), 3);
        assert_eq!(store.count(Collection::Admins), 2);
        assert_eq!(store.logs(None, None).len(), 5);
    }

    #[test]
    fn test_empty_store_has_settings() {
        let store = SimulatedStore::empty();
        assert_eq!(store.count(Collection::Tables), 0);
        assert_eq!(store.settings()["sessionTimeout"], 3600);
    }

    #[test]
    fn test_insert_assigns_id_and_timestamps() {
        let store = SimulatedStore::seeded();
        let created = store
            .insert(Collection::Tables, json!({"id": "999", "name": "orders", "type": "base"}))
            .unwrap();
        assert_eq!(created["id"], "4");
        assert_eq!(created["name"], "orders");
        assert!(created["created"].is_string());
        assert_eq!(created["created"], created["updated"]);
    }

    #[test]
    fn test_insert_rejects_non_object() {
        let store = SimulatedStore::empty();
        assert!(store.insert(Collection::Tables, json!([1, 2])).is_none());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = SimulatedStore::seeded();
        let created = store.insert(Collection::Tables, json!({"name": "x"})).unwrap();
        assert_eq!(created["id"], "4");

        assert!(store.remove(Collection::Tables, "4"));
        let created = store.insert(Collection::Tables, json!({"name": "y"})).unwrap();
        assert_eq!(created["id"], "5");
    }

    #[test]
    fn test_update_merges_and_keeps_id() {
        let store = SimulatedStore::seeded();
        let updated = store
            .update(Collection::Tables, "2", json!({"id": "77", "name": "items"}))
            .unwrap();
        assert_eq!(updated["id"], "2");
        assert_eq!(updated["name"], "items");
        assert_eq!(updated["type"], "base");
        assert_ne!(updated["updated"], "2024-01-20T10:00:00Z");
    }

    #[test]
    fn test_update_missing_record() {
        let store = SimulatedStore::seeded();
        assert!(store.update(Collection::Admins, "42", json!({})).is_none());
    }

    #[test]
    fn test_admin_secrets_not_stored() {
        let store = SimulatedStore::seeded();
        let created = store
            .insert(
                Collection::Admins,
                json!({"email": "new@example.com", "password": "pw", "passwordConfirm": "pw"}),
            )
            .unwrap();
        assert!(created.get("password").is_none());
        assert!(created.get("passwordConfirm").is_none());
    }

    #[test]
    fn test_remove_missing() {
        let store = SimulatedStore::seeded();
        assert!(!store.remove(Collection::Tables, "nope"));
    }

    #[test]
    fn test_settings_update() {
        let store = SimulatedStore::seeded();
        let updated = store.update_settings(json!({"appName": "Acme"})).unwrap();
        assert_eq!(updated["appName"], "Acme");
        assert_eq!(updated["version"], "1.0.0");
        assert!(store.update_settings(json!("x")).is_none());
    }

    #[test]
    fn test_log_filters() {
        let store = SimulatedStore::seeded();
        assert_eq!(store.logs(Some("error"), None).len(), 1);
        assert_eq!(store.logs(Some("all"), None).len(), 5);
        assert_eq!(store.logs(None, Some("DATABASE")).len(), 2);
        assert_eq!(store.logs(Some("info"), Some("backup")).len(), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let store1 = SimulatedStore::empty();
        let store2 = store1.clone();
        store1.insert(Collection::Admins, json!({"email": "a@b.c"}));
        assert_eq!(store2.count(Collection::Admins), 1);
    }
}
