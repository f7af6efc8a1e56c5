//! Typed wrappers over [`ApiClient::call`] for the console endpoints.

use super::fetch::ApiClient;
use crate::error::{ApiError, ErrorKind, Result};
use crate::protocol::constants::endpoints;
use crate::transport::RequestOptions;
use crate::types::{Admin, AppSettings, AuthResponse, LogEntry, LogLevel, NewTable, TableMetadata, TableSchema};
use serde::Serialize;
use serde_json::{json, Value};

/// Status reported when a request body cannot be serialized.
const CLIENT_ENCODE_STATUS: u16 = 400;

/// Filter for [`ApiClient::list_logs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Only entries at this level
    pub level: Option<LogLevel>,
    /// Case-insensitive match on message or source
    pub search: Option<String>,
}

impl LogQuery {
    fn to_endpoint(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(level) = self.level {
            query.append_pair("level", level.as_str());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
        }
        let query = query.finish();
        if query.is_empty() {
            endpoints::LOGS.to_string()
        } else {
            format!("{}?{}", endpoints::LOGS, query)
        }
    }
}

impl ApiClient {
    /// Serialize a request body; failures are reported like any other call failure.
    fn encode_body<T: Serialize>(&self, endpoint: &str, value: &T) -> Result<Value> {
        serde_json::to_value(value).map_err(|e| {
            self.fail(
                endpoint,
                ApiError::new(
                    ErrorKind::Application,
                    CLIENT_ENCODE_STATUS,
                    format!("cannot encode request body: {}", e),
                ),
            )
        })
    }

    /// Exchange admin credentials for a session token.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        self.call(endpoints::AUTH_WITH_PASSWORD, RequestOptions::post(body)).await
    }

    pub async fn list_tables(&self) -> Result<Vec<TableMetadata>> {
        self.call(endpoints::TABLES, RequestOptions::get()).await
    }

    pub async fn get_table(&self, id: &str) -> Result<TableMetadata> {
        self.call(&endpoints::table(id), RequestOptions::get()).await
    }

    pub async fn create_table(&self, table: &NewTable) -> Result<TableMetadata> {
        let body = self.encode_body(endpoints::TABLES, table)?;
        self.call(endpoints::TABLES, RequestOptions::post(body)).await
    }

    /// Replace a table's field list.
    pub async fn update_table(&self, id: &str, schema: &TableSchema) -> Result<TableMetadata> {
        let endpoint = endpoints::table(id);
        let body = self.encode_body(&endpoint, schema)?;
        self.call(&endpoint, RequestOptions::patch(body)).await
    }

    pub async fn delete_table(&self, id: &str) -> Result<()> {
        self.call::<Value>(&endpoints::table(id), RequestOptions::delete())
            .await
            .map(drop)
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>> {
        self.call(endpoints::ADMINS, RequestOptions::get()).await
    }

    /// Patch an admin; `patch` may carry `email`, `password` and `passwordConfirm`.
    pub async fn update_admin(&self, id: &str, patch: Value) -> Result<Admin> {
        self.call(&endpoints::admin(id), RequestOptions::patch(patch)).await
    }

    pub async fn delete_admin(&self, id: &str) -> Result<()> {
        self.call::<Value>(&endpoints::admin(id), RequestOptions::delete())
            .await
            .map(drop)
    }

    pub async fn get_settings(&self) -> Result<AppSettings> {
        self.call(endpoints::SETTINGS, RequestOptions::get()).await
    }

    /// Merge `patch` into the settings and return the result.
    pub async fn update_settings(&self, patch: Value) -> Result<AppSettings> {
        self.call(endpoints::SETTINGS, RequestOptions::patch(patch)).await
    }

    pub async fn list_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        self.call(&query.to_endpoint(), RequestOptions::get()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::types::{TableField, TableRules, TableType};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn client() -> ApiClient {
        ApiClient::builder("tok").config(ClientConfig::instant()).build()
    }

    #[test]
    fn test_log_query_endpoint() {
        assert_eq!(LogQuery::default().to_endpoint(), "/api/v1/logs");

        let query = LogQuery {
            level: Some(LogLevel::Error),
            search: Some("disk full".to_string()),
        };
        assert_eq!(query.to_endpoint(), "/api/v1/logs?level=error&search=disk+full");
    }

    #[tokio::test]
    async fn test_login_with_password() {
        let client = ApiClient::builder("").config(ClientConfig::instant()).build();

        let auth = assert_ok!(client.login_with_password("admin@example.com", "password").await);
        assert!(auth.token.starts_with("mock-jwt-token-"));
        assert_eq!(auth.user.email, "admin@example.com");

        let err = assert_err!(client.login_with_password("admin@example.com", "nope").await);
        assert_eq!(err.kind, ErrorKind::Application);
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_table_lifecycle() {
        let client = client();
        let before = client.list_tables().await.unwrap();

        let created = client
            .create_table(&NewTable {
                name: "orders".to_string(),
                table_type: TableType::Base,
                rules: TableRules::default(),
                fields: Some(vec![TableField::primary("id")]),
                sql: None,
            })
            .await
            .unwrap();
        assert_eq!(created.name, "orders");

        let tables = client.list_tables().await.unwrap();
        assert_eq!(tables.len(), before.len() + 1);
        assert_eq!(tables.iter().filter(|t| t.id == created.id).count(), 1);

        let schema = TableSchema {
            fields: vec![TableField::primary("id"), TableField::required("total", "number")],
        };
        let updated = client.update_table(&created.id, &schema).await.unwrap();
        assert_eq!(updated.fields.map(|f| f.len()), Some(2));

        assert_ok!(client.delete_table(&created.id).await);
        let err = assert_err!(client.get_table(&created.id).await);
        assert_eq!(err.status, 404);
        assert_eq!(client.list_tables().await.unwrap().len(), before.len());
    }

    #[tokio::test]
    async fn test_settings_patch_merges() {
        let client = client();
        let settings = client
            .update_settings(json!({ "maintenanceMode": true }))
            .await
            .unwrap();
        assert!(settings.maintenance_mode);
        assert_eq!(settings.app_name, client.get_settings().await.unwrap().app_name);
    }

    #[tokio::test]
    async fn test_admins() {
        let client = client();
        let admins = client.list_admins().await.unwrap();
        assert_eq!(admins.len(), 2);

        let updated = client
            .update_admin(&admins[1].id, json!({ "email": "ops@example.com", "password": "x" }))
            .await
            .unwrap();
        assert_eq!(updated.email, "ops@example.com");

        assert_ok!(client.delete_admin(&admins[1].id).await);
        assert_eq!(client.list_admins().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_logs_filters() {
        let client = client();
        let all = client.list_logs(&LogQuery::default()).await.unwrap();
        let errors = client
            .list_logs(&LogQuery {
                level: Some(LogLevel::Error),
                search: None,
            })
            .await
            .unwrap();

        assert!(!errors.is_empty());
        assert!(errors.len() < all.len());
        assert!(errors.iter().all(|e| e.level == LogLevel::Error));
    }

    #[tokio::test]
    async fn test_body_encoding_failure_reports_through_hook() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let client = ApiClient::builder("tok")
            .config(ClientConfig::instant())
            .on_error(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        // Non-string map keys cannot become a JSON object.
        let mut body = HashMap::new();
        body.insert((1u8, 2u8), 3u8);

        let err = assert_err!(client.encode_body(endpoints::TABLES, &body));
        assert_eq!(err.kind, ErrorKind::Application);
        assert_eq!(err.status, 400);
        assert!(err.message.contains("cannot encode request body"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
