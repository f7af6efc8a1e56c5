//! Endpoint paths, header names and fixed protocol values.

/// API endpoint paths.
pub mod endpoints {
    /// Table collection
    pub const TABLES: &str = "/api/v1/tables";
    /// Admin collection
    pub const ADMINS: &str = "/api/v1/admins";
    /// Credential exchange
    pub const AUTH_WITH_PASSWORD: &str = "/api/v1/admins/auth-with-password";
    /// Application settings
    pub const SETTINGS: &str = "/api/v1/settings";
    /// Alias of [`SETTINGS`] used by newer service builds
    pub const SETTINGS_CONFIG: &str = "/api/v1/settings/config";
    /// Service logs
    pub const LOGS: &str = "/api/v1/logs";

    /// `/api/v1/tables/{id}`
    pub fn table(id: &str) -> String {
        format!("{}/{}", TABLES, id)
    }

    /// `/api/v1/admins/{id}`
    pub fn admin(id: &str) -> String {
        format!("{}/{}", ADMINS, id)
    }
}

/// Header names and values.
pub mod headers {
    use http::HeaderName;

    /// `Authorization`
    pub const AUTHORIZATION: HeaderName = http::header::AUTHORIZATION;
    /// `Content-Type`
    pub const CONTENT_TYPE: HeaderName = http::header::CONTENT_TYPE;
    /// Content type for every request body
    pub const APPLICATION_JSON: &str = "application/json";
    /// Authorization scheme prefix
    pub const BEARER_PREFIX: &str = "Bearer ";
}

/// Status used for synthetic failures (network, loop guard).
pub const SYNTHETIC_FAILURE_STATUS: u16 = 500;

/// Status used when a body claims the envelope shape but is malformed.
pub const MALFORMED_ENVELOPE_STATUS: u16 = 502;

/// Message carried by loop-guard failures.
pub const LOOP_GUARD_MESSAGE: &str = "possible infinite loop detected";
