//! API constants and endpoint builders for the content-management API

/// API version requested on every call
pub const API_VERSION: &str = "3";

/// Standard headers for content-management requests
pub mod headers {
    /// Accept header value
    pub const ACCEPT_JSON: &str = "application/json";

    /// Content type for JSON:API request bodies
    pub const CONTENT_TYPE_JSON_API: &str = "application/vnd.api+json";

    /// Header carrying the requested API version
    pub const API_VERSION: &str = "X-Api-Version";

    /// Header selecting a sandbox environment instead of the primary one
    pub const ENVIRONMENT: &str = "X-Environment";
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Project settings (holds the locale list)
pub fn site_endpoint(base_url: &str) -> String {
    join(base_url, "site")
}

/// Plugin collection endpoint
pub fn plugins_endpoint(base_url: &str) -> String {
    join(base_url, "plugins")
}

/// Single plugin endpoint
pub fn plugin_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("plugins/{}", id))
}

/// Item type collection endpoint
pub fn item_types_endpoint(base_url: &str) -> String {
    join(base_url, "item-types")
}

/// Single item type endpoint
pub fn item_type_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("item-types/{}", id))
}

/// Fields of one item type
pub fn item_type_fields_endpoint(base_url: &str, item_type_id: &str) -> String {
    join(base_url, &format!("item-types/{}/fields", item_type_id))
}

/// Fieldsets of one item type
pub fn item_type_fieldsets_endpoint(base_url: &str, item_type_id: &str) -> String {
    join(base_url, &format!("item-types/{}/fieldsets", item_type_id))
}

/// Single field endpoint
pub fn field_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("fields/{}", id))
}

/// Single fieldset endpoint
pub fn fieldset_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("fieldsets/{}", id))
}
