//! JSON message types for requests and responses.
//!
//! Outgoing messages are plain objects whose shape depends on the call:
//! the login/logout pair manages the session context, `findTerms` creates a
//! server-side module over a table, and `sort`/`fetch` address an existing
//! result set by its `id`. Responses share a single envelope with a
//! `status` field and a request-specific body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status string carried by successful responses.
pub const STATUS_OK: &str = "ok";

/// Status string carried by error responses.
pub const STATUS_ERROR: &str = "error";

/// Numeric code the server attaches to licensing failures.
pub const LICENSE_ERROR_CODE: i64 = 403;

/// Login message. `spawn` asks the server to persist the issued context
/// beyond the spawning connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    pub spawn: u32,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: username.into(),
            password: password.into(),
            spawn: 1,
        }
    }
}

/// Logout message for an established context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub logout: u32,
    pub context: String,
}

impl LogoutRequest {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            logout: 1,
            context: context.into(),
        }
    }
}

/// Search request. Creates a server-side module over `create` (the table
/// name) and invokes its `findTerms` method; `params` is the pair of the
/// top-level boolean operator and the term list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindTermsRequest {
    pub name: String,
    pub create: String,
    pub method: String,
    pub params: (String, Value),
}

impl FindTermsRequest {
    pub fn new(table: impl Into<String>, operator: impl Into<String>, terms: Value) -> Self {
        Self {
            name: "Module".to_string(),
            create: table.into(),
            method: "findTerms".to_string(),
            params: (operator.into(), terms),
        }
    }
}

/// Sort request against an existing result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortRequest {
    pub method: String,
    pub id: Value,
    pub params: SortParams,
}

/// Sort parameters. `flags` serializes as `null` when absent; the dialect
/// expects the key to be present either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortParams {
    pub columns: Vec<String>,
    pub flags: Option<Vec<String>>,
}

impl SortRequest {
    pub fn new(id: Value, columns: Vec<String>, flags: Option<Vec<String>>) -> Self {
        Self {
            method: "sort".to_string(),
            id,
            params: SortParams { columns, flags },
        }
    }
}

/// Cursor positioning flag for fetch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFlag {
    Start,
    Current,
    End,
}

impl FetchFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchFlag::Start => "start",
            FetchFlag::Current => "current",
            FetchFlag::End => "end",
        }
    }
}

/// Fetch request against an existing result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub method: String,
    pub id: Value,
    pub params: FetchParams,
}

/// Fetch parameters. `columns` serializes as `null` when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchParams {
    pub flag: FetchFlag,
    pub offset: i64,
    pub count: i64,
    pub columns: Option<Vec<String>>,
}

impl FetchRequest {
    pub fn new(
        id: Value,
        flag: FetchFlag,
        offset: i64,
        count: i64,
        columns: Option<Vec<String>>,
    ) -> Self {
        Self {
            method: "fetch".to_string(),
            id,
            params: FetchParams {
                flag,
                offset,
                count,
                columns,
            },
        }
    }
}

/// Parsed response envelope.
///
/// Every reply carries `status`. The `context` field appears on login
/// replies, `id` on replies that address a server-side result set, and
/// `code` on errors. Everything else is request-specific and kept in
/// `body` for the caller to interpret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Licensing failures arrive as an error status with code 403.
    pub fn is_license_error(&self) -> bool {
        self.status == STATUS_ERROR && self.code == Some(LICENSE_ERROR_CODE)
    }

    /// Total match count carried by search and sort replies.
    pub fn result_count(&self) -> Option<u64> {
        self.body.get("result")?.as_u64()
    }

    /// Row objects carried by fetch replies.
    pub fn rows(&self) -> Option<&Vec<Value>> {
        self.body.get("result")?.get("rows")?.as_array()
    }
}
