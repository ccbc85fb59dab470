//! Outcome of a call against the handle server.

use std::fmt;

use hdl_doc::Node;

pub const SUCCESS: i64 = 1;
pub const SERVER_ERROR: i64 = 2;
pub const HANDLE_NOT_FOUND: i64 = 100;
pub const HANDLE_ALREADY_EXISTS: i64 = 101;
pub const INVALID_HANDLE: i64 = 102;
pub const VALUES_NOT_FOUND: i64 = 200;
pub const VALUE_ALREADY_EXISTS: i64 = 201;
pub const INVALID_VALUE: i64 = 202;
pub const SERVER_NOT_RESPONSIBLE: i64 = 301;
pub const AUTHENTICATION_NEEDED: i64 = 402;

/// Human readable text for a handle response code.
pub fn response_code_description(code: i64) -> &'static str {
    match code {
        SUCCESS => "Success",
        SERVER_ERROR => "An unexpected error on the server",
        HANDLE_NOT_FOUND => "Handle not found",
        HANDLE_ALREADY_EXISTS => "Handle already exists",
        INVALID_HANDLE => "Invalid handle",
        VALUES_NOT_FOUND => "Values not found",
        VALUE_ALREADY_EXISTS => "Value already exists",
        INVALID_VALUE => "Invalid value",
        SERVER_NOT_RESPONSIBLE => "Server not responsible for handle",
        AUTHENTICATION_NEEDED => "Authentication needed",
        404..=409 => "Other authentication errors",
        _ => "Unknown",
    }
}

/// Result of one remote call.
///
/// `success` is only set when the server answered with response code 1.
/// `data` holds the record document for reads and is `Null` otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleResult {
    pub success: bool,
    pub handle_code: i64,
    pub handle: String,
    pub data: Node,
}

impl HandleResult {
    pub fn ok(handle: impl Into<String>, data: Node) -> Self {
        Self {
            success: true,
            handle_code: SUCCESS,
            handle: handle.into(),
            data,
        }
    }

    pub fn failed(handle: impl Into<String>, handle_code: i64) -> Self {
        Self {
            success: false,
            handle_code,
            handle: handle.into(),
            data: Node::Null,
        }
    }

    pub fn description(&self) -> &'static str {
        response_code_description(self.handle_code)
    }
}

impl fmt::Display for HandleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.handle,
            self.handle_code,
            self.description()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(response_code_description(1), "Success");
        assert_eq!(response_code_description(100), "Handle not found");
        assert_eq!(response_code_description(301), "Server not responsible for handle");
        assert_eq!(response_code_description(402), "Authentication needed");
    }

    #[test]
    fn authentication_range_is_exclusive() {
        assert_eq!(response_code_description(403), "Unknown");
        assert_eq!(response_code_description(404), "Other authentication errors");
        assert_eq!(response_code_description(409), "Other authentication errors");
        assert_eq!(response_code_description(410), "Unknown");
        assert_eq!(response_code_description(0), "Unknown");
    }

    #[test]
    fn display_includes_description() {
        let r = HandleResult::failed("21.T1/abc", HANDLE_NOT_FOUND);
        assert!(!r.success);
        assert_eq!(r.to_string(), "21.T1/abc 100 (Handle not found)");
    }
}
