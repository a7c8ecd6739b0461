//! Structured errors for the tripshell tools.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by tool plumbing rather than by the cache manager.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty key).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::Encode(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_codes() {
        let mcp_err: McpError = ToolError::InvalidInput("key cannot be empty".into()).into();
        assert_eq!(mcp_err.code.0, -32602);
        let mcp_err: McpError = ToolError::Encode("bad".into()).into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
