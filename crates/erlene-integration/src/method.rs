//! HTTP verbs issued by the gateway.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// HTTP method supported for outbound integration calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parses a caller-supplied verb, rejecting anything unsupported.
    pub fn parse(method: &str) -> Result<Self> {
        method
            .trim()
            .parse()
            .map_err(|_| Error::invalid_method(method))
    }

    /// Returns whether the payload travels as query parameters.
    #[inline]
    pub fn sends_query(self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("get").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("Post").unwrap(), HttpMethod::Post);
        assert_eq!(HttpMethod::parse(" DELETE ").unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        for method in ["PATCH", "HEAD", "", "GETS"] {
            let error = HttpMethod::parse(method).unwrap_err();
            assert_eq!(error.kind, ErrorKind::InvalidMethod);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
        assert!(HttpMethod::Get.sends_query());
        assert!(!HttpMethod::Post.sends_query());
    }
}
