//! Outcome statuses drawn from the HTTP numeric status-code space.
//!
//! The engine reuses the well-known taxonomy to report cache hits, busy
//! states, and generator-reported failures uniformly, without speaking
//! HTTP itself. Generator scripts may self-report any code in the
//! conventional range; the constants below are the codes the engine
//! emits on its own.

use std::fmt;

use serde::Serialize;

/// Numeric outcome status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Status(u16);

impl Status {
    /// Artifact available: cache hit or fresh generation.
    pub const OK: Self = Self(200);
    /// Request accepted: deletion performed, or generation already in
    /// progress elsewhere (busy).
    pub const ACCEPTED: Self = Self(202);
    /// Generator ran but produced no content; also the initial state of
    /// every request.
    pub const NO_CONTENT: Self = Self(204);
    /// Artifact absent where one was required.
    pub const NOT_FOUND: Self = Self(404);
    /// Input listing failed, or the generator failed without
    /// self-reporting a code.
    pub const CONFLICT: Self = Self(409);
    /// No generator exists for the product type.
    pub const NOT_IMPLEMENTED: Self = Self(501);

    /// Interpret a numeric code; `None` outside the conventional
    /// `100..=599` range.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        if code >= 100 && code < 600 {
            Some(Self(code))
        } else {
            None
        }
    }

    /// The numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// `true` for the 2xx class.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Human label for the codes the engine itself emits.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            202 => "Accepted",
            204 => "No Content",
            404 => "Not Found",
            409 => "Conflict",
            501 => "Not Implemented",
            _ => "Unclassified",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_enforces_conventional_range() {
        assert_eq!(Status::from_code(409), Some(Status::CONFLICT));
        assert_eq!(Status::from_code(99), None);
        assert_eq!(Status::from_code(600), None);
    }

    #[test]
    fn success_covers_the_2xx_class() {
        assert!(Status::OK.is_success());
        assert!(Status::ACCEPTED.is_success());
        assert!(Status::NO_CONTENT.is_success());
        assert!(!Status::NOT_FOUND.is_success());
        assert!(!Status::NOT_IMPLEMENTED.is_success());
    }

    #[test]
    fn display_includes_code_and_reason() {
        assert_eq!(Status::OK.to_string(), "200 OK");
        assert_eq!(Status::NOT_IMPLEMENTED.to_string(), "501 Not Implemented");
        let custom = Status::from_code(418).expect("valid code");
        assert_eq!(custom.to_string(), "418 Unclassified");
    }

    #[test]
    fn serializes_as_the_bare_code() {
        let json = serde_json::to_string(&Status::CONFLICT).expect("serialize");
        assert_eq!(json, "409");
    }
}
