//! Uniform JSON response body
//!
//! Every response is `{"code": n, "msg": s, "data"?: v}` with three tiers:
//! 200 success, 400 soft failure (bad credential or bad input), 500 hard
//! failure. Hard failures never carry detail.

use crate::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const CODE_OK: u16 = 200;
pub const CODE_FAIL: u16 = 400;
pub const CODE_ERROR: u16 = 500;

/// Message for both unknown accounts and wrong passwords
pub const MSG_BAD_LOGIN: &str = "invalid username or password";
pub const MSG_INTERNAL: &str = "internal error";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: u16,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Envelope {
    pub fn ok(data: Option<String>) -> Self {
        Envelope {
            code: CODE_OK,
            msg: "ok".to_string(),
            data,
        }
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        Envelope {
            code: CODE_FAIL,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn error() -> Self {
        Envelope {
            code: CODE_ERROR,
            msg: MSG_INTERNAL.to_string(),
            data: None,
        }
    }

    /// Map a store error onto the envelope tiers.
    ///
    /// `NotFound` and `BadCredential` collapse into one message so callers
    /// cannot enumerate usernames.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::NotFound(_) | Error::BadCredential(_) => Self::fail(MSG_BAD_LOGIN),
            Error::Validation(msg) => Self::fail(msg.clone()),
            Error::DuplicateAccount(_) => Self::fail("account already exists"),
            _ => Self::error(),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
