//! The `Main` group shipped with every installation.

use crate::types::{CodeGroup, ResponseCode};

pub const MAIN_GROUP: &str = "MainRespCode";

const MAIN_CASES: &[(&str, u32, u16, &str)] = &[
    (
        "AppVersionOutdated",
        426,
        426,
        "Application version is outdated. Please update to the latest version.",
    ),
    (
        "AppMissingHeaders",
        1000,
        400,
        "Required headers are missing from the request.",
    ),
    (
        "AppWrongLanguage",
        1001,
        406,
        "Invalid or unsupported language specified.",
    ),
    ("ValidationError", 1002, 422, "The given data was invalid."),
    (
        "AppInvalidDeviceModel",
        1003,
        500,
        "Invalid or unsupported device model.",
    ),
    (
        "MaintenanceMode",
        503,
        503,
        "The application is currently in maintenance mode. Please try again later.",
    ),
    (
        "ServiceUnavailable",
        504,
        503,
        "Service is temporarily unavailable. Please try again later.",
    ),
    (
        "InternalServerError",
        500,
        500,
        "An internal server error occurred. Please try again later.",
    ),
    ("BadGateway", 502, 502, "Bad gateway. Please try again later."),
    ("GatewayTimeout", 505, 504, "Gateway timeout. Please try again later."),
    (
        "Unauthorized",
        401,
        401,
        "You are not authorized to perform this action.",
    ),
    ("Forbidden", 403, 403, "Access to this resource is forbidden."),
    ("NotFound", 404, 404, "The requested resource was not found."),
    ("TooManyRequests", 429, 429, "Too many requests. Please slow down."),
    (
        "RateLimitExceeded",
        430,
        429,
        "Rate limit exceeded. Please try again later.",
    ),
];

/// Builds the `Main` group: general application, gateway and rate-limit codes
/// with their HTTP statuses and English messages.
pub fn main_group() -> CodeGroup {
    let cases = MAIN_CASES
        .iter()
        .map(|(name, code, status, message)| {
            ResponseCode::new(*name, *code)
                .with_http_status(*status)
                .with_message(*message)
        })
        .collect();

    CodeGroup::from_trusted(MAIN_GROUP, cases)
}
