use crate::utils::error::{EpgError, Result};
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Largest accepted fetch pool; the dispatcher sizes its semaphore from it.
pub const MAX_WORKERS: usize = 256;

/// Widest day-offset window the schedule API is asked for.
pub const MAX_OFFSET_SPAN: i32 = 14;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> EpgError {
    EpgError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Schedule endpoints and feeds must be plain http(s) URLs; an empty value
/// means the setting was never provided.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(EpgError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            ))
        }
    }
    if url.host_str().is_none() {
        return Err(invalid(field_name, url_str, "URL has no host"));
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_workers(field_name: &str, workers: usize) -> Result<()> {
    validate_range(field_name, workers, 1, MAX_WORKERS)
}

/// `first..=last` must be non-empty and at most `MAX_OFFSET_SPAN` days wide.
pub fn validate_offset_window(first: i32, last: i32) -> Result<()> {
    if last < first {
        return Err(invalid(
            "fetch.last_offset",
            last,
            format!("must not be before fetch.first_offset ({})", first),
        ));
    }
    if last - first >= MAX_OFFSET_SPAN {
        return Err(invalid(
            "fetch.last_offset",
            last,
            format!(
                "window {}..={} exceeds {} days",
                first, last, MAX_OFFSET_SPAN
            ),
        ));
    }
    Ok(())
}

/// Rejects headers the HTTP client would refuse to build.
pub fn validate_header(name: &str, value: &str) -> Result<()> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| invalid("fetch.headers", name, e.to_string()))?;
    HeaderValue::from_str(value)
        .map_err(|e| invalid(&format!("fetch.headers.{}", name), value, e.to_string()))?;
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}
