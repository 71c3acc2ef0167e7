use crate::utils::error::{ReplenishError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ReplenishError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ReplenishError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
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
        return Err(ReplenishError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Peer locations must be non-empty, unique, and must not include the home location.
pub fn validate_peer_locations(field_name: &str, home: &str, peers: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for peer in peers {
        validate_non_empty_string(field_name, peer)?;
        if peer == home {
            return Err(ReplenishError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: peer.clone(),
                reason: "Home location cannot be its own peer".to_string(),
            });
        }
        if !seen.insert(peer.as_str()) {
            return Err(ReplenishError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: peer.clone(),
                reason: "Duplicate peer location".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("erp.base_url", "https://example.com").is_ok());
        assert!(validate_url("erp.base_url", "http://example.com").is_ok());
        assert!(validate_url("erp.base_url", "").is_err());
        assert!(validate_url("erp.base_url", "invalid-url").is_err());
        assert!(validate_url("erp.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("run.horizon_weeks", 4, 1).is_ok());
        assert!(validate_positive_number("run.horizon_weeks", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("http.timeout_seconds", 30, 1, 600).is_ok());
        assert!(validate_range("http.timeout_seconds", 0, 1, 600).is_err());
        assert!(validate_range("http.timeout_seconds", 601, 1, 600).is_err());
    }

    #[test]
    fn test_validate_peer_locations() {
        let peers = vec!["B".to_string(), "C".to_string()];
        assert!(validate_peer_locations("run.peer_locations", "A", &peers).is_ok());

        let with_home = vec!["B".to_string(), "A".to_string()];
        assert!(validate_peer_locations("run.peer_locations", "A", &with_home).is_err());

        let duplicated = vec!["B".to_string(), "B".to_string()];
        assert!(validate_peer_locations("run.peer_locations", "A", &duplicated).is_err());

        let blank = vec![" ".to_string()];
        assert!(validate_peer_locations("run.peer_locations", "A", &blank).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("token".to_string());
        assert_eq!(validate_required_field("erp.token", &present).unwrap(), "token");
        let missing: Option<String> = None;
        assert!(validate_required_field("erp.token", &missing).is_err());
    }
}
