//! Status enums shared by the client state slices.

use serde::{Deserialize, Serialize};

/// Authentication status of the current session.
///
/// `Anonymous -> Pending -> Authenticated | Failed`, `Authenticated -> Anonymous`
/// on logout, `Failed -> Pending` on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Pending,
    Authenticated,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Pending => write!(f, "pending"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Progress of a catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Product list ordering accepted by the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductSort {
    #[serde(rename = "price:asc")]
    PriceAsc,
    #[serde(rename = "price:desc")]
    PriceDesc,
    #[serde(rename = "rating:asc")]
    RatingAsc,
    #[serde(rename = "rating:desc")]
    RatingDesc,
}

impl ProductSort {
    /// Query-string value for the `sort` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price:asc",
            Self::PriceDesc => "price:desc",
            Self::RatingAsc => "rating:asc",
            Self::RatingDesc => "rating:desc",
        }
    }
}

impl std::fmt::Display for ProductSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price:asc" => Ok(Self::PriceAsc),
            "price:desc" => Ok(Self::PriceDesc),
            "rating:asc" => Ok(Self::RatingAsc),
            "rating:desc" => Ok(Self::RatingDesc),
            _ => Err(format!("invalid sort option: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_round_trips_through_str() {
        for sort in [
            ProductSort::PriceAsc,
            ProductSort::PriceDesc,
            ProductSort::RatingAsc,
            ProductSort::RatingDesc,
        ] {
            assert_eq!(sort.as_str().parse::<ProductSort>().unwrap(), sort);
        }
        assert!("name:asc".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_session_status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::Authenticated).unwrap();
        assert_eq!(json, "\"authenticated\"");
    }
}
