//! User status value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Account is in good standing. New registrations start here.
    #[default]
    Active,
    /// Account was deactivated by its owner.
    Inactive,
    /// Account was suspended by an administrator.
    Suspended,
    /// Account is locked for security reasons.
    Locked,
}

impl UserStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Locked => "LOCKED",
        }
    }

    /// Checks if the account is considered active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// All possible statuses.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Active, Self::Inactive, Self::Suspended, Self::Locked]
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = crate::UserbaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| crate::UserbaseError::validation(format!("unknown user status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        assert_eq!(UserStatus::default(), UserStatus::Active);
        assert!(UserStatus::default().is_active());
    }

    #[test]
    fn test_round_trips_through_storage_form() {
        for status in UserStatus::all() {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("suspended".parse::<UserStatus>().unwrap(), UserStatus::Suspended);
        assert!("deleted".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&UserStatus::Locked).unwrap();
        assert_eq!(json, "\"LOCKED\"");
        let parsed: UserStatus = serde_json::from_str("\"INACTIVE\"").unwrap();
        assert_eq!(parsed, UserStatus::Inactive);
    }
}
