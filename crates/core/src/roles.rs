//! User roles.
//!
//! The role is resolved once, at the authentication boundary, into a
//! [`Role`] value. Handlers and the enrollment engine never look at raw
//! role strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Stored value for [`Role::Facilitator`].
pub const ROLE_FACILITATOR: &str = "facilitator";
/// Stored value for [`Role::Seeker`].
pub const ROLE_SEEKER: &str = "seeker";

/// What a user is allowed to do on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates and owns events.
    Facilitator,
    /// Browses and enrolls in events.
    Seeker,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Facilitator => ROLE_FACILITATOR,
            Role::Seeker => ROLE_SEEKER,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_FACILITATOR => Ok(Role::Facilitator),
            ROLE_SEEKER => Ok(Role::Seeker),
            other => Err(CoreError::Validation(format!("Unknown role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_roles() {
        assert_eq!("facilitator".parse::<Role>().unwrap(), Role::Facilitator);
        assert_eq!("seeker".parse::<Role>().unwrap(), Role::Seeker);
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("SEEKER".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for role in [Role::Facilitator, Role::Seeker] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Role::Facilitator).unwrap();
        assert_eq!(json, "\"facilitator\"");
    }
}
