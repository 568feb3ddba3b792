use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organizer,
    Presenter,
    Committee,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Presenter => "presenter",
            Self::Committee => "committee",
            Self::Guest => "guest",
        }
    }

    /// Guests and committee members may hand out virtual rewards.
    pub fn is_grantor(&self) -> bool {
        matches!(self, Self::Guest | Self::Committee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organizer" => Ok(Self::Organizer),
            "presenter" => Ok(Self::Presenter),
            "committee" => Ok(Self::Committee),
            "guest" => Ok(Self::Guest),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A user's membership in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub display_name: String,
}
