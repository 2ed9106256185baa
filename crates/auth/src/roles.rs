use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of an authenticated user.
///
/// The set is closed: every decision over roles is an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Employee,
    Farmer,
    GreenTech,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Employee, Role::Farmer, Role::GreenTech];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Farmer => "Farmer",
            Role::GreenTech => "GreenTech",
        }
    }

    /// Landing page a user of this role is sent to after login.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Employee => "/employee/dashboard",
            Role::Farmer => "/farmer/dashboard",
            Role::GreenTech => "/greentech/dashboard",
        }
    }

    pub fn as_producer(&self) -> Option<ProducerRole> {
        ProducerRole::try_from(*self).ok()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Employee" => Ok(Role::Employee),
            "Farmer" => Ok(Role::Farmer),
            "GreenTech" => Ok(Role::GreenTech),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles that list products and request categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProducerRole {
    Farmer,
    GreenTech,
}

impl ProducerRole {
    pub fn as_str(&self) -> &'static str {
        Role::from(*self).as_str()
    }
}

impl core::fmt::Display for ProducerRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProducerRole> for Role {
    fn from(value: ProducerRole) -> Self {
        match value {
            ProducerRole::Farmer => Role::Farmer,
            ProducerRole::GreenTech => Role::GreenTech,
        }
    }
}

impl TryFrom<Role> for ProducerRole {
    type Error = UnknownRole;

    fn try_from(value: Role) -> Result<Self, Self::Error> {
        match value {
            Role::Farmer => Ok(ProducerRole::Farmer),
            Role::GreenTech => Ok(ProducerRole::GreenTech),
            Role::Employee => Err(UnknownRole(value.as_str().to_string())),
        }
    }
}

impl FromStr for ProducerRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_str(s)?.try_into()
    }
}
