use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Ordered privilege tiers. The numeric level is the only authority signal:
/// "at least X" means `level(role) >= level(X)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    None,
    Developer,
    Admin,
}

/// Lowest role that may use the API at all.
pub const BASELINE_ROLE: Role = Role::Developer;

/// Raw role input as it arrives from a payload or a stored document:
/// either a numeric level or a symbolic name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleInput {
    Level(i64),
    Name(String),
}

impl Role {
    pub const ALL: [Role; 3] = [Role::None, Role::Developer, Role::Admin];

    pub fn level(self) -> i64 {
        match self {
            Role::None => 0,
            Role::Developer => 10,
            Role::Admin => 20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::None => "NONE",
            Role::Developer => "DEVELOPER",
            Role::Admin => "ADMIN",
        }
    }

    /// Only the exact enumerated levels are roles; 15 or -1 are not.
    pub fn from_level(level: i64) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.level() == level)
    }

    /// Case-insensitive match on the canonical name; padding is not stripped.
    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// Never fails loudly: unknown names, undefined levels and anything else give `None`.
    pub fn normalize(input: &RoleInput) -> Option<Role> {
        match input {
            RoleInput::Level(n) => Role::from_level(*n),
            RoleInput::Name(s) => Role::from_name(s),
        }
    }

    pub fn at_least(self, threshold: Role) -> bool { self.level() >= threshold.level() }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering { self.level().cmp(&other.level()) }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

// Roles travel as their numeric level, matching the stored `userLevel` field.
impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.level())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = RoleInput::deserialize(deserializer)?;
        Role::normalize(&input).ok_or_else(|| serde::de::Error::custom(format!("invalid user level: {:?}", input)))
    }
}
