//! User identity and role model.
//!
//! DESIGN
//! ======
//! Backends send `role` as a bare string, a list of strings, a list holding a
//! `null` placeholder, or nothing at all. All of these are normalized to a
//! [`Roles`] set at deserialization so every membership check downstream is a
//! set lookup, never a substring test over a bare string.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single role granted to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    User,
    /// Any role this client has no special handling for, kept verbatim.
    Other(String),
}

impl Role {
    /// Parse a role name. `admin` and `user` match case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else if trimmed.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Other(trimmed.to_owned())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Normalized set of roles. Always serialized as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Blank names are dropped.
impl<'a> FromIterator<&'a str> for Roles {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(Role::parse)
            .collect()
    }
}

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

impl Serialize for Roles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRoles {
            One(String),
            Many(Vec<Option<String>>),
        }

        Ok(match Option::<RawRoles>::deserialize(deserializer)? {
            None => Self::default(),
            Some(RawRoles::One(role)) => std::iter::once(role.as_str()).collect(),
            Some(RawRoles::Many(roles)) => roles.iter().flatten().map(String::as_str).collect(),
        })
    }
}

/// The user record returned by the authentication endpoint.
///
/// Fields this client does not interpret (id, email, ...) are preserved in
/// `extra` so the persisted record round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "role")]
    pub roles: Roles,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// The identity held while nobody is signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_roles<'a>(name: Option<&str>, roles: impl IntoIterator<Item = &'a str>) -> Self {
        Self { name: name.map(str::to_owned), roles: roles.into_iter().collect(), extra: Map::new() }
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }
}
