//! Caller identity and role model.
//!
//! Every operation receives the authenticated caller as an explicit
//! [`Actor`] value. Identity is established upstream; this core only
//! consumes the user id and role carried on each request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned when constructing identity values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorValidationError {
    EmptyUserId,
    InvalidUserId,
    UnknownRole { value: String },
}

impl fmt::Display for ActorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id must not be empty"),
            Self::InvalidUserId => write!(f, "user id must be a valid UUID"),
            Self::UnknownRole { value } => {
                write!(
                    f,
                    "unknown role {value:?}; expected student, staff, libstaff, or admin"
                )
            }
        }
    }
}

impl std::error::Error for ActorValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ActorValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    /// Construct a [`UserId`] from an already parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, ActorValidationError> {
        if id.is_empty() {
            return Err(ActorValidationError::EmptyUserId);
        }
        if id.trim() != id {
            return Err(ActorValidationError::InvalidUserId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| ActorValidationError::InvalidUserId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = ActorValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Role granted to the caller by the identity provider.
///
/// Roles are ordered by privilege only informally; authorisation checks use
/// the predicate methods rather than comparing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular borrower.
    Student,
    /// Academic or departmental staff; may borrow and operate the desk.
    Staff,
    /// Library staff; may operate the desk and administer the catalogue.
    LibStaff,
    /// Full administrator.
    Admin,
}

impl Role {
    /// Whether the role may perform desk operations (issuing copies and
    /// acting on another user's reservation or loan).
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::LibStaff | Self::Admin)
    }

    /// Whether the role may administer the catalogue (register copies and
    /// toggle a copy's administrative status).
    pub fn is_librarian(self) -> bool {
        matches!(self, Self::LibStaff | Self::Admin)
    }

    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Staff => "staff",
            Self::LibStaff => "libstaff",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ActorValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Self::Student),
            "staff" => Ok(Self::Staff),
            "libstaff" => Ok(Self::LibStaff),
            "admin" => Ok(Self::Admin),
            other => Err(ActorValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Authenticated caller passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    id: UserId,
    role: Role,
}

impl Actor {
    /// Build an actor from validated components.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Stable identifier of the caller.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Role granted to the caller.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller may act on a reservation or loan held by `user`.
    ///
    /// Holders always act for themselves; desk staff may act for anyone.
    pub fn may_act_for(&self, user: &UserId) -> bool {
        self.id == *user || self.role.is_staff()
    }
}

#[cfg(test)]
mod tests;
