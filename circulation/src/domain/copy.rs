//! Physical copy model and typed lending status.
//!
//! A [`CopyRecord`] describes one physical, separately trackable instance of
//! a title. Its [`CopyStatus`] owns the reservation and loan fields, so a
//! record cannot hold reservation data without being `Reserved` or loan data
//! without being `Issued`. The serde representation flattens those fields
//! for the wire and re-validates the presence rules on deserialisation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::actor::UserId;

/// Validation errors returned when constructing copy values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyValidationError {
    EmptyTitle,
    EmptyAuthor,
    EmptyIsbn,
    EmptyCallNumber,
    EmptyAccessionNumber,
    PaddedAccessionNumber,
    /// Reservation fields present on a copy that is not reserved.
    StrayReservation { status: CopyStatusKind },
    /// Loan fields present on a copy that is not issued.
    StrayLoan { status: CopyStatusKind },
    /// Status is `Reserved` but the reservation fields are incomplete.
    MissingReservation,
    /// Status is `Issued` but the loan fields are incomplete.
    MissingLoan,
    /// A holder identifier failed identity validation.
    InvalidHolder { message: String },
}

impl fmt::Display for CopyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyAuthor => write!(f, "author must not be empty"),
            Self::EmptyIsbn => write!(f, "isbn must not be empty"),
            Self::EmptyCallNumber => write!(f, "call number must not be empty"),
            Self::EmptyAccessionNumber => write!(f, "accession number must not be empty"),
            Self::PaddedAccessionNumber => {
                write!(f, "accession number must not contain surrounding whitespace")
            }
            Self::StrayReservation { status } => {
                write!(f, "copy with status {status} must not carry reservation fields")
            }
            Self::StrayLoan { status } => {
                write!(f, "copy with status {status} must not carry loan fields")
            }
            Self::MissingReservation => {
                write!(f, "reserved copy must carry reservedBy and reservedAt")
            }
            Self::MissingLoan => {
                write!(f, "issued copy must carry issuedTo, issuedAt, and dueDate")
            }
            Self::InvalidHolder { message } => write!(f, "invalid holder id: {message}"),
        }
    }
}

impl std::error::Error for CopyValidationError {}

/// Stable identifier for one physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CopyId(Uuid);

impl CopyId {
    /// Generate a new random [`CopyId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CopyId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CopyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Accession number stamped on the physical copy; unique per copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessionNumber(String);

impl AccessionNumber {
    /// Validate and construct an [`AccessionNumber`].
    pub fn new(value: impl Into<String>) -> Result<Self, CopyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CopyValidationError::EmptyAccessionNumber);
        }
        if raw.trim() != raw {
            return Err(CopyValidationError::PaddedAccessionNumber);
        }
        Ok(Self(raw))
    }

    /// Borrow the accession number as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AccessionNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AccessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AccessionNumber> for String {
    fn from(value: AccessionNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for AccessionNumber {
    type Error = CopyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Discriminant of [`CopyStatus`] without the associated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CopyStatusKind {
    /// In circulation and available.
    Active,
    /// Administratively withdrawn from circulation.
    Deactive,
    /// Held for a user ahead of issuance.
    Reserved,
    /// On loan to a user.
    Issued,
}

impl CopyStatusKind {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Deactive => "Deactive",
            Self::Reserved => "Reserved",
            Self::Issued => "Issued",
        }
    }
}

impl fmt::Display for CopyStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lending status of a copy, owning the fields tied to each state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStatus {
    /// In circulation and available for reservation or issuance.
    Active,
    /// Withdrawn from circulation; cannot be reserved or issued.
    Deactive,
    /// Held for `by` since `at`.
    Reserved {
        by: UserId,
        at: DateTime<Utc>,
    },
    /// On loan to `to` since `at`, due back by `due`.
    Issued {
        to: UserId,
        at: DateTime<Utc>,
        due: DateTime<Utc>,
    },
}

impl CopyStatus {
    /// Discriminant without the associated fields.
    pub fn kind(&self) -> CopyStatusKind {
        match self {
            Self::Active => CopyStatusKind::Active,
            Self::Deactive => CopyStatusKind::Deactive,
            Self::Reserved { .. } => CopyStatusKind::Reserved,
            Self::Issued { .. } => CopyStatusKind::Issued,
        }
    }
}

/// Catalogue fields supplied when registering a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub call_number: String,
    pub accession_number: String,
}

/// One physical copy of a title.
///
/// ## Invariants
/// - Catalogue text fields are non-empty once trimmed of whitespace.
/// - Reservation fields exist exactly when the status is `Reserved`; loan
///   fields exist exactly when the status is `Issued`. Both are enforced
///   structurally by [`CopyStatus`] and re-checked when deserialising the
///   flattened wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CopyRecordDto", into = "CopyRecordDto")]
pub struct CopyRecord {
    id: CopyId,
    title: String,
    author: String,
    isbn: String,
    call_number: String,
    accession_number: AccessionNumber,
    status: CopyStatus,
}

fn require_text(
    value: String,
    error: CopyValidationError,
) -> Result<String, CopyValidationError> {
    if value.trim().is_empty() {
        return Err(error);
    }
    Ok(value)
}

impl CopyRecord {
    /// Build a newly registered copy; registration always starts `Active`.
    pub fn new(id: CopyId, draft: CopyDraft) -> Result<Self, CopyValidationError> {
        Ok(Self {
            id,
            title: require_text(draft.title, CopyValidationError::EmptyTitle)?,
            author: require_text(draft.author, CopyValidationError::EmptyAuthor)?,
            isbn: require_text(draft.isbn, CopyValidationError::EmptyIsbn)?,
            call_number: require_text(draft.call_number, CopyValidationError::EmptyCallNumber)?,
            accession_number: AccessionNumber::new(draft.accession_number)?,
            status: CopyStatus::Active,
        })
    }

    /// Stable identifier of the copy.
    pub fn id(&self) -> CopyId {
        self.id
    }

    /// Title of the copy.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Author of the copy.
    pub fn author(&self) -> &str {
        self.author.as_str()
    }

    /// ISBN of the title this copy belongs to.
    pub fn isbn(&self) -> &str {
        self.isbn.as_str()
    }

    /// Shelving call number.
    pub fn call_number(&self) -> &str {
        self.call_number.as_str()
    }

    /// Accession number stamped on the copy.
    pub fn accession_number(&self) -> &AccessionNumber {
        &self.accession_number
    }

    /// Current lending status.
    pub fn status(&self) -> &CopyStatus {
        &self.status
    }

    /// Clone the record with a different status; catalogue fields carry over.
    pub fn with_status(&self, status: CopyStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CopyRecordDto {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    call_number: String,
    accession_number: String,
    status: CopyStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
}

impl From<CopyRecord> for CopyRecordDto {
    fn from(value: CopyRecord) -> Self {
        let CopyRecord {
            id,
            title,
            author,
            isbn,
            call_number,
            accession_number,
            status,
        } = value;

        let mut dto = Self {
            id: *id.as_uuid(),
            title,
            author,
            isbn,
            call_number,
            accession_number: accession_number.into(),
            status: status.kind(),
            reserved_by: None,
            reserved_at: None,
            issued_to: None,
            issued_at: None,
            due_date: None,
        };
        match status {
            CopyStatus::Active | CopyStatus::Deactive => {}
            CopyStatus::Reserved { by, at } => {
                dto.reserved_by = Some(by.to_string());
                dto.reserved_at = Some(at);
            }
            CopyStatus::Issued { to, at, due } => {
                dto.issued_to = Some(to.to_string());
                dto.issued_at = Some(at);
                dto.due_date = Some(due);
            }
        }
        dto
    }
}

fn parse_holder(raw: String) -> Result<UserId, CopyValidationError> {
    UserId::new(raw).map_err(|err| CopyValidationError::InvalidHolder {
        message: err.to_string(),
    })
}

impl TryFrom<CopyRecordDto> for CopyRecord {
    type Error = CopyValidationError;

    fn try_from(value: CopyRecordDto) -> Result<Self, Self::Error> {
        let CopyRecordDto {
            id,
            title,
            author,
            isbn,
            call_number,
            accession_number,
            status,
            reserved_by,
            reserved_at,
            issued_to,
            issued_at,
            due_date,
        } = value;

        let has_reservation = reserved_by.is_some() || reserved_at.is_some();
        let has_loan = issued_to.is_some() || issued_at.is_some() || due_date.is_some();

        let status = match status {
            CopyStatusKind::Active | CopyStatusKind::Deactive => {
                if has_reservation {
                    return Err(CopyValidationError::StrayReservation { status });
                }
                if has_loan {
                    return Err(CopyValidationError::StrayLoan { status });
                }
                match status {
                    CopyStatusKind::Active => CopyStatus::Active,
                    _ => CopyStatus::Deactive,
                }
            }
            CopyStatusKind::Reserved => {
                if has_loan {
                    return Err(CopyValidationError::StrayLoan { status });
                }
                let (Some(by), Some(at)) = (reserved_by, reserved_at) else {
                    return Err(CopyValidationError::MissingReservation);
                };
                CopyStatus::Reserved {
                    by: parse_holder(by)?,
                    at,
                }
            }
            CopyStatusKind::Issued => {
                if has_reservation {
                    return Err(CopyValidationError::StrayReservation { status });
                }
                let (Some(to), Some(at), Some(due)) = (issued_to, issued_at, due_date) else {
                    return Err(CopyValidationError::MissingLoan);
                };
                CopyStatus::Issued {
                    to: parse_holder(to)?,
                    at,
                    due,
                }
            }
        };

        let base = Self::new(
            CopyId::from(id),
            CopyDraft {
                title,
                author,
                isbn,
                call_number,
                accession_number,
            },
        )?;
        Ok(base.with_status(status))
    }
}
