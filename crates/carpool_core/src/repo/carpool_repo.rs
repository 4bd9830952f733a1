//! Carpool document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load, create and update one carpool document per calendar date.
//! - Keep the JSON document layout and SQL details inside the persistence
//!   boundary.
//!
//! # Invariants
//! - Write paths call `CarpoolDocument::validate()` before SQL mutations.
//! - Read paths reject invalid persisted documents instead of masking them.
//! - Updates overwrite the stored document; the last write wins.

use crate::db::{ensure_connection_ready, DbError};
use crate::model::carpool::{format_date_key, CarpoolDocument, DocumentValidationError};
use crate::phone::PhoneError;
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable storage id of one carpool document.
pub type CarpoolId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for carpool and directory persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(DocumentValidationError),
    Db(DbError),
    NotFound(String),
    /// A document for this date already exists.
    DuplicateDate(String),
    InvalidPhone(PhoneError),
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::DuplicateDate(date) => write!(f, "carpool for {date} already exists"),
            Self::InvalidPhone(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Serialization(err) => write!(f, "serialization failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidPhone(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateDate(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PhoneError> for RepoError {
    fn from(value: PhoneError) -> Self {
        Self::InvalidPhone(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// A persisted document with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCarpool {
    pub id: CarpoolId,
    pub document: CarpoolDocument,
}

/// Repository interface for per-date carpool documents.
pub trait CarpoolRepository {
    fn load_by_date(&self, date: NaiveDate) -> RepoResult<Option<StoredCarpool>>;
    fn create(&self, doc: &CarpoolDocument) -> RepoResult<CarpoolId>;
    fn update(&self, id: CarpoolId, doc: &CarpoolDocument) -> RepoResult<()>;
}

impl<R: CarpoolRepository + ?Sized> CarpoolRepository for &R {
    fn load_by_date(&self, date: NaiveDate) -> RepoResult<Option<StoredCarpool>> {
        (**self).load_by_date(date)
    }

    fn create(&self, doc: &CarpoolDocument) -> RepoResult<CarpoolId> {
        (**self).create(doc)
    }

    fn update(&self, id: CarpoolId, doc: &CarpoolDocument) -> RepoResult<()> {
        (**self).update(id, doc)
    }
}

/// SQLite-backed carpool repository.
pub struct SqliteCarpoolRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCarpoolRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `DbError::UninitializedConnection` when the connection was not opened
    ///   through `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CarpoolRepository for SqliteCarpoolRepository<'_> {
    fn load_by_date(&self, date: NaiveDate) -> RepoResult<Option<StoredCarpool>> {
        let date_key = format_date_key(date);
        let row = self
            .conn
            .query_row(
                "SELECT uuid, document FROM carpools WHERE date = ?1;",
                [date_key.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id_text, document_text)) = row else {
            return Ok(None);
        };

        let id = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{id_text}` in carpools.uuid"))
        })?;
        let document: CarpoolDocument =
            serde_json::from_str(&document_text).map_err(|err| {
                RepoError::InvalidData(format!("carpool {date_key} document: {err}"))
            })?;
        if document.date != date {
            return Err(RepoError::InvalidData(format!(
                "carpool row for {date_key} holds document dated {}",
                document.date_key()
            )));
        }
        document.validate()?;

        Ok(Some(StoredCarpool { id, document }))
    }

    fn create(&self, doc: &CarpoolDocument) -> RepoResult<CarpoolId> {
        doc.validate()?;
        let id = Uuid::new_v4();
        let date_key = doc.date_key();
        let body = serde_json::to_string(doc)?;

        let inserted = self.conn.execute(
            "INSERT INTO carpools (uuid, date, document) VALUES (?1, ?2, ?3);",
            params![id.to_string(), date_key.as_str(), body],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                return Err(RepoError::DuplicateDate(date_key));
            }
            Err(err) => return Err(err.into()),
        }

        debug!("event=carpool_create module=repo status=ok carpool_id={id} date={date_key}");
        Ok(id)
    }

    fn update(&self, id: CarpoolId, doc: &CarpoolDocument) -> RepoResult<()> {
        doc.validate()?;
        let body = serde_json::to_string(doc)?;

        let changed = self.conn.execute(
            "UPDATE carpools
             SET
                date = ?1,
                document = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3;",
            params![doc.date_key(), body, id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        debug!(
            "event=carpool_update module=repo status=ok carpool_id={id} date={}",
            doc.date_key()
        );
        Ok(())
    }
}
