//! Driver/rider directory contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve the "current user" profile by phone number.
//! - Persist driver and rider profiles created during setup.
//! - Search and register schools.
//!
//! # Invariants
//! - Phone numbers are normalized before they reach SQL, for both writes and
//!   lookups.
//! - Profiles are upserted by id; a phone number belongs to one profile.

use crate::db::ensure_connection_ready;
use crate::model::profile::{Driver, RiderProfile, School};
use crate::phone::validate_phone_number;
use crate::repo::carpool_repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Repository interface for user profiles.
pub trait DirectoryRepository {
    fn find_driver_by_phone(&self, phone: &str) -> RepoResult<Option<Driver>>;
    fn find_rider_by_phone(&self, phone: &str) -> RepoResult<Option<RiderProfile>>;
    fn save_driver(&self, driver: &Driver) -> RepoResult<()>;
    fn save_rider(&self, rider: &RiderProfile) -> RepoResult<()>;
    /// Schools whose name contains every word of `term`, ordered by name.
    fn search_schools(&self, term: &str) -> RepoResult<Vec<School>>;
    /// Registers a school and returns its new id.
    fn create_school(&self, name: &str, grades: &[u8]) -> RepoResult<String>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn find_driver_by_phone(&self, phone: &str) -> RepoResult<Option<Driver>> {
        find_profile(self.conn, ProfileTable::Drivers, phone)
    }

    fn find_rider_by_phone(&self, phone: &str) -> RepoResult<Option<RiderProfile>> {
        find_profile(self.conn, ProfileTable::Riders, phone)
    }

    fn save_driver(&self, driver: &Driver) -> RepoResult<()> {
        let mut normalized = driver.clone();
        normalized.phone = validate_phone_number(&driver.phone)?;
        save_profile(
            self.conn,
            ProfileTable::Drivers,
            &normalized.id,
            &normalized.phone,
            &normalized,
        )
    }

    fn save_rider(&self, rider: &RiderProfile) -> RepoResult<()> {
        let mut normalized = rider.clone();
        normalized.phone = validate_phone_number(&rider.phone)?;
        save_profile(
            self.conn,
            ProfileTable::Riders,
            &normalized.id,
            &normalized.phone,
            &normalized,
        )
    }

    fn search_schools(&self, term: &str) -> RepoResult<Vec<School>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, grades FROM schools ORDER BY name ASC, id ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut schools = Vec::new();
        for row in rows {
            let (id, name, grades_text) = row?;
            let grades = serde_json::from_str(&grades_text).map_err(|err| {
                RepoError::InvalidData(format!("schools.grades for {id}: {err}"))
            })?;
            let school = School { id, name, grades };
            if school.matches(term) {
                schools.push(school);
            }
        }
        Ok(schools)
    }

    fn create_school(&self, name: &str, grades: &[u8]) -> RepoResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "school name must not be blank".to_string(),
            ));
        }
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO schools (id, name, grades) VALUES (?1, ?2, ?3);",
            params![id, name, serde_json::to_string(grades)?],
        )?;

        debug!("event=school_create module=repo status=ok id={id}");
        Ok(id)
    }
}

#[derive(Debug, Clone, Copy)]
enum ProfileTable {
    Drivers,
    Riders,
}

impl ProfileTable {
    fn name(self) -> &'static str {
        match self {
            Self::Drivers => "drivers",
            Self::Riders => "riders",
        }
    }
}

fn find_profile<T: DeserializeOwned>(
    conn: &Connection,
    table: ProfileTable,
    phone: &str,
) -> RepoResult<Option<T>> {
    let normalized = validate_phone_number(phone)?;
    let profile = conn
        .query_row(
            &format!("SELECT profile FROM {} WHERE phone = ?1;", table.name()),
            [normalized.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    profile
        .map(|text| {
            serde_json::from_str(&text).map_err(|err| {
                RepoError::InvalidData(format!("{}.profile: {err}", table.name()))
            })
        })
        .transpose()
}

fn save_profile<T: Serialize>(
    conn: &Connection,
    table: ProfileTable,
    id: &str,
    phone: &str,
    profile: &T,
) -> RepoResult<()> {
    if id.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "{} profile id must not be blank",
            table.name()
        )));
    }
    let body = serde_json::to_string(profile)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, phone, profile) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                phone = excluded.phone,
                profile = excluded.profile,
                updated_at = (strftime('%s', 'now') * 1000);",
            table.name()
        ),
        params![id, phone, body],
    )?;

    debug!(
        "event=profile_save module=repo status=ok table={} id={id}",
        table.name()
    );
    Ok(())
}
