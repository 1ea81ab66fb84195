// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User records: bare creation on first contact, completion on registration.

use rusqlite::{OptionalExtension, params};
use ticketdesk_core::DeskError;
use ticketdesk_core::types::{GeoPoint, Registration, User, UserId};

use crate::database::{Database, map_tr_err, now_ts, parse_date, parse_ts};

/// Insert a bare user. Existing rows are left untouched.
pub async fn create_user(db: &Database, id: UserId) -> Result<(), DeskError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
                params![id.0, now_ts()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a user by ID.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<User>, DeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, phone, latitude, longitude, birth_date,
                        is_registered, has_avatar, created_at
                 FROM users WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id.0], |row| {
                let latitude: Option<f64> = row.get(3)?;
                let longitude: Option<f64> = row.get(4)?;
                let birth_date: Option<String> = row.get(5)?;
                let created_at: String = row.get(8)?;
                Ok(User {
                    id: UserId(row.get(0)?),
                    full_name: row.get(1)?,
                    phone: row.get(2)?,
                    location: latitude.zip(longitude).map(|(latitude, longitude)| GeoPoint {
                        latitude,
                        longitude,
                    }),
                    birth_date: birth_date.as_deref().map(|d| parse_date(5, d)).transpose()?,
                    is_registered: row.get(6)?,
                    has_avatar: row.get(7)?,
                    created_at: parse_ts(8, &created_at)?,
                })
            });
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Write the registration fields and mark the user registered.
pub async fn update_user_registration(
    db: &Database,
    registration: &Registration,
) -> Result<(), DeskError> {
    let reg = registration.clone();
    let user_id = reg.user_id;
    let updated = db
        .connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE users
                 SET full_name = ?1, phone = ?2, latitude = ?3, longitude = ?4,
                     birth_date = ?5, has_avatar = ?6, is_registered = 1
                 WHERE id = ?7",
                params![
                    reg.full_name,
                    reg.phone,
                    reg.location.map(|p| p.latitude),
                    reg.location.map(|p| p.longitude),
                    reg.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    reg.has_avatar,
                    reg.user_id.0,
                ],
            )?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(DeskError::storage(format!(
            "cannot register unknown user {user_id}"
        )));
    }
    Ok(())
}

/// Whether the user exists and completed registration.
pub async fn is_registered(db: &Database, id: UserId) -> Result<bool, DeskError> {
    db.connection()
        .call(move |conn| {
            let flag: Option<bool> = conn
                .query_row(
                    "SELECT is_registered FROM users WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(flag.unwrap_or(false))
        })
        .await
        .map_err(map_tr_err)
}
