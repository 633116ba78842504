use super::{like_pattern, Database};
use crate::models::Hotel;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

const HOTEL_COLUMNS: &str = "id, name, address, city, state, country, postal_code, phone, email,
     description, star_rating, manager_id, is_active, created_at";

fn hotel_from_row(row: &Row<'_>) -> rusqlite::Result<Hotel> {
    Ok(Hotel {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        country: row.get(5)?,
        postal_code: row.get(6)?,
        phone: row.get(7)?,
        email: row.get(8)?,
        description: row.get(9)?,
        star_rating: row.get(10)?,
        manager_id: row.get(11)?,
        is_active: row.get(12)?,
        created_at: row.get(13)?,
    })
}

impl Database {
    /// Active hotels, optionally filtered by name/address substring
    pub fn list_hotels(&self, search: Option<&str>) -> Result<Vec<Hotel>> {
        let conn = self.conn();

        let hotels = match search.filter(|s| !s.trim().is_empty()) {
            Some(search) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {HOTEL_COLUMNS} FROM hotels
                     WHERE is_active = 1
                       AND (LOWER(name) LIKE ?1 ESCAPE '\\' OR LOWER(address) LIKE ?1 ESCAPE '\\')
                     ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![like_pattern(search)], hotel_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {HOTEL_COLUMNS} FROM hotels WHERE is_active = 1 ORDER BY id"
                ))?;
                let rows = stmt.query_map([], hotel_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(hotels)
    }

    pub fn get_hotel(&self, id: i64) -> Result<Option<Hotel>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = ?1 AND is_active = 1"),
            params![id],
            hotel_from_row,
        )
        .optional()
        .context("Failed to load hotel")
    }

    pub fn insert_hotel(&self, hotel: &Hotel) -> Result<Hotel> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO hotels (name, address, city, state, country, postal_code, phone, email,
                                 description, star_rating, manager_id, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12)",
            params![
                hotel.name.trim(),
                hotel.address.trim(),
                hotel.city,
                hotel.state,
                hotel.country,
                hotel.postal_code,
                hotel.phone,
                hotel.email,
                hotel.description,
                hotel.star_rating,
                hotel.manager_id,
                created_at,
            ],
        )
        .context("Failed to insert hotel")?;

        Ok(Hotel {
            id: conn.last_insert_rowid(),
            name: hotel.name.trim().to_string(),
            address: hotel.address.trim().to_string(),
            is_active: true,
            created_at: Some(created_at),
            ..hotel.clone()
        })
    }

    /// Overwrites every mutable column; returns false when no active hotel has `id`
    pub fn update_hotel(&self, id: i64, hotel: &Hotel) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE hotels SET name = ?1, address = ?2, city = ?3, state = ?4, country = ?5,
                        postal_code = ?6, phone = ?7, email = ?8, description = ?9,
                        star_rating = ?10, manager_id = ?11
                 WHERE id = ?12 AND is_active = 1",
                params![
                    hotel.name.trim(),
                    hotel.address.trim(),
                    hotel.city,
                    hotel.state,
                    hotel.country,
                    hotel.postal_code,
                    hotel.phone,
                    hotel.email,
                    hotel.description,
                    hotel.star_rating,
                    hotel.manager_id,
                    id,
                ],
            )
            .context("Failed to update hotel")?;
        Ok(changed > 0)
    }

    /// Soft delete
    pub fn deactivate_hotel(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE hotels SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                params![id],
            )
            .context("Failed to deactivate hotel")?;
        Ok(changed > 0)
    }

    pub fn count_active_hotels(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM hotels WHERE is_active = 1", [], |row| {
            row.get(0)
        })
        .context("Failed to count hotels")
    }
}
