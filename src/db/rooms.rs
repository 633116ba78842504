use super::{like_pattern, Database};
use crate::models::Room;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

const ROOM_COLUMNS: &str =
    "id, hotel_id, room_number, room_type, capacity, price_per_night, amenities, is_available, is_active";

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        room_number: row.get(2)?,
        room_type: row.get(3)?,
        capacity: row.get(4)?,
        price_per_night: row.get(5)?,
        amenities: row.get(6)?,
        is_available: row.get(7)?,
        is_active: row.get(8)?,
    })
}

impl Database {
    /// Active rooms, optionally restricted to one hotel and a number/type/amenities substring
    pub fn list_rooms(&self, hotel_id: Option<i64>, search: Option<&str>) -> Result<Vec<Room>> {
        let pattern = search
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms
             WHERE is_active = 1
               AND (?1 IS NULL OR hotel_id = ?1)
               AND (?2 IS NULL
                    OR LOWER(room_number) LIKE ?2 ESCAPE '\\'
                    OR LOWER(room_type) LIKE ?2 ESCAPE '\\'
                    OR LOWER(amenities) LIKE ?2 ESCAPE '\\')
             ORDER BY hotel_id, room_number"
        ))?;

        let rooms = stmt
            .query_map(params![hotel_id, pattern], room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list rooms")?;

        Ok(rooms)
    }

    /// Rooms of `hotel_id` flagged available with no CONFIRMED or CHECKED_IN booking
    /// overlapping the half-open stay `[check_in, check_out)`
    pub fn available_rooms(
        &self,
        hotel_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<Room>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms r
             WHERE r.hotel_id = ?1 AND r.is_available = 1 AND r.is_active = 1
               AND r.id NOT IN (
                   SELECT b.room_id FROM bookings b
                   WHERE b.room_id IS NOT NULL
                     AND b.status IN ('CONFIRMED', 'CHECKED_IN')
                     AND b.check_in_date < ?3
                     AND b.check_out_date > ?2)
             ORDER BY r.room_number"
        ))?;

        let rooms = stmt
            .query_map(params![hotel_id, check_in, check_out], room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list available rooms")?;

        Ok(rooms)
    }

    pub fn get_room(&self, id: i64) -> Result<Option<Room>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1 AND is_active = 1"),
            params![id],
            room_from_row,
        )
        .optional()
        .context("Failed to load room")
    }

    /// New rooms always start available and active
    pub fn insert_room(&self, room: &Room) -> Result<Room> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO rooms (hotel_id, room_number, room_type, capacity, price_per_night,
                                amenities, is_available, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1)",
            params![
                room.hotel_id,
                room.room_number.trim(),
                room.room_type.trim(),
                room.capacity,
                room.price_per_night,
                room.amenities,
            ],
        )
        .context("Failed to insert room")?;

        Ok(Room {
            id: conn.last_insert_rowid(),
            room_number: room.room_number.trim().to_string(),
            room_type: room.room_type.trim().to_string(),
            is_available: true,
            is_active: true,
            ..room.clone()
        })
    }

    pub fn update_room(&self, id: i64, room: &Room) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE rooms SET hotel_id = ?1, room_number = ?2, room_type = ?3, capacity = ?4,
                        price_per_night = ?5, amenities = ?6, is_available = ?7
                 WHERE id = ?8 AND is_active = 1",
                params![
                    room.hotel_id,
                    room.room_number.trim(),
                    room.room_type.trim(),
                    room.capacity,
                    room.price_per_night,
                    room.amenities,
                    room.is_available,
                    id,
                ],
            )
            .context("Failed to update room")?;
        Ok(changed > 0)
    }

    /// Soft delete
    pub fn deactivate_room(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE rooms SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                params![id],
            )
            .context("Failed to deactivate room")?;
        Ok(changed > 0)
    }

    pub fn count_active_rooms(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM rooms WHERE is_active = 1", [], |row| {
            row.get(0)
        })
        .context("Failed to count rooms")
    }
}
