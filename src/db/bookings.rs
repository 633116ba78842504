use super::Database;
use crate::models::{Booking, BookingStatus};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;

const BOOKING_COLUMNS: &str = "id, customer_id, hotel_id, room_id, check_in_date, check_out_date,
     booking_date, total_amount, status, special_requests, created_at, updated_at";

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let status: String = row.get(8)?;
    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        hotel_id: row.get(2)?,
        room_id: row.get(3)?,
        check_in_date: row.get(4)?,
        check_out_date: row.get(5)?,
        booking_date: row.get(6)?,
        total_amount: row.get(7)?,
        status: BookingStatus::parse(&status).unwrap_or_default(),
        special_requests: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl Database {
    fn query_bookings(&self, filter: &str, param: Option<i64>) -> Result<Vec<Booking>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings {filter} ORDER BY created_at DESC, id DESC"
        ))?;

        let bookings = match param {
            Some(value) => stmt
                .query_map(params![value], booking_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>(),
            None => stmt
                .query_map([], booking_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>(),
        }
        .context("Failed to list bookings")?;

        Ok(bookings)
    }

    /// Newest first
    pub fn list_bookings(&self) -> Result<Vec<Booking>> {
        self.query_bookings("", None)
    }

    pub fn bookings_for_customer(&self, customer_id: i64) -> Result<Vec<Booking>> {
        self.query_bookings("WHERE customer_id = ?1", Some(customer_id))
    }

    pub fn bookings_for_hotel(&self, hotel_id: i64) -> Result<Vec<Booking>> {
        self.query_bookings("WHERE hotel_id = ?1", Some(hotel_id))
    }

    pub fn get_booking(&self, id: i64) -> Result<Option<Booking>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            booking_from_row,
        )
        .optional()
        .context("Failed to load booking")
    }

    pub fn insert_booking(&self, booking: &Booking) -> Result<Booking> {
        let check_in = booking
            .check_in_date
            .context("Booking has no check-in date")?;
        let check_out = booking
            .check_out_date
            .context("Booking has no check-out date")?;
        let now = Utc::now();

        let conn = self.conn();
        conn.execute(
            "INSERT INTO bookings (customer_id, hotel_id, room_id, check_in_date, check_out_date,
                                   booking_date, total_amount, status, special_requests,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?6, ?6)",
            params![
                booking.customer_id,
                booking.hotel_id,
                booking.room_id,
                check_in,
                check_out,
                now,
                booking.total_amount,
                booking.status.as_str(),
                booking.special_requests,
            ],
        )
        .context("Failed to insert booking")?;

        Ok(Booking {
            id: conn.last_insert_rowid(),
            booking_date: Some(now),
            created_at: Some(now),
            updated_at: Some(now),
            ..booking.clone()
        })
    }

    pub fn update_booking_status(&self, id: i64, status: BookingStatus) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now(), id],
            )
            .context("Failed to update booking status")?;
        Ok(changed > 0)
    }

    pub fn delete_booking(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute("DELETE FROM bookings WHERE id = ?1", params![id])
            .context("Failed to delete booking")?;
        Ok(changed > 0)
    }

    pub fn count_bookings(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
            .context("Failed to count bookings")
    }

    /// Count per status; statuses without bookings map to zero
    pub fn booking_counts_by_status(&self) -> Result<HashMap<BookingStatus, i64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to count bookings by status")?;

        let mut counts: HashMap<BookingStatus, i64> =
            BookingStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for (status, count) in rows {
            if let Some(status) = BookingStatus::parse(&status) {
                *counts.entry(status).or_insert(0) += count;
            }
        }

        Ok(counts)
    }

    /// Sum of amounts over billable bookings
    pub fn total_revenue(&self) -> Result<f64> {
        let billable: Vec<String> = BookingStatus::ALL
            .iter()
            .filter(|status| status.is_billable())
            .map(|status| format!("'{}'", status.as_str()))
            .collect();

        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(total_amount), 0.0) FROM bookings WHERE status IN ({})",
                billable.join(", ")
            ),
            [],
            |row| row.get(0),
        )
        .context("Failed to compute revenue")
    }

    pub fn recent_bookings(&self, limit: usize) -> Result<Vec<Booking>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;

        let bookings = stmt
            .query_map(params![limit as i64], booking_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list recent bookings")?;

        Ok(bookings)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn sample_booking(customer_id: i64, status: BookingStatus, amount: f64) -> Booking {
        Booking {
            id: 0,
            customer_id,
            hotel_id: 1,
            room_id: None,
            check_in_date: NaiveDate::from_ymd_opt(2026, 7, 1),
            check_out_date: NaiveDate::from_ymd_opt(2026, 7, 3),
            booking_date: None,
            total_amount: Some(amount),
            status,
            special_requests: Some("Late arrival".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_insert_and_get_booking() {
        let db = Database::in_memory().unwrap();
        let stored = db
            .insert_booking(&sample_booking(3, BookingStatus::Pending, 240.0))
            .unwrap();

        let loaded = db.get_booking(stored.id).unwrap().unwrap();
        assert_eq!(loaded.customer_id, 3);
        assert_eq!(loaded.status, BookingStatus::Pending);
        assert_eq!(loaded.check_in_date, NaiveDate::from_ymd_opt(2026, 7, 1));
        assert!(loaded.booking_date.is_some());
    }

    #[test]
    fn test_bookings_newest_first_and_by_customer() {
        let db = Database::in_memory().unwrap();
        let first = db
            .insert_booking(&sample_booking(1, BookingStatus::Pending, 100.0))
            .unwrap();
        let second = db
            .insert_booking(&sample_booking(2, BookingStatus::Pending, 100.0))
            .unwrap();

        let all = db.list_bookings().unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let mine = db.bookings_for_customer(1).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);
        assert_eq!(db.bookings_for_hotel(1).unwrap().len(), 2);
    }

    #[test]
    fn test_status_counts_and_revenue() {
        let db = Database::in_memory().unwrap();
        db.insert_booking(&sample_booking(1, BookingStatus::Pending, 100.0))
            .unwrap();
        db.insert_booking(&sample_booking(1, BookingStatus::Confirmed, 200.0))
            .unwrap();
        db.insert_booking(&sample_booking(2, BookingStatus::CheckedOut, 300.0))
            .unwrap();
        let cancelled = db
            .insert_booking(&sample_booking(2, BookingStatus::Confirmed, 400.0))
            .unwrap();
        assert!(db
            .update_booking_status(cancelled.id, BookingStatus::Cancelled)
            .unwrap());

        let counts = db.booking_counts_by_status().unwrap();
        assert_eq!(counts[&BookingStatus::Pending], 1);
        assert_eq!(counts[&BookingStatus::Confirmed], 1);
        assert_eq!(counts[&BookingStatus::CheckedIn], 0);
        assert_eq!(counts[&BookingStatus::Cancelled], 1);

        assert_eq!(db.count_bookings().unwrap(), 4);
        assert!((db.total_revenue().unwrap() - 500.0).abs() < f64::EPSILON);
        assert_eq!(db.recent_bookings(2).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_booking() {
        let db = Database::in_memory().unwrap();
        let stored = db
            .insert_booking(&sample_booking(1, BookingStatus::Pending, 100.0))
            .unwrap();

        assert!(db.delete_booking(stored.id).unwrap());
        assert!(db.get_booking(stored.id).unwrap().is_none());
        assert!(!db.update_booking_status(stored.id, BookingStatus::Confirmed).unwrap());
    }
}
