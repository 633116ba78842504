use super::{like_pattern, Database};
use crate::models::Customer;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
    })
}

impl Database {
    /// All customers, optionally filtered by name/email substring
    pub fn list_customers(&self, search: Option<&str>) -> Result<Vec<Customer>> {
        let pattern = search
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, email, password FROM customers
             WHERE ?1 IS NULL
                OR LOWER(name) LIKE ?1 ESCAPE '\\'
                OR LOWER(email) LIKE ?1 ESCAPE '\\'
             ORDER BY id",
        )?;

        let customers = stmt
            .query_map(params![pattern], customer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list customers")?;

        Ok(customers)
    }

    pub fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, email, password FROM customers WHERE id = ?1",
            params![id],
            customer_from_row,
        )
        .optional()
        .context("Failed to load customer")
    }

    /// `customer.password` must already be hashed
    pub fn insert_customer(&self, customer: &Customer) -> Result<Customer> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO customers (name, email, password) VALUES (?1, ?2, ?3)",
            params![customer.name.trim(), customer.email.trim(), customer.password],
        )
        .context("Failed to insert customer")?;

        Ok(Customer {
            id: conn.last_insert_rowid(),
            name: customer.name.trim().to_string(),
            email: customer.email.trim().to_string(),
            password: customer.password.clone(),
        })
    }

    /// A `None` password keeps the stored credential
    pub fn update_customer(&self, id: i64, customer: &Customer) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE customers SET name = ?1, email = ?2, password = COALESCE(?3, password)
                 WHERE id = ?4",
                params![customer.name.trim(), customer.email.trim(), customer.password, id],
            )
            .context("Failed to update customer")?;
        Ok(changed > 0)
    }

    pub fn delete_customer(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute("DELETE FROM customers WHERE id = ?1", params![id])
            .context("Failed to delete customer")?;
        Ok(changed > 0)
    }

    pub fn count_customers(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
            .context("Failed to count customers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, email: &str) -> Customer {
        Customer {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            password: Some("$2b$04$stored".to_string()),
        }
    }

    #[test]
    fn test_customer_crud() {
        let db = Database::in_memory().unwrap();
        let stored = db
            .insert_customer(&customer("Ada Lovelace", "ada@example.com"))
            .unwrap();
        assert!(stored.id > 0);

        let mut changed = customer("Ada King", "ada@example.com");
        changed.password = None;
        assert!(db.update_customer(stored.id, &changed).unwrap());

        let loaded = db.get_customer(stored.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Ada King");
        assert_eq!(loaded.password.as_deref(), Some("$2b$04$stored"));

        assert!(db.delete_customer(stored.id).unwrap());
        assert!(db.get_customer(stored.id).unwrap().is_none());
        assert!(!db.delete_customer(stored.id).unwrap());
    }

    #[test]
    fn test_customer_search() {
        let db = Database::in_memory().unwrap();
        db.insert_customer(&customer("Ada Lovelace", "ada@example.com"))
            .unwrap();
        db.insert_customer(&customer("Alan Turing", "alan@bletchley.org"))
            .unwrap();

        assert_eq!(db.list_customers(None).unwrap().len(), 2);
        assert_eq!(db.list_customers(Some("BLETCHLEY")).unwrap().len(), 1);
        assert_eq!(db.list_customers(Some("lovelace")).unwrap().len(), 1);
        assert_eq!(db.count_customers().unwrap(), 2);
    }
}
