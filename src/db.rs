use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Error, OptionalExtension, Row, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{
    place::{Place, PlaceSummary},
    review::Review,
    user::User,
};

// Shared handle to the SQLite store. Cloning is cheap; every clone talks to
// the same connection and each operation holds the lock for its duration.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const USER_COLUMNS: &str = "u.id, u.phone_number, u.name, u.password_hash, u.date_joined";

const REVIEW_SELECT: &str = "SELECT r.id, r.place_id, r.user_id, u.name, r.rating, r.text, r.created_at
     FROM reviews r
     JOIN users u ON u.id = r.user_id";

fn user_from_row(row: &Row<'_>) -> Result<User, Error> {
    Ok(User {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        date_joined: row.get(4)?,
    })
}

fn review_from_row(row: &Row<'_>) -> Result<Review, Error> {
    Ok(Review {
        id: row.get(0)?,
        place_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        rating: row.get(4)?,
        text: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// Insert-or-fetch on the (name, address) unique key. Returns the place id and
// whether this call created the row.
fn get_or_create_place_tx(tx: &Transaction<'_>, name: &str, address: &str) -> Result<(i64, bool), Error> {
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO places (name, address) VALUES (?, ?)",
        params![name, address],
    )?;

    let place_id = tx.query_row(
        "SELECT id FROM places WHERE name = ? AND address = ?",
        params![name, address],
        |row| row.get(0),
    )?;

    Ok((place_id, inserted == 1))
}

impl Database {
    // Open (or create) the database file; ":memory:" gives a private in-memory store
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        info!("Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn create_schema(&self) -> Result<(), Error> {
        let conn = self.conn.lock().await;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                phone_number TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                date_joined TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tokens (
                key TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS places (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                UNIQUE (name, address)
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                place_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (place_id) REFERENCES places(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS reviews_place_id ON reviews (place_id);",
        )?;

        info!("[DB] Schema ready");
        Ok(())
    }

    pub async fn insert_user(&self, phone_number: &str, name: &str, password_hash: &str) -> Result<User, Error> {
        let conn = self.conn.lock().await;
        let date_joined = Utc::now();

        conn.execute(
            "INSERT INTO users (phone_number, name, password_hash, date_joined) VALUES (?, ?, ?, ?)",
            params![phone_number, name, password_hash, date_joined],
        )?;
        let id = conn.last_insert_rowid();
        info!("[DB] Created user {}", id);

        Ok(User {
            id,
            phone_number: phone_number.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            date_joined,
        })
    }

    pub async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.phone_number = ?"),
            [phone_number],
            user_from_row,
        )
        .optional()
    }

    pub async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?"),
            [key],
            user_from_row,
        )
        .optional()
    }

    // A user keeps one token; `candidate` is only stored when none exists yet.
    pub async fn get_or_create_token(&self, user_id: i64, candidate: &str) -> Result<String, Error> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO tokens (key, user_id, created_at) VALUES (?, ?, ?)",
            params![candidate, user_id, Utc::now()],
        )?;
        let key: String = tx.query_row("SELECT key FROM tokens WHERE user_id = ?", [user_id], |row| row.get(0))?;

        tx.commit()?;
        if inserted == 1 {
            debug!("[DB] Issued token for user {}", user_id);
        }
        Ok(key)
    }

    pub async fn get_or_create_place(&self, name: &str, address: &str) -> Result<(Place, bool), Error> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let (id, created) = get_or_create_place_tx(&tx, name, address)?;
        tx.commit()?;

        Ok((
            Place {
                id,
                name: name.to_string(),
                address: address.to_string(),
            },
            created,
        ))
    }

    pub async fn get_place(&self, place_id: i64) -> Result<Option<Place>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, address FROM places WHERE id = ?",
            [place_id],
            |row| {
                Ok(Place {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                })
            },
        )
        .optional()
    }

    // Look up or create the place and attach a new review to it, all in one
    // transaction. Dropping `tx` on any error rolls both steps back.
    pub async fn submit_review(
        &self,
        place_name: &str,
        address: &str,
        user_id: i64,
        rating: u8,
        text: &str,
    ) -> Result<Review, Error> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let (place_id, created) = get_or_create_place_tx(&tx, place_name, address)?;
        if created {
            info!("[DB] Created place {} ({:?}, {:?})", place_id, place_name, address);
        }

        let created_at: DateTime<Utc> = Utc::now();
        tx.execute(
            "INSERT INTO reviews (place_id, user_id, rating, text, created_at) VALUES (?, ?, ?, ?, ?)",
            params![place_id, user_id, rating, text, created_at],
        )?;
        let review_id = tx.last_insert_rowid();

        let review = tx.query_row(&format!("{REVIEW_SELECT} WHERE r.id = ?"), [review_id], review_from_row)?;

        tx.commit()?;
        info!("[DB] Review {} stored for place {}", review_id, place_id);
        Ok(review)
    }

    // Every place with the mean of its ratings, in id order.
    pub async fn list_place_summaries(&self) -> Result<Vec<PlaceSummary>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.address, AVG(r.rating)
             FROM places p
             LEFT JOIN reviews r ON r.place_id = p.id
             GROUP BY p.id
             ORDER BY p.id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PlaceSummary {
                place: Place {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                },
                average_rating: row.get(3)?,
            })
        })?;

        let summaries = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("[DB] Loaded {} place summaries", summaries.len());
        Ok(summaries)
    }

    pub async fn get_reviews_for_place(&self, place_id: i64) -> Result<Vec<Review>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("{REVIEW_SELECT} WHERE r.place_id = ? ORDER BY r.id ASC"))?;
        let reviews = stmt.query_map([place_id], review_from_row)?;
        reviews.collect()
    }
}
