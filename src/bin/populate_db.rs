// Fills the configured database with random users, places and reviews.
use std::io;

use argon2::password_hash;
use placereview::{auth::hash_password, config::Config, db::Database, models::user::User};
use rand::{seq::SliceRandom, thread_rng, Rng};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USERS: usize = 10;
const PLACES: usize = 20;
const REVIEWS: usize = 50;
const SEED_PASSWORD: &str = "password";

const FIRST_NAMES: &[&str] = &["Amina", "Brian", "Chen", "Dara", "Elif", "Femi", "Grace", "Hiro", "Ines", "Jonas"];
const LAST_NAMES: &[&str] = &["Otieno", "Kowalski", "Nguyen", "Silva", "Haddad", "Berg", "Okafor", "Rossi"];
const PLACE_WORDS: &[&str] = &["Golden", "Corner", "River", "Blue", "Old Town", "Harbor", "Sunny", "Hidden"];
const PLACE_KINDS: &[&str] = &["Cafe", "Bistro", "Bakery", "Grill", "Noodle Bar", "Diner", "Deli", "Tavern"];
const STREETS: &[&str] = &["Main St", "Market St", "Elm Ave", "Station Rd", "Park Ln", "Mill Rd"];
const SNIPPETS: &[&str] = &[
    "Friendly staff and quick service.",
    "Would come back again.",
    "A bit crowded at lunch.",
    "Portions were generous.",
    "Prices are on the high side.",
    "Nice place for a quiet evening.",
];

#[derive(Error, Debug)]
enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] password_hash::Error),
}

// Rows this run actually inserted; reused rows are not counted
#[derive(Debug, Default, PartialEq)]
struct SeedCounts {
    users: usize,
    places: usize,
    reviews: usize,
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

async fn get_or_create_user(db: &Database, phone: &str, name: &str) -> Result<(User, bool), SeedError> {
    match db.get_user_by_phone(phone).await? {
        Some(user) => Ok((user, false)),
        None => {
            let password_hash = hash_password(SEED_PASSWORD)?;
            Ok((db.insert_user(phone, name, &password_hash).await?, true))
        }
    }
}

async fn populate(db: &Database) -> Result<SeedCounts, SeedError> {
    let mut rng = thread_rng();
    let mut counts = SeedCounts::default();

    println!("Creating Users...");
    let mut users = Vec::with_capacity(USERS);
    for _ in 0..USERS {
        let phone = format!("7{:09}", rng.gen_range(0..1_000_000_000u32));
        let name = format!("{} {}", pick(&mut rng, FIRST_NAMES), pick(&mut rng, LAST_NAMES));
        let (user, created) = get_or_create_user(db, &phone, &name).await?;
        counts.users += usize::from(created);
        users.push(user);
    }

    println!("Creating Places...");
    let mut places = Vec::with_capacity(PLACES);
    for _ in 0..PLACES {
        let name = format!("{} {}", pick(&mut rng, PLACE_WORDS), pick(&mut rng, PLACE_KINDS));
        let address = format!("{} {}", rng.gen_range(1..500), pick(&mut rng, STREETS));
        let (place, created) = db.get_or_create_place(&name, &address).await?;
        counts.places += usize::from(created);
        places.push(place);
    }

    println!("Creating Reviews...");
    for _ in 0..REVIEWS {
        let (Some(place), Some(user)) = (places.choose(&mut rng), users.choose(&mut rng)) else {
            break;
        };
        let rating = rng.gen_range(1..=5u8);
        let text = format!("{} {}", pick(&mut rng, SNIPPETS), pick(&mut rng, SNIPPETS));
        db.submit_review(&place.name, &place.address, user.id, rating, &text)
            .await?;
        counts.reviews += 1;
    }

    Ok(counts)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let db = Database::new(&config.db_path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    db.create_schema()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let counts = populate(&db)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    info!(
        "Seeded {} new users, {} new places, {} reviews",
        counts.users, counts.places, counts.reviews
    );
    println!("Successfully populated database");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_db() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_populate_counts_inserted_rows() {
        let db = create_test_db().await;
        let counts = populate(&db).await.unwrap();

        assert!(counts.users >= 1 && counts.users <= USERS);
        assert!(counts.places >= 1 && counts.places <= PLACES);
        assert_eq!(counts.reviews, REVIEWS);

        let stored: usize = db
            .list_place_summaries()
            .await
            .unwrap()
            .len();
        assert_eq!(stored, counts.places);
    }

    #[tokio::test]
    async fn test_existing_user_is_reused() {
        let db = create_test_db().await;
        let (first, created) = get_or_create_user(&db, "7000000001", "Amina Otieno").await.unwrap();
        assert!(created);

        let (again, created) = get_or_create_user(&db, "7000000001", "Someone Else").await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.name, "Amina Otieno");
    }
}
