use rand::RngCore;
use time::{Date, OffsetDateTime};

use crate::products::dto::Category;

/// Derive a product id from its inputs: `DDMMYYYY-category-username-hex8`.
/// Pure apart from the caller-supplied random suffix; collision handling
/// lives at the insert site.
pub fn derive(date: Date, category: Category, username: &str, suffix: [u8; 4]) -> String {
    let date_part = format!(
        "{:02}{:02}{}",
        date.day(),
        u8::from(date.month()),
        date.year()
    );
    let safe_username: String = username
        .split_whitespace()
        .collect::<String>()
        .to_lowercase();
    let random_part: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}",
        date_part,
        category.slug(),
        safe_username,
        random_part
    )
}

/// Derive an id for "now" with a fresh random suffix.
pub fn generate(category: Category, username: &str) -> String {
    let mut suffix = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut suffix);
    derive(OffsetDateTime::now_utc().date(), category, username, suffix)
}
