//! Fake data generation helpers.
//!
//! Provides deterministic fake data for names, emails, dates, etc.

use chrono::{Duration, NaiveDate};
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate",
    "Leo", "Maya", "Noah", "Olivia", "Peter", "Quinn", "Rose", "Sam", "Tara", "Uma", "Victor",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Garcia", "Miller", "Davis", "Martinez", "Anderson",
    "Taylor", "O'Brien", "Moore", "Jackson", "Martin", "Lee", "D'Souza", "White", "Harris",
];

const BUSINESS_KINDS: &[&str] = &[
    "Cafe", "Bakery", "Car Wash", "Dental Practice", "Fitness Studio", "Hardware Store",
    "Pizzeria", "Print Shop", "Salon", "Pet Grooming", "Laundromat", "Bookshop",
];

const TOWN_WORDS: &[&str] = &[
    "Corner", "Main Street", "Riverside", "Downtown", "Hillside", "Harbor", "Oak", "Maple",
];

const LOREM_WORDS: &[&str] = &[
    "established", "loyal", "customers", "growing", "revenue", "turnkey", "staff", "lease",
    "equipment", "included", "strong", "margins", "owner", "retiring", "prime", "location",
    "training", "provided", "seasonal", "steady",
];

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.random_range(0..items.len())]
    }

    pub fn first_name(&mut self) -> &'static str {
        self.pick(FIRST_NAMES)
    }

    pub fn last_name(&mut self) -> &'static str {
        self.pick(LAST_NAMES)
    }

    /// Generate an email address, unique per `n`
    pub fn email(&mut self, first: &str, last: &str, n: i64) -> String {
        let last: String = last.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), n)
    }

    pub fn phone(&mut self) -> String {
        format!("555-{:04}", self.rng.random_range(0..10000))
    }

    pub fn business_name(&mut self) -> String {
        format!("{} {}", self.pick(TOWN_WORDS), self.pick(BUSINESS_KINDS))
    }

    /// Generate a price rounded to cents
    pub fn price(&mut self, min: f64, max: f64) -> f64 {
        let value = self.rng.random_range(min..max);
        (value * 100.0).round() / 100.0
    }

    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    pub fn bool_with_probability(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    pub fn choice<T: Copy>(&mut self, items: &[T]) -> T {
        self.pick(items)
    }

    /// Generate a sentence (capitalized, with period)
    pub fn sentence(&mut self, word_count: usize) -> String {
        let mut text = (0..word_count)
            .map(|_| self.pick(LOREM_WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        text.push('.');
        text
    }

    /// MySQL DATETIME string within 2019..2024
    pub fn datetime(&mut self) -> String {
        let base = NaiveDate::from_ymd_opt(2019, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let at = base + Duration::seconds(self.rng.random_range(0..5 * 365 * 86_400));
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
