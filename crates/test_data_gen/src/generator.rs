//! Marketplace data generator.
//!
//! Produces the legacy marketplace tables (users, listings of three kinds,
//! billing, messaging and lookups) with consistent foreign keys, then
//! renders them as a mysqldump-style script.

use crate::fake::FakeData;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};

/// Generation scale presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// ~300 total rows
    Small,
    /// ~10,000 total rows
    Medium,
    /// ~150,000 total rows
    Large,
}

impl Scale {
    pub fn users(&self) -> usize {
        match self {
            Scale::Small => 40,
            Scale::Medium => 1_000,
            Scale::Large => 15_000,
        }
    }

    pub fn listings_per_kind(&self) -> usize {
        match self {
            Scale::Small => 15,
            Scale::Medium => 400,
            Scale::Large => 6_000,
        }
    }

    pub fn chatrooms(&self) -> usize {
        match self {
            Scale::Small => 20,
            Scale::Medium => 800,
            Scale::Large => 12_000,
        }
    }

    pub fn messages_per_room(&self) -> usize {
        match self {
            Scale::Small => 3,
            Scale::Medium => 5,
            Scale::Large => 6,
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Scale::Small),
            "medium" | "m" => Ok(Scale::Medium),
            "large" | "l" => Ok(Scale::Large),
            _ => Err(format!("Unknown scale: {}. Use small, medium, or large", s)),
        }
    }
}

/// SQL value representation
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
}

impl SqlValue {
    /// Format for a MySQL INSERT statement
    pub fn to_mysql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(n) => format!("{:.2}", n),
            SqlValue::String(s) => format!("'{}'", escape_mysql_string(s)),
        }
    }
}

fn escape_mysql_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn s(v: impl Into<String>) -> SqlValue {
    SqlValue::String(v.into())
}

fn opt_int(v: Option<i64>) -> SqlValue {
    v.map(SqlValue::Int).unwrap_or(SqlValue::Null)
}

/// A row of generated data
pub type Row = Vec<SqlValue>;

/// Generated data for a single table
#[derive(Debug, Clone)]
pub struct TableData {
    pub table_name: String,
    /// Column name and MySQL type
    pub columns: Vec<(&'static str, &'static str)>,
    pub rows: Vec<Row>,
}

impl TableData {
    fn new(table_name: &str, columns: &[(&'static str, &'static str)]) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    fn write_create(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "--\n-- Table structure for table `{}`\n--\n", self.table_name)?;
        writeln!(w, "DROP TABLE IF EXISTS `{}`;", self.table_name)?;
        writeln!(w, "CREATE TABLE `{}` (", self.table_name)?;
        for (name, ty) in &self.columns {
            writeln!(w, "  `{}` {},", name, ty)?;
        }
        writeln!(w, "  PRIMARY KEY (`id`)")?;
        writeln!(w, ") ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n")
    }

    fn write_inserts(&self, w: &mut impl Write, batch_size: usize) -> io::Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        writeln!(w, "LOCK TABLES `{}` WRITE;", self.table_name)?;
        for chunk in self.rows.chunks(batch_size.max(1)) {
            write!(w, "INSERT INTO `{}` VALUES ", self.table_name)?;
            for (i, row) in chunk.iter().enumerate() {
                if i > 0 {
                    w.write_all(b",")?;
                }
                let values: Vec<String> = row.iter().map(SqlValue::to_mysql).collect();
                write!(w, "({})", values.join(","))?;
            }
            writeln!(w, ";")?;
        }
        writeln!(w, "UNLOCK TABLES;\n")
    }
}

/// All generated data
#[derive(Debug, Clone)]
pub struct GeneratedData {
    pub tables: Vec<TableData>,
}

impl GeneratedData {
    pub fn table(&self, name: &str) -> Option<&TableData> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Write a mysqldump-style script, `batch_size` rows per INSERT.
    pub fn write_mysql(&self, w: &mut impl Write, batch_size: usize) -> io::Result<()> {
        writeln!(w, "-- MySQL dump 10.13  Distrib 8.0.36, for Linux (x86_64)")?;
        writeln!(w, "--\n-- Host: localhost    Database: marketplace\n--\n")?;
        writeln!(w, "/*!40101 SET NAMES utf8mb4 */;")?;
        writeln!(w, "/*!40014 SET FOREIGN_KEY_CHECKS=0 */;\n")?;
        for table in &self.tables {
            table.write_create(w)?;
            table.write_inserts(w, batch_size)?;
        }
        writeln!(w, "-- Dump completed")
    }

    pub fn to_mysql_string(&self, batch_size: usize) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_mysql(&mut buf, batch_size);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

const STATES: &[(&str, &str)] = &[
    ("Texas", "TX"),
    ("Ohio", "OH"),
    ("Oregon", "OR"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
];

const CITIES: &[(&str, usize)] = &[
    ("Austin", 0),
    ("Dallas", 0),
    ("Columbus", 1),
    ("Dayton", 1),
    ("Portland", 2),
    ("Miami", 3),
    ("Tampa", 3),
    ("Atlanta", 4),
];

const INDUSTRIES: &[(&str, &[&str])] = &[
    ("Food & Beverage", &["Cafes", "Bakeries", "Restaurants"]),
    ("Retail", &["Clothing", "Hardware", "Books"]),
    ("Services", &["Cleaning", "Salons", "Auto"]),
    ("Health", &["Dental", "Fitness"]),
];

const ROLES: &[&str] = &["buyer", "buyer", "buyer", "seller", "seller", "investor", "broker"];
const LISTING_STATUSES: &[&str] = &["active", "active", "pending", "sold", "inactive", "approved"];
const GATEWAYS: &[&str] = &["stripe", "Stripe", "paypal", "manual"];
const PAYMENT_STATUSES: &[&str] = &["succeeded", "completed", "pending", "failed", "refunded"];

/// Main data generator
pub struct Generator {
    scale: Scale,
    fake: FakeData<ChaCha8Rng>,
    dangling: bool,
}

impl Generator {
    pub fn new(seed: u64, scale: Scale) -> Self {
        Self {
            scale,
            fake: FakeData::new(ChaCha8Rng::seed_from_u64(seed)),
            dangling: false,
        }
    }

    /// Make a few references point at rows that do not exist.
    pub fn with_dangling_references(mut self, dangling: bool) -> Self {
        self.dangling = dangling;
        self
    }

    pub fn generate(&mut self) -> GeneratedData {
        let mut tables = self.lookups();
        let users = self.users();
        let user_count = users.rows.len() as i64;
        tables.push(users);

        let business = self.listings("businesses", 1, user_count);
        let franchise = self.listings("franchise", 10_001, user_count);
        let investors = self.listings("investors", 20_001, user_count);
        let mut listing_ids: Vec<(i64, &'static str)> = Vec::new();
        for (table, kind) in [(&business, "business"), (&franchise, "franchise"), (&investors, "investor")] {
            for row in &table.rows {
                if let SqlValue::Int(id) = row[0] {
                    listing_ids.push((id, kind));
                }
            }
        }
        tables.extend([business, franchise, investors]);

        tables.extend(self.billing(user_count));
        tables.extend(self.messaging(user_count, &listing_ids));
        GeneratedData { tables }
    }

    fn user_ref(&mut self, user_count: i64) -> i64 {
        if self.dangling && self.fake.bool_with_probability(0.02) {
            user_count + self.fake.int_range(1_000, 2_000)
        } else {
            self.fake.int_range(1, user_count)
        }
    }

    fn lookups(&mut self) -> Vec<TableData> {
        let mut states = TableData::new(
            "states",
            &[("id", "int unsigned NOT NULL"), ("name", "varchar(100) NOT NULL"), ("code", "varchar(5) DEFAULT NULL")],
        );
        for (i, (name, code)) in STATES.iter().enumerate() {
            states.rows.push(vec![SqlValue::Int(i as i64 + 1), s(*name), s(*code)]);
        }

        let mut cities = TableData::new(
            "cities",
            &[("id", "int unsigned NOT NULL"), ("state_id", "int unsigned NOT NULL"), ("name", "varchar(100) NOT NULL")],
        );
        for (i, (name, state)) in CITIES.iter().enumerate() {
            cities
                .rows
                .push(vec![SqlValue::Int(i as i64 + 1), SqlValue::Int(*state as i64 + 1), s(*name)]);
        }

        let mut industries = TableData::new(
            "industries",
            &[("id", "int unsigned NOT NULL"), ("name", "varchar(150) NOT NULL"), ("slug", "varchar(150) DEFAULT NULL"), ("status", "tinyint(1) NOT NULL DEFAULT '1'")],
        );
        let mut sub_industries = TableData::new(
            "sub_industries",
            &[("id", "int unsigned NOT NULL"), ("industry_id", "int unsigned NOT NULL"), ("name", "varchar(150) NOT NULL")],
        );
        let mut sub_id = 0;
        for (i, (name, subs)) in INDUSTRIES.iter().enumerate() {
            let industry_id = i as i64 + 1;
            industries
                .rows
                .push(vec![SqlValue::Int(industry_id), s(*name), SqlValue::Null, SqlValue::Int(1)]);
            for sub in subs.iter() {
                sub_id += 1;
                sub_industries
                    .rows
                    .push(vec![SqlValue::Int(sub_id), SqlValue::Int(industry_id), s(*sub)]);
            }
        }

        vec![states, cities, industries, sub_industries]
    }

    fn users(&mut self) -> TableData {
        let mut users = TableData::new(
            "users",
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("first_name", "varchar(100) DEFAULT NULL"),
                ("last_name", "varchar(100) DEFAULT NULL"),
                ("email", "varchar(191) NOT NULL"),
                ("phone", "varchar(30) DEFAULT NULL"),
                ("role", "varchar(20) NOT NULL"),
                ("status", "tinyint(1) NOT NULL DEFAULT '1'"),
                ("email_verified_at", "timestamp NULL DEFAULT NULL"),
                ("city_id", "int unsigned DEFAULT NULL"),
                ("created_at", "timestamp NULL DEFAULT NULL"),
            ],
        );
        for id in 1..=self.scale.users() as i64 {
            let first = self.fake.first_name();
            let last = self.fake.last_name();
            let email = self.fake.email(first, last, id);
            let phone = self.fake.bool_with_probability(0.6).then(|| self.fake.phone());
            let verified = self.fake.bool_with_probability(0.7).then(|| self.fake.datetime());
            let city = self
                .fake
                .bool_with_probability(0.8)
                .then(|| self.fake.int_range(1, CITIES.len() as i64));
            let role = if id == 1 { "admin" } else { self.fake.choice(ROLES) };
            users.rows.push(vec![
                SqlValue::Int(id),
                s(first),
                s(last),
                s(email),
                phone.map(s).unwrap_or(SqlValue::Null),
                s(role),
                SqlValue::Int(i64::from(self.fake.bool_with_probability(0.9))),
                verified.map(s).unwrap_or(SqlValue::Null),
                opt_int(city),
                s(self.fake.datetime()),
            ]);
        }
        users
    }

    fn listings(&mut self, table: &str, first_id: i64, user_count: i64) -> TableData {
        let mut listings = TableData::new(
            table,
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("user_id", "bigint unsigned NOT NULL"),
                ("title", "varchar(191) NOT NULL"),
                ("description", "text"),
                ("industry_id", "int unsigned DEFAULT NULL"),
                ("city_id", "int unsigned DEFAULT NULL"),
                ("asking_price", "decimal(15,2) DEFAULT NULL"),
                ("cash_flow", "varchar(50) DEFAULT NULL"),
                ("min_investment", "decimal(15,2) DEFAULT NULL"),
                ("max_investment", "decimal(15,2) DEFAULT NULL"),
                ("status", "varchar(20) NOT NULL"),
                ("views", "int unsigned NOT NULL DEFAULT '0'"),
                ("created_at", "timestamp NULL DEFAULT NULL"),
            ],
        );
        for n in 0..self.scale.listings_per_kind() as i64 {
            let words = self.fake.int_range(6, 20) as usize;
            let description = format!("{}\n{}", self.fake.sentence(words), self.fake.sentence(5));
            let cash_flow = format!("${}", self.fake.int_range(10, 400) * 1_000);
            let lo = self.fake.price(10_000.0, 200_000.0);
            let hi = self.fake.price(10_000.0, 400_000.0);
            listings.rows.push(vec![
                SqlValue::Int(first_id + n),
                SqlValue::Int(self.user_ref(user_count)),
                s(self.fake.business_name()),
                s(description),
                SqlValue::Int(self.fake.int_range(1, INDUSTRIES.len() as i64)),
                SqlValue::Int(self.fake.int_range(1, CITIES.len() as i64)),
                SqlValue::Float(self.fake.price(50_000.0, 2_000_000.0)),
                s(cash_flow),
                SqlValue::Float(lo),
                SqlValue::Float(hi),
                s(self.fake.choice(LISTING_STATUSES)),
                SqlValue::Int(self.fake.int_range(0, 5_000)),
                s(self.fake.datetime()),
            ]);
        }
        listings
    }

    fn billing(&mut self, user_count: i64) -> Vec<TableData> {
        let mut plans = TableData::new(
            "plans",
            &[
                ("id", "int unsigned NOT NULL"),
                ("name", "varchar(100) NOT NULL"),
                ("price", "decimal(8,2) NOT NULL"),
                ("duration_days", "int NOT NULL"),
                ("features", "text"),
                ("status", "tinyint(1) NOT NULL DEFAULT '1'"),
            ],
        );
        for (id, (name, price, days)) in [("Basic", 9.99, 30), ("Pro", 49.0, 90), ("Enterprise", 199.0, 365)]
            .into_iter()
            .enumerate()
        {
            plans.rows.push(vec![
                SqlValue::Int(id as i64 + 1),
                s(name),
                SqlValue::Float(price),
                SqlValue::Int(days),
                s("[\"Listings\",\"Email support\"]"),
                SqlValue::Int(1),
            ]);
        }

        let mut subscriptions = TableData::new(
            "subscriptions",
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("user_id", "bigint unsigned NOT NULL"),
                ("plan_id", "int unsigned NOT NULL"),
                ("status", "varchar(20) NOT NULL"),
                ("start_date", "date DEFAULT NULL"),
                ("auto_renew", "tinyint(1) NOT NULL DEFAULT '0'"),
            ],
        );
        let mut transactions = TableData::new(
            "transactions",
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("user_id", "bigint unsigned NOT NULL"),
                ("subscription_id", "bigint unsigned DEFAULT NULL"),
                ("amount", "decimal(10,2) NOT NULL"),
                ("payment_gateway", "varchar(30) DEFAULT NULL"),
                ("status", "varchar(20) NOT NULL"),
                ("created_at", "timestamp NULL DEFAULT NULL"),
            ],
        );
        let count = (user_count / 2).max(1);
        for id in 1..=count {
            let user = self.user_ref(user_count);
            let plan = self.fake.int_range(1, 3);
            let started = self.fake.datetime();
            subscriptions.rows.push(vec![
                SqlValue::Int(id),
                SqlValue::Int(user),
                SqlValue::Int(plan),
                s(self.fake.choice(&["active", "expired", "cancelled", "trialing"])),
                s(started[..10].to_string()),
                SqlValue::Int(i64::from(self.fake.bool_with_probability(0.5))),
            ]);
            transactions.rows.push(vec![
                SqlValue::Int(id),
                SqlValue::Int(user),
                SqlValue::Int(id),
                SqlValue::Float(self.fake.price(9.0, 200.0)),
                s(self.fake.choice(GATEWAYS)),
                s(self.fake.choice(PAYMENT_STATUSES)),
                s(started),
            ]);
        }
        vec![plans, subscriptions, transactions]
    }

    fn messaging(&mut self, user_count: i64, listings: &[(i64, &'static str)]) -> Vec<TableData> {
        let mut chatrooms = TableData::new(
            "chatrooms",
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("sender_id", "bigint unsigned NOT NULL"),
                ("receiver_id", "bigint unsigned NOT NULL"),
                ("listing_id", "bigint unsigned DEFAULT NULL"),
                ("listing_type", "varchar(20) DEFAULT NULL"),
                ("created_at", "timestamp NULL DEFAULT NULL"),
            ],
        );
        let mut messages = TableData::new(
            "messages",
            &[
                ("id", "bigint unsigned NOT NULL"),
                ("chatroom_id", "bigint unsigned NOT NULL"),
                ("sender_id", "bigint unsigned NOT NULL"),
                ("message", "text"),
                ("is_read", "tinyint(1) NOT NULL DEFAULT '0'"),
                ("created_at", "timestamp NULL DEFAULT NULL"),
            ],
        );
        let mut message_id = 0;
        for room in 1..=self.scale.chatrooms() as i64 {
            let sender = self.fake.int_range(1, user_count);
            let receiver = self.fake.int_range(1, user_count);
            let listing = (!listings.is_empty())
                .then(|| listings[self.fake.int_range(0, listings.len() as i64 - 1) as usize]);
            chatrooms.rows.push(vec![
                SqlValue::Int(room),
                SqlValue::Int(sender),
                SqlValue::Int(receiver),
                opt_int(listing.map(|(id, _)| id)),
                listing.map(|(_, kind)| s(kind)).unwrap_or(SqlValue::Null),
                s(self.fake.datetime()),
            ]);
            for _ in 0..self.scale.messages_per_room() {
                message_id += 1;
                let from = if self.fake.bool_with_probability(0.5) { sender } else { receiver };
                let words = self.fake.int_range(3, 12) as usize;
                messages.rows.push(vec![
                    SqlValue::Int(message_id),
                    SqlValue::Int(room),
                    SqlValue::Int(from),
                    s(self.fake.sentence(words)),
                    SqlValue::Int(i64::from(self.fake.bool_with_probability(0.6))),
                    s(self.fake.datetime()),
                ]);
            }
        }
        vec![chatrooms, messages]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = Generator::new(42, Scale::Small).generate().to_mysql_string(50);
        let b = Generator::new(42, Scale::Small).generate().to_mysql_string(50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_tables_present() {
        let data = Generator::new(1, Scale::Small).generate();
        for name in [
            "states", "cities", "industries", "sub_industries", "users", "businesses", "franchise",
            "investors", "plans", "subscriptions", "transactions", "chatrooms", "messages",
        ] {
            assert!(data.table(name).is_some(), "missing {}", name);
        }
        assert_eq!(data.table("users").unwrap().rows.len(), Scale::Small.users());
    }

    #[test]
    fn test_listing_ids_do_not_collide() {
        let data = Generator::new(1, Scale::Small).generate();
        let first = |t: &str| data.table(t).unwrap().rows[0][0].clone();
        assert_eq!(first("businesses"), SqlValue::Int(1));
        assert_eq!(first("franchise"), SqlValue::Int(10_001));
        assert_eq!(first("investors"), SqlValue::Int(20_001));
    }

    #[test]
    fn test_mysql_escaping() {
        assert_eq!(s("O'Brien\nline").to_mysql(), r"'O\'Brien\nline'");
        assert_eq!(SqlValue::Float(3.0).to_mysql(), "3.00");
    }

    #[test]
    fn test_batched_inserts() {
        let data = Generator::new(1, Scale::Small).generate();
        let sql = data.to_mysql_string(10);
        let user_inserts = sql.matches("INSERT INTO `users` VALUES").count();
        assert_eq!(user_inserts, Scale::Small.users().div_ceil(10));
        assert!(sql.contains("CREATE TABLE `messages`"));
    }
}
