//! Plans, subscriptions and payment transactions.

use super::fields::{flag, int, keyword, list, money, text, timestamp};
use super::{legacy, TransformContext};
use crate::dump::Row;
use crate::idmap::IntoSourceId;
use crate::parser::ScalarValue;
use serde::Serialize;
use uuid::Uuid;

pub const PLANS: &str = "plans";
pub const SUBSCRIPTIONS: &str = "subscriptions";
pub const TRANSACTIONS: &str = "transactions";

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    Monthly,
    Yearly,
    Lifetime,
}

impl PlanInterval {
    fn from_keyword(k: &str) -> Option<Self> {
        if k.starts_with("month") {
            Some(PlanInterval::Monthly)
        } else if k.starts_with("year") || k.starts_with("annual") {
            Some(PlanInterval::Yearly)
        } else if k.starts_with("life") || k.starts_with("one") {
            Some(PlanInterval::Lifetime)
        } else {
            None
        }
    }

    /// Interval implied by a duration in days; zero means no expiry.
    fn from_days(days: i64) -> Self {
        match days {
            d if d <= 0 || d >= 3650 => PlanInterval::Lifetime,
            d if d >= 360 => PlanInterval::Yearly,
            _ => PlanInterval::Monthly,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub interval: PlanInterval,
    pub duration_days: Option<i64>,
    pub listing_limit: Option<i64>,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
}

pub fn build_plan(row: &Row, ctx: &TransformContext<'_>) -> Option<PlanDoc> {
    let (sid, id) = ctx.own_id(PLANS, row)?;
    let duration_days = int(row, &["duration_days", "duration", "days"]);

    let interval = keyword(row, &["interval", "billing_cycle", "period"])
        .and_then(|k| PlanInterval::from_keyword(&k))
        .or_else(|| duration_days.map(PlanInterval::from_days))
        .unwrap_or(PlanInterval::Monthly);

    Some(PlanDoc {
        id,
        legacy_id: legacy(&sid),
        name: text(row, &["name", "title"]).unwrap_or_else(|| format!("Plan {}", sid)),
        price: money(row, &["price", "amount"]).unwrap_or(0.0),
        currency: currency(row),
        interval,
        duration_days,
        listing_limit: int(row, &["listing_limit", "max_listings", "listings_allowed"]),
        features: list(row, &["features", "description"]),
        is_active: flag(row, &["is_active", "status"]).unwrap_or(true),
        created_at: timestamp(row, &["created_at"]),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
    Pending,
}

impl SubscriptionStatus {
    fn from_keyword(k: &str) -> Self {
        match k {
            "active" | "1" | "paid" | "trialing" => SubscriptionStatus::Active,
            "expired" | "ended" => SubscriptionStatus::Expired,
            "cancelled" | "canceled" | "0" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub user_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub status: SubscriptionStatus,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub auto_renew: bool,
    pub created_at: Option<String>,
}

pub fn build_subscription(row: &Row, ctx: &TransformContext<'_>) -> Option<SubscriptionDoc> {
    let (sid, id) = ctx.own_id(SUBSCRIPTIONS, row)?;

    Some(SubscriptionDoc {
        id,
        legacy_id: legacy(&sid),
        user_id: ctx.reference(SUBSCRIPTIONS, "users", row, &["user_id"]),
        plan_id: ctx.reference(SUBSCRIPTIONS, PLANS, row, &["plan_id", "package_id"]),
        status: keyword(row, &["status"])
            .map(|k| SubscriptionStatus::from_keyword(&k))
            .unwrap_or(SubscriptionStatus::Pending),
        starts_at: timestamp(row, &["start_date", "starts_at", "started_at"]),
        ends_at: timestamp(row, &["end_date", "ends_at", "expires_at", "expiry_date"]),
        auto_renew: flag(row, &["auto_renew", "is_recurring"]).unwrap_or(false),
        created_at: timestamp(row, &["created_at"]),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    Refunded,
}

impl TransactionStatus {
    fn from_keyword(k: &str) -> Self {
        match k {
            "completed" | "complete" | "success" | "succeeded" | "paid" | "1" => {
                TransactionStatus::Completed
            }
            "failed" | "declined" | "error" | "cancelled" | "canceled" => TransactionStatus::Failed,
            "refunded" | "refund" => TransactionStatus::Refunded,
            _ => TransactionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub user_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub gateway: Option<String>,
    pub external_reference: Option<String>,
    pub status: TransactionStatus,
    pub created_at: Option<String>,
}

pub fn build_transaction(row: &Row, ctx: &TransformContext<'_>) -> Option<TransactionDoc> {
    let (sid, id) = ctx.own_id(TRANSACTIONS, row)?;

    // Older rows only carry the subscription; take the plan from it
    let plan_id = ctx
        .reference(TRANSACTIONS, PLANS, row, &["plan_id", "package_id"])
        .or_else(|| {
            let sub = row.value("subscription_id").into_source_id()?;
            let plan = ctx.lookups.subscription_plans.get(&sub)?;
            ctx.reference_id(TRANSACTIONS, PLANS, plan)
        });

    Some(TransactionDoc {
        id,
        legacy_id: legacy(&sid),
        user_id: ctx.reference(TRANSACTIONS, "users", row, &["user_id"]),
        subscription_id: ctx.reference(TRANSACTIONS, SUBSCRIPTIONS, row, &["subscription_id"]),
        plan_id,
        amount: money(row, &["amount", "total", "price"]).unwrap_or(0.0),
        currency: currency(row),
        gateway: keyword(row, &["payment_gateway", "gateway", "payment_method"]),
        external_reference: text(
            row,
            &["transaction_ref", "transaction_id", "reference", "payment_id"],
        ),
        status: keyword(row, &["status", "payment_status"])
            .map(|k| TransactionStatus::from_keyword(&k))
            .unwrap_or(TransactionStatus::Pending),
        created_at: timestamp(row, &["created_at", "paid_at"]),
    })
}

fn currency(row: &Row) -> String {
    text(row, &["currency", "currency_code"])
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idmap::IdMapper;
    use crate::transform::test_support::{parsed, variants};

    #[test]
    fn test_build_plans() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let built = ctx.build_collection(PLANS, PLANS, build_plan);
        let [basic, pro, forever] = built.docs.as_slice() else {
            panic!("expected three plans");
        };

        assert_eq!(basic.currency, "USD");
        assert_eq!(basic.interval, PlanInterval::Monthly);
        assert_eq!(basic.features, vec!["1 listing", "Email support"]);
        assert_eq!(basic.listing_limit, Some(3));

        assert_eq!(pro.currency, "EUR");
        assert_eq!(pro.interval, PlanInterval::Yearly);
        assert_eq!(pro.features, vec!["Unlimited listings", "Priority support"]);

        assert_eq!(forever.interval, PlanInterval::Lifetime);
        assert!(!forever.is_active);
    }

    #[test]
    fn test_build_subscriptions() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let built = ctx.build_collection(SUBSCRIPTIONS, SUBSCRIPTIONS, build_subscription);

        let first = &built.docs[0];
        assert_eq!(first.user_id, ids.get("users", 1));
        assert_eq!(first.plan_id, ids.get("plans", 2));
        assert_eq!(first.status, SubscriptionStatus::Active);
        assert_eq!(first.ends_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(first.auto_renew);

        assert_eq!(built.docs[1].status, SubscriptionStatus::Cancelled);
        assert_eq!(built.docs[1].ends_at, None);
    }

    #[test]
    fn test_build_transactions() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let built = ctx.build_collection(TRANSACTIONS, TRANSACTIONS, build_transaction);

        let paid = &built.docs[0];
        assert_eq!(paid.status, TransactionStatus::Completed);
        assert_eq!(paid.gateway.as_deref(), Some("stripe"));
        assert_eq!(paid.currency, "USD");
        // Plan taken from subscription 1
        assert_eq!(paid.plan_id, ids.get("plans", 2));
        assert_eq!(paid.subscription_id, ids.get("subscriptions", 1));

        let declined = &built.docs[1];
        assert_eq!(declined.status, TransactionStatus::Failed);
        assert_eq!(declined.amount, 9.99);
        assert_eq!(declined.currency, "USD");
        assert_eq!(declined.plan_id, ids.get("plans", 1));
        assert_eq!(ctx.dangling_for(TRANSACTIONS), 0);
    }
}
