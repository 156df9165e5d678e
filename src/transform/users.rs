use super::fields::{email, flag, keyword, text, timestamp};
use super::{legacy, Location, TransformContext};
use crate::dump::Row;
use crate::parser::ScalarValue;
use serde::Serialize;
use uuid::Uuid;

pub const COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Seller,
    Investor,
    Buyer,
}

impl UserRole {
    fn from_keyword(k: &str) -> Self {
        match k {
            "admin" | "administrator" | "superadmin" | "super_admin" => UserRole::Admin,
            "seller" | "broker" | "business" | "owner" | "franchisor" => UserRole::Seller,
            "investor" => UserRole::Investor,
            _ => UserRole::Buyer,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub email_verified: bool,
    pub avatar_url: Option<String>,
    pub location: Option<Location>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub fn build_user(row: &Row, ctx: &TransformContext<'_>) -> Option<UserDoc> {
    let (sid, id) = ctx.own_id(COLLECTION, row)?;

    let first_name = text(row, &["first_name", "fname"]);
    let last_name = text(row, &["last_name", "lname"]);
    let email = email(row, &["email"]);

    let display_name = text(row, &["name", "display_name", "username"])
        .or_else(|| {
            let full = [first_name.as_deref(), last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            (!full.is_empty()).then_some(full)
        })
        .or_else(|| {
            email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("User {}", sid));

    let email_verified = timestamp(row, &["email_verified_at"]).is_some()
        || flag(row, &["email_verified", "is_verified"]).unwrap_or(false);

    Some(UserDoc {
        id,
        legacy_id: legacy(&sid),
        first_name,
        last_name,
        display_name,
        email,
        phone: text(row, &["phone", "mobile", "phone_number"]),
        role: keyword(row, &["role", "user_type", "type"])
            .map(|k| UserRole::from_keyword(&k))
            .unwrap_or(UserRole::Buyer),
        is_active: flag(row, &["is_active", "status", "active"]).unwrap_or(true),
        email_verified,
        avatar_url: text(row, &["avatar", "avatar_url", "profile_image", "photo"]),
        location: ctx.location(COLLECTION, row),
        created_at: timestamp(row, &["created_at"]),
        updated_at: timestamp(row, &["updated_at"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idmap::IdMapper;
    use crate::transform::test_support::{parsed, variants};

    #[test]
    fn test_build_users() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let built = ctx.build_collection(COLLECTION, "users", build_user);

        // The row with id 0 has no usable source id
        assert_eq!(built.docs.len(), 2);
        assert_eq!(built.skipped, 1);

        let ann = &built.docs[0];
        assert_eq!(Some(ann.id), ids.get("users", 1));
        assert_eq!(ann.display_name, "Ann Lee");
        assert_eq!(ann.email.as_deref(), Some("ann@example.com"));
        assert_eq!(ann.role, UserRole::Seller);
        assert!(ann.is_active);
        assert!(ann.email_verified);
        assert_eq!(ann.created_at.as_deref(), Some("2023-01-01T00:00:00Z"));
        assert_eq!(ann.updated_at, None);
        assert_eq!(ann.location.as_ref().unwrap().state.as_deref(), Some("Texas"));

        let bob = &built.docs[1];
        assert_eq!(bob.display_name, "Bob");
        assert_eq!(bob.role, UserRole::Buyer);
        assert!(!bob.is_active);
        assert!(!bob.email_verified);
        assert!(bob.location.is_none());
    }

    #[test]
    fn test_user_json_shape() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let doc = build_user(&dump.rows("users")[0], &ctx).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["legacy_id"], 1);
        assert_eq!(json["role"], "seller");
        assert_eq!(json["id"], doc.id.to_string());
    }
}
