//! Chatrooms and messages.

use super::fields::{flag, keyword, text, timestamp};
use super::listings::ListingKind;
use super::{legacy, TransformContext};
use crate::dump::Row;
use crate::idmap::CONSOLIDATED_TYPE;
use crate::parser::ScalarValue;
use serde::Serialize;
use uuid::Uuid;

pub const CHATROOMS: &str = "chatrooms";
pub const MESSAGES: &str = "messages";

const PARTICIPANT_COLUMNS: [&[&str]; 2] = [
    &["sender_id", "user_one", "user1_id", "buyer_id", "from_user_id"],
    &["receiver_id", "user_two", "user2_id", "seller_id", "to_user_id"],
];

#[derive(Debug, Clone, Serialize)]
pub struct ChatroomDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub participants: Vec<Uuid>,
    pub listing_id: Option<Uuid>,
    pub listing_kind: Option<ListingKind>,
    pub last_message_at: Option<String>,
    pub created_at: Option<String>,
}

pub fn build_chatroom(row: &Row, ctx: &TransformContext<'_>) -> Option<ChatroomDoc> {
    let (sid, id) = ctx.own_id(CHATROOMS, row)?;

    let mut participants: Vec<Uuid> = Vec::with_capacity(2);
    for columns in PARTICIPANT_COLUMNS {
        if let Some(user) = ctx.reference(CHATROOMS, "users", row, columns) {
            if !participants.contains(&user) {
                participants.push(user);
            }
        }
    }

    // listing_type names the variant table; without it only the
    // consolidated namespace can resolve the listing
    let listing_kind = keyword(row, &["listing_type", "type"]).and_then(|k| ListingKind::from_name(&k));
    let listing_target = listing_kind
        .and_then(|kind| {
            ctx.listing_variants()
                .iter()
                .find(|v| ListingKind::from_name(v) == Some(kind))
        })
        .map(String::as_str)
        .unwrap_or(CONSOLIDATED_TYPE);
    let listing_id = ctx.reference(
        CHATROOMS,
        listing_target,
        row,
        &["listing_id", "business_id", "item_id"],
    );

    let last_message_at = timestamp(row, &["last_message_at", "updated_at"])
        .or_else(|| ctx.lookups.last_message_at.get(&sid).cloned());

    Some(ChatroomDoc {
        id,
        legacy_id: legacy(&sid),
        participants,
        listing_id,
        listing_kind,
        last_message_at,
        created_at: timestamp(row, &["created_at"]),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub chatroom_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub body: String,
    pub is_read: bool,
    pub created_at: Option<String>,
}

pub fn build_message(row: &Row, ctx: &TransformContext<'_>) -> Option<MessageDoc> {
    let (sid, id) = ctx.own_id(MESSAGES, row)?;

    Some(MessageDoc {
        id,
        legacy_id: legacy(&sid),
        chatroom_id: ctx.reference(MESSAGES, CHATROOMS, row, &["chatroom_id", "chat_id", "room_id"]),
        sender_id: ctx.reference(MESSAGES, "users", row, &["sender_id", "user_id", "from_user_id"]),
        body: text(row, &["message", "body", "content"]).unwrap_or_default(),
        is_read: flag(row, &["is_read", "read", "seen"])
            .or_else(|| timestamp(row, &["read_at"]).map(|_| true))
            .unwrap_or(false),
        created_at: timestamp(row, &["created_at"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idmap::IdMapper;
    use crate::transform::listings::build_all_listings;
    use crate::transform::test_support::{parsed, variants};

    #[test]
    fn test_build_chatrooms() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        build_all_listings(&ctx);
        let built = ctx.build_collection(CHATROOMS, CHATROOMS, build_chatroom);

        let first = &built.docs[0];
        assert_eq!(
            first.participants,
            vec![ids.get("users", 2).unwrap(), ids.get("users", 1).unwrap()]
        );
        assert_eq!(first.listing_kind, Some(ListingKind::Franchise));
        assert_eq!(first.listing_id, ids.get("franchise", 7));
        assert_ne!(first.listing_id, ids.get("listings", 7));
        assert_eq!(first.last_message_at.as_deref(), Some("2023-04-01T10:00:00Z"));

        // Same user on both sides; no listing type falls back to listings
        let second = &built.docs[1];
        assert_eq!(second.participants.len(), 1);
        assert_eq!(second.listing_id, ids.get("businesses", 7));
        assert_eq!(second.last_message_at, None);
    }

    #[test]
    fn test_build_messages() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let built = ctx.build_collection(MESSAGES, MESSAGES, build_message);

        assert_eq!(built.docs.len(), 3);
        assert_eq!(built.docs[0].body, "Is it still available?");
        assert!(built.docs[0].is_read);
        assert_eq!(built.docs[0].chatroom_id, ids.get("chatrooms", 1));
        assert_eq!(built.docs[2].body, "");
        assert!(!built.docs[2].is_read);
    }
}
