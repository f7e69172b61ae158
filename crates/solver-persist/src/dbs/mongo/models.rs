use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde::Serialize;

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread};
use crate::timestamp;

/// MongoDB-specific Thread document (uses ObjectId)
#[derive(Debug, Clone, Serialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub owner_id: String,
    pub title: String,
    pub has_image: bool,
    pub created_at: bson::DateTime,
    pub last_updated: bson::DateTime,
}

/// MongoDB-specific Message document
///
/// `thread_id` keeps whichever form the parent thread's `_id` has.
#[derive(Debug, Clone, Serialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: Bson,
    pub owner_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id.to_hex(),
            owner_id: thread.owner_id,
            title: thread.title,
            has_image: thread.has_image,
            created_at: thread.created_at.timestamp_millis(),
            last_updated: thread.last_updated.timestamp_millis(),
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id.to_hex(),
            thread_id: bson_id_string(&msg.thread_id),
            owner_id: msg.owner_id,
            role: msg.role,
            content: msg.content,
            image_url: msg.image_url,
            timestamp: msg.timestamp.timestamp_millis(),
            turn_id: msg.turn_id,
        }
    }
}

/// Normalize any stored timestamp shape to epoch milliseconds.
///
/// Accepts BSON datetimes, numeric epochs (seconds or milliseconds),
/// `{seconds|_seconds, nanoseconds|_nanoseconds}` objects, BSON internal
/// timestamps and RFC 3339 strings.
pub fn normalize_timestamp(value: &Bson) -> Option<i64> {
    match value {
        Bson::DateTime(dt) => Some(dt.timestamp_millis()),
        Bson::Int32(n) => timestamp::from_numeric_epoch(f64::from(*n)),
        Bson::Int64(n) => timestamp::from_numeric_epoch(*n as f64),
        Bson::Double(n) => timestamp::from_numeric_epoch(*n),
        Bson::Timestamp(ts) => Some(i64::from(ts.time) * 1000),
        Bson::String(s) => timestamp::from_rfc3339(s),
        Bson::Document(doc) => {
            let seconds = ["seconds", "_seconds"]
                .iter()
                .find_map(|key| doc.get(*key).and_then(as_i64))?;
            let nanos = ["nanoseconds", "_nanoseconds"]
                .iter()
                .find_map(|key| doc.get(*key).and_then(as_i64))
                .unwrap_or(0);
            Some(timestamp::from_seconds_nanos(seconds, nanos))
        }
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.is_finite() => Some(*n as i64),
        _ => None,
    }
}

fn bson_id_string(value: &Bson) -> String {
    match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ids written by older clients may be plain strings
fn id_string(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key)? {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn required_str(doc: &Document, key: &str) -> Result<String> {
    doc.get_str(key)
        .map(str::to_string)
        .map_err(|_| PersistError::Codec(format!("missing or non-string field `{}`", key)))
}

fn required_timestamp(doc: &Document, key: &str) -> Result<i64> {
    doc.get(key)
        .and_then(normalize_timestamp)
        .ok_or_else(|| PersistError::Codec(format!("missing or unreadable timestamp `{}`", key)))
}

/// Decode a raw thread document, validating every field
pub fn thread_from_document(doc: &Document) -> Result<Thread> {
    let id = id_string(doc, "_id").ok_or_else(|| PersistError::Codec("missing `_id`".to_string()))?;
    let created_at = required_timestamp(doc, "created_at")?;
    // Rows written before `last_updated` existed fall back to creation time
    let last_updated = doc
        .get("last_updated")
        .and_then(normalize_timestamp)
        .unwrap_or(created_at);

    Ok(Thread {
        id,
        owner_id: required_str(doc, "owner_id")?,
        title: doc.get_str("title").unwrap_or_default().to_string(),
        has_image: doc.get_bool("has_image").unwrap_or(false),
        created_at,
        last_updated: last_updated.max(created_at),
    })
}

/// Decode a raw message document, validating every field
pub fn message_from_document(doc: &Document) -> Result<Message> {
    let id = id_string(doc, "_id").ok_or_else(|| PersistError::Codec("missing `_id`".to_string()))?;
    let thread_id = id_string(doc, "thread_id")
        .ok_or_else(|| PersistError::Codec("missing `thread_id`".to_string()))?;
    let role_str = required_str(doc, "role")?;
    let role = MessageRole::parse(&role_str)
        .ok_or_else(|| PersistError::Codec(format!("unknown role `{}`", role_str)))?;

    Ok(Message {
        id,
        thread_id,
        owner_id: required_str(doc, "owner_id")?,
        role,
        content: required_str(doc, "content")?,
        image_url: doc
            .get_str("image_url")
            .ok()
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        timestamp: required_timestamp(doc, "timestamp")?,
        turn_id: doc.get_str("turn_id").ok().map(str::to_string),
    })
}

/// Decode a batch, logging and skipping malformed rows
pub fn decode_all<T>(
    documents: Vec<Document>,
    kind: &str,
    decode: fn(&Document) -> Result<T>,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match decode(doc) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    kind = kind,
                    id = ?doc.get("_id"),
                    error = %e,
                    "Skipping malformed document"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_normalize_timestamp_shapes() {
        let millis = 1_700_000_000_250_i64;

        assert_eq!(
            normalize_timestamp(&Bson::DateTime(bson::DateTime::from_millis(millis))),
            Some(millis)
        );
        assert_eq!(normalize_timestamp(&Bson::Int64(millis)), Some(millis));
        assert_eq!(
            normalize_timestamp(&Bson::Int64(1_700_000_000)),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            normalize_timestamp(&Bson::Document(doc! { "_seconds": 1_700_000_000_i64, "_nanoseconds": 250_000_000 })),
            Some(millis)
        );
        assert_eq!(
            normalize_timestamp(&Bson::Document(doc! { "seconds": 1_700_000_000_i64 })),
            Some(1_700_000_000_000)
        );
        assert_eq!(normalize_timestamp(&Bson::Boolean(true)), None);
        assert_eq!(normalize_timestamp(&Bson::Document(doc! { "foo": 1 })), None);
    }

    #[test]
    fn test_thread_from_document() {
        let oid = ObjectId::new();
        let doc = doc! {
            "_id": oid,
            "owner_id": "u1",
            "title": "二次方程式",
            "has_image": true,
            "created_at": bson::DateTime::from_millis(1_000),
            "last_updated": 2_i64,
        };

        let thread = thread_from_document(&doc).unwrap();
        assert_eq!(thread.id, oid.to_hex());
        assert_eq!(thread.title, "二次方程式");
        assert!(thread.has_image);
        assert_eq!(thread.created_at, 1_000);
        // 2 seconds
        assert_eq!(thread.last_updated, 2_000);
    }

    #[test]
    fn test_thread_missing_owner_is_rejected() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "created_at": bson::DateTime::from_millis(1_000),
        };
        assert!(matches!(thread_from_document(&doc), Err(PersistError::Codec(_))));
    }

    #[test]
    fn test_message_from_document() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "thread_id": "legacy-thread-id",
            "owner_id": "u1",
            "role": "assistant",
            "content": "答案是 42",
            "image_url": "",
            "timestamp": { "seconds": 1_700_000_000_i64, "nanoseconds": 0 },
        };

        let message = message_from_document(&doc).unwrap();
        assert_eq!(message.thread_id, "legacy-thread-id");
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.image_url, None);
        assert_eq!(message.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_message_keeps_legacy_thread_id() {
        let message: Message = MongoMessage {
            id: ObjectId::new(),
            thread_id: Bson::String("legacy-thread-id".to_string()),
            owner_id: "u1".to_string(),
            role: MessageRole::User,
            content: "q".to_string(),
            image_url: None,
            timestamp: bson::DateTime::from_millis(1_000),
            turn_id: None,
        }
        .into();
        assert_eq!(message.thread_id, "legacy-thread-id");
    }

    #[test]
    fn test_decode_all_skips_malformed() {
        let good = doc! {
            "_id": ObjectId::new(),
            "thread_id": ObjectId::new(),
            "owner_id": "u1",
            "role": "user",
            "content": "q",
            "timestamp": bson::DateTime::now(),
        };
        let missing_content = doc! {
            "_id": ObjectId::new(),
            "thread_id": ObjectId::new(),
            "owner_id": "u1",
            "role": "user",
            "timestamp": bson::DateTime::now(),
        };

        let decoded = decode_all(vec![good, missing_content], "message", message_from_document);
        assert_eq!(decoded.len(), 1);
    }
}
