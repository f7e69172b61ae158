pub mod message;
pub mod thread;
pub mod turn;

pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;
pub use turn::MongoTurnRepository;

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};

/// Stored form of an id: an ObjectId when it parses as one, otherwise the
/// plain string older clients wrote
pub fn id_value(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

/// Filter matching `field` against either stored form of `id`
pub fn id_filter(field: &str, id: &str) -> Document {
    let mut filter = Document::new();
    match ObjectId::parse_str(id) {
        Ok(oid) => filter.insert(field, doc! { "$in": [oid, id] }),
        Err(_) => filter.insert(field, id),
    };
    filter
}

/// Server error code for a unique index violation
pub(crate) const DUPLICATE_KEY: i32 = 11000;

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
