//! Field semantics: pick a realistic kind of leaf value from a field name and
//! its declared type. Pure; first matching rule wins.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leaf {
    Timestamp,
    Email,
    Uuid,
    Url,
    FullName,
    Sentence,
    Paragraph,
    StreetAddress,
    Word,
    Integer,
    Boolean,
    EmptyArray,
    Null,
}

const DATE_KEYS: &[&str] = &[
    "createdat", "created_at", "created",
    "updatedat", "updated_at", "updated",
    "deletedat", "deleted_at", "deleted",
    "publishedat", "published_at", "published",
    "modifiedat", "modified_at", "modified",
    "date", "timestamp", "time",
];

pub fn is_date_field(key: &str) -> bool {
    let key = key.to_lowercase();
    DATE_KEYS.iter().any(|pattern| key.contains(pattern))
}

/// Leaf kind for a field whose type is string-like.
pub fn classify_string(key: &str) -> Leaf {
    let key = key.to_lowercase();
    if key.contains("email") {
        Leaf::Email
    } else if key.contains("id") || key.ends_with("id") {
        Leaf::Uuid
    } else if key.contains("url") {
        Leaf::Url
    } else if key.contains("name") {
        Leaf::FullName
    } else if key.contains("title") {
        Leaf::Sentence
    } else if key.contains("description") {
        Leaf::Paragraph
    } else if key.contains("address") {
        Leaf::StreetAddress
    } else {
        Leaf::Word
    }
}

/// Leaf kind for a non-nested, non-enum value.
pub fn classify(key: &str, type_name: &str) -> Leaf {
    let ty = type_name.to_lowercase();
    if is_date_field(key) || ty.contains("date") {
        Leaf::Timestamp
    } else if ty.contains("string") {
        classify_string(key)
    } else if ty.contains("number") {
        Leaf::Integer
    } else if ty.contains("boolean") {
        Leaf::Boolean
    } else if ty.contains("[]") {
        Leaf::EmptyArray
    } else {
        Leaf::Null
    }
}
