//! Schema → concrete JSON value.
//!
//! Synthesis is random by nature; the random source is a type parameter so
//! callers (and tests) can seed it.
use chrono::{SecondsFormat, TimeDelta, Utc};
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::internet::en::{DomainSuffix, SafeEmail};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::classify::{classify, Leaf};
use crate::schema::{Schema, TypeProperty};

// ------------------------------- Policy ---------------------------------- //

const MAX_ARRAY_COUNT: u32 = 5;                 // upper clamp for an explicit count
const DEFAULT_ARRAY_LEN: (u32, u32) = (1, 3);   // root arrays without a count
const PROPERTY_ARRAY_LEN: (usize, usize) = (1, 3);
const OPTIONAL_PRESENT_P: f64 = 0.5;
const MAX_INTEGER: i64 = 1000;
const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

pub struct Synthesizer<R = StdRng> {
    rng: R,
}

impl Synthesizer<StdRng> {
    pub fn new() -> Self {
        Synthesizer { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Synthesizer { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for Synthesizer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Synthesizer<R> {
    pub fn with_rng(rng: R) -> Self {
        Synthesizer { rng }
    }

    /// Produce a value shaped like `schema`. `count_hint` fixes the length of a
    /// root array (clamped to 1..=5).
    pub fn synthesize(&mut self, schema: &Schema, count_hint: Option<u32>) -> Value {
        if schema.is_enum {
            let pick = self.pick(schema.enum_values.as_deref().unwrap_or_default());
            return match (schema.is_array, pick) {
                (true, Some(v)) => Value::Array(vec![v]),
                (true, None) => Value::Array(Vec::new()),
                (false, pick) => pick.unwrap_or(Value::Null),
            };
        }
        if schema.is_array {
            let count = match count_hint {
                Some(n) => n.clamp(1, MAX_ARRAY_COUNT),
                None => self.rng.gen_range(DEFAULT_ARRAY_LEN.0..=DEFAULT_ARRAY_LEN.1),
            };
            return Value::Array((0..count).map(|_| self.object(schema)).collect());
        }
        self.object(schema)
    }

    /// One object instance; optional properties are present with probability ½.
    pub fn object(&mut self, schema: &Schema) -> Value {
        let mut out = Map::new();
        for (key, prop) in &schema.properties {
            if prop.is_optional && !self.rng.gen_bool(OPTIONAL_PRESENT_P) {
                continue;
            }
            let value = if prop.is_array {
                let len = self.rng.gen_range(PROPERTY_ARRAY_LEN.0..=PROPERTY_ARRAY_LEN.1);
                Value::Array((0..len).map(|_| self.single(key, prop)).collect())
            } else {
                self.single(key, prop)
            };
            out.insert(key.clone(), value);
        }
        Value::Object(out)
    }

    /// One value for a property. A nested enum schema yields one of its
    /// values, not an (empty) object instance.
    fn single(&mut self, key: &str, prop: &TypeProperty) -> Value {
        if let Some(nested) = &prop.nested_type {
            if nested.is_enum {
                let values = nested.enum_values.as_deref().unwrap_or_default();
                return self.pick(values).unwrap_or(Value::Null);
            }
            return self.object(nested);
        }
        if prop.is_enum {
            let values = prop.enum_values.as_deref().unwrap_or_default();
            return self.pick(values).unwrap_or(Value::Null);
        }
        self.leaf(classify(key, &prop.type_name))
    }

    fn pick(&mut self, values: &[String]) -> Option<Value> {
        values.choose(&mut self.rng).cloned().map(Value::String)
    }

    pub fn leaf(&mut self, leaf: Leaf) -> Value {
        let rng = &mut self.rng;
        match leaf {
            Leaf::Timestamp => {
                let ago = TimeDelta::milliseconds(rng.gen_range(0..RECENT_WINDOW_MS));
                Value::String((Utc::now() - ago).to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Leaf::Email => Value::String(SafeEmail().fake_with_rng(rng)),
            Leaf::Uuid => {
                let mut bytes = [0u8; 16];
                rng.fill(&mut bytes);
                Value::String(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            Leaf::Url => {
                let host: String = Word().fake_with_rng(rng);
                let suffix: String = DomainSuffix().fake_with_rng(rng);
                Value::String(format!("https://{}.{suffix}/", host.to_lowercase()))
            }
            Leaf::FullName => Value::String(Name().fake_with_rng(rng)),
            Leaf::Sentence => Value::String(Sentence(3..8).fake_with_rng(rng)),
            Leaf::Paragraph => Value::String(Paragraph(1..3).fake_with_rng(rng)),
            Leaf::StreetAddress => {
                let number: String = BuildingNumber().fake_with_rng(rng);
                let street: String = StreetName().fake_with_rng(rng);
                Value::String(format!("{number} {street}"))
            }
            Leaf::Word => Value::String(Word().fake_with_rng(rng)),
            Leaf::Integer => Value::from(rng.gen_range(0..=MAX_INTEGER)),
            Leaf::Boolean => Value::Bool(rng.gen_bool(0.5)),
            Leaf::EmptyArray => Value::Array(Vec::new()),
            Leaf::Null => Value::Null,
        }
    }
}
