// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Streaming batch events and record decoding.
//!
//! A Kafka-triggered Lambda receives a mapping of partition keys (e.g. `"topic-0"`)
//! to ordered records. Each record carries a base64 encoded JSON document in
//! its `value` field. Partitions are kept in the order they appear in the event.
//!
//! Records are read leniently: a record with an unexpected shape still becomes
//! an [`EncodedRecord`] and only fails when it is decoded, so one bad record
//! never rejects the whole batch.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{PortError, Result};

/// Event delivered to the batch handlers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBatch {
    pub records: Partitions,
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(default)]
    pub event_source_arn: Option<String>,
}

impl RecordBatch {
    pub fn new(records: Partitions) -> Self {
        Self {
            records,
            event_source: None,
            event_source_arn: None,
        }
    }

    /// Iterate records partition by partition, in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EncodedRecord)> {
        self.records
            .0
            .iter()
            .flat_map(|(key, records)| records.iter().map(move |r| (key.as_str(), r)))
    }

    /// Total number of records across partitions.
    pub fn len(&self) -> usize {
        self.records.0.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition key to records, in the order the partitions appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions(pub Vec<(String, Vec<EncodedRecord>)>);

impl<'de> Deserialize<'de> for Partitions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PartitionsVisitor;

        impl<'de> Visitor<'de> for PartitionsVisitor {
            type Value = Partitions;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of partition keys to record lists")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Partitions, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut partitions = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, records)) = map.next_entry::<String, Vec<Value>>()? {
                    let records = records.into_iter().map(EncodedRecord::from_raw).collect();
                    partitions.push((key, records));
                }
                Ok(Partitions(partitions))
            }
        }

        deserializer.deserialize_map(PartitionsVisitor)
    }
}

/// A single streaming record. Only `value` is used; the rest is kept for logging.
///
/// `value` is kept as raw JSON and checked in [`decode_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub partition: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub offset: Option<i64>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl EncodedRecord {
    /// Wrap a JSON document the way the streaming source does.
    pub fn from_json(document: &Value) -> Self {
        Self {
            value: Some(Value::String(
                general_purpose::STANDARD.encode(document.to_string()),
            )),
            ..Self::default()
        }
    }

    /// Build a record from raw event JSON. Anything that is not an object
    /// becomes a record without a value.
    pub fn from_raw(raw: Value) -> Self {
        serde_json::from_value(raw).unwrap_or_default()
    }
}

/// Metadata fields of the wrong type are dropped instead of failing the record.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a record value: base64 → UTF-8 text.
pub fn decode_text(record: &EncodedRecord) -> Result<String> {
    let value = match &record.value {
        Some(Value::String(value)) => value,
        None | Some(Value::Null) => return Err(PortError::missing_field("value")),
        Some(other) => {
            return Err(PortError::MalformedMessage(format!(
                "record value must be a base64 string, got {}",
                other
            )));
        }
    };
    let bytes = general_purpose::STANDARD.decode(value.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Decode a record value into a typed message.
///
/// Syntax problems map to [`PortError::Decode`], shape problems to
/// [`PortError::MalformedMessage`].
pub fn decode_record<T: DeserializeOwned>(record: &EncodedRecord) -> Result<T> {
    let text = decode_text(record)?;
    debug!(message = %text, "Received message");
    Ok(serde_json::from_str(&text)?)
}
