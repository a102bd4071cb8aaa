//! Survivor and monster payloads decoded into fixed-column tables.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::DecodeError;

/// Anything with a latitude/longitude, used by the bounds stage.
pub trait PointRecord {
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivorRecord {
    pub survivor_id: String,
    pub district: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterRecord {
    pub monster_id: String,
    pub lat: f64,
    pub lon: f64,
}

impl PointRecord for SurvivorRecord {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl PointRecord for MonsterRecord {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

/// Where an endpoint keeps its record array. Survivors arrive as a bare array,
/// monsters wrapped in an object under `monsters`.
#[derive(Debug, Clone, Copy)]
pub enum RecordList {
    TopLevel,
    Nested(&'static str),
}

pub const SURVIVOR_LIST: RecordList = RecordList::TopLevel;
pub const MONSTER_LIST: RecordList = RecordList::Nested("monsters");

impl RecordList {
    fn records<'a>(&self, payload: &'a Value) -> Result<&'a [Value], DecodeError> {
        let list = match self {
            RecordList::TopLevel => payload,
            RecordList::Nested(key) => payload.get(key).ok_or_else(|| {
                DecodeError::Malformed(format!("expected an object with a '{key}' key"))
            })?,
        };
        list.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| DecodeError::Malformed("expected an array of records".into()))
    }
}

/// Generic table: the decoded rows plus how many records were unusable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table<R> {
    pub rows: Vec<R>,
    pub skipped: usize,
}

impl<R> Table<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub type SurvivorTable = Table<SurvivorRecord>;
pub type MonsterTable = Table<MonsterRecord>;

impl SurvivorTable {
    /// Distinct district names, in sorted order.
    pub fn districts(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.district.as_str()).collect()
    }

    pub fn in_district<'a>(&'a self, district: &'a str) -> impl Iterator<Item = &'a SurvivorRecord> {
        self.rows.iter().filter(move |row| row.district == district)
    }
}

pub fn decode_survivors(payload: &Value) -> Result<SurvivorTable, DecodeError> {
    decode_table(payload, SURVIVOR_LIST, "survivor", |record| {
        Some(SurvivorRecord {
            survivor_id: id_field(record, "survivor_id")?,
            district: text_field(record, "district")?,
            lat: coordinate_field(record, "lat")?,
            lon: coordinate_field(record, "lon")?,
        })
    })
}

pub fn decode_monsters(payload: &Value) -> Result<MonsterTable, DecodeError> {
    decode_table(payload, MONSTER_LIST, "monster", |record| {
        Some(MonsterRecord {
            monster_id: id_field(record, "monster_id")?,
            lat: coordinate_field(record, "lat")?,
            lon: coordinate_field(record, "lon")?,
        })
    })
}

fn decode_table<R>(
    payload: &Value,
    list: RecordList,
    kind: &str,
    decode: impl Fn(&Map<String, Value>) -> Option<R>,
) -> Result<Table<R>, DecodeError> {
    let records = list.records(payload)?;
    let mut table = Table {
        rows: Vec::with_capacity(records.len()),
        skipped: 0,
    };
    for (index, record) in records.iter().enumerate() {
        match record.as_object().and_then(&decode) {
            Some(row) => table.rows.push(row),
            None => {
                warn!(index, kind, "skipping record with missing or invalid fields");
                table.skipped += 1;
            }
        }
    }
    Ok(table)
}

fn id_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key)?.as_str().map(str::to_string)
}

fn coordinate_field(record: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match record.get(key)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
