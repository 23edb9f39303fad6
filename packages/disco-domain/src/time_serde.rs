//! Catalogue timestamps: `YYYY-MM-DDTHH:MM:SS` with an optional fractional part and no offset.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	PrimitiveDateTime,
	format_description::BorrowedFormatItem,
	macros::format_description,
};

const INPUT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
const OUTPUT_SECONDS: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const OUTPUT_MICROS: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");

pub fn parse(raw: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
	PrimitiveDateTime::parse(raw.trim(), INPUT)
}

pub fn format(value: &PrimitiveDateTime) -> Result<String, time::error::Format> {
	if value.nanosecond() == 0 { value.format(OUTPUT_SECONDS) } else { value.format(OUTPUT_MICROS) }
}

pub fn serialize<S>(value: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = format(value).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}
