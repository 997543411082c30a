// src/data/datetime.rs

//! Datetime aliases and helpers for record timevalue handling.
//!
//! The accounting file stores record creation times as either a
//! `timeval`-style pair or a plain `time_t`; conversion to a typed
//! datetime happens once at decode, in
//! [`convert_tvsec_tvusec_datetime`].
//!
//! [`convert_tvsec_tvusec_datetime`]: crate::data::utent::convert_tvsec_tvusec_datetime

#[doc(hidden)]
pub use ::chrono::{
    DateTime,
    Duration,
    FixedOffset,
    LocalResult,
    TimeZone,
    Timelike,
};

/// `DateTimeL` is _L_ocal `DateTime` with a fixed offset.
pub type DateTimeL = DateTime<FixedOffset>;

/// Optional [`DateTimeL`].
pub type DateTimeLOpt = Option<DateTimeL>;

/// Create a [`DateTimeL`] with a year, month, day, hour, minute, second.
///
/// Intended to ease creating datetimes in tests.
pub fn ymdhms(
    fixedoffset: &FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTimeL {
    fixedoffset
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Create a [`DateTimeL`] with a year, month, day, hour, minute, second,
/// microsecond.
///
/// Intended to ease creating datetimes in tests.
#[allow(clippy::too_many_arguments)]
pub fn ymdhmsm(
    fixedoffset: &FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
    micros: u32,
) -> DateTimeL {
    ymdhms(fixedoffset, year, month, day, hour, min, sec)
        .with_nanosecond(micros * 1000)
        .unwrap()
}
