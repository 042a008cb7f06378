// GPS epoch time conversions
//
// Many spacecraft clocks count from the GPS (and ISS) epoch: January 6,
// 1980 at midnight UTC. These helpers translate between that count and
// calendar timestamps, GPS week numbers, and Julian dates.

use chrono::{DateTime, Duration, TimeZone, Utc};

const SECONDS_PER_WEEK: i64 = 604_800;

lazy_static::lazy_static! {
    static ref GPS_EPOCH: DateTime<Utc> = Utc
        .with_ymd_and_hms(1980, 1, 6, 0, 0, 0)
        .single()
        .expect("GPS epoch is a valid timestamp");
}

/// Midnight on January 6th, 1980 (UTC).
pub fn gps_epoch() -> DateTime<Utc> {
    *GPS_EPOCH
}

/// The current UTC time as (seconds, microseconds).
pub fn timestamp_utc() -> (i64, u32) {
    let now = Utc::now();
    (now.timestamp(), now.timestamp_subsec_micros())
}

/// Whole seconds elapsed between the GPS epoch and the given timestamp.
pub fn to_gps_seconds(timestamp: DateTime<Utc>) -> i64 {
    (timestamp - gps_epoch()).num_seconds()
}

/// Converts seconds (and microseconds) since the GPS epoch back to a UTC
/// timestamp.
pub fn to_utc(seconds: i64, microseconds: i64) -> DateTime<Utc> {
    gps_epoch() + Duration::seconds(seconds) + Duration::microseconds(microseconds)
}

/// Converts a UTC timestamp to (GPS week number, seconds into the week).
///
/// `leap` is the current GPS-UTC leap second offset, added before the
/// split; GPS time does not observe leap seconds.
pub fn to_gps_week_and_secs(timestamp: DateTime<Utc>, leap: i64) -> (i64, i64) {
    let delta = to_gps_seconds(timestamp) + leap;
    (delta.div_euclid(SECONDS_PER_WEEK), delta.rem_euclid(SECONDS_PER_WEEK))
}

/// Converts a UTC timestamp to a Julian date, using the formula from
/// Meeus (1991).
pub fn to_julian(timestamp: DateTime<Utc>) -> f64 {
    use chrono::{Datelike, Timelike};

    let (year, month) = if timestamp.month() < 3 {
        (i64::from(timestamp.year()) - 1, i64::from(timestamp.month()) + 12)
    } else {
        (i64::from(timestamp.year()), i64::from(timestamp.month()))
    };

    let a = year / 100;
    let b = 2 - a + a / 4;
    let day_fraction = ((f64::from(timestamp.second()) / 60.0 + f64::from(timestamp.minute()))
        / 60.0
        + f64::from(timestamp.hour()))
        / 24.0;

    let days = (365.25 * (year + 4716) as f64).floor()
        + (30.6001 * (month + 1) as f64).floor()
        + f64::from(timestamp.day());

    days + b as f64 - 1524.5 + day_fraction
}

/// Converts a UTC timestamp to Greenwich Mean Sidereal Time, in radians,
/// using the formula from D.A. Vallado (2004).
pub fn to_gmst(timestamp: DateTime<Utc>) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let t_ut1 = (to_julian(timestamp) - 2_451_545.0) / 36_525.0;

    let mut gmst = 67_310.54841 + (876_600.0 * 3600.0 + 8_640_184.812866) * t_ut1;
    gmst += 0.093104 * t_ut1 * t_ut1;
    gmst -= 6.2e-6 * t_ut1 * t_ut1 * t_ut1;

    // 86400 seconds / 360 degrees = 240 seconds per degree
    gmst /= 240.0;

    let gmst = gmst.to_radians() % two_pi;
    if gmst < 0.0 {
        gmst + two_pi
    } else {
        gmst
    }
}
