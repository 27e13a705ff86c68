// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Date and time specification, [RFC 5322 section 3.3](
//! https://datatracker.ietf.org/doc/html/rfc5322#section-3.3), including the
//! obsolete forms of section 4.3

use serde::{Serialize, Serializer};
use std::fmt;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

use crate::syntax::*;
use super::syntax::cfws;

/// Value of `Date` and `Resent-Date` fields
///
/// Two values are equal when they denote the same instant, regardless of
/// their offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateTime(pub OffsetDateTime);

impl DateTime {
    pub fn offset(&self) -> UtcOffset {
        self.0.offset()
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime(value)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = self.0;
        let offset = value.offset();
        let (hours, minutes, _) = offset.as_hms();

        write!(f, "{}, {} {} {:04} {:02}:{:02}:{:02} {}{:02}{:02}",
            day_name_of(value.weekday()),
            value.day(),
            month_name_of(value.month()),
            value.year(),
            value.hour(),
            value.minute(),
            value.second(),
            if offset.is_negative() { '-' } else { '+' },
            hours.unsigned_abs(),
            minutes.unsigned_abs(),
        )
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// -------------------------------------------------- 3.3. Date and Time ---

pub fn date_time(buf: &mut Buffer) -> Result<DateTime> {
    // date-time = [ day-of-week "," ] date time [CFWS]
    // obs-day-of-week = [CFWS] day-name [CFWS]
    buf.atomic(|buf| {
        buf.maybe(cfws);

        let day_of_week = buf.maybe(|buf| {
            let day = day_name(buf)?;
            buf.maybe(cfws);
            buf.maybe(|buf| buf.expect(","));
            buf.maybe(cfws);
            Ok(day)
        });

        let date = date(buf)?;
        buf.maybe(cfws);
        let (time, offset) = time(buf)?;
        buf.maybe(cfws);

        if let Some(day_of_week) = day_of_week {
            if day_of_week != date.weekday() {
                log::debug!("ignoring day name {day_of_week} for {date}, which is a {}",
                    date.weekday());
            }
        }

        Ok(DateTime(PrimitiveDateTime::new(date, time).assume_offset(offset)))
    })
}

static DAY_NAMES: [(&str, Weekday); 7] = [
    ("Mon", Weekday::Monday),
    ("Tue", Weekday::Tuesday),
    ("Wed", Weekday::Wednesday),
    ("Thu", Weekday::Thursday),
    ("Fri", Weekday::Friday),
    ("Sat", Weekday::Saturday),
    ("Sun", Weekday::Sunday),
];

static MONTH_NAMES: [(&str, Month); 12] = [
    ("Jan", Month::January),
    ("Feb", Month::February),
    ("Mar", Month::March),
    ("Apr", Month::April),
    ("May", Month::May),
    ("Jun", Month::June),
    ("Jul", Month::July),
    ("Aug", Month::August),
    ("Sep", Month::September),
    ("Oct", Month::October),
    ("Nov", Month::November),
    ("Dec", Month::December),
];

/// Match an alphabetic word against a table of names by its first three
/// letters, so that both `Thu` and `Thursday` are accepted
fn named<T: Copy>(buf: &mut Buffer, names: &[(&str, T)], what: &'static str) -> Result<T> {
    buf.atomic(|buf| {
        let word = buf.take_while(|c, _| c.is_ascii_alphabetic());

        word.get(..3)
            .and_then(|prefix| names.iter().find(|(name, _)| name.eq_ignore_ascii_case(prefix)))
            .map(|&(_, value)| value)
            .map_or_else(|| buf.error(what), Ok)
    })
}

pub fn day_name(buf: &mut Buffer) -> Result<Weekday> {
    // day-name = "Mon" / "Tue" / "Wed" / "Thu" / "Fri" / "Sat" / "Sun"
    named(buf, &DAY_NAMES, "invalid day name")
}

fn day_name_of(day: Weekday) -> &'static str {
    DAY_NAMES.iter()
        .find(|(_, value)| *value == day)
        .map_or("", |&(name, _)| name)
}

pub fn date(buf: &mut Buffer) -> Result<Date> {
    // date    = day month year
    // obs-day = [CFWS] 1*2DIGIT [CFWS]
    buf.atomic(|buf| {
        let at = buf.location();
        let day: u8 = read_number(buf, 10, 1, 2)?;
        buf.maybe(cfws);
        let month = month(buf)?;
        buf.maybe(cfws);
        let year = year(buf)?;

        Date::from_calendar_date(year, month, day)
            .map_err(|err| Located::new(at, err.to_string()))
    })
}

pub fn month(buf: &mut Buffer) -> Result<Month> {
    // month = "Jan" / "Feb" / "Mar" / "Apr" /
    //         "May" / "Jun" / "Jul" / "Aug" /
    //         "Sep" / "Oct" / "Nov" / "Dec"
    named(buf, &MONTH_NAMES, "invalid month name")
}

fn month_name_of(month: Month) -> &'static str {
    MONTH_NAMES.iter()
        .find(|(_, value)| *value == month)
        .map_or("", |&(name, _)| name)
}

pub fn year(buf: &mut Buffer) -> Result<i32> {
    // year     = (FWS 4*DIGIT FWS) / obs-year
    // obs-year = [CFWS] 2*DIGIT [CFWS]
    let before = buf.len();
    let year: i32 = read_number(buf, 10, 2, 4)?;

    Ok(match before - buf.len() {
        2 if year < 50 => 2000 + year,
        2 | 3 => 1900 + year,
        _ => year,
    })
}

pub fn time(buf: &mut Buffer) -> Result<(Time, UtcOffset)> {
    // time = time-of-day zone
    buf.atomic(|buf| {
        let time = time_of_day(buf)?;
        let zone = buf.maybe(zone).unwrap_or_else(|| {
            log::debug!("missing time zone, assuming +0000");
            UtcOffset::UTC
        });
        Ok((time, zone))
    })
}

pub fn time_of_day(buf: &mut Buffer) -> Result<Time> {
    // time-of-day = hour ":" minute [ ":" second ]
    // obs-hour    = [CFWS] 2DIGIT [CFWS]
    buf.atomic(|buf| {
        let at = buf.location();
        let hour: u8 = read_number(buf, 10, 1, 2)?;
        buf.maybe(cfws);
        buf.expect(":")?;
        buf.maybe(cfws);
        let minute: u8 = read_number(buf, 10, 1, 2)?;

        let second = buf.maybe(|buf| {
            buf.maybe(cfws);
            buf.expect(":")?;
            buf.maybe(cfws);
            read_number::<u8>(buf, 10, 1, 2)
        }).unwrap_or(0);

        // Leap seconds can't be represented.
        let second = if second == 60 { 59 } else { second };

        Time::from_hms(hour, minute, second)
            .map_err(|err| Located::new(at, err.to_string()))
    })
}

static OBSOLETE_ZONES: &[(&str, i8)] = &[
    // UTC
    ("UT", 0),
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    // US time zones
    ("EDT", -4),
    ("EST", -5),
    ("CDT", -5),
    ("CST", -6),
    ("MDT", -6),
    ("MST", -7),
    ("PDT", -7),
    ("PST", -8),
];

pub fn zone(buf: &mut Buffer) -> Result<UtcOffset> {
    // zone     = (FWS ( "+" / "-" ) 4DIGIT) / obs-zone
    // obs-zone = "UT" / "GMT" / "EST" / "EDT" / "CST" / "CDT" /
    //            "MST" / "MDT" / "PST" / "PDT" / military zones
    buf.atomic(|buf| {
        buf.maybe(cfws);

        match buf.peek() {
            Some(sign @ (b'+' | b'-')) => {
                buf.advance(1);
                let hours: i32 = read_number(buf, 10, 2, 2)?;
                let minutes: i32 = read_number(buf, 10, 2, 2)?;

                if hours > 23 || minutes > 59 {
                    log::debug!("time zone offset {hours:02}{minutes:02} out of range, using +0000");
                    return Ok(UtcOffset::UTC);
                }

                let seconds = (hours * 60 + minutes) * 60;
                let seconds = if sign == b'-' { -seconds } else { seconds };

                // -0000 means the offset is unknown, which is +0000 as well.
                Ok(UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = buf.take_while(|c, _| c.is_ascii_alphabetic());

                // Military and unrecognised zones are treated as +0000,
                // as RFC 5322 section 4.3 requires.
                let offset = OBSOLETE_ZONES.iter()
                    .find(|(zone, _)| zone.eq_ignore_ascii_case(name))
                    .and_then(|&(_, hours)| UtcOffset::from_hms(hours, 0, 0).ok());

                Ok(offset.unwrap_or_else(|| {
                    log::debug!("unknown time zone {name:?}, using +0000");
                    UtcOffset::UTC
                }))
            }
            _ => buf.error("expected a time zone"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: Month, day: u8, time: (u8, u8, u8), offset: (i8, i8)) -> DateTime {
        Date::from_calendar_date(year, month, day).unwrap()
            .with_hms(time.0, time.1, time.2).unwrap()
            .assume_offset(UtcOffset::from_hms(offset.0, offset.1, 0).unwrap())
            .into()
    }

    fn parse(text: &str) -> DateTime {
        let mut buf = Buffer::new(text);
        let value = date_time(&mut buf).unwrap();
        buf.expect_empty().unwrap();
        value
    }

    #[test]
    fn current_syntax() {
        let value = parse("Fri, 21 Nov 1997 09:55:06 -0600");
        assert_eq!(value, at(1997, Month::November, 21, (9, 55, 6), (-6, 0)));
        assert_eq!(value.offset(), UtcOffset::from_hms(-6, 0, 0).unwrap());
        assert_eq!(value.to_string(), "Fri, 21 Nov 1997 09:55:06 -0600");
    }

    #[test]
    fn folded_without_seconds() {
        let value = parse("Thu,\r\n      13\r\n        Feb\r\n          1969\r\n      23:32\r\n               -0330 (Newfoundland Time)");
        assert_eq!(value, at(1969, Month::February, 13, (23, 32, 0), (-3, -30)));
        assert_eq!(value.to_string(), "Thu, 13 Feb 1969 23:32:00 -0330");
    }

    #[test]
    fn obsolete_forms() {
        assert_eq!(parse("21 Nov 97 09:55:06 GMT"),
            at(1997, Month::November, 21, (9, 55, 6), (0, 0)));
        assert_eq!(parse("Fri, 21 Nov 1997 09(comment):   55  :  06 -0600"),
            at(1997, Month::November, 21, (9, 55, 6), (-6, 0)));
        assert_eq!(parse("1 Jan 03 00:00 EST"),
            at(2003, Month::January, 1, (0, 0, 0), (-5, 0)));
        assert_eq!(parse("1 Jan 103 00:00 PDT"),
            at(2003, Month::January, 1, (0, 0, 0), (-7, 0)));
        assert_eq!(parse("thursday, 13 february 1969 23:32:54 -0330"),
            at(1969, Month::February, 13, (23, 32, 54), (-3, -30)));
    }

    #[test]
    fn unknown_zones_are_utc() {
        for zone in ["-0000", "A", "XYZ", "+9999", ""] {
            let value = parse(&format!("1 Jul 2003 10:52:37 {zone}"));
            assert_eq!(value.offset(), UtcOffset::UTC);
            assert_eq!(value, at(2003, Month::July, 1, (10, 52, 37), (0, 0)));
        }
    }

    #[test]
    fn wrong_day_name_is_ignored() {
        assert_eq!(parse("Mon, 1 Jul 2003 10:52:37 +0200"),
            at(2003, Month::July, 1, (10, 52, 37), (2, 0)));
    }

    #[test]
    fn leap_second_is_clamped() {
        assert_eq!(parse("31 Dec 1998 23:59:60 +0000"),
            at(1998, Month::December, 31, (23, 59, 59), (0, 0)));
    }

    #[test]
    fn impossible_dates() {
        assert!(date_time(&mut Buffer::new("31 Feb 2003 10:00 +0000")).is_err());
        assert!(date_time(&mut Buffer::new("1 Feb 2003 25:00 +0000")).is_err());
        assert!(date_time(&mut Buffer::new("yesterday")).is_err());
    }

    #[test]
    fn instant_equality() {
        assert_eq!(parse("Fri, 21 Nov 1997 09:55:06 -0600"),
            parse("Fri, 21 Nov 1997 15:55:06 +0000"));
    }
}
