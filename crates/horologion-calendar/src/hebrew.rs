//! Hebrew calendar conversion
//!
//! Classical molad arithmetic: months alternate 29/30 days around a
//! mean lunation of 29d 12h 793 halakim, leap months follow the
//! 19-year Metonic cycle, and the four postponement rules (dechiyot)
//! pin Rosh Hashanah to a permitted weekday. Year length then falls
//! in {353, 354, 355} for common years and {383, 384, 385} for leap
//! years, which fixes the lengths of Cheshvan and Kislev.

use serde::{Deserialize, Serialize};

use horologion_core::{HorologionError, HorologionResult, UtcInstant};

/// Rata Die day number of 1 Tishrei, AM 1
const HEBREW_EPOCH_RD: i64 = -1_373_428;

/// Halakim (parts) per hour
const PARTS_PER_HOUR: i64 = 1080;

/// Months of the Hebrew year, ecclesiastical numbering (Nisan = 1).
/// `Adar` occurs only in common years; `AdarI`/`AdarII` only in leap
/// years, in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HebrewMonth {
    Nisan,
    Iyar,
    Sivan,
    Tammuz,
    Av,
    Elul,
    Tishrei,
    Cheshvan,
    Kislev,
    Tevet,
    Shevat,
    Adar,
    AdarI,
    AdarII,
}

impl HebrewMonth {
    /// Ecclesiastical month number, 1 (Nisan) through 13 (Adar II)
    pub fn number(self) -> u8 {
        match self {
            HebrewMonth::Nisan => 1,
            HebrewMonth::Iyar => 2,
            HebrewMonth::Sivan => 3,
            HebrewMonth::Tammuz => 4,
            HebrewMonth::Av => 5,
            HebrewMonth::Elul => 6,
            HebrewMonth::Tishrei => 7,
            HebrewMonth::Cheshvan => 8,
            HebrewMonth::Kislev => 9,
            HebrewMonth::Tevet => 10,
            HebrewMonth::Shevat => 11,
            HebrewMonth::Adar | HebrewMonth::AdarI => 12,
            HebrewMonth::AdarII => 13,
        }
    }

    /// Transliterated display name
    pub fn name(self) -> &'static str {
        match self {
            HebrewMonth::Nisan => "Nisan",
            HebrewMonth::Iyar => "Iyar",
            HebrewMonth::Sivan => "Sivan",
            HebrewMonth::Tammuz => "Tammuz",
            HebrewMonth::Av => "Av",
            HebrewMonth::Elul => "Elul",
            HebrewMonth::Tishrei => "Tishrei",
            HebrewMonth::Cheshvan => "Cheshvan",
            HebrewMonth::Kislev => "Kislev",
            HebrewMonth::Tevet => "Tevet",
            HebrewMonth::Shevat => "Shevat",
            HebrewMonth::Adar => "Adar",
            HebrewMonth::AdarI => "Adar I",
            HebrewMonth::AdarII => "Adar II",
        }
    }

    /// Whether this is the intercalated leap month
    pub fn is_leap_month(self) -> bool {
        self == HebrewMonth::AdarII
    }
}

/// Year classification by length
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearKind {
    /// 353/383 days: Kislev shortened to 29
    Deficient,
    /// 354/384 days: standard month lengths
    Regular,
    /// 355/385 days: Cheshvan lengthened to 30
    Complete,
}

/// A date in the Hebrew calendar, derived and immutable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HebrewDate {
    pub year: i64,
    pub month: HebrewMonth,
    pub day: u8,
}

impl HebrewDate {
    /// Fixed holiday falling on this date, if any
    pub fn holiday(&self) -> Option<&'static str> {
        let leap = is_leap_year(self.year);
        match (self.month, self.day) {
            (HebrewMonth::Nisan, 15) => Some("Pesach"),
            (HebrewMonth::Sivan, 6) => Some("Shavuot"),
            (HebrewMonth::Tishrei, 1) => Some("Rosh Hashanah"),
            (HebrewMonth::Tishrei, 10) => Some("Yom Kippur"),
            (HebrewMonth::Tishrei, 15) => Some("Sukkot"),
            (HebrewMonth::Kislev, 25) => Some("Chanukah"),
            (HebrewMonth::Adar, 14) if !leap => Some("Purim"),
            (HebrewMonth::AdarII, 14) if leap => Some("Purim"),
            _ => None,
        }
    }
}

/// Leap years fall at positions {3, 6, 8, 11, 14, 17, 19} of the
/// 19-year cycle
#[inline]
pub fn is_leap_year(year: i64) -> bool {
    (7 * year + 1).rem_euclid(19) < 7
}

/// 12 in common years, 13 in leap years
#[inline]
pub fn months_in_year(year: i64) -> u8 {
    if is_leap_year(year) {
        13
    } else {
        12
    }
}

/// Days from the Hebrew epoch to the molad-determined (and
/// postponement-adjusted) 1 Tishrei of `year`
fn elapsed_days(year: i64) -> i64 {
    // Months before this year: 235 per full cycle, then 12 per common
    // and 13 per leap year of the partial cycle
    let cycles = (year - 1).div_euclid(19);
    let in_cycle = (year - 1).rem_euclid(19);
    let months = 235 * cycles + 12 * in_cycle + (7 * in_cycle + 1) / 19;

    // Molad of Tishrei: epochal molad was day 2, 5h 204p, and each
    // lunation adds 29d 12h 793p
    let parts = 204 + 793 * (months % PARTS_PER_HOUR);
    let hours = 5 + 12 * months + 793 * (months / PARTS_PER_HOUR) + parts / PARTS_PER_HOUR;
    let day = 1 + 29 * months + hours / 24;
    let parts_rem = PARTS_PER_HOUR * (hours % 24) + parts % PARTS_PER_HOUR;

    // Dechiyot: molad too late in the day, or the gatarad/betutakpat
    // rules for keeping year lengths legal
    let mut rosh = day;
    if parts_rem >= 19_440
        || (day % 7 == 2 && parts_rem >= 9_924 && !is_leap_year(year))
        || (day % 7 == 1 && parts_rem >= 16_789 && is_leap_year(year - 1))
    {
        rosh += 1;
    }
    // Rosh Hashanah never falls on Sunday, Wednesday or Friday
    if matches!(rosh % 7, 0 | 3 | 5) {
        rosh += 1;
    }
    rosh
}

/// Rata Die day number of 1 Tishrei of `year`
#[inline]
fn new_year_rd(year: i64) -> i64 {
    HEBREW_EPOCH_RD + elapsed_days(year)
}

/// Length of the year in days: 353-355 common, 383-385 leap
#[inline]
pub fn days_in_year(year: i64) -> i64 {
    elapsed_days(year + 1) - elapsed_days(year)
}

/// Classify a year by its length
pub fn year_kind(year: i64) -> YearKind {
    match days_in_year(year) % 10 {
        3 => YearKind::Deficient,
        5 => YearKind::Complete,
        _ => YearKind::Regular,
    }
}

/// Months of `year` in civil order (from Tishrei), with their lengths
pub fn civil_months(year: i64) -> Vec<(HebrewMonth, u8)> {
    let kind = year_kind(year);
    let mut months = vec![
        (HebrewMonth::Tishrei, 30),
        (
            HebrewMonth::Cheshvan,
            if kind == YearKind::Complete { 30 } else { 29 },
        ),
        (
            HebrewMonth::Kislev,
            if kind == YearKind::Deficient { 29 } else { 30 },
        ),
        (HebrewMonth::Tevet, 29),
        (HebrewMonth::Shevat, 30),
    ];
    if is_leap_year(year) {
        months.push((HebrewMonth::AdarI, 30));
        months.push((HebrewMonth::AdarII, 29));
    } else {
        months.push((HebrewMonth::Adar, 29));
    }
    months.extend([
        (HebrewMonth::Nisan, 30),
        (HebrewMonth::Iyar, 29),
        (HebrewMonth::Sivan, 30),
        (HebrewMonth::Tammuz, 29),
        (HebrewMonth::Av, 30),
        (HebrewMonth::Elul, 29),
    ]);
    months
}

/// Days in one month of `year`
pub fn days_in_month(year: i64, month: HebrewMonth) -> Option<u8> {
    civil_months(year)
        .into_iter()
        .find(|(m, _)| *m == month)
        .map(|(_, len)| len)
}

/// Convert an instant to its Hebrew calendar date.
/// Instants before the calendar epoch are rejected.
pub fn convert(instant: UtcInstant) -> HorologionResult<HebrewDate> {
    from_rata_die(instant.rata_die())
}

/// Convert a Rata Die day number to a Hebrew date
pub fn from_rata_die(rd: i64) -> HorologionResult<HebrewDate> {
    if rd < HEBREW_EPOCH_RD {
        return Err(HorologionError::BeforeHebrewEpoch(rd));
    }

    // Estimate from the mean year (35975351/98496 days), then settle
    let mut year = (rd - HEBREW_EPOCH_RD) * 98_496 / 35_975_351 + 1;
    while new_year_rd(year + 1) <= rd {
        year += 1;
    }
    while new_year_rd(year) > rd {
        year -= 1;
    }

    let mut remaining = rd - new_year_rd(year);
    for (month, len) in civil_months(year) {
        if remaining < i64::from(len) {
            return Ok(HebrewDate {
                year,
                month,
                day: (remaining + 1) as u8,
            });
        }
        remaining -= i64::from(len);
    }

    // civil_months always sums to days_in_year
    unreachable!("day offset exceeded Hebrew year length")
}

/// Rata Die day number of a Hebrew date (round-trip support)
pub fn to_rata_die(date: HebrewDate) -> Option<i64> {
    let mut rd = new_year_rd(date.year);
    for (month, len) in civil_months(date.year) {
        if month == date.month {
            if date.day == 0 || date.day > len {
                return None;
            }
            return Some(rd + i64::from(date.day) - 1);
        }
        rd += i64::from(len);
    }
    None
}
