//! Moon phase calculation
//!
//! Closed-form approximation: the UTC calendar date is converted to a Julian
//! Day Number and positioned inside the synodic month relative to a known new
//! moon. No ephemeris, no network.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Serialize, Serializer, ser::SerializeStruct};

/// Julian day of the reference new moon (2000-01-06 18:14 UTC)
pub const REFERENCE_NEW_MOON_JD: f64 = 2_451_549.5;

/// Mean synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_67;

/// The eight phase buckets, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

struct PhaseText {
    name: &'static str,
    description: &'static str,
    full_description: &'static str,
}

const WAXING_FULL: &str = "Wassende Maan (ideaal voor groei, aantrekken en opbouwen)";
const WANING_FULL: &str = "Afnemende Maan (geschikt voor loslaten, reinigen en naar binnen keren)";

const PHASE_TABLE: [PhaseText; 8] = [
    PhaseText {
        name: "Nieuwe Maan",
        description: "Een tijd voor nieuwe starts",
        full_description: "Nieuwe Maan (perfect voor nieuwe starts en intenties zetten)",
    },
    PhaseText {
        name: "Wassende Sikkel",
        description: "Een tijd voor intenties en hoop",
        full_description: WAXING_FULL,
    },
    PhaseText {
        name: "Eerste Kwartier",
        description: "Een tijd voor actie en uitdagingen",
        full_description: WAXING_FULL,
    },
    PhaseText {
        name: "Wassende Maan",
        description: "Een tijd voor verfijning en aanpassing",
        full_description: WAXING_FULL,
    },
    PhaseText {
        name: "Volle Maan",
        description: "Een piek van energie en manifestatie",
        full_description: "Volle Maan (een piek van energie, krachtig voor loslaten en manifestatie)",
    },
    PhaseText {
        name: "Afnemende Maan",
        description: "Een tijd voor dankbaarheid en loslaten",
        full_description: WANING_FULL,
    },
    PhaseText {
        name: "Laatste Kwartier",
        description: "Een tijd voor loslaten en vergeven",
        full_description: WANING_FULL,
    },
    PhaseText {
        name: "Afnemende Sikkel",
        description: "Een tijd voor rust en overgave",
        full_description: WANING_FULL,
    },
];

impl MoonPhase {
    /// All phases in table order
    pub const ALL: [Self; 8] = [
        Self::NewMoon,
        Self::WaxingCrescent,
        Self::FirstQuarter,
        Self::WaxingGibbous,
        Self::FullMoon,
        Self::WaningGibbous,
        Self::LastQuarter,
        Self::WaningCrescent,
    ];

    /// Phase for a bucket index; wraps modulo 8
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index & 7]
    }

    /// Position in the table (0 = new moon, 4 = full moon)
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        PHASE_TABLE[self.index()].name
    }

    /// Short description
    #[must_use]
    pub const fn description(self) -> &'static str {
        PHASE_TABLE[self.index()].description
    }

    /// Long description used when prompting the generator
    #[must_use]
    pub const fn full_description(self) -> &'static str {
        PHASE_TABLE[self.index()].full_description
    }

    /// Identifier for the front-end icon
    #[must_use]
    pub const fn icon_key(self) -> &'static str {
        match self {
            Self::NewMoon => "NewMoon",
            Self::WaxingCrescent => "WaxingCrescent",
            Self::FirstQuarter => "FirstQuarter",
            Self::WaxingGibbous => "WaxingGibbous",
            Self::FullMoon => "FullMoon",
            Self::WaningGibbous => "WaningGibbous",
            Self::LastQuarter => "LastQuarter",
            Self::WaningCrescent => "WaningCrescent",
        }
    }
}

impl std::fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for MoonPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MoonPhase", 5)?;
        s.serialize_field("index", &self.index())?;
        s.serialize_field("name", self.name())?;
        s.serialize_field("description", self.description())?;
        s.serialize_field("iconKey", self.icon_key())?;
        s.serialize_field("fullDescription", self.full_description())?;
        s.end()
    }
}

/// Julian Day Number for a civil (proleptic Gregorian) date
#[must_use]
pub const fn julian_day_number(year: i32, month: u32, day: u32) -> i64 {
    let month = month as i64;
    let a = (14 - month) / 12;
    let y = year as i64 + 4800 - a;
    let m = month + 12 * a - 3;

    day as i64 + (153 * m + 2) / 5 + 365 * y + y.div_euclid(4) - y.div_euclid(100)
        + y.div_euclid(400)
        - 32045
}

/// Fractional position inside the synodic month, in `[0, 1)`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cycle_position(date: NaiveDate) -> f64 {
    let jdn = julian_day_number(date.year(), date.month(), date.day());
    let elapsed = jdn as f64 - REFERENCE_NEW_MOON_JD;
    let phase = (elapsed / SYNODIC_MONTH_DAYS).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if phase >= 1.0 { 0.0 } else { phase }
}

/// Moon phase for a UTC calendar date
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn moon_phase(date: NaiveDate) -> MoonPhase {
    let index = (cycle_position(date) * 8.0 + 0.5).floor() as usize & 7;
    MoonPhase::from_index(index)
}

/// Moon phase for an instant, using its UTC calendar date
#[must_use]
pub fn moon_phase_at(instant: DateTime<Utc>) -> MoonPhase {
    moon_phase(instant.date_naive())
}

/// Moon phase for today (UTC)
#[must_use]
pub fn moon_phase_now() -> MoonPhase {
    moon_phase_at(Utc::now())
}
