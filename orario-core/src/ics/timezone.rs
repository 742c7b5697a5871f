//! Time zone resolution and VTIMEZONE rules.
//!
//! Local times are resolved with `chrono-tz`. The VTIMEZONE block that
//! accompanies zone-qualified timestamps comes from a fixed rule table, so
//! the emitted definition never depends on the current date.

use chrono_tz::Tz;
use icalendar::parser::{Component, ParseString, Property};

use crate::error::{ExportError, ExportResult};

/// One STANDARD or DAYLIGHT sub-component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observance {
    /// Abbreviation written as TZNAME
    pub name: &'static str,
    /// Offset in effect before the transition, in seconds east of UTC
    pub offset_from: i32,
    /// Offset in effect after the transition, in seconds east of UTC
    pub offset_to: i32,
    /// First onset, as local time before the transition
    pub dtstart: &'static str,
    pub rrule: Option<&'static str>,
}

/// Transition rules for one family of zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRules {
    pub standard: Observance,
    pub daylight: Option<Observance>,
}

const HOUR: i32 = 3600;

const CENTRAL_EUROPE: ZoneRules = ZoneRules {
    standard: Observance {
        name: "CET",
        offset_from: 2 * HOUR,
        offset_to: HOUR,
        dtstart: "19701025T030000",
        rrule: Some("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"),
    },
    daylight: Some(Observance {
        name: "CEST",
        offset_from: HOUR,
        offset_to: 2 * HOUR,
        dtstart: "19700329T020000",
        rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"),
    }),
};

const WESTERN_EUROPE: ZoneRules = ZoneRules {
    standard: Observance {
        name: "GMT",
        offset_from: HOUR,
        offset_to: 0,
        dtstart: "19701025T020000",
        rrule: Some("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"),
    },
    daylight: Some(Observance {
        name: "BST",
        offset_from: 0,
        offset_to: HOUR,
        dtstart: "19700329T010000",
        rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"),
    }),
};

const PORTUGAL: ZoneRules = ZoneRules {
    standard: Observance {
        name: "WET",
        ..WESTERN_EUROPE.standard
    },
    daylight: Some(Observance {
        name: "WEST",
        offset_from: 0,
        offset_to: HOUR,
        dtstart: "19700329T010000",
        rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"),
    }),
};

const IRELAND: ZoneRules = ZoneRules {
    daylight: Some(Observance {
        name: "IST",
        offset_from: 0,
        offset_to: HOUR,
        dtstart: "19700329T010000",
        rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"),
    }),
    ..WESTERN_EUROPE
};

const EASTERN_EUROPE: ZoneRules = ZoneRules {
    standard: Observance {
        name: "EET",
        offset_from: 3 * HOUR,
        offset_to: 2 * HOUR,
        dtstart: "19701025T040000",
        rrule: Some("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"),
    },
    daylight: Some(Observance {
        name: "EEST",
        offset_from: 2 * HOUR,
        offset_to: 3 * HOUR,
        dtstart: "19700329T030000",
        rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"),
    }),
};

/// North American rules since 2007: second Sunday of March to first Sunday
/// of November, both at 02:00 local.
const fn north_america(std_name: &'static str, dst_name: &'static str, std_hours: i32) -> ZoneRules {
    let standard = std_hours * HOUR;
    let daylight = standard + HOUR;
    ZoneRules {
        standard: Observance {
            name: std_name,
            offset_from: daylight,
            offset_to: standard,
            dtstart: "19701101T020000",
            rrule: Some("FREQ=YEARLY;BYMONTH=11;BYDAY=1SU"),
        },
        daylight: Some(Observance {
            name: dst_name,
            offset_from: standard,
            offset_to: daylight,
            dtstart: "19700308T020000",
            rrule: Some("FREQ=YEARLY;BYMONTH=3;BYDAY=2SU"),
        }),
    }
}

const US_EASTERN: ZoneRules = north_america("EST", "EDT", -5);
const US_CENTRAL: ZoneRules = north_america("CST", "CDT", -6);
const US_MOUNTAIN: ZoneRules = north_america("MST", "MDT", -7);
const US_PACIFIC: ZoneRules = north_america("PST", "PDT", -8);

const ARIZONA: ZoneRules = ZoneRules {
    standard: Observance {
        name: "MST",
        offset_from: -7 * HOUR,
        offset_to: -7 * HOUR,
        dtstart: "19700101T000000",
        rrule: None,
    },
    daylight: None,
};

const UNIVERSAL: ZoneRules = ZoneRules {
    standard: Observance {
        name: "UTC",
        offset_from: 0,
        offset_to: 0,
        dtstart: "19700101T000000",
        rrule: None,
    },
    daylight: None,
};

/// Zones the formatter can describe with a VTIMEZONE block.
pub const SUPPORTED_ZONES: &[(&str, &ZoneRules)] = &[
    ("Europe/Rome", &CENTRAL_EUROPE),
    ("Europe/Vatican", &CENTRAL_EUROPE),
    ("Europe/San_Marino", &CENTRAL_EUROPE),
    ("Europe/Malta", &CENTRAL_EUROPE),
    ("Europe/Berlin", &CENTRAL_EUROPE),
    ("Europe/Paris", &CENTRAL_EUROPE),
    ("Europe/Madrid", &CENTRAL_EUROPE),
    ("Europe/Vienna", &CENTRAL_EUROPE),
    ("Europe/Zurich", &CENTRAL_EUROPE),
    ("Europe/Amsterdam", &CENTRAL_EUROPE),
    ("Europe/Brussels", &CENTRAL_EUROPE),
    ("Europe/Luxembourg", &CENTRAL_EUROPE),
    ("Europe/Monaco", &CENTRAL_EUROPE),
    ("Europe/Ljubljana", &CENTRAL_EUROPE),
    ("Europe/Zagreb", &CENTRAL_EUROPE),
    ("Europe/Prague", &CENTRAL_EUROPE),
    ("Europe/Warsaw", &CENTRAL_EUROPE),
    ("Europe/Budapest", &CENTRAL_EUROPE),
    ("Europe/Copenhagen", &CENTRAL_EUROPE),
    ("Europe/Stockholm", &CENTRAL_EUROPE),
    ("Europe/Oslo", &CENTRAL_EUROPE),
    ("Europe/London", &WESTERN_EUROPE),
    ("Europe/Dublin", &IRELAND),
    ("Europe/Lisbon", &PORTUGAL),
    ("Europe/Athens", &EASTERN_EUROPE),
    ("Europe/Helsinki", &EASTERN_EUROPE),
    ("Europe/Bucharest", &EASTERN_EUROPE),
    ("Europe/Sofia", &EASTERN_EUROPE),
    ("Europe/Riga", &EASTERN_EUROPE),
    ("Europe/Tallinn", &EASTERN_EUROPE),
    ("Europe/Vilnius", &EASTERN_EUROPE),
    ("America/New_York", &US_EASTERN),
    ("America/Chicago", &US_CENTRAL),
    ("America/Denver", &US_MOUNTAIN),
    ("America/Los_Angeles", &US_PACIFIC),
    ("America/Phoenix", &ARIZONA),
    ("UTC", &UNIVERSAL),
    ("Etc/UTC", &UNIVERSAL),
];

/// Look up the VTIMEZONE rules for an IANA identifier.
pub fn rules_for(tzid: &str) -> Option<&'static ZoneRules> {
    SUPPORTED_ZONES
        .iter()
        .find(|(id, _)| *id == tzid)
        .map(|(_, rules)| *rules)
}

/// The zone an export is written in.
#[derive(Debug, Clone)]
pub struct ExportZone {
    pub tzid: String,
    pub tz: Tz,
    rules: Option<&'static ZoneRules>,
}

impl ExportZone {
    /// Resolve a zone for UTC-encoded output, which only needs chrono-tz.
    pub fn for_utc(tzid: &str) -> ExportResult<Self> {
        let tz: Tz = tzid
            .parse()
            .map_err(|_| ExportError::UnsupportedZone(tzid.to_string()))?;

        Ok(ExportZone {
            tzid: tzid.to_string(),
            tz,
            rules: rules_for(tzid),
        })
    }

    /// Resolve a zone for TZID-qualified output, which also needs a rule.
    pub fn for_zoned(tzid: &str) -> ExportResult<Self> {
        let zone = Self::for_utc(tzid)?;
        if zone.rules.is_none() {
            return Err(ExportError::UnsupportedZone(tzid.to_string()));
        }
        Ok(zone)
    }

    /// This zone's VTIMEZONE block. Zones without a rule have none.
    pub fn vtimezone(&self) -> Option<Component<'static>> {
        let rules = self.rules?;

        let mut observances = vec![observance("STANDARD", &rules.standard)];
        if let Some(daylight) = &rules.daylight {
            observances.push(observance("DAYLIGHT", daylight));
        }

        Some(Component {
            name: "VTIMEZONE".into(),
            properties: vec![property("TZID", self.tzid.clone())],
            components: observances,
        })
    }
}

fn observance(name: &'static str, observance: &Observance) -> Component<'static> {
    let mut properties = vec![
        property("DTSTART", observance.dtstart),
        property("TZOFFSETFROM", format_offset(observance.offset_from)),
        property("TZOFFSETTO", format_offset(observance.offset_to)),
        property("TZNAME", observance.name),
    ];
    if let Some(rrule) = observance.rrule {
        properties.push(property("RRULE", rrule));
    }

    Component {
        name: name.into(),
        properties,
        components: Vec::new(),
    }
}

fn property(name: &'static str, value: impl Into<String>) -> Property<'static> {
    Property {
        name: name.into(),
        val: ParseString::from(value.into()),
        params: Vec::new(),
    }
}

/// Drop the DTSTAMP and UID lines icalendar adds to every component it
/// writes. VTIMEZONE and its observances take neither.
pub(super) fn strip_vtimezone_stamps(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_vtimezone = false;

    for line in ics.lines() {
        if line == "BEGIN:VTIMEZONE" {
            in_vtimezone = true;
        } else if line == "END:VTIMEZONE" {
            in_vtimezone = false;
        }

        if in_vtimezone && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Format a UTC offset as `+HHMM` / `-HHMM`.
fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
}
