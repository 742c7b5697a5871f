//! Exports re-read with the icalendar crate's parser, the way a third-party
//! calendar application would see them.

use chrono::{NaiveDate, TimeZone, Utc};
use icalendar::parser::{Component, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use orario_core::ics::ICS_FILENAME;
use orario_core::{ExportOptions, Schedule, TimeEncoding};

const PAYLOAD: &str = r#"{
    "412": {
        "TEACHING": "ALGORITHMS, ADVANCED",
        "START_ISO8601": "2024-01-15T09:00:00",
        "END_ISO8601": "2024-01-15T11:00:00",
        "LECTURER_NAME": "ROSSI MARIO",
        "URL_DOCENTE": "https://www.unive.it/data/persone/5591234",
        "CLASSROOM_NAME": "Aula Delta 1B",
        "LOCATION_NAME": "Campus Scientifico via Torino",
        "ADDRESS": "Via Torino 155, Mestre",
        "URLS_INSEGNAMENTO": "https://www.unive.it/data/insegnamento/396541",
        "CREDITS": 6.0
    },
    "413": {
        "TEACHING": "ALGORITHMS, ADVANCED",
        "START_ISO8601": "2024-04-08T14:00:00",
        "END_ISO8601": "2024-04-08T16:00:00",
        "LECTURER_NAME": "ROSSI MARIO",
        "URL_DOCENTE": "null",
        "CLASSROOM_NAME": "Aula Delta 1B",
        "LOCATION_NAME": "Campus Scientifico via Torino",
        "ADDRESS": "Via Torino 155, Mestre",
        "URLS_INSEGNAMENTO": "https://www.unive.it/data/insegnamento/396541",
        "CREDITS": 6.0
    },
    "414": {
        "TEACHING": "ALGORITHMS, ADVANCED",
        "START_ISO8601": "null",
        "END_ISO8601": "null"
    }
}"#;

fn components<'a>(parent: &'a [Component<'a>], name: &str) -> Vec<&'a Component<'a>> {
    parent.iter().filter(|c| c.name == name).collect()
}

fn dtstart(event: &Component<'_>) -> CalendarDateTime {
    let prop = event.find_prop("DTSTART").expect("VEVENT without DTSTART");
    match DatePerhapsTime::try_from(prop) {
        Ok(DatePerhapsTime::DateTime(dt)) => dt,
        _ => panic!("DTSTART is not a date-time"),
    }
}

#[test_log::test]
fn zoned_export_parses_back() {
    let schedule = Schedule::from_payload("ALGORITHMS, ADVANCED", PAYLOAD).unwrap();
    let report = schedule
        .export("Europe/Rome", &ExportOptions::default())
        .unwrap();

    assert_eq!(report.exported, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 2);

    let unfolded = unfold(report.document.as_str());
    let calendar = read_calendar(&unfolded).expect("export should parse");

    let timezones = components(&calendar.components, "VTIMEZONE");
    assert_eq!(timezones.len(), 1);
    assert_eq!(components(&timezones[0].components, "STANDARD").len(), 1);
    assert_eq!(components(&timezones[0].components, "DAYLIGHT").len(), 1);

    let events = components(&calendar.components, "VEVENT");
    assert_eq!(events.len(), 2);

    let expected = [
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        NaiveDate::from_ymd_opt(2024, 4, 8).unwrap().and_hms_opt(14, 0, 0).unwrap(),
    ];
    for (event, expected) in events.iter().zip(expected) {
        match dtstart(event) {
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                assert_eq!(tzid, "Europe/Rome");
                assert_eq!(date_time, expected);
            }
            _ => panic!("Expected a TZID-qualified DTSTART"),
        }
        assert!(event.find_prop("UID").is_some());
        assert!(event.find_prop("DTSTAMP").is_some());
        assert!(event.find_prop("DESCRIPTION").is_some());
        assert!(event.find_prop("LOCATION").is_some());
        assert!(event.find_prop("URL").is_some());
    }
}

#[test_log::test]
fn utc_export_parses_back_as_utc() {
    let schedule = Schedule::from_payload("ALGORITHMS, ADVANCED", PAYLOAD).unwrap();
    let options = ExportOptions {
        encoding: TimeEncoding::Utc,
        ..ExportOptions::default()
    };
    let report = schedule.export("Europe/Rome", &options).unwrap();

    let unfolded = unfold(report.document.as_str());
    let calendar = read_calendar(&unfolded).expect("export should parse");
    assert!(components(&calendar.components, "VTIMEZONE").is_empty());

    let events = components(&calendar.components, "VEVENT");
    let starts: Vec<_> = events
        .iter()
        .map(|event| match dtstart(event) {
            CalendarDateTime::Utc(dt) => dt,
            _ => panic!("Expected a UTC DTSTART"),
        })
        .collect();

    assert_eq!(
        starts,
        vec![
            // CET, UTC+1
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
            // CEST, UTC+2
            Utc.with_ymd_and_hms(2024, 4, 8, 12, 0, 0).unwrap(),
        ]
    );
}

#[test]
fn download_name_matches_convention() {
    assert_eq!(ICS_FILENAME, "calendar.ics");
}
