use std::fmt::Write;

use models::ambulance::LocationEntry;

/// Render a history as the plain-text report shown to dispatchers.
pub fn history_report(entries: &[LocationEntry]) -> String {
    let mut out = String::from("Location History:\n\n");
    for entry in entries {
        let _ = writeln!(out, "{}", entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Location: {}", entry.location);
        let _ = writeln!(out, "Coordinates: {}, {}\n", entry.latitude, entry.longitude);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn renders_entries_oldest_first() {
        let entries = vec![
            LocationEntry {
                location: "City Hospital".into(),
                latitude: 12.9,
                longitude: 77.6,
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            },
            LocationEntry {
                location: "Bus Stand".into(),
                latitude: 12.95,
                longitude: 77.65,
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            },
        ];
        let report = history_report(&entries);
        assert_eq!(
            report,
            "Location History:\n\n\
             2024-05-01 08:30:00 UTC\nLocation: City Hospital\nCoordinates: 12.9, 77.6\n\n\
             2024-05-01 09:00:00 UTC\nLocation: Bus Stand\nCoordinates: 12.95, 77.65\n\n"
        );
    }

    #[test]
    fn empty_history_has_only_header() {
        assert_eq!(history_report(&[]), "Location History:\n\n");
    }
}
