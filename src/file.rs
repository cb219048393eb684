use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::model::catalog::{self, CatalogEntry};
use crate::model::{BodyDescriptor, Direction, Rgb};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("could not read body file: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("no body named {0}")]
    UnknownBody(String),
}

/// One row of a body file: a catalog entry, plus the starting phase if the
/// file pins one down.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRecord {
    pub entry: CatalogEntry,
    pub phase: Option<f64>,
}

impl BodyRecord {
    pub fn to_descriptor<R: Rng + ?Sized>(&self, rng: &mut R) -> BodyDescriptor {
        match self.phase {
            Some(phase) => self.entry.to_descriptor(phase),
            None => self.entry.to_descriptor_random(rng),
        }
    }
}

pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<Vec<BodyRecord>, FileError> {
    let text = fs::read_to_string(filename.as_ref())?;
    let records = parse_bodies(&text)?;
    debug!(
        "read {} bodies from {}",
        records.len(),
        filename.as_ref().display()
    );
    Ok(records)
}

/// Parses a body table. The first line is a header and is skipped, as are
/// blank lines and lines starting with `#`.
///
/// Columns: `name radius distance speed color phase direction`
pub fn parse_bodies(text: &str) -> Result<Vec<BodyRecord>, FileError> {
    let mut records: Vec<BodyRecord> = vec![];

    for (idx, line) in text.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parse_err = |reason: String| FileError::Parse {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        if fields.len() != 7 {
            return Err(parse_err(format!(
                "expected 7 fields, found {}",
                fields.len()
            )));
        }

        let number = |column: &str, s: &str| {
            s.parse::<f64>()
                .map_err(|_| parse_err(format!("bad {} {:?}", column, s)))
        };

        let name = fields[0];
        if records
            .iter()
            .any(|r| r.entry.name.eq_ignore_ascii_case(name))
        {
            return Err(parse_err(format!("{} appears twice", name)));
        }

        let phase = match fields[5] {
            "-" => None,
            s => Some(number("phase", s)?),
        };
        let direction = match fields[6] {
            "+" => Direction::Prograde,
            "-" => Direction::Retrograde,
            s => return Err(parse_err(format!("bad direction {:?}", s))),
        };
        let color = parse_color(fields[4]).ok_or_else(|| {
            parse_err(format!("bad color {:?}, expected six hex digits", fields[4]))
        })?;

        records.push(BodyRecord {
            entry: CatalogEntry {
                name: name.to_owned(),
                radius: number("radius", fields[1])?,
                distance: number("distance", fields[2])?,
                speed: number("speed", fields[3])?,
                color,
                direction,
            },
            phase,
        });
    }

    Ok(records)
}

/// Descriptors for every record, with unpinned phases drawn from `rng`.
pub fn to_descriptors<R: Rng + ?Sized>(records: &[BodyRecord], rng: &mut R) -> Vec<BodyDescriptor> {
    records.iter().map(|r| r.to_descriptor(rng)).collect()
}

/// The lone body for the planet viewer.
pub fn planet_viewer(records: &[BodyRecord], name: &str) -> Result<BodyDescriptor, FileError> {
    let entries: Vec<CatalogEntry> = records.iter().map(|r| r.entry.clone()).collect();
    catalog::planet_viewer(&entries, name).ok_or_else(|| FileError::UnknownBody(name.to_owned()))
}

fn parse_color(s: &str) -> Option<Rgb> {
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(s, 16).ok().map(Rgb::from_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TABLE: &str = "\
name radius distance speed color phase direction
sun 40 0 0 ffa500 0 +
# comment lines are fine

earth 8 120 1.0 2233ff - +
moonish 2 50 0.5 aaaaaa 1.5 -
";

    #[test]
    fn test_parse_table() {
        let records = parse_bodies(TABLE).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].entry.name, "sun");
        assert!(records[0].entry.is_star());
        assert_eq!(records[1].phase, None);
        assert_eq!(records[1].entry.color, Rgb::from_hex(0x2233ff));
        assert_eq!(records[2].phase, Some(1.5));
        assert_eq!(records[2].entry.direction, Direction::Retrograde);

        let descriptors = to_descriptors(&records, &mut StdRng::seed_from_u64(1));
        approx::assert_relative_eq!(descriptors[1].orbit_distance, 12.0);
        approx::assert_relative_eq!(descriptors[2].initial_phase, 1.5);
        assert!(descriptors.iter().all(|d| d.validate().is_ok()));
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let bad_color = "header\nsun 40 0 0 orange 0 +\n";
        match parse_bodies(bad_color) {
            Err(FileError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }

        let short = "header\nsun 40 0\n";
        assert!(matches!(
            parse_bodies(short),
            Err(FileError::Parse { line: 2, .. })
        ));

        let direction = "header\nsun 40 0 0 ffa500 0 sideways\n";
        assert!(parse_bodies(direction).is_err());

        let twice = "header\nsun 40 0 0 ffa500 0 +\nSun 40 0 0 ffa500 0 +\n";
        assert!(matches!(
            parse_bodies(twice),
            Err(FileError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_planet_viewer_lookup() {
        let records = parse_bodies(TABLE).unwrap();
        let earth = planet_viewer(&records, "EARTH").unwrap();
        assert!(earth.is_central());

        match planet_viewer(&records, "pluto") {
            Err(FileError::UnknownBody(name)) => assert_eq!(name, "pluto"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_file("definitely/not/here.txt"),
            Err(FileError::Io(_))
        ));
    }
}
