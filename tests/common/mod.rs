//! Shared fixtures: writes database files byte by byte, independent of the
//! library's own encoder.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const MAGIC: u32 = 515;
pub const VALID: u8 = 0x00;
pub const DELETED: u8 = 0xFF;

pub const CONTRACTOR_COLUMNS: [(&str, usize); 6] = [
    ("name", 32),
    ("location", 64),
    ("specialties", 64),
    ("size", 6),
    ("rate", 8),
    ("owner", 8),
];

pub const DATA_SECTION_START: u64 = 54;
pub const RECORD_LENGTH: u64 = 183;

/// The 33 standard contractor records, in slot order.
pub const CONTRACTORS: [[&str; 6]; 33] = [
    ["Bitter Homes & Gardens", "Smallville", "Drywall, Painting, Carpets", "10", "$75.00", ""],
    ["Buonarotti & Company", "Smallville", "Air Conditioning, Painting", "10", "$40.00", ""],
    ["Fred & Nobby", "Smallville", "Drywall", "9", "$85.00", ""],
    ["Hamner & Tong", "Smallville", "Heating, Carpets, Plumbing", "5", "$75.00", ""],
    ["Dogs With Tools", "Smallville", "Roofing", "7", "$35.00", "12345678"],
    ["Moore Power Tool Ya", "Whoville", "Heating, Painting, Plumbing", "6", "$80.00", ""],
    ["Bitter Homes & Gardens", "Whoville", "Glass, Drywall, Electrical", "4", "$55.00", ""],
    ["Swanders & Flaughn", "Whoville", "Roofing, Painting", "9", "$70.00", ""],
    ["Buonarotti & Company", "Whoville", "Heating, Electrical", "12", "$40.00", ""],
    ["Fred & Nobby", "Whoville", "Carpets, Glass", "2", "$65.00", "87654321"],
    ["Hamner & Tong", "Lendmarch", "Painting, Drywall", "8", "$45.00", ""],
    ["Dogs With Tools", "Lendmarch", "Heating, Plumbing", "3", "$90.00", ""],
    ["Moore Power Tool Ya", "Lendmarch", "Electrical, Roofing", "7", "$60.00", ""],
    ["Swanders & Flaughn", "Hobbiton", "Heating, Painting", "4", "$50.00", ""],
    ["Bitter Homes & Gardens", "Hobbiton", "Roofing, Carpets", "6", "$40.00", ""],
    ["Buonarotti & Company", "Hobbiton", "Heating, Glass", "5", "$95.00", ""],
    ["Fred & Nobby", "Hobbiton", "Painting, Plumbing", "8", "$60.00", ""],
    ["Hamner & Tong", "EmeraldCity", "Heating, Drywall", "11", "$70.00", ""],
    ["Dogs With Tools", "EmeraldCity", "Plumbing, Carpets", "3", "$55.00", ""],
    ["Moore Power Tool Ya", "EmeraldCity", "Roofing, Glass", "5", "$35.00", ""],
    ["Bitter Homes & Gardens", "EmeraldCity", "Plumbing, Painting", "9", "$80.00", ""],
    ["Swanders & Flaughn", "Xanadu", "Heating, Carpets", "6", "$45.00", ""],
    ["Buonarotti & Company", "Xanadu", "Drywall, Roofing", "10", "$65.00", ""],
    ["Fred & Nobby", "Xanadu", "Heating, Electrical, Glass", "4", "$75.00", ""],
    ["Hamner & Tong", "Xanadu", "Carpets, Painting", "7", "$50.00", ""],
    ["Dogs With Tools", "Pleasantville", "Heating, Roofing", "2", "$85.00", ""],
    ["Moore Power Tool Ya", "Pleasantville", "Painting, Carpets", "8", "$40.00", ""],
    ["Swanders & Flaughn", "Pleasantville", "Glass, Plumbing", "12", "$90.00", ""],
    ["Bitter Homes & Gardens", "Pleasantville", "Electrical, Drywall", "3", "$60.00", ""],
    ["Buonarotti & Company", "Atlantis", "Roofing, Electrical", "6", "$55.00", ""],
    ["Fred & Nobby", "Atlantis", "Glass, Drywall", "5", "$70.00", ""],
    ["Hamner & Tong", "Atlantis", "Carpets, Roofing", "9", "$45.00", ""],
    ["Bitter Homes & Gardens", "Lendmarch", "Painting, Glass", "4", "$80.00", ""],
];

/// Builds the header bytes for the given columns.
pub fn header(magic: u32, columns: &[(&str, usize)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&magic.to_be_bytes());
    bytes.extend_from_slice(&(columns.len() as u16).to_be_bytes());
    for (name, length) in columns {
        bytes.push(name.len() as u8);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(*length as u8);
    }
    bytes
}

/// Builds one slot: flag byte plus left-justified, space-padded fields.
pub fn slot(flag: u8, columns: &[(&str, usize)], fields: &[&str]) -> Vec<u8> {
    let mut bytes = vec![flag];
    for ((_, length), field) in columns.iter().zip(fields) {
        bytes.extend_from_slice(field.as_bytes());
        bytes.extend(std::iter::repeat(b' ').take(length - field.len()));
    }
    bytes
}

/// Writes a complete database file.
pub fn write_db(path: &Path, columns: &[(&str, usize)], records: &[(u8, &[&str])]) {
    let mut bytes = header(MAGIC, columns);
    for (flag, fields) in records {
        bytes.extend(slot(*flag, columns, fields));
    }
    std::fs::write(path, bytes).unwrap();
}

/// Writes the standard contractor file into a fresh temp directory.
pub fn contractor_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db-2x1.db");
    let records: Vec<(u8, &[&str])> = CONTRACTORS.iter().map(|r| (VALID, &r[..])).collect();
    write_db(&path, &CONTRACTOR_COLUMNS, &records);
    (dir, path)
}

/// Owned copy of a fixture record.
pub fn contractor(rec_no: usize) -> Vec<String> {
    CONTRACTORS[rec_no].iter().map(|s| s.to_string()).collect()
}

/// Criteria with every column absent.
pub fn match_all() -> Vec<Option<&'static str>> {
    vec![None; CONTRACTOR_COLUMNS.len()]
}
