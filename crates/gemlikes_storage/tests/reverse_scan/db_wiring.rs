#![forbid(unsafe_code)]

use std::fs::{self, File};
use std::io::Write;

use gemlikes_storage::ReverseLines;

#[test]
fn at_rscan_db_01_large_file_is_scanned_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log");
    let mut file = File::create(&path).unwrap();
    for i in 0..5_000 {
        writeln!(file, "line {i}").unwrap();
    }
    drop(file);

    let mut scan = ReverseLines::with_window(File::open(&path).unwrap(), 512).unwrap();
    assert_eq!(scan.next().unwrap().unwrap(), "line 4999");
    assert_eq!(scan.next().unwrap().unwrap(), "line 4998");
    let rest: Vec<String> = scan.map(|l| l.unwrap()).collect();
    assert_eq!(rest.len(), 4_998);
    assert_eq!(rest.last().unwrap(), "line 0");
}

#[test]
fn at_rscan_db_02_exhausted_scanner_stays_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log");
    fs::write(&path, "only\n").unwrap();
    let mut scan = ReverseLines::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(scan.next().unwrap().unwrap(), "only");
    assert!(scan.next().is_none());
    assert!(scan.next().is_none());
}
