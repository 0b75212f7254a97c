mod common;

use std::fs;

use astromosaic::astromosaic_errors::AstroMosaicError;
use astromosaic::fits_header::{
    fits_files_in, move_by_resolution, read_header_file, summarize, FitsValue,
};
use camino::Utf8Path;

use common::fits_bytes;

fn image(naxis1: &str, naxis2: &str, filter: &str) -> Vec<u8> {
    fits_bytes(&[
        ("SIMPLE", "T"),
        ("BITPIX", "16"),
        ("NAXIS", "2"),
        ("NAXIS1", naxis1),
        ("NAXIS2", naxis2),
        ("TELESCOP", "'Slooh.com T3 Canary Islands'"),
        ("FILTER", filter),
    ])
}

#[test]
fn test_sort_images_by_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    fs::write(root.join("a.fit"), image("4656", "3520", "'Red'")).unwrap();
    fs::write(root.join("b.fit"), image("1024", "1024", "'Blue'")).unwrap();
    fs::write(root.join("c.fit"), image("4656", "3520", "'Green'")).unwrap();

    let files = fits_files_in(root).unwrap();
    assert_eq!(files.len(), 3);

    let summary = summarize(&files[1]).unwrap();
    assert_eq!((summary.naxis1, summary.naxis2), (1024, 1024));
    assert_eq!(summary.telescope_id, "T3");
    assert_eq!(summary.filter, "Blue");

    for file in &files {
        move_by_resolution(file).unwrap();
    }
    assert_eq!(fits_files_in(&root.join("4656x3520")).unwrap().len(), 2);
    assert_eq!(fits_files_in(&root.join("1024x1024")).unwrap().len(), 1);
    assert!(fits_files_in(root).unwrap().is_empty());
}

#[test]
fn test_header_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8Path::from_path(dir.path()).unwrap().join("img.fit");
    fs::write(&path, image("800", "600", "'L' / luminance")).unwrap();

    let header = read_header_file(&path).unwrap();
    assert_eq!(header.get("FILTER"), Some(&FitsValue::String("L".into())));
    let lines = header.lines();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[4], "NAXIS2=600");
}

#[test]
fn test_not_a_fits_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8Path::from_path(dir.path()).unwrap().join("bad.fit");
    fs::write(&path, vec![b'x'; 2880]).unwrap();
    assert!(matches!(
        read_header_file(&path),
        Err(AstroMosaicError::FitsError(_))
    ));

    let missing = Utf8Path::from_path(dir.path()).unwrap().join("missing.fit");
    assert!(matches!(
        read_header_file(&missing),
        Err(AstroMosaicError::IoError(_))
    ));
}
