//! # FITS header utility
//!
//! Reads the primary header of FITS images and implements the three file commands of the
//! command line tool:
//!
//! - **list**: `<file>  <NAXIS1> <NAXIS2> <telescope id> <FILTER>`, where the telescope id is
//!   characters 10..12 of `TELESCOP`,
//! - **move**: move each file into a `<NAXIS1>x<NAXIS2>` directory next to it, created on demand,
//! - **header**: dump every `KEY=value` card.
//!
//! Only the header is read: 80-byte cards grouped in 2880-byte blocks, up to the `END` card.
//! Pixel data is never touched.
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

use crate::astromosaic_errors::AstroMosaicError;

/// Size of a FITS logical record.
pub const FITS_BLOCK_SIZE: usize = 2880;
/// Size of a header card.
pub const FITS_CARD_SIZE: usize = 80;
/// Upper bound on header blocks read before giving up on finding `END`.
const MAX_HEADER_BLOCKS: usize = 1024;

/// Value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum FitsValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Text of a commentary card (`COMMENT`, `HISTORY`, blank keyword).
    Comment(String),
}

impl FitsValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FitsValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FitsValue::String(s) | FitsValue::Comment(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FitsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitsValue::String(s) | FitsValue::Comment(s) => write!(f, "{s}"),
            FitsValue::Integer(i) => write!(f, "{i}"),
            FitsValue::Float(x) => write!(f, "{x}"),
            FitsValue::Boolean(true) => write!(f, "True"),
            FitsValue::Boolean(false) => write!(f, "False"),
        }
    }
}

/// Primary header, cards in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<(String, FitsValue)>,
}

impl FitsHeader {
    /// First card with `keyword` (case-insensitive).
    pub fn get(&self, keyword: &str) -> Option<&FitsValue> {
        self.cards
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v)
    }

    pub fn cards(&self) -> &[(String, FitsValue)] {
        &self.cards
    }

    fn require_int(&self, keyword: &str) -> Result<i64, AstroMosaicError> {
        self.get(keyword)
            .and_then(FitsValue::as_i64)
            .ok_or_else(|| AstroMosaicError::FitsError(format!("missing integer keyword {keyword}")))
    }

    /// `NAXIS1` and `NAXIS2`.
    pub fn dimensions(&self) -> Result<(i64, i64), AstroMosaicError> {
        Ok((self.require_int("NAXIS1")?, self.require_int("NAXIS2")?))
    }

    /// Directory name used by the **move** command, e.g. `4656x3520`.
    pub fn resolution_dir(&self) -> Result<String, AstroMosaicError> {
        let (x, y) = self.dimensions()?;
        Ok(format!("{x}x{y}"))
    }

    /// `KEY=value` lines of the **header** command.
    pub fn lines(&self) -> Vec<String> {
        self.cards.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

fn parse_value(text: &str) -> FitsValue {
    let text = text.trim_start();

    if let Some(rest) = text.strip_prefix('\'') {
        // Quoted string, '' is an escaped quote
        let mut value = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                    continue;
                }
                break;
            }
            value.push(c);
        }
        return FitsValue::String(value.trim_end().to_string());
    }

    let value = text.split('/').next().unwrap_or("").trim();
    match value {
        "T" => FitsValue::Boolean(true),
        "F" => FitsValue::Boolean(false),
        _ => {
            if let Ok(i) = value.parse::<i64>() {
                FitsValue::Integer(i)
            } else if let Ok(x) = value.replace(['D', 'd'], "E").parse::<f64>() {
                FitsValue::Float(x)
            } else {
                FitsValue::String(value.to_string())
            }
        }
    }
}

/// Read a primary header from `reader`.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::FitsError`] if the stream does not start with `SIMPLE`, or ends
///   before the `END` card.
pub fn read_header<R: Read>(reader: &mut R) -> Result<FitsHeader, AstroMosaicError> {
    let mut header = FitsHeader::default();
    let mut block = [0u8; FITS_BLOCK_SIZE];

    for block_index in 0..MAX_HEADER_BLOCKS {
        reader.read_exact(&mut block).map_err(|e| {
            AstroMosaicError::FitsError(format!("truncated header in block {block_index}: {e}"))
        })?;

        for card in block.chunks(FITS_CARD_SIZE) {
            let card: String = card
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect();
            let keyword = card[..8].trim_end().to_string();

            if block_index == 0 && header.cards.is_empty() && keyword != "SIMPLE" {
                return Err(AstroMosaicError::FitsError(format!(
                    "not a FITS file, first keyword is '{keyword}'"
                )));
            }

            if keyword == "END" {
                return Ok(header);
            }

            let value = if &card[8..10] == "= " {
                parse_value(&card[10..])
            } else if keyword.is_empty() && card[8..].trim().is_empty() {
                continue;
            } else {
                FitsValue::Comment(card[8..].trim().to_string())
            };
            header.cards.push((keyword, value));
        }
    }

    Err(AstroMosaicError::FitsError(format!(
        "no END card in the first {MAX_HEADER_BLOCKS} blocks"
    )))
}

pub fn read_header_file(path: &Utf8Path) -> Result<FitsHeader, AstroMosaicError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_header(&mut reader).map_err(|e| match e {
        AstroMosaicError::FitsError(msg) => AstroMosaicError::FitsError(format!("{path}: {msg}")),
        other => other,
    })
}

/// One line of the **list** command.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsSummary {
    pub path: Utf8PathBuf,
    pub naxis1: i64,
    pub naxis2: i64,
    /// Characters 10..12 of `TELESCOP` (empty when absent or shorter).
    pub telescope_id: String,
    pub filter: String,
}

impl fmt::Display for FitsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} {} {} {}",
            self.path, self.naxis1, self.naxis2, self.telescope_id, self.filter
        )
    }
}

pub fn summarize(path: &Utf8Path) -> Result<FitsSummary, AstroMosaicError> {
    let header = read_header_file(path)?;
    let (naxis1, naxis2) = header.dimensions()?;
    let text = |key: &str| header.get(key).map(|v| v.to_string()).unwrap_or_default();

    Ok(FitsSummary {
        path: path.to_owned(),
        naxis1,
        naxis2,
        telescope_id: text("TELESCOP").chars().skip(10).take(2).collect(),
        filter: text("FILTER"),
    })
}

/// Move `path` into the `<NAXIS1>x<NAXIS2>` directory beside it.
///
/// Return
/// ----------
/// * The new location of the file.
pub fn move_by_resolution(path: &Utf8Path) -> Result<Utf8PathBuf, AstroMosaicError> {
    let resolution = read_header_file(path)?.resolution_dir()?;
    let file_name = path
        .file_name()
        .ok_or_else(|| AstroMosaicError::FitsError(format!("{path} is not a file")))?;
    let dir = path.parent().unwrap_or(Utf8Path::new("")).join(&resolution);

    if !dir.exists() {
        info!("mkdir {dir}");
        fs::create_dir_all(&dir)?;
    }
    let target = dir.join(file_name);
    fs::rename(path, &target)?;
    info!("move {path} to {resolution}");
    Ok(target)
}

/// `*.fit` / `*.fits` files of a directory, sorted by name.
pub fn fits_files_in(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, AstroMosaicError> {
    let mut files = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path();
        let is_fits = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("fit") || ext.eq_ignore_ascii_case("fits"));
        if is_fits && path.is_file() {
            files.push(path.to_owned());
        }
    }
    files.sort();
    debug!("{} FITS files in {dir}", files.len());
    Ok(files)
}

#[cfg(test)]
mod fits_header_test {
    use super::*;

    /// Build a header-only FITS byte stream from `(keyword, value field)` cards.
    fn header_bytes(cards: &[(&str, &str)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (key, value) in cards.iter().chain(std::iter::once(&("END", ""))) {
            let card = if value.is_empty() {
                format!("{key:<80}")
            } else {
                format!("{key:<8}= {value:<70}")
            };
            bytes.extend_from_slice(&card.as_bytes()[..FITS_CARD_SIZE]);
        }
        let padded = bytes.len().div_ceil(FITS_BLOCK_SIZE) * FITS_BLOCK_SIZE;
        bytes.resize(padded, b' ');
        bytes
    }

    fn sample() -> Vec<u8> {
        header_bytes(&[
            ("SIMPLE", "T"),
            ("BITPIX", "16 / bits per pixel"),
            ("NAXIS", "2"),
            ("NAXIS1", "4656"),
            ("NAXIS2", "3520"),
            ("TELESCOP", "'Slooh.com T2 wide field'"),
            ("FILTER", "'Luminance'"),
            ("EXPTIME", "1.2D2"),
            ("OBJECT", "'M81 ''Bode'''"),
        ])
    }

    #[test]
    fn test_read_header() {
        let header = read_header(&mut sample().as_slice()).unwrap();
        assert_eq!(header.get("SIMPLE"), Some(&FitsValue::Boolean(true)));
        assert_eq!(header.get("bitpix"), Some(&FitsValue::Integer(16)));
        assert_eq!(header.dimensions().unwrap(), (4656, 3520));
        assert_eq!(header.get("EXPTIME"), Some(&FitsValue::Float(120.0)));
        assert_eq!(
            header.get("OBJECT"),
            Some(&FitsValue::String("M81 'Bode'".into()))
        );
        assert_eq!(header.resolution_dir().unwrap(), "4656x3520");
        assert_eq!(header.lines()[3], "NAXIS1=4656");
        assert_eq!(header.lines()[0], "SIMPLE=True");
    }

    #[test]
    fn test_invalid_streams() {
        let not_fits = header_bytes(&[("BITPIX", "16")]);
        assert!(matches!(
            read_header(&mut not_fits.as_slice()),
            Err(AstroMosaicError::FitsError(_))
        ));

        let truncated = &sample()[..1000];
        assert!(matches!(
            read_header(&mut &truncated[..]),
            Err(AstroMosaicError::FitsError(_))
        ));

        let no_axes = header_bytes(&[("SIMPLE", "T"), ("NAXIS", "0")]);
        let header = read_header(&mut no_axes.as_slice()).unwrap();
        assert!(header.resolution_dir().is_err());
    }

    #[test]
    fn test_list_and_move() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let file = root.join("m81_L.fit");
        fs::write(&file, sample()).unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();

        let files = fits_files_in(root).unwrap();
        assert_eq!(files, vec![file.clone()]);

        let summary = summarize(&file).unwrap();
        assert_eq!(summary.telescope_id, "T2");
        assert_eq!(summary.filter, "Luminance");
        assert!(summary.to_string().ends_with("  4656 3520 T2 Luminance"));

        let moved = move_by_resolution(&file).unwrap();
        assert_eq!(moved, root.join("4656x3520").join("m81_L.fit"));
        assert!(moved.exists() && !file.exists());
    }
}
