//! Common regex patterns for field validation and labeled extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Ten-digit national ID number.
pub const ID_NUMBER: &str = r"\d{10}";

/// Phone number: optional leading `+`, then at least eight digits, spaces or dashes.
pub const PHONE: &str = r"\+?[\d\s-]{8,}";

pub const EMAIL: &str = r"[\w.-]+@[\w.-]+\.\w+";

/// Day-first date as printed on cards (`DD/MM/YYYY`).
pub const DATE_DMY: &str = r"\d{2}/\d{2}/\d{4}";

lazy_static! {
    // Anything `clean` strips: not a word char, whitespace, '@', '.' or '-'
    pub static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^\w\s@.\-]").unwrap();

    // Labeled "Key: value" lines found on full-page OCR output
    pub static ref LABEL_NAME: Regex = Regex::new(
        r"(?im)^\s*Name\s*:\s*(.+?)\s*$"
    ).unwrap();

    pub static ref LABEL_DATE_OF_BIRTH: Regex = Regex::new(
        r"(?i)(?:Date\s+of\s+Birth|DOB)\s*:\s*(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})"
    ).unwrap();

    pub static ref LABEL_NATIONALITY: Regex = Regex::new(
        r"(?im)Nationality\s*:\s*(.+?)\s*$"
    ).unwrap();

    pub static ref LABEL_ISSUE_DATE: Regex = Regex::new(
        r"(?i)(?:Issuing\s+Date|Issue\s+Date)\s*:\s*(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})"
    ).unwrap();

    pub static ref LABEL_EXPIRY_DATE: Regex = Regex::new(
        r"(?i)(?:Expiry\s+Date|Exp\s+Date)\s*:\s*(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})"
    ).unwrap();

    pub static ref LABEL_ID_NUMBER: Regex = Regex::new(
        r"(?i)(?:ID\s+Number|ID\s+No\.?)\s*:\s*(\w+)"
    ).unwrap();

    pub static ref LABEL_LICENSE_NUMBER: Regex = Regex::new(
        r"(?i)(?:License\s+No\.?|License\s+Number)\s*:\s*(\w+)"
    ).unwrap();

    pub static ref LABEL_PHONE: Regex = Regex::new(
        r"(?i)\bPhone\s*:\s*(\+?[\d -]{7,}\d)"
    ).unwrap();

    pub static ref LABEL_EMAIL: Regex = Regex::new(
        r"(?i)\bE-?mail\s*:\s*([\w.+-]+@[\w-]+\.[\w.-]+)"
    ).unwrap();
}
