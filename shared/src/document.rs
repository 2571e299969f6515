//! Brazilian document helpers (CPF, CNPJ, phone numbers)
//!
//! Formatting functions are lenient: input that does not have the expected
//! number of digits is returned unchanged. Validation goes through [`TaxId`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip everything except ASCII digits
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `12345678900` → `123.456.789-00`
pub fn format_cpf(input: &str) -> String {
    let d = digits_only(input);
    if d.len() != CPF_LEN {
        return input.to_string();
    }
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

/// `12345678000100` → `12.345.678/0001-00`
pub fn format_cnpj(input: &str) -> String {
    let d = digits_only(input);
    if d.len() != CNPJ_LEN {
        return input.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    )
}

/// Mobile `(11) 98765-4321`, landline `(11) 3456-7890`
pub fn format_phone(input: &str) -> String {
    let d = digits_only(input);
    match d.len() {
        11 => format!("({}) {}-{}", &d[0..2], &d[2..7], &d[7..11]),
        10 => format!("({}) {}-{}", &d[0..2], &d[2..6], &d[6..10]),
        _ => input.to_string(),
    }
}

fn to_digits(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn cpf_check_digit(digits: &[u32]) -> u32 {
    let start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 { 0 } else { 11 - rest }
}

/// Check-digit validation for a CPF (formatted or bare)
pub fn is_valid_cpf(input: &str) -> bool {
    let d = to_digits(&digits_only(input));
    if d.len() != CPF_LEN || all_same(&d) {
        return false;
    }
    cpf_check_digit(&d[..9]) == d[9] && cpf_check_digit(&d[..10]) == d[10]
}

/// Check-digit validation for a CNPJ (formatted or bare)
pub fn is_valid_cnpj(input: &str) -> bool {
    let d = to_digits(&digits_only(input));
    if d.len() != CNPJ_LEN || all_same(&d) {
        return false;
    }
    cnpj_check_digit(&d[..12], &CNPJ_WEIGHTS_1) == d[12]
        && cnpj_check_digit(&d[..13], &CNPJ_WEIGHTS_2) == d[13]
}

/// Kind of Brazilian tax document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxIdKind {
    Cpf,
    Cnpj,
}

/// Validated tax document, stored as bare digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let digits = digits_only(input);
        let valid = match digits.len() {
            CPF_LEN => is_valid_cpf(&digits),
            CNPJ_LEN => is_valid_cnpj(&digits),
            _ => false,
        };
        if !valid {
            return Err(
                AppError::with_message(ErrorCode::InvalidFormat, "Invalid CPF/CNPJ")
                    .with_detail("tax_id", input),
            );
        }
        Ok(TaxId(digits))
    }

    pub fn kind(&self) -> TaxIdKind {
        if self.0.len() == CPF_LEN {
            TaxIdKind::Cpf
        } else {
            TaxIdKind::Cnpj
        }
    }

    /// Bare digits, the form the gateway expects
    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn formatted(&self) -> String {
        match self.kind() {
            TaxIdKind::Cpf => format_cpf(&self.0),
            TaxIdKind::Cnpj => format_cnpj(&self.0),
        }
    }
}

impl TryFrom<String> for TaxId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaxId::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(value: TaxId) -> Self {
        value.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("12.345.678/0001-00"), "12345678000100");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_format_documents() {
        assert_eq!(format_cpf("12345678900"), "123.456.789-00");
        assert_eq!(format_cnpj("12345678000100"), "12.345.678/0001-00");
        // wrong length passes through
        assert_eq!(format_cpf("123"), "123");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("+55"), "+55");
    }

    #[test]
    fn test_cpf_validation() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
    }

    #[test]
    fn test_cnpj_validation() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-80"));
        assert!(!is_valid_cnpj("00000000000000"));
    }

    #[test]
    fn test_tax_id_parse() {
        let cnpj = TaxId::parse("11.222.333/0001-81").unwrap();
        assert_eq!(cnpj.kind(), TaxIdKind::Cnpj);
        assert_eq!(cnpj.digits(), "11222333000181");
        assert_eq!(cnpj.to_string(), "11.222.333/0001-81");

        let cpf = TaxId::parse("52998224725").unwrap();
        assert_eq!(cpf.kind(), TaxIdKind::Cpf);

        let err = TaxId::parse("11.222.333/0001-00").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_tax_id_serde() {
        let id: TaxId = serde_json::from_str("\"11.222.333/0001-81\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"11222333000181\"");
        assert!(serde_json::from_str::<TaxId>("\"123\"").is_err());
    }
}
