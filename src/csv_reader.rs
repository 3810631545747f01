use anyhow::{anyhow, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;

/// One decoded data row: header name -> cell text, exactly as synthesized.
/// Casing and typing are left alone here; the normalizer owns both.
pub type RawRow = HashMap<String, String>;

/// Decode header-named delimited text into one map per data row.
///
/// Rows shorter than the header simply omit the trailing keys; rows longer
/// than the header drop the extra cells. Field presence is validated
/// downstream against the requested schema keys.
pub fn decode_rows(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(anyhow!("delimited text has no header row"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(i) {
                row.insert(header.clone(), value.to_string());
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let rows = decode_rows("year,count\n2020,3\n2021,5\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["year"], "2020");
        assert_eq!(rows[1]["count"], "5");
    }

    #[test]
    fn test_decode_preserves_header_casing() {
        let rows = decode_rows("Date,Count\n2020-05-01,12\n").unwrap();
        assert_eq!(rows[0]["Date"], "2020-05-01");
        assert!(!rows[0].contains_key("date"));
    }

    #[test]
    fn test_decode_short_row_omits_keys() {
        let rows = decode_rows("a,b,c\n1,2\n").unwrap();
        assert_eq!(rows[0].len(), 2);
        assert!(!rows[0].contains_key("c"));
    }

    #[test]
    fn test_decode_trims_cells() {
        let rows = decode_rows("a, b\n 1 , 2 \n").unwrap();
        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode_rows("").is_err());
        let rows = decode_rows("a,b\n").unwrap();
        assert!(rows.is_empty());
    }
}
