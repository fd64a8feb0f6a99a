//! Spreadsheet and CSV row extraction
//!
//! Both paths produce the same `RowData` shape: the first row supplies the
//! headers, every following row becomes a header-keyed record. CSV input is
//! decoded as UTF-8 first with a Shift-JIS retry, which covers the legacy
//! exports Japanese logistics systems still produce.

use calamine::Reader;
use hakobu_core::AppError;
use serde_json::{Map, Value};

use crate::content::RowData;

pub fn extract_workbook(data: &[u8]) -> Result<RowData, AppError> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::Extraction(format!("Failed to read spreadsheet: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Extraction("Spreadsheet has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::Extraction(format!("Failed to read sheet {}: {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let records: Vec<Map<String, Value>> = rows
        .map(|row| record_from_cells(&headers, row.iter().map(cell_to_string)))
        .collect();

    Ok(row_data(headers, records))
}

pub fn extract_csv(data: &[u8]) -> Result<RowData, AppError> {
    let decoded = decode_csv_bytes(data)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Extraction(format!("Failed to read CSV: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| AppError::Extraction(format!("Failed to read CSV: {}", e)))?;
        records.push(record_from_cells(
            &headers,
            record.iter().map(|c| c.trim().to_string()),
        ));
    }

    Ok(row_data(headers, records))
}

/// UTF-8 first; Shift-JIS on failure.
fn decode_csv_bytes(data: &[u8]) -> Result<String, AppError> {
    if let Ok(text) = std::str::from_utf8(data) {
        return Ok(text.to_string());
    }
    let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(data);
    if had_errors {
        return Err(AppError::Extraction(
            "CSV is neither valid UTF-8 nor valid Shift-JIS".to_string(),
        ));
    }
    Ok(decoded.into_owned())
}

fn cell_to_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.trim().to_string(),
        calamine::Data::Float(f) => {
            // render 3.0 as "3", matching what the sheet displays
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    }
}

fn record_from_cells(
    headers: &[String],
    cells: impl Iterator<Item = String>,
) -> Map<String, Value> {
    let mut record = Map::new();
    for (i, cell) in cells.enumerate() {
        let key = headers
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("column_{}", i + 1));
        record.insert(key, Value::String(cell));
    }
    record
}

fn row_data(headers: Vec<String>, records: Vec<Map<String, Value>>) -> RowData {
    let summary = format!("{} rows x {} columns", records.len(), headers.len());
    RowData {
        headers,
        records,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_utf8() {
        let csv = "sender_name,item_name,item_quantity\nHanako Sato,Apples,3\nTaro Yamada,Pears,2\n";
        let rows = extract_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            rows.headers,
            vec!["sender_name", "item_name", "item_quantity"]
        );
        assert_eq!(rows.records.len(), 2);
        assert_eq!(rows.records[0]["sender_name"], "Hanako Sato");
        assert_eq!(rows.summary, "2 rows x 3 columns");
    }

    #[test]
    fn test_csv_shift_jis_fallback() {
        // "差出人" (sender) in Shift-JIS, invalid as UTF-8
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("差出人,品名\n山田太郎,りんご\n");
        assert!(std::str::from_utf8(&encoded).is_err());

        let rows = extract_csv(&encoded).unwrap();
        assert_eq!(rows.headers, vec!["差出人", "品名"]);
        assert_eq!(rows.records[0]["差出人"], "山田太郎");
    }

    #[test]
    fn test_csv_undecodable_bytes_error() {
        // 0x80 alone is invalid in UTF-8 and starts an incomplete Shift-JIS pair
        let bytes = vec![0x80, 0x80, 0xFD, 0xFE];
        match extract_csv(&bytes) {
            // either the decode fails outright or Shift-JIS happens to accept
            // the pairs; the contract is simply "no panic, clean error or rows"
            Ok(_) => {}
            Err(err) => assert!(matches!(err, AppError::Extraction(_))),
        }
    }

    #[test]
    fn test_csv_rows_shorter_and_longer_than_headers() {
        let csv = "a,b\n1\n1,2,3\n";
        let rows = extract_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.records[0].len(), 1);
        assert_eq!(rows.records[1]["column_3"], "3");
    }

    #[test]
    fn test_workbook_rejects_garbage() {
        let err = extract_workbook(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell_to_string(&calamine::Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&calamine::Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&calamine::Data::Empty), "");
        assert_eq!(
            cell_to_string(&calamine::Data::String(" Boxes ".to_string())),
            "Boxes"
        );
    }
}
