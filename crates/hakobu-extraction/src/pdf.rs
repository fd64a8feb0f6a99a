//! PDF content extraction
//!
//! Pulls per-page text and table-like line runs out of a PDF. A document
//! whose pages carry almost no text (under 50 trimmed characters in total)
//! is treated as a scan: its embedded raster images are collected instead,
//! JPEG streams passed through as-is and Flate rasters re-encoded as PNG
//! with CMYK converted to RGB. A scan with no recoverable images falls back
//! to the near-empty text result.

use std::io::Cursor;
use std::sync::OnceLock;

use base64::Engine;
use hakobu_core::AppError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use regex::Regex;

use crate::content::{ExtractedContent, ImagePayload};

/// Total trimmed text length below which a PDF counts as image-based.
const TEXT_LENGTH_THRESHOLD: usize = 50;

/// Minimum consecutive multi-cell lines that qualify as a table.
const MIN_TABLE_ROWS: usize = 2;

pub fn extract_pdf(data: &[u8]) -> Result<ExtractedContent, AppError> {
    let doc = match Document::load_mem(data) {
        Ok(doc) => doc,
        Err(err) => {
            // Some real-world PDFs defeat lopdf's parser; pdf-extract is more
            // forgiving for the text-only case.
            tracing::debug!(error = %err, "lopdf failed to load PDF, trying pdf-extract");
            let text = pdf_extract::extract_text_from_mem(data)
                .map_err(|e| AppError::Extraction(format!("Failed to read PDF: {}", e)))?;
            return Ok(text_content(text.trim().to_string(), Vec::new()));
        }
    };

    let pages = doc.get_pages();
    let mut text = String::new();
    let mut total_text_length = 0usize;
    let mut tables: Vec<(u32, Vec<Vec<Vec<String>>>)> = Vec::new();

    for (&page_no, _) in &pages {
        let page_text = doc.extract_text(&[page_no]).unwrap_or_default();
        if !page_text.trim().is_empty() {
            text.push_str(&format!("--- Page {} ---\n", page_no));
            text.push_str(page_text.trim_end());
            text.push_str("\n\n");
            total_text_length += page_text.trim().len();
        }

        let page_tables = detect_tables(&page_text);
        if !page_tables.is_empty() {
            tables.push((page_no, page_tables));
        }
    }

    if total_text_length < TEXT_LENGTH_THRESHOLD {
        let images = extract_page_images(&doc, &pages);
        if !images.is_empty() {
            return Ok(ExtractedContent::ScannedPdf {
                pages: images,
                text: text.trim().to_string(),
            });
        }
        // No text layer and no images found: last resort, the whole-document
        // extractor occasionally recovers text lopdf's does not.
        if text.trim().is_empty() {
            if let Ok(fallback) = pdf_extract::extract_text_from_mem(data) {
                if !fallback.trim().is_empty() {
                    return Ok(text_content(fallback.trim().to_string(), Vec::new()));
                }
            }
        }
    }

    Ok(text_content(text.trim().to_string(), tables))
}

fn text_content(mut text: String, tables: Vec<(u32, Vec<Vec<Vec<String>>>)>) -> ExtractedContent {
    let has_tables = !tables.is_empty();
    if has_tables {
        text.push_str("\n\n--- Extracted tables ---\n");
        for (page_no, page_tables) in &tables {
            for (table_no, table) in page_tables.iter().enumerate() {
                text.push_str(&format!("\nPage {} table {}:\n", page_no, table_no + 1));
                for row in table {
                    text.push_str(&row.join(" | "));
                    text.push('\n');
                }
            }
        }
    }
    ExtractedContent::Text { text, has_tables }
}

fn cell_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"\t| {2,}").expect("static regex"))
}

/// Table heuristic: runs of consecutive lines that split into two or more
/// cells on tabs or wide gaps. Blank cells survive as empty strings so the
/// rendered rows keep their shape.
fn detect_tables(page_text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let trimmed = line.trim_end();
        let cells: Vec<String> = cell_splitter()
            .split(trimmed)
            .map(|c| c.trim().to_string())
            .collect();
        let filled = cells.iter().filter(|c| !c.is_empty()).count();

        if cells.len() >= 2 && filled >= 2 {
            current.push(cells);
        } else {
            if current.len() >= MIN_TABLE_ROWS {
                tables.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() >= MIN_TABLE_ROWS {
        tables.push(current);
    }

    tables
}

/// Walk pages in order collecting their image XObjects.
fn extract_page_images(
    doc: &Document,
    pages: &std::collections::BTreeMap<u32, ObjectId>,
) -> Vec<ImagePayload> {
    let mut images = Vec::new();
    for (_, &page_id) in pages {
        let Some(resources) = page_resources(doc, page_id) else {
            continue;
        };
        let Ok(xobjects) = resources
            .get(b"XObject")
            .and_then(|obj| resolve(doc, obj).as_dict())
        else {
            continue;
        };
        for (_, value) in xobjects.iter() {
            if let Object::Stream(stream) = resolve(doc, value) {
                if is_image_stream(stream) {
                    if let Some(payload) = image_payload(doc, stream) {
                        images.push(payload);
                    }
                }
            }
        }
    }
    images
}

/// The page's Resources dictionary, following Pages-tree inheritance.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut dict = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..16 {
        if let Ok(res) = dict.get(b"Resources") {
            return resolve(doc, res).as_dict().ok();
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent).as_dict().ok()?;
    }
    None
}

/// Follow reference chains to the underlying object.
fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    let mut hops = 0;
    while let Ok(id) = obj.as_reference() {
        hops += 1;
        if hops > 8 {
            break;
        }
        match doc.get_object(id) {
            Ok(inner) => obj = inner,
            Err(_) => break,
        }
    }
    obj
}

fn is_image_stream(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

fn filter_name<'a>(doc: &'a Document, stream: &'a Stream) -> Option<&'a [u8]> {
    match stream.dict.get(b"Filter").ok().map(|o| resolve(doc, o))? {
        Object::Name(name) => Some(name.as_slice()),
        // For filter chains the final filter determines the stored format.
        Object::Array(filters) => match filters.last()? {
            Object::Name(name) => Some(name.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

/// Number of color components, resolved through ICCBased streams.
fn color_components(doc: &Document, dict: &Dictionary) -> Option<u32> {
    let space = resolve(doc, dict.get(b"ColorSpace").ok()?);
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" => Some(1),
            b"DeviceRGB" => Some(3),
            b"DeviceCMYK" => Some(4),
            _ => None,
        },
        Object::Array(entries) => {
            let head = entries.first()?.as_name().ok()?;
            if head != b"ICCBased" {
                return None;
            }
            let icc = resolve(doc, entries.get(1)?);
            if let Object::Stream(icc_stream) = icc {
                let n = icc_stream.dict.get(b"N").ok()?.as_i64().ok()?;
                match n {
                    1 => Some(1),
                    3 => Some(3),
                    4 => Some(4),
                    _ => None,
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Convert one embedded image stream into an attachment payload.
///
/// JPEG (DCTDecode) streams already hold a complete file and pass through.
/// Flate rasters are re-encoded as PNG; unsupported layouts yield None and
/// are skipped rather than failing the whole document.
fn image_payload(doc: &Document, stream: &Stream) -> Option<ImagePayload> {
    if filter_name(doc, stream).is_some_and(|name| name == b"DCTDecode") {
        return Some(ImagePayload {
            media_type: "image/jpeg".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&stream.content),
        });
    }

    let dict = &stream.dict;
    let width = dict.get(b"Width").ok()?.as_i64().ok()?;
    let height = dict.get(b"Height").ok()?.as_i64().ok()?;
    if width <= 0 || height <= 0 {
        return None;
    }
    let (width, height) = (width as u32, height as u32);
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }
    let components = color_components(doc, dict)?;

    let raw = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let expected = (width as usize) * (height as usize) * (components as usize);
    if raw.len() < expected {
        return None;
    }

    let rgb: Vec<u8> = match components {
        3 => raw[..expected].to_vec(),
        1 => raw[..expected].iter().flat_map(|&g| [g, g, g]).collect(),
        4 => raw[..expected]
            .chunks_exact(4)
            .flat_map(|px| cmyk_to_rgb(px[0], px[1], px[2], px[3]))
            .collect(),
        _ => return None,
    };

    let buffer = image::RgbImage::from_raw(width, height, rgb)?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .ok()?;

    Some(ImagePayload {
        media_type: "image/png".to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(&png),
    })
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let to_channel = |v: u8| ((255 - v as u32) * (255 - k as u32) / 255) as u8;
    [to_channel(c), to_channel(m), to_channel(y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// Build a single-page PDF with the given text drawn in Courier.
    fn pdf_with_text(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    /// Build a single-page PDF whose only content is an embedded JPEG XObject.
    fn pdf_with_jpeg_image(jpeg_bytes: &[u8]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes.to_vec(),
        )));
        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    #[test]
    fn test_text_pdf_classified_by_threshold() {
        let long_line = "Sender: Hanako Sato, 3-1-2 Umeda Kita-ku Osaka, phone 06-0000-0000";
        assert!(long_line.len() >= TEXT_LENGTH_THRESHOLD);
        let bytes = pdf_with_text(long_line);
        match extract_pdf(&bytes).unwrap() {
            ExtractedContent::Text { text, has_tables } => {
                assert!(text.contains("Hanako Sato"));
                assert!(text.contains("--- Page 1 ---"));
                assert!(!has_tables);
            }
            other => panic!("Expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_sparse_pdf_without_images_falls_back_to_text() {
        let bytes = pdf_with_text("stub");
        match extract_pdf(&bytes).unwrap() {
            // under the threshold and no embedded images: the scrap of text wins
            ExtractedContent::Text { text, .. } => assert!(text.contains("stub")),
            other => panic!("Expected text fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_scanned_pdf_returns_jpeg_passthrough() {
        let fake_jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let bytes = pdf_with_jpeg_image(&fake_jpeg);
        match extract_pdf(&bytes).unwrap() {
            ExtractedContent::ScannedPdf { pages, .. } => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].media_type, "image/jpeg");
                assert_eq!(
                    base64::engine::general_purpose::STANDARD
                        .decode(&pages[0].data)
                        .unwrap(),
                    fake_jpeg
                );
            }
            other => panic!("Expected scanned pdf, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_bytes_yield_extraction_error() {
        let result = extract_pdf(b"not a pdf at all");
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_detect_tables_needs_consecutive_rows() {
        let text = "Item        Qty     Price\nApples      3       450\nPears       2       300\nfooter line";
        let tables = detect_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0][1], vec!["Apples", "3", "450"]);

        // a lone multi-cell line is not a table
        assert!(detect_tables("only   one   row").is_empty());
    }

    #[test]
    fn test_table_rendering_appends_pipe_rows() {
        let tables = vec![(
            1,
            vec![vec![
                vec!["Item".to_string(), "Qty".to_string()],
                vec!["Apples".to_string(), String::new()],
            ]],
        )];
        match text_content("body".to_string(), tables) {
            ExtractedContent::Text { text, has_tables } => {
                assert!(has_tables);
                assert!(text.contains("Page 1 table 1:"));
                assert!(text.contains("Item | Qty"));
                // blank cell renders as empty string, trailing separator kept
                assert!(text.contains("Apples | "));
            }
            other => panic!("Expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_cmyk_to_rgb_extremes() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(255, 0, 0, 0), [0, 255, 255]);
    }
}
