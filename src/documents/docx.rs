//! Paragraph text from `.docx` (Office Open XML) files.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::DocumentError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Non-blank paragraphs of the main document body, joined by `\n`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::Unreadable(format!("not a valid .docx archive ({})", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| DocumentError::Unreadable(format!("missing {} ({})", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::Unreadable(e.to_string()))?;

    Ok(paragraphs_from_xml(&xml)?.join("\n"))
}

/// Paragraph texts in the order their `<w:p>` opens. Paragraphs nested in
/// text boxes are kept separate from the paragraph that anchors them.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;
    let mut props_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"w:pPr" => props_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:pPr" => props_depth = props_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) if props_depth == 0 => {
                let mark = match e.name().as_ref() {
                    b"w:tab" => Some('\t'),
                    b"w:br" | b"w:cr" => Some('\n'),
                    _ => None,
                };
                if let (Some(mark), Some(&idx)) = (mark, open.last()) {
                    paragraphs[idx].push(mark);
                }
            }
            Ok(Event::Text(e)) if in_text => {
                if let Some(&idx) = open.last() {
                    let text = e.unescape().map_err(|err| malformed(&reader, err))?;
                    paragraphs[idx].push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(&reader, err)),
            _ => {}
        }
    }

    Ok(paragraphs
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .collect())
}

fn malformed(reader: &Reader<&[u8]>, err: quick_xml::Error) -> DocumentError {
    DocumentError::Unreadable(format!(
        "malformed {} at byte {} ({})",
        DOCUMENT_PART,
        reader.buffer_position(),
        err
    ))
}
