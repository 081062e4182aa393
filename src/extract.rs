//! Document text extraction / 文档文本提取
//!
//! Supported formats / 支持格式：
//! - Plain text (`txt`, `md`, `csv`, anything unrecognised): UTF-8, BOM-marked encodings, GB18030 fallback
//! - Word (`docx`): paragraphs of `word/document.xml`
//! - PowerPoint (`pptx`): paragraphs of every slide, in slide order
//! - Spreadsheets (`xls`, `xlsx`, `xlsm`, `ods`): first sheet as CSV rows
//! - PDF: text of every page

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use calamine::{open_workbook_auto, Reader as _};
use csv::WriterBuilder;
use encoding_rs::{Encoding, GB18030};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{FiberError, Result};

/// Document format, chosen by file extension / 文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Word,
    Presentation,
    Spreadsheet,
    Pdf,
}

impl DocumentKind {
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => DocumentKind::Word,
            "pptx" => DocumentKind::Presentation,
            "xls" | "xlsx" | "xlsm" | "ods" => DocumentKind::Spreadsheet,
            "pdf" => DocumentKind::Pdf,
            _ => DocumentKind::PlainText,
        }
    }
}

/// Extract the text of a document, one paragraph or row per line / 提取文档文本
pub fn extract_text(path: &Path) -> Result<String> {
    match DocumentKind::of(path) {
        DocumentKind::PlainText => Ok(decode_text(&std::fs::read(path)?)),
        DocumentKind::Word => {
            let mut archive = open_zip(path)?;
            let xml = read_zip_entry(&mut archive, "word/document.xml")?;
            Ok(ooxml_paragraphs(&xml)?.join("\n"))
        }
        DocumentKind::Presentation => presentation_text(path),
        DocumentKind::Spreadsheet => spreadsheet_text(path),
        DocumentKind::Pdf => pdf_text(path),
    }
}

/// Decode file bytes / 解码文件内容
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // Most non-UTF-8 text in this corpus is Chinese; GB18030 is a superset of GBK
        Err(_) => {
            let (decoded, _) = GB18030.decode_without_bom_handling(bytes);
            decoded.into_owned()
        }
    }
}

fn open_zip(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

fn read_zip_entry(archive: &mut ZipArchive<BufReader<File>>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Paragraph texts of a WordprocessingML or DrawingML part / 提取段落文本
///
/// Matches on local names, so `w:p`/`w:t` (Word) and `a:p`/`a:t` (slides)
/// are handled alike. Nested paragraphs (text boxes) come out separately.
fn ooxml_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(open.pop()),
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(ref e) => {
                let current = open.last_mut();
                match (e.local_name().as_ref(), current) {
                    (b"p", _) => paragraphs.push(String::new()),
                    // `w:tab` also appears in paragraph properties, only runs count
                    (b"tab", Some(current)) if in_run => current.push('\t'),
                    (b"br" | b"cr", Some(current)) => current.push('\n'),
                    _ => {}
                }
            }
            Event::Text(ref e) if in_text => {
                if let Some(current) = open.last_mut() {
                    current.push_str(&e.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn presentation_text(path: &Path) -> Result<String> {
    let mut archive = open_zip(path)?;
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort();

    let mut texts = Vec::with_capacity(slides.len());
    for (_, name) in slides {
        let xml = read_zip_entry(&mut archive, &name)?;
        texts.push(ooxml_paragraphs(&xml)?.join("\n"));
    }
    Ok(texts.join("\n"))
}

/// First sheet, rendered as CSV / 第一个工作表（CSV 格式）
fn spreadsheet_text(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(String::new()),
    };

    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in range.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn pdf_text(path: &Path) -> Result<String> {
    // pdf-extract panics on some malformed files; treat that as a failed file
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(FiberError::Pdf(e.to_string())),
        Err(_) => Err(FiberError::Pdf(format!("failed to parse {:?}", path))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, parts: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::of(Path::new("a.DOCX")), DocumentKind::Word);
        assert_eq!(DocumentKind::of(Path::new("a.pptx")), DocumentKind::Presentation);
        assert_eq!(DocumentKind::of(Path::new("a.xls")), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::of(Path::new("a.pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::of(Path::new("a.md")), DocumentKind::PlainText);
        assert_eq!(DocumentKind::of(Path::new("noext")), DocumentKind::PlainText);
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text("plain".as_bytes()), "plain");
        assert_eq!(decode_text(b"\xef\xbb\xbfbom"), "bom");
        let (gbk, _, _) = encoding_rs::GBK.encode("搜索");
        assert_eq!(decode_text(&gbk), "搜索");
    }

    #[test]
    fn test_extract_docx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        write_zip(
            &path,
            &[(
                "word/document.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
      <w:r><w:t>Quarterly </w:t></w:r><w:r><w:t xml:space="preserve">report &amp; notes</w:t></w:r>
    </w:p>
    <w:p/>
    <w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t></w:r></w:p>
  </w:body>
</w:document>"#,
            )],
        );

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Quarterly report & notes\n\nName\tValue");
    }

    #[test]
    fn test_extract_pptx_in_slide_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.pptx");
        let slide = |title: &str, body: &str| {
            format!(
                r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree>
<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r><a:br/><a:r><a:t>more</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#,
                title, body
            )
        };
        let (s1, s2, s10) = (slide("Intro", "hello"), slide("Plan", "steps"), slide("End", "bye"));
        write_zip(
            &path,
            &[
                ("ppt/slides/slide10.xml", s10.as_str()),
                ("ppt/slides/slide2.xml", s2.as_str()),
                ("ppt/slides/slide1.xml", s1.as_str()),
                ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
            ],
        );

        let text = extract_text(&path).unwrap();
        assert_eq!(
            text,
            "Intro\nhello\nmore\nPlan\nsteps\nmore\nEnd\nbye\nmore"
        );
    }

    #[test]
    fn test_extract_xlsx_first_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.xlsx");
        write_zip(
            &path,
            &[
                (
                    "[Content_Types].xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#,
                ),
                (
                    "_rels/.rels",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
                ),
                (
                    "xl/workbook.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
                ),
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#,
                ),
                (
                    "xl/worksheets/sheet1.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>item</t></is></c><c r="B1" t="inlineStr"><is><t>note</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>apples</t></is></c><c r="B2" t="inlineStr"><is><t>red, sweet</t></is></c></row>
</sheetData>
</worksheet>"#,
                ),
            ],
        );

        let text = extract_text(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["item,note", "apples,\"red, sweet\""]);
    }

    /// Single-page PDF with correct xref offsets
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).into_bytes());
        }
        let xref = pdf.len();
        pdf.extend(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).into_bytes());
        for offset in offsets {
            pdf.extend(format!("{:010} 00000 n \n", offset).into_bytes());
        }
        pdf.extend(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .into_bytes(),
        );
        pdf
    }

    #[test]
    fn test_extract_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, minimal_pdf("Hello PDF")).unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("PDF"));
    }

    #[test]
    fn test_extract_broken_documents_fail() {
        let dir = TempDir::new().unwrap();
        for name in ["bad.docx", "bad.pptx", "bad.xlsx", "bad.pdf"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"not a document").unwrap();
            assert!(extract_text(&path).is_err(), "{} should fail", name);
        }
    }
}
