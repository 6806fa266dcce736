//! Text extraction for indexed files.

use regex::Regex;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Result, SearchError};

const SUPPORTED_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rs", "py", "js", "ts", "json", "yaml", "yml", "toml", "css",
    "html", "htm", "xml", "csv", "log", "ini", "cfg", "conf", "sh", "rst", "tex",
];

/// Bytes inspected when sniffing for binary data.
const SNIFF_LEN: usize = 8 * 1024;

/// Extracts searchable text from `path`.
///
/// Returns `Ok(None)` when the file simply has no text to offer (binary data,
/// legacy `.doc`, unknown types, or whitespace only). Errors are reserved for
/// files that should have had text but could not be read or decoded.
pub fn extract_text_content(path: &Path) -> Result<Option<String>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => {
            let bytes = fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| SearchError::PdfExtraction(e.to_string()))?
        }
        "docx" => extract_docx(path)?,
        _ if is_text_like(path, &extension) => {
            let bytes = fs::read(path)?;
            if looks_binary(&bytes) {
                return Ok(None);
            }
            String::from_utf8_lossy(&bytes).into_owned()
        }
        _ => return Ok(None),
    };

    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

fn is_text_like(path: &Path, extension: &str) -> bool {
    if SUPPORTED_TEXT_EXTENSIONS.contains(&extension) {
        return true;
    }
    mime_guess::from_path(path)
        .first()
        .map_or(false, |mime| mime.type_() == mime_guess::mime::TEXT)
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(SNIFF_LEN).any(|b| *b == 0)
}

fn extract_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| SearchError::Extraction {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| SearchError::Extraction {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;
    Ok(docx_xml_to_text(&xml))
}

/// Paragraph ends become blank lines so snippet extraction can split on them.
fn docx_xml_to_text(xml: &str) -> String {
    static PARAGRAPH_END: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    let paragraph_end = PARAGRAPH_END.get_or_init(|| Regex::new(r"</w:p>").unwrap());
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());

    let with_breaks = paragraph_end.replace_all(xml, "\n\n");
    let text = tag.replace_all(&with_breaks, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
