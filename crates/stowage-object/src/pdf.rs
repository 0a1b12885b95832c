//! PDF text extraction.
//!
//! Extraction is an optional capability compiled in with the `pdf` feature.
//! Callers check [`is_available`] before downloading anything, so a build
//! without it reports [`Error::ExtractionUnavailable`] rather than a format
//! error.

use crate::types::{Error, ObjectRef, Result};

/// Leading bytes of every PDF document.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Whether PDF text extraction is compiled into this build.
#[inline]
pub const fn is_available() -> bool {
    cfg!(feature = "pdf")
}

/// Extracts text from a PDF document, one string per page in document order.
///
/// Fails with [`Error::UnsupportedFormat`] for non-PDF, encrypted, or corrupt
/// payloads, and with [`Error::ExtractionUnavailable`] without the `pdf`
/// feature.
///
/// `object` names the document in errors and logs.
pub fn extract(object: &ObjectRef, bytes: &[u8]) -> Result<Vec<String>> {
    if !is_available() {
        return Err(Error::extraction_unavailable(object));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(Error::unsupported_format(object, "payload is not a PDF document"));
    }
    backend::extract_pages(object, bytes)
}

/// Extracts the text of all pages joined with newlines.
pub fn extract_text(object: &ObjectRef, bytes: &[u8]) -> Result<String> {
    Ok(extract(object, bytes)?.join("\n"))
}

#[cfg(feature = "pdf")]
mod backend {
    use lopdf::Document;

    use crate::TRACING_TARGET_PDF;
    use crate::types::{Error, ObjectRef, Result};

    pub(super) fn extract_pages(object: &ObjectRef, bytes: &[u8]) -> Result<Vec<String>> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::unsupported_format(object, format!("failed to parse PDF: {e}")))?;
        if doc.is_encrypted() {
            return Err(Error::unsupported_format(object, "PDF is password protected"));
        }

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            let text = doc.extract_text(&[*page_number]).map_err(|e| {
                Error::unsupported_format(object, format!("failed to extract page {page_number}: {e}"))
            })?;
            texts.push(text);
        }

        tracing::debug!(
            target: TRACING_TARGET_PDF,
            object = %object,
            pages = texts.len(),
            "Extracted PDF text"
        );
        Ok(texts)
    }
}

#[cfg(not(feature = "pdf"))]
mod backend {
    use crate::types::{Error, ObjectRef, Result};

    pub(super) fn extract_pages(object: &ObjectRef, _bytes: &[u8]) -> Result<Vec<String>> {
        Err(Error::extraction_unavailable(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    fn object(key: &str) -> ObjectRef {
        ObjectRef::new("docs", key).unwrap()
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn unavailable_without_feature() {
        assert!(!is_available());
        let err = extract(&object("doc.pdf"), b"%PDF-1.7").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionUnavailable);
        assert!(err.to_string().contains("doc.pdf"));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn garbage_is_unsupported() {
        assert!(is_available());
        let err = extract(&object("doc.pdf"), b"plain text").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

        let err = extract(&object("doc.pdf"), b"%PDF-1.7\nnot really").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(err.to_string().contains("'docs'"));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn extracts_page_text() {
        let bytes = fixtures::hello_pdf();
        let pages = extract(&object("hello.pdf"), &bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Hello World"), "page text: {:?}", pages[0]);

        let text = extract_text(&object("hello.pdf"), &bytes).unwrap();
        assert_eq!(text.trim(), pages[0].trim());
    }
}

/// PDF documents for tests.
#[cfg(all(test, feature = "pdf"))]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// A single-page document reading "Hello World".
    pub fn hello_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello World")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}
