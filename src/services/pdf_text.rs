use anyhow::Context;
use lopdf::Document;

/// Extracts the plain text of every page, concatenated in page order with a
/// newline between pages. The question parser works on this flat text.
pub(crate) fn extract_text(bytes: &[u8]) -> anyhow::Result<String> {
    let doc = Document::load_mem(bytes).context("failed to parse PDF document")?;

    let mut full_text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc
            .extract_text(&[*page_number])
            .with_context(|| format!("failed to extract text from page {page_number}"))?;
        full_text.push_str(&page_text);
        full_text.push('\n');
    }

    Ok(full_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_bytes() {
        assert!(extract_text(b"not a pdf at all").is_err());
    }
}
