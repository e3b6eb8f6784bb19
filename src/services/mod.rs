pub(crate) mod analytics;
pub(crate) mod grading;
pub(crate) mod pdf_text;
pub(crate) mod question_import;
pub(crate) mod ranking;
pub(crate) mod report_pdf;
pub(crate) mod reports;
pub(crate) mod test_codes;
