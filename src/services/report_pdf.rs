use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Submission, Test};
use crate::services::{grading, ranking, reports};
use crate::services::reports::ReportData;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: f32 = 50.0;
const TOP_START: f32 = 790.0;
const BOTTOM_LIMIT: f32 = 50.0;
const LINE_GAP: f32 = 8.0;

struct Line {
    text: String,
    size: f32,
}

fn line(text: impl Into<String>, size: f32) -> Line {
    Line { text: text.into(), size }
}

fn blank(size: f32) -> Line {
    Line { text: String::new(), size }
}

/// Helvetica has no glyphs outside Latin-1; anything else is replaced so the
/// text stream stays renderable.
fn printable(text: &str) -> String {
    text.chars().map(|ch| if ch.is_ascii_graphic() || ch == ' ' { ch } else { '?' }).collect()
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut short: String = text.chars().take(max_chars).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}

/// Lays the lines out top to bottom, breaking to a fresh page whenever the
/// cursor would run past the bottom margin.
fn render_lines(lines: &[Line]) -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut operations: Vec<Operation> = Vec::new();
    let mut cursor = TOP_START;

    let flush_page =
        |doc: &mut Document, kids: &mut Vec<Object>, operations: Vec<Operation>| -> anyhow::Result<()> {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
            Ok(())
        };

    for entry in lines {
        if cursor - entry.size < BOTTOM_LIMIT {
            flush_page(&mut doc, &mut kids, std::mem::take(&mut operations))?;
            cursor = TOP_START;
        }
        cursor -= entry.size;
        if !entry.text.is_empty() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), entry.size.into()]));
            operations.push(Operation::new("Td", vec![MARGIN_LEFT.into(), cursor.into()]));
            operations
                .push(Operation::new("Tj", vec![Object::string_literal(printable(&entry.text))]));
            operations.push(Operation::new("ET", vec![]));
        }
        cursor -= LINE_GAP;
    }
    flush_page(&mut doc, &mut kids, operations)?;

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Report card PDF for one student: identity block, performance summary and a
/// per-question pass/fail list.
pub(crate) fn render_individual(report: &ReportData) -> anyhow::Result<Vec<u8>> {
    let mut lines = vec![
        line("SOSE TestHub", 24.0),
        line("Student Report Card", 14.0),
        blank(10.0),
        line("Student Information", 16.0),
        line(format!("Name: {}", report.student_name), 12.0),
        line(format!("Class: {}", report.class_name), 12.0),
        line(format!("Test: {}", report.test_title), 12.0),
        line(format!("Subject: {}", report.subject), 12.0),
    ];
    if let Some(chapter) = &report.chapter {
        lines.push(line(format!("Chapter: {chapter}"), 12.0));
    }

    lines.push(blank(10.0));
    lines.push(line("Performance Summary", 16.0));
    lines.push(line(
        format!("Marks Obtained: {}/{}", report.marks_obtained, report.total_marks),
        12.0,
    ));
    lines.push(line(format!("Percentage: {}%", report.percentage), 12.0));
    lines.push(line(format!("Grade: {}", report.grade), 12.0));
    lines.push(line(format!("Rank: {}/{}", report.rank, report.total_students), 12.0));
    lines.push(line(format!("Time Spent: {} min", report.time_spent_minutes), 12.0));

    lines.push(blank(10.0));
    lines.push(line("Question-wise Performance", 16.0));
    for (index, outcome) in report.question_wise.iter().enumerate() {
        let status = if outcome.correct { "+" } else { "x" };
        lines.push(line(
            format!(
                "{status} Q{}: {}/{}  {}",
                index + 1,
                outcome.marks_obtained,
                outcome.total_marks,
                truncated(&outcome.text, 60)
            ),
            10.0,
        ));
    }

    lines.push(blank(10.0));
    lines.push(line(format!("Generated on: {}", format_primitive(primitive_now_utc())), 10.0));
    lines.push(line(format!("Submitted on: {}", format_primitive(report.submitted_at)), 10.0));

    render_lines(&lines)
}

/// Class-level PDF: test identity, class average and the ranked student list.
pub(crate) fn render_class(test: &Test, submissions: &[Submission]) -> anyhow::Result<Vec<u8>> {
    let total_marks = grading::total_marks(&test.questions);
    let average_score = if submissions.is_empty() {
        0.0
    } else {
        let sum: i64 = submissions.iter().map(|sub| i64::from(ranking::final_score(sub))).sum();
        sum as f64 / submissions.len() as f64
    };
    let average_percentage = reports::percentage(average_score.round() as i32, total_marks);

    let mut lines = vec![
        line("SOSE TestHub - Class Report", 20.0),
        blank(8.0),
        line(format!("Test: {}", test.title), 14.0),
        line(format!("Subject: {}", test.subject), 14.0),
        line(format!("Class: {}", test.class_name), 14.0),
        line(format!("Total Students: {}", submissions.len()), 14.0),
        line(
            format!("Class Average: {average_score:.1}/{total_marks} ({average_percentage}%)"),
            14.0,
        ),
        blank(10.0),
        line("Student Performance:", 12.0),
    ];

    for (index, submission) in ranking::rank_submissions(submissions).iter().enumerate() {
        let final_score = ranking::final_score(submission);
        let percentage = reports::percentage(final_score, submission.total_marks);
        let grade = reports::grade_letter(percentage);
        lines.push(line(
            format!(
                "{}. {}: {}/{} ({}%) - {}",
                index + 1,
                submission.student_name,
                final_score,
                submission.total_marks,
                percentage,
                grade
            ),
            12.0,
        ));
    }

    render_lines(&lines)
}

fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

pub(crate) fn individual_filename(student_name: &str, test_title: &str) -> String {
    format!("{}_{}_Report.pdf", sanitize_component(student_name), sanitize_component(test_title))
}

pub(crate) fn class_filename(test_title: &str) -> String {
    format!("{}_Class_Report.pdf", sanitize_component(test_title))
}
