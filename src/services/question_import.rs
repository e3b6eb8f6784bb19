use std::sync::OnceLock;

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

use crate::db::types::{Difficulty, QuestionKind};
use crate::services::pdf_text;

/// Parse result before ids and teacher ownership are assigned. Never
/// persisted directly.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ImportedQuestion {
    pub(crate) text: String,
    #[serde(rename = "type")]
    pub(crate) kind: QuestionKind,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: i32,
    pub(crate) subject: String,
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Difficulty,
}

fn block_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\n|\A)(?:\d+\.|\bQ\d+\.?|\bQuestion\s+\d+)").unwrap()
    })
}

fn option_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(?[a-dA-D]\)").unwrap())
}

fn answer_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)answer|ans|correct").unwrap())
}

fn answer_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([a-dA-D])\b").unwrap())
}

fn marks_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[(\d+)\s*marks?\]|\((\d+)\s*marks?\)|(\d+)\s*marks?").unwrap()
    })
}

fn easy_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)easy|basic|simple").unwrap())
}

fn hard_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hard|difficult|complex|advanced").unwrap())
}

fn essay_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)explain|describe|discuss|elaborate").unwrap())
}

/// Splits flat question text into numbered blocks and parses each block with
/// an ordered rule list. Malformed blocks are skipped, never fatal.
pub(crate) fn parse_questions(text: &str, default_subject: &str) -> Vec<ImportedQuestion> {
    let mut questions = Vec::new();

    // Text before the first question marker is discarded.
    for block in block_splitter().split(text).skip(1) {
        let lines: Vec<&str> =
            block.trim().lines().map(str::trim).filter(|line| !line.is_empty()).collect();
        let Some(question_text) = lines.first() else {
            continue;
        };

        let has_options = lines.iter().any(|line| option_marker().is_match(line));

        let mut kind = QuestionKind::Short;
        let mut options: Vec<String> = Vec::new();
        let mut correct_answer = None;

        if has_options {
            kind = QuestionKind::Mcq;
            options = lines
                .iter()
                .filter(|line| option_marker().is_match(line))
                .map(|line| option_marker().replace(line, "").trim().to_string())
                .take(4)
                .collect();

            // The key can be marked with "Answer:", "Ans:", "Correct:" or a
            // star next to the option letter.
            let answer_line = lines
                .iter()
                .find(|line| answer_keyword().is_match(line) || line.contains('*'));
            if let Some(line) = answer_line {
                if let Some(capture) = answer_letter().captures(line) {
                    let letter = capture[1].to_ascii_lowercase();
                    let index = (letter.as_bytes()[0] - b'a') as usize;
                    if index < options.len() {
                        correct_answer = Some(options[index].clone());
                    }
                }
            }
        } else if question_text.len() > 200 || essay_keywords().is_match(question_text) {
            kind = QuestionKind::Essay;
        }

        let marks = marks_marker()
            .captures(block)
            .and_then(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .next()
                    .and_then(|group| group.as_str().parse::<i32>().ok())
            })
            .unwrap_or(1);

        // Hard keywords override Easy when a block mentions both.
        let mut difficulty = Difficulty::Medium;
        if easy_keywords().is_match(block) {
            difficulty = Difficulty::Easy;
        }
        if hard_keywords().is_match(block) {
            difficulty = Difficulty::Hard;
        }

        questions.push(ImportedQuestion {
            text: (*question_text).to_string(),
            kind,
            options,
            correct_answer,
            marks,
            subject: default_subject.to_string(),
            topic: None,
            difficulty,
        });
    }

    questions
}

/// Full import path for an uploaded PDF: extract text, parse, stamp the
/// optional topic on every parsed question.
pub(crate) fn import_from_pdf(
    bytes: &[u8],
    subject: &str,
    topic: Option<&str>,
) -> anyhow::Result<Vec<ImportedQuestion>> {
    let text = pdf_text::extract_text(bytes)
        .context("Failed to import questions from PDF. Please check the file format.")?;
    let mut questions = parse_questions(&text, subject);
    if let Some(topic) = topic {
        for question in &mut questions {
            question.topic = Some(topic.to_string());
        }
    }
    Ok(questions)
}

/// Teacher-facing guide for the plain-text question format the parser
/// understands.
pub(crate) fn question_template() -> &'static str {
    "\
Question Format Template:

1. What is the capital of India?
   a) Mumbai
   b) Delhi
   c) Kolkata
   d) Chennai
   Answer: b
   [2 marks]

2. Explain the process of photosynthesis.
   [5 marks]

3. Solve: 2x + 5 = 15
   [3 marks]

Guidelines:
- Number questions sequentially (1., 2., Q1, Q2, etc.)
- For MCQ: Use a), b), c), d) or (a), (b), (c), (d)
- Mark correct answer with \"Answer:\" or \"Ans:\" followed by option
- Specify marks with [X marks] or (X marks)
- Use keywords like \"Easy\", \"Medium\", \"Hard\" for difficulty
- Separate questions with blank lines
"
}
