use serde::Serialize;

use crate::db::models::{Submission, Test};
use crate::services::{ranking, reports};

const BUCKET_LABELS: [&str; 5] = ["0-20", "21-40", "41-60", "61-80", "81-100"];

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TestAnalytics {
    pub(crate) total_submissions: usize,
    pub(crate) average_score: f64,
    pub(crate) average_time_minutes: i64,
    pub(crate) score_distribution: Vec<DistributionBucket>,
    pub(crate) question_accuracy: Vec<QuestionAccuracy>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DistributionBucket {
    pub(crate) range: &'static str,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionAccuracy {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) accuracy: f64,
}

/// Aggregates across every submission of a test. Empty input yields zeroed
/// averages and buckets instead of dividing by zero.
pub(crate) fn summarize(test: &Test, submissions: &[Submission]) -> TestAnalytics {
    let total_submissions = submissions.len();

    let (average_score, average_time_minutes) = if total_submissions == 0 {
        (0.0, 0)
    } else {
        let score_sum: i64 =
            submissions.iter().map(|sub| i64::from(ranking::final_score(sub))).sum();
        let time_sum: i64 =
            submissions.iter().map(|sub| i64::from(sub.time_spent_minutes)).sum();
        let mean_score = score_sum as f64 / total_submissions as f64;
        let mean_time = time_sum as f64 / total_submissions as f64;
        ((mean_score * 100.0).round() / 100.0, mean_time.round() as i64)
    };

    let mut bucket_counts = [0usize; 5];
    for submission in submissions {
        let percentage =
            reports::percentage(ranking::final_score(submission), submission.total_marks);
        bucket_counts[bucket_index(percentage)] += 1;
    }
    let score_distribution = BUCKET_LABELS
        .iter()
        .zip(bucket_counts)
        .map(|(range, count)| DistributionBucket { range, count })
        .collect();

    let question_accuracy = test
        .questions
        .iter()
        .map(|question| {
            let accuracy = if total_submissions == 0 {
                0.0
            } else {
                let correct = submissions
                    .iter()
                    .filter(|sub| {
                        let answer =
                            sub.answers.get(&question.id).map(String::as_str).unwrap_or("");
                        reports::is_answer_correct(question, answer)
                    })
                    .count();
                let ratio = correct as f64 / total_submissions as f64 * 100.0;
                (ratio * 100.0).round() / 100.0
            };
            QuestionAccuracy {
                question_id: question.id.clone(),
                text: question.text.clone(),
                accuracy,
            }
        })
        .collect();

    TestAnalytics {
        total_submissions,
        average_score,
        average_time_minutes,
        score_distribution,
        question_accuracy,
    }
}

fn bucket_index(percentage: i32) -> usize {
    match percentage {
        p if p <= 20 => 0,
        p if p <= 40 => 1,
        p if p <= 60 => 2,
        p if p <= 80 => 3,
        _ => 4,
    }
}
