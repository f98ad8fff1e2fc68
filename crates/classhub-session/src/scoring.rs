//! Pure quiz scoring.
//!
//! Scoring is total: malformed or missing answer data counts as incorrect,
//! never as an error surfaced to the caller.

use classhub_entity::quiz::QuizQuestion;

/// Count the answers matching each question's correct option.
///
/// Missing answers (short vectors or explicit `None`) score as wrong; extra
/// answers beyond the question count are ignored.
pub fn score(questions: &[QuizQuestion], answers: &[Option<usize>]) -> usize {
    questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i).copied().flatten() == Some(q.correct_option))
        .count()
}

/// The correct option index per question, in question order.
pub fn answer_key(questions: &[QuizQuestion]) -> Vec<usize> {
    questions.iter().map(|q| q.correct_option).collect()
}

/// Pad an answer vector with `None` to the question count, dropping any
/// surplus entries, so stored responses always line up with the questions.
pub fn normalize_answers(answers: Vec<Option<usize>>, question_count: usize) -> Vec<Option<usize>> {
    let mut answers = answers;
    answers.resize(question_count, None);
    answers
}
