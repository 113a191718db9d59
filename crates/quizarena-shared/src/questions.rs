//! Question model and per-match selection.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Simple,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub difficulty: Difficulty,
    pub category: String,
}

impl Question {
    /// Indices of every option except the correct one.
    pub fn wrong_indices(&self) -> Vec<usize> {
        (0..self.options.len())
            .filter(|&i| i != self.correct_index)
            .collect()
    }
}

/// Pick up to `count` questions at random. `category` of `None` draws from
/// the whole pool.
pub fn select_questions<R: Rng + ?Sized>(
    pool: &[Question],
    count: usize,
    category: Option<&str>,
    rng: &mut R,
) -> Vec<Question> {
    let mut candidates: Vec<&Question> = pool
        .iter()
        .filter(|q| category.map_or(true, |c| q.category == c))
        .collect();
    candidates.shuffle(rng);
    candidates.into_iter().take(count).cloned().collect()
}

#[cfg(test)]
pub(crate) fn sample_question(id: &str, category: &str) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {id}?"),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_index: 2,
        difficulty: Difficulty::Simple,
        category: category.to_string(),
    }
}
