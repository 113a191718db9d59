//! The question pool matches are drawn from.

use std::collections::BTreeSet;
use std::path::Path;

use rand::Rng;
use tracing::debug;

use quizarena_shared::questions::{select_questions, Question};
use quizarena_shared::types::GameMode;

use crate::error::{ClientError, Result};

const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

/// Questions asked per match in each mode.
pub fn questions_per_match(mode: GameMode) -> usize {
    match mode {
        GameMode::Classic => 30,
        GameMode::Duel => 15,
        GameMode::Teams => 20,
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// The pool shipped with the client.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_QUESTIONS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)
            .map_err(|e| ClientError::Validation(format!("Malformed question data: {e}")))?;
        Self::new(questions)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let bank = Self::from_json(&json)?;
        debug!(path = %path.display(), count = bank.len(), "question bank loaded");
        Ok(bank)
    }

    /// Every question needs at least three options so fifty-fifty can hide
    /// two wrong ones, and a correct index inside the option list.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if let Some(bad) = questions
            .iter()
            .find(|q| q.options.len() < 3 || q.correct_index >= q.options.len())
        {
            return Err(ClientError::Validation(format!(
                "Question {} has an invalid option list",
                bad.id
            )));
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn categories(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Draw the questions for one match. Smaller pools yield every matching
    /// question; an empty draw is an error.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        mode: GameMode,
        category: Option<&str>,
        rng: &mut R,
    ) -> Result<Vec<Question>> {
        let picked = select_questions(&self.questions, questions_per_match(mode), category, rng);
        if picked.is_empty() {
            return Err(ClientError::Validation(match category {
                Some(c) => format!("No questions in category {c}"),
                None => "The question bank is empty".to_string(),
            }));
        }
        Ok(picked)
    }
}
