// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::Course;

pub const MAX_OPTIONS_PER_QUESTION: usize = 4;

/// Whether students can discover the assessment at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Draft,
    Published,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Draft => "draft",
            Visibility::Published => "published",
        }
    }
}

/// Derived run status of an assessment, computed for display and
/// filtering. Never stored: the wire carries `authorizedToStart` and
/// `endReason`, and this enum is the total derivation over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Ongoing,
    Ended,
}

impl RunState {
    /// Total over all four combinations. A set `end_reason` dominates:
    /// an ended exam that was never authorized is still Ended.
    pub fn derive(authorized_to_start: bool, end_reason: Option<&str>) -> RunState {
        match (authorized_to_start, end_reason) {
            (_, Some(_)) => RunState::Ended,
            (true, None) => RunState::Ongoing,
            (false, None) => RunState::NotStarted,
        }
    }
}

/// Kind of a section and of the questions it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    MultipleChoice,
    Subjective,
    Theory,
}

/// Stable option label shown to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// Label for the option at `index`, for building options in order.
    pub fn from_index(index: usize) -> Option<OptionLabel> {
        match index {
            0 => Some(OptionLabel::A),
            1 => Some(OptionLabel::B),
            2 => Some(OptionLabel::C),
            3 => Some(OptionLabel::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: OptionLabel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub score: i64,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub correct_answer: Option<OptionLabel>,
}

impl Question {
    /// Appends an option, assigning the next label in order.
    /// Rejects a fifth option and returns the question unchanged.
    pub fn push_option(&mut self, text: impl Into<String>) -> Result<OptionLabel, String> {
        let label = OptionLabel::from_index(self.options.len())
            .ok_or_else(|| format!("a question holds at most {} options", MAX_OPTIONS_PER_QUESTION))?;
        self.options.push(QuestionOption {
            label,
            text: text.into(),
        });
        Ok(label)
    }

    /// Whether the marked correct answer references an option that
    /// actually exists.
    pub fn correct_answer_is_valid(&self) -> bool {
        match self.correct_answer {
            None => true,
            Some(marker) => self.options.iter().any(|opt| opt.label == marker),
        }
    }

    /// A question is either fully specified or a transient draft that
    /// must not be persisted into its section. Objective questions need
    /// text, at least one option and a marked (existing) answer.
    pub fn is_complete(&self) -> bool {
        if self.question.trim().is_empty() {
            return false;
        }
        match self.kind {
            SectionKind::MultipleChoice => {
                !self.options.is_empty()
                    && self.correct_answer.is_some()
                    && self.correct_answer_is_valid()
            }
            SectionKind::Subjective | SectionKind::Theory => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Authoritative snapshot of one assessment as last received from the
/// remote API. Pure data holder: validation lives in the lifecycle
/// controller, derivation in [`RunState::derive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,

    /// Absent on every mutation response; preserved across snapshot
    /// replacement by the view layer.
    #[serde(default)]
    pub course: Option<Course>,

    #[serde(default)]
    pub total_marks: Option<i64>,
    /// Minutes the exam clock runs for.
    #[serde(default)]
    pub time_limit: Option<i64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub term: Option<String>,

    #[serde(default)]
    pub status: Visibility,
    #[serde(default)]
    pub authorized_to_start: bool,
    /// Null while the run has not ended; set exactly once, either by
    /// staff or by the system (time expired). Terminal for the run.
    #[serde(default)]
    pub end_reason: Option<String>,

    #[serde(default)]
    pub sections: Vec<Section>,
    /// Individually assigned student ids, additive to cohort targeting.
    #[serde(default)]
    pub students: Vec<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Assessment {
    pub fn run_state(&self) -> RunState {
        RunState::derive(self.authorized_to_start, self.end_reason.as_deref())
    }

    /// Total questions across all sections, as shown on list and
    /// detail cards.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_total_and_ended_dominates() {
        assert_eq!(RunState::derive(false, None), RunState::NotStarted);
        assert_eq!(RunState::derive(true, None), RunState::Ongoing);
        assert_eq!(RunState::derive(true, Some("time expired")), RunState::Ended);
        // Never authorized but ended anyway: still Ended, not NotStarted.
        assert_eq!(RunState::derive(false, Some("cancelled")), RunState::Ended);
    }

    #[test]
    fn test_question_caps_at_four_options() {
        let mut q = Question {
            question: "Pick one".to_string(),
            kind: SectionKind::MultipleChoice,
            score: 5,
            options: vec![],
            correct_answer: None,
        };

        assert_eq!(q.push_option("one").unwrap(), OptionLabel::A);
        assert_eq!(q.push_option("two").unwrap(), OptionLabel::B);
        assert_eq!(q.push_option("three").unwrap(), OptionLabel::C);
        assert_eq!(q.push_option("four").unwrap(), OptionLabel::D);
        assert!(q.push_option("five").is_err());
        assert_eq!(q.options.len(), 4);
    }

    #[test]
    fn test_question_completeness() {
        let mut q = Question {
            question: "Pick one".to_string(),
            kind: SectionKind::MultipleChoice,
            score: 5,
            options: vec![],
            correct_answer: None,
        };
        assert!(!q.is_complete(), "no options yet");

        q.push_option("first").unwrap();
        assert!(!q.is_complete(), "no correct answer marked");

        q.correct_answer = Some(OptionLabel::B);
        assert!(!q.is_complete(), "marker references a missing option");

        q.correct_answer = Some(OptionLabel::A);
        assert!(q.is_complete());

        let theory = Question {
            question: "Discuss.".to_string(),
            kind: SectionKind::Theory,
            score: 10,
            options: vec![],
            correct_answer: None,
        };
        assert!(theory.is_complete(), "theory questions need no options");
    }

    #[test]
    fn test_question_count_spans_sections() {
        let question = Question {
            question: "q".to_string(),
            kind: SectionKind::MultipleChoice,
            score: 5,
            options: vec![],
            correct_answer: None,
        };
        let assessment = Assessment {
            id: "a1".to_string(),
            title: "MID-TERM".to_string(),
            instructions: None,
            course: None,
            total_marks: Some(60),
            time_limit: Some(45),
            start_date: None,
            due_date: None,
            session: None,
            term: None,
            status: Visibility::Draft,
            authorized_to_start: false,
            end_reason: None,
            sections: vec![
                Section {
                    kind: SectionKind::MultipleChoice,
                    title: "Section A".to_string(),
                    instructions: None,
                    questions: vec![question.clone(), question.clone()],
                },
                Section {
                    kind: SectionKind::Theory,
                    title: "Section B".to_string(),
                    instructions: None,
                    questions: vec![question],
                },
            ],
            students: vec![],
            created_at: None,
        };

        assert_eq!(assessment.question_count(), 3);
    }
}
