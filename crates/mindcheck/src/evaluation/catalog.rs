use super::domain::{Question, QuestionId};

/// Seeded questionnaire. Items are reference data and never change after load.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
        }
    }

    /// Build a catalog from externally loaded questions. Weights below 1 are raised to 1.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .map(|mut question| {
                question.weight = question.weight.max(1);
                question
            })
            .collect();
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn question(id: u32, text: &str, weight: u32) -> Question {
    Question {
        id: QuestionId(id),
        text: text.to_string(),
        weight,
    }
}

fn standard_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "How often have you felt sad or depressed over the last two weeks?",
            3,
        ),
        question(
            2,
            "Have you lost interest in activities you used to enjoy?",
            3,
        ),
        question(3, "Have you had trouble sleeping, or slept too much?", 2),
        question(4, "Have you felt tired or low on energy?", 2),
        question(
            5,
            "Have you had difficulty concentrating on everyday tasks?",
            2,
        ),
        question(
            6,
            "Have you felt bad about yourself or thought of yourself as a failure?",
            4,
        ),
        question(
            7,
            "Have you thought you would be better off dead, or had thoughts of hurting yourself?",
            5,
        ),
        question(8, "Have you felt nervous, anxious or on edge?", 3),
        question(
            9,
            "Do you feel unable to stop worrying, or that you worry too much?",
            3,
        ),
        question(
            10,
            "How unsupported do you feel by your friends and family?",
            2,
        ),
    ]
}
