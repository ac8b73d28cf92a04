use crate::model::{Category, Classification};

pub mod rules;

#[derive(Debug, Clone, Copy)]
pub struct PhraseRule {
    pub phrase: &'static str,
    pub category: Category,
    pub form_type: &'static str,
}

impl PhraseRule {
    pub const fn new(phrase: &'static str, category: Category, form_type: &'static str) -> Self {
        Self {
            phrase,
            category,
            form_type,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RuleStage {
    AnyOf {
        phrases: &'static [&'static str],
        category: Category,
        form_type: &'static str,
    },
    AllOf {
        phrases: &'static [&'static str],
        category: Category,
        form_type: &'static str,
    },
    FrontOrUnused {
        front: &'static [&'static str],
        unused: &'static [&'static str],
        category: Category,
        form_type: &'static str,
    },
    Detector {
        detect: fn(&str) -> bool,
        category: Category,
        form_type: &'static str,
    },
    FirstPhrase(&'static [PhraseRule]),
}

impl RuleStage {
    pub fn evaluate(&self, folded: &str) -> Option<Classification> {
        match self {
            Self::AnyOf {
                phrases,
                category,
                form_type,
            } => contains_any(folded, phrases).then(|| Classification::new(*category, form_type)),
            Self::AllOf {
                phrases,
                category,
                form_type,
            } => phrases
                .iter()
                .all(|phrase| folded.contains(phrase))
                .then(|| Classification::new(*category, form_type)),
            Self::FrontOrUnused {
                front,
                unused,
                category,
                form_type,
            } => {
                if contains_any(folded, front) {
                    Some(Classification::new(*category, form_type))
                } else if contains_any(folded, unused) {
                    Some(Classification::unused())
                } else {
                    None
                }
            }
            Self::Detector {
                detect,
                category,
                form_type,
            } => detect(folded).then(|| Classification::new(*category, form_type)),
            Self::FirstPhrase(rules) => rules
                .iter()
                .find(|rule| folded.contains(rule.phrase))
                .map(|rule| Classification::new(rule.category, rule.form_type)),
        }
    }
}

pub fn classify(text: &str) -> Classification {
    classify_with(rules::CASCADE, text)
}

pub fn classify_with(cascade: &[RuleStage], text: &str) -> Classification {
    let folded = text.to_lowercase();
    cascade
        .iter()
        .find_map(|stage| stage.evaluate(&folded))
        .unwrap_or_else(|| Classification::new(Category::Unknown, crate::model::forms::UNUSED))
}

fn contains_any(folded: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| folded.contains(phrase))
}
