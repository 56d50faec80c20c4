use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use standard_error::{Interpolate, StandardError};
use uuid::Uuid;

use crate::prelude::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
}

impl QuestionKind {
    pub fn needs_options(&self) -> bool {
        matches!(self, QuestionKind::Select | QuestionKind::Radio | QuestionKind::Checkbox)
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Text => "Short Text",
            QuestionKind::Textarea => "Long Text",
            QuestionKind::Select => "Dropdown",
            QuestionKind::Radio => "Single Choice",
            QuestionKind::Checkbox => "Multiple Choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub order: usize,
}

impl CustomQuestion {
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && (!self.kind.needs_options() || !self.options.is_empty())
    }
}

/// The question currently being typed. It is mirrored into the committed
/// list whenever it is complete enough to be asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    /// option text typed but not yet added
    #[serde(default)]
    pub pending_option: String,
}

impl Default for Draft {
    fn default() -> Self {
        Draft {
            id: Uuid::new_v4().to_string(),
            question: String::new(),
            kind: QuestionKind::Text,
            required: false,
            options: vec![],
            pending_option: String::new(),
        }
    }
}

impl Draft {
    fn all_options(&self) -> Vec<String> {
        let mut options = self.options.clone();
        let pending = self.pending_option.trim();
        if !pending.is_empty() {
            options.push(pending.to_string());
        }
        options
    }

    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && (!self.kind.needs_options() || !self.all_options().is_empty())
    }

    fn to_question(&self) -> CustomQuestion {
        CustomQuestion {
            id: self.id.clone(),
            question: self.question.trim().to_string(),
            kind: self.kind,
            required: self.required,
            options: if self.kind.needs_options() { self.all_options() } else { vec![] },
            order: 0,
        }
    }

    fn from_question(q: &CustomQuestion) -> Self {
        Draft {
            id: q.id.clone(),
            question: q.question.clone(),
            kind: q.kind,
            required: q.required,
            options: q.options.clone(),
            pending_option: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionChanges {
    pub question: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionKind>,
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BuilderAction {
    SetPrompt { text: String },
    SetKind { kind: QuestionKind },
    SetRequired { required: bool },
    TypeOption { text: String },
    CommitOption,
    RemoveDraftOption { index: usize },
    NewDraft,
    LoadDraft { id: String },
    MoveUp { id: String },
    MoveDown { id: String },
    Edit { id: String, changes: QuestionChanges },
    AddOption { id: String, option: String },
    RemoveOption { id: String, index: usize },
    Remove { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionBuilder {
    #[serde(default)]
    pub draft: Draft,
    #[serde(default)]
    pub questions: Vec<CustomQuestion>,
}

fn builder_error(reason: &str) -> StandardError {
    StandardError::new("ERR-QUESTION-001").interpolate_err(reason.to_string())
}

impl QuestionBuilder {
    pub fn new(questions: Vec<CustomQuestion>) -> Self {
        let mut builder = QuestionBuilder {
            draft: Draft::default(),
            questions,
        };
        builder.questions.sort_by_key(|q| q.order);
        builder.renumber();
        builder
    }

    pub fn apply(&mut self, action: BuilderAction) -> Result<()> {
        tracing::debug!("question builder action: {:?}", &action);
        match action {
            BuilderAction::SetPrompt { text } => {
                self.draft.question = text;
                self.sync_draft();
            }
            BuilderAction::SetKind { kind } => {
                self.draft.kind = kind;
                if !kind.needs_options() {
                    self.draft.options.clear();
                    self.draft.pending_option.clear();
                }
                self.sync_draft();
            }
            BuilderAction::SetRequired { required } => {
                self.draft.required = required;
                self.sync_draft();
            }
            BuilderAction::TypeOption { text } => {
                self.draft.pending_option = text;
                self.sync_draft();
            }
            BuilderAction::CommitOption => {
                let option = self.draft.pending_option.trim().to_string();
                if !option.is_empty() {
                    self.draft.options.push(option);
                }
                self.draft.pending_option.clear();
                self.sync_draft();
            }
            BuilderAction::RemoveDraftOption { index } => {
                if index >= self.draft.options.len() {
                    return Err(builder_error("option index out of range"));
                }
                self.draft.options.remove(index);
                self.sync_draft();
            }
            BuilderAction::NewDraft => {
                self.draft = Draft::default();
            }
            BuilderAction::LoadDraft { id } => {
                let q = self.find(&id)?;
                self.draft = Draft::from_question(&self.questions[q]);
            }
            BuilderAction::MoveUp { id } => {
                let index = self.find(&id)?;
                if index > 0 {
                    self.questions.swap(index, index - 1);
                    self.renumber();
                }
            }
            BuilderAction::MoveDown { id } => {
                let index = self.find(&id)?;
                if index + 1 < self.questions.len() {
                    self.questions.swap(index, index + 1);
                    self.renumber();
                }
            }
            BuilderAction::Edit { id, changes } => {
                let index = self.find(&id)?;
                let mut edited = self.questions[index].clone();
                if let Some(question) = changes.question {
                    edited.question = question;
                }
                if let Some(kind) = changes.kind {
                    edited.kind = kind;
                    if !kind.needs_options() {
                        edited.options.clear();
                    }
                }
                if let Some(required) = changes.required {
                    edited.required = required;
                }
                self.replace(index, edited)?;
            }
            BuilderAction::AddOption { id, option } => {
                let index = self.find(&id)?;
                let option = option.trim();
                if option.is_empty() {
                    return Ok(());
                }
                let mut edited = self.questions[index].clone();
                edited.options.push(option.to_string());
                self.replace(index, edited)?;
            }
            BuilderAction::RemoveOption { id, index: option } => {
                let index = self.find(&id)?;
                let mut edited = self.questions[index].clone();
                if option >= edited.options.len() {
                    return Err(builder_error("option index out of range"));
                }
                edited.options.remove(option);
                self.replace(index, edited)?;
            }
            BuilderAction::Remove { id } => {
                let index = self.find(&id)?;
                self.questions.remove(index);
                if self.draft.id == id {
                    self.draft = Draft::default();
                }
                self.renumber();
            }
        }
        Ok(())
    }

    fn find(&self, id: &str) -> Result<usize> {
        self.questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| builder_error("unknown question"))
    }

    fn replace(&mut self, index: usize, edited: CustomQuestion) -> Result<()> {
        if !edited.is_valid() {
            return Err(builder_error("a question needs text, and choice questions need an option"));
        }
        if self.draft.id == edited.id {
            self.draft = Draft::from_question(&edited);
        }
        self.questions[index] = edited;
        self.renumber();
        Ok(())
    }

    fn sync_draft(&mut self) {
        let existing = self.questions.iter().position(|q| q.id == self.draft.id);
        match (self.draft.is_valid(), existing) {
            (true, Some(index)) => self.questions[index] = self.draft.to_question(),
            (true, None) => self.questions.push(self.draft.to_question()),
            (false, Some(index)) => {
                self.questions.remove(index);
            }
            (false, None) => {}
        }
        self.renumber();
    }

    fn renumber(&mut self) {
        for (i, q) in self.questions.iter_mut().enumerate() {
            q.order = i;
        }
    }
}

/// Checks a question list coming back from a form and returns it ordered
/// with dense positions.
pub fn validate_questions(mut questions: Vec<CustomQuestion>) -> Result<Vec<CustomQuestion>> {
    let mut seen = HashSet::new();
    for q in questions.iter_mut() {
        q.question = q.question.trim().to_string();
        q.options = q
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if !q.kind.needs_options() {
            q.options.clear();
        }
        if !q.is_valid() {
            return Err(builder_error(&format!("question {} is incomplete", q.id)));
        }
        if !seen.insert(q.id.clone()) {
            return Err(builder_error(&format!("question {} appears twice", q.id)));
        }
    }
    questions.sort_by_key(|q| q.order);
    for (i, q) in questions.iter_mut().enumerate() {
        q.order = i;
    }
    Ok(questions)
}

fn answer_error(reason: String) -> StandardError {
    StandardError::new("ERR-APPLY-004").interpolate_err(reason)
}

/// Matches raw form answers (question id -> submitted values) against the
/// posting's questions. Multiple-choice answers are stored as arrays, all
/// others as strings; unknown ids are dropped.
pub fn validate_answers(
    questions: &[CustomQuestion],
    raw: &HashMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Value>> {
    let mut answers = BTreeMap::new();
    for q in questions {
        let values: Vec<String> = raw
            .get(&q.id)
            .map(|v| {
                v.iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if values.is_empty() {
            if q.required {
                return Err(answer_error(format!("\"{}\" is required", q.question)));
            }
            continue;
        }
        if q.kind.needs_options() {
            if let Some(bad) = values.iter().find(|v| !q.options.contains(v)) {
                return Err(answer_error(format!("\"{}\" is not an option for \"{}\"", bad, q.question)));
            }
        }
        match q.kind {
            QuestionKind::Checkbox => {
                answers.insert(q.id.clone(), Value::from(values));
            }
            _ => {
                if values.len() > 1 {
                    return Err(answer_error(format!("\"{}\" takes a single answer", q.question)));
                }
                answers.insert(q.id.clone(), Value::from(values[0].clone()));
            }
        }
    }
    Ok(answers)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn prompt(builder: &mut QuestionBuilder, text: &str) {
        builder
            .apply(BuilderAction::SetPrompt { text: text.into() })
            .unwrap();
    }

    fn committed(builder: &QuestionBuilder) -> Vec<(&str, usize)> {
        builder
            .questions
            .iter()
            .map(|q| (q.question.as_str(), q.order))
            .collect()
    }

    fn two_questions() -> QuestionBuilder {
        let mut builder = QuestionBuilder::default();
        prompt(&mut builder, "Why this role?");
        builder.apply(BuilderAction::NewDraft).unwrap();
        prompt(&mut builder, "Earliest start date?");
        builder.apply(BuilderAction::NewDraft).unwrap();
        prompt(&mut builder, "Do you drive?");
        builder.apply(BuilderAction::NewDraft).unwrap();
        builder
    }

    #[test]
    #[traced_test]
    fn test_draft_is_upserted_while_typing() {
        let mut builder = QuestionBuilder::default();
        prompt(&mut builder, "W");
        assert_eq!(committed(&builder), vec![("W", 0)]);
        prompt(&mut builder, "Why this role?  ");
        assert_eq!(committed(&builder), vec![("Why this role?", 0)]);
        prompt(&mut builder, "   ");
        assert!(builder.questions.is_empty());
    }

    #[test]
    fn test_choice_draft_needs_an_option() {
        let mut builder = QuestionBuilder::default();
        builder
            .apply(BuilderAction::SetKind { kind: QuestionKind::Radio })
            .unwrap();
        prompt(&mut builder, "Preferred shift?");
        assert!(builder.questions.is_empty());

        builder
            .apply(BuilderAction::TypeOption { text: "Morn".into() })
            .unwrap();
        assert_eq!(builder.questions.len(), 1);
        assert_eq!(builder.questions[0].options, vec!["Morn"]);

        builder
            .apply(BuilderAction::TypeOption { text: "Morning ".into() })
            .unwrap();
        builder.apply(BuilderAction::CommitOption).unwrap();
        assert_eq!(builder.draft.options, vec!["Morning"]);
        assert_eq!(builder.questions[0].options, vec!["Morning"]);

        builder
            .apply(BuilderAction::RemoveDraftOption { index: 0 })
            .unwrap();
        assert!(builder.questions.is_empty());
    }

    #[test]
    fn test_switching_to_text_drops_options() {
        let mut builder = QuestionBuilder::default();
        builder
            .apply(BuilderAction::SetKind { kind: QuestionKind::Select })
            .unwrap();
        builder
            .apply(BuilderAction::TypeOption { text: "Yes".into() })
            .unwrap();
        builder.apply(BuilderAction::CommitOption).unwrap();
        prompt(&mut builder, "Can you travel?");
        builder
            .apply(BuilderAction::SetKind { kind: QuestionKind::Textarea })
            .unwrap();
        assert!(builder.draft.options.is_empty());
        assert!(builder.questions[0].options.is_empty());
        assert_eq!(builder.questions[0].kind, QuestionKind::Textarea);
    }

    #[test]
    fn test_draft_keeps_its_position() {
        let mut builder = two_questions();
        let middle = builder.questions[1].id.clone();
        builder
            .apply(BuilderAction::LoadDraft { id: middle.clone() })
            .unwrap();
        prompt(&mut builder, "Earliest start?");
        assert_eq!(
            committed(&builder),
            vec![("Why this role?", 0), ("Earliest start?", 1), ("Do you drive?", 2)]
        );
        prompt(&mut builder, "");
        assert_eq!(committed(&builder), vec![("Why this role?", 0), ("Do you drive?", 1)]);
        prompt(&mut builder, "Earliest start?");
        assert_eq!(builder.questions[2].id, middle);
    }

    #[test]
    fn test_reorder_swaps_neighbours() {
        let mut builder = two_questions();
        let last = builder.questions[2].id.clone();
        builder.apply(BuilderAction::MoveUp { id: last.clone() }).unwrap();
        assert_eq!(
            committed(&builder),
            vec![("Why this role?", 0), ("Do you drive?", 1), ("Earliest start date?", 2)]
        );
        builder.apply(BuilderAction::MoveDown { id: last.clone() }).unwrap();
        builder.apply(BuilderAction::MoveDown { id: last }).unwrap();
        assert_eq!(
            committed(&builder),
            vec![("Why this role?", 0), ("Earliest start date?", 1), ("Do you drive?", 2)]
        );
        let first = builder.questions[0].id.clone();
        builder.apply(BuilderAction::MoveUp { id: first }).unwrap();
        assert_eq!(builder.questions[0].question, "Why this role?");
    }

    #[test]
    fn test_remove_renumbers() {
        let mut builder = two_questions();
        let first = builder.questions[0].id.clone();
        builder.apply(BuilderAction::Remove { id: first }).unwrap();
        assert_eq!(committed(&builder), vec![("Earliest start date?", 0), ("Do you drive?", 1)]);
        assert!(builder.apply(BuilderAction::Remove { id: "missing".into() }).is_err());
    }

    #[test]
    fn test_removed_draft_does_not_come_back() {
        let mut builder = QuestionBuilder::default();
        prompt(&mut builder, "Why this role?");
        let id = builder.draft.id.clone();
        builder.apply(BuilderAction::Remove { id: id.clone() }).unwrap();
        assert_ne!(builder.draft.id, id);
        builder
            .apply(BuilderAction::SetRequired { required: true })
            .unwrap();
        assert!(builder.questions.is_empty());
    }

    #[test]
    fn test_in_place_edits_keep_list_valid() {
        let mut builder = QuestionBuilder::default();
        builder
            .apply(BuilderAction::SetKind { kind: QuestionKind::Checkbox })
            .unwrap();
        builder
            .apply(BuilderAction::TypeOption { text: "Canvassing".into() })
            .unwrap();
        builder.apply(BuilderAction::CommitOption).unwrap();
        prompt(&mut builder, "Which teams?");
        builder.apply(BuilderAction::NewDraft).unwrap();
        let id = builder.questions[0].id.clone();

        builder
            .apply(BuilderAction::AddOption { id: id.clone(), option: " Phone banking ".into() })
            .unwrap();
        assert_eq!(builder.questions[0].options, vec!["Canvassing", "Phone banking"]);
        builder
            .apply(BuilderAction::RemoveOption { id: id.clone(), index: 0 })
            .unwrap();
        assert!(
            builder
                .apply(BuilderAction::RemoveOption { id: id.clone(), index: 0 })
                .is_err()
        );
        let edit = |question: &str| BuilderAction::Edit {
            id: id.clone(),
            changes: QuestionChanges {
                question: Some(question.into()),
                ..Default::default()
            },
        };
        assert!(builder.apply(edit(" ")).is_err());
        builder.apply(edit("Which teams interest you?")).unwrap();
        assert_eq!(builder.questions[0].question, "Which teams interest you?");
        assert!(builder.questions.iter().all(|q| q.is_valid()));
    }

    #[test]
    fn test_builder_wire_format() {
        let state = r#"{"draft":{"id":"d1","question":"","type":"text"},"questions":[]}"#;
        let mut builder: QuestionBuilder = serde_json::from_str(state).unwrap();
        let action: BuilderAction =
            serde_json::from_str(r#"{"action":"set_prompt","text":"Pronouns?"}"#).unwrap();
        builder.apply(action).unwrap();
        let out = serde_json::to_value(&builder).unwrap();
        assert_eq!(out["questions"][0]["id"], "d1");
        assert_eq!(out["questions"][0]["type"], "text");
        assert_eq!(out["questions"][0]["order"], 0);
    }

    #[test]
    fn test_validate_questions_orders_densely() {
        let questions = vec![
            CustomQuestion {
                id: "b".into(),
                question: " Second ".into(),
                kind: QuestionKind::Text,
                required: false,
                options: vec!["stray".into()],
                order: 7,
            },
            CustomQuestion {
                id: "a".into(),
                question: "First".into(),
                kind: QuestionKind::Select,
                required: true,
                options: vec![" Yes ".into(), "".into()],
                order: 2,
            },
        ];
        let checked = validate_questions(questions.clone()).unwrap();
        assert_eq!(checked[0].id, "a");
        assert_eq!(checked[0].options, vec!["Yes"]);
        assert_eq!(checked[1].order, 1);
        assert!(checked[1].options.is_empty());

        let mut broken = questions.clone();
        broken[1].options = vec![" ".into()];
        assert!(validate_questions(broken).is_err());
        let mut duplicated = questions;
        duplicated[1].id = "b".into();
        assert!(validate_questions(duplicated).is_err());
    }

    #[test]
    fn test_validate_answers() {
        let questions = vec![
            CustomQuestion {
                id: "why".into(),
                question: "Why?".into(),
                kind: QuestionKind::Textarea,
                required: true,
                options: vec![],
                order: 0,
            },
            CustomQuestion {
                id: "teams".into(),
                question: "Teams".into(),
                kind: QuestionKind::Checkbox,
                required: false,
                options: vec!["Field".into(), "Digital".into()],
                order: 1,
            },
            CustomQuestion {
                id: "shift".into(),
                question: "Shift".into(),
                kind: QuestionKind::Radio,
                required: false,
                options: vec!["Day".into(), "Night".into()],
                order: 2,
            },
        ];
        let mut raw = HashMap::new();
        assert!(validate_answers(&questions, &raw).is_err());

        raw.insert("why".to_string(), vec!["Because".to_string()]);
        raw.insert("teams".to_string(), vec!["Field".to_string(), "Digital".to_string()]);
        raw.insert("ignored".to_string(), vec!["x".to_string()]);
        let answers = validate_answers(&questions, &raw).unwrap();
        assert_eq!(answers["why"], Value::from("Because"));
        assert_eq!(answers["teams"], serde_json::json!(["Field", "Digital"]));
        assert!(!answers.contains_key("ignored"));
        assert!(!answers.contains_key("shift"));

        raw.insert("shift".to_string(), vec!["Day".to_string(), "Night".to_string()]);
        assert!(validate_answers(&questions, &raw).is_err());
        raw.insert("shift".to_string(), vec!["Weekend".to_string()]);
        assert!(validate_answers(&questions, &raw).is_err());
    }
}
