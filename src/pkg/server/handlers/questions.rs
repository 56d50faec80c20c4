use axum::{Json, http::StatusCode};
use serde::Deserialize;
use standard_error::Status;

use crate::{
    pkg::internal::questions::{BuilderAction, QuestionBuilder},
    prelude::Result,
};

#[derive(Deserialize)]
pub struct BuilderInput {
    #[serde(default)]
    pub state: QuestionBuilder,
    pub action: BuilderAction,
}

/// one step of the question builder: current state plus action in, next state out
pub async fn builder(Json(input): Json<BuilderInput>) -> Result<Json<QuestionBuilder>> {
    let mut builder = input.state;
    builder
        .apply(input.action)
        .map_err(|mut e| e.code(StatusCode::UNPROCESSABLE_ENTITY))?;
    Ok(Json(builder))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    async fn step(state: QuestionBuilder, action: serde_json::Value) -> Result<QuestionBuilder> {
        let input: BuilderInput = serde_json::from_value(json!({ "state": state, "action": action })).unwrap();
        builder(Json(input)).await.map(|Json(next)| next)
    }

    #[tokio::test]
    #[traced_test]
    async fn test_builder_endpoint_commits_a_valid_draft() {
        let state = step(QuestionBuilder::default(), json!({"action": "set_prompt", "text": "Why us?"}))
            .await
            .unwrap();
        assert_eq!(state.questions.len(), 1);
        assert_eq!(state.questions[0].question, "Why us?");

        let state = step(state, json!({"action": "set_kind", "kind": "radio"})).await.unwrap();
        assert!(state.questions.is_empty());

        let state = step(state, json!({"action": "type_option", "text": "Yes"})).await.unwrap();
        assert_eq!(state.questions[0].options, vec!["Yes".to_string()]);
    }

    #[tokio::test]
    async fn test_builder_endpoint_reports_rejected_edits() {
        let state = step(QuestionBuilder::default(), json!({"action": "set_prompt", "text": "Why us?"}))
            .await
            .unwrap();
        let id = state.questions[0].id.clone();
        let result = step(state, json!({"action": "edit", "id": id, "changes": {"question": "  "}})).await;
        assert!(result.is_err());
    }
}
