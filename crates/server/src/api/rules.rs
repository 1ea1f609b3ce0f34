use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use spider_registry::RuleRegistry;
use tracing::debug;
use utoipa::ToSchema;

use super::AppState;
use super::envelope::{ApiError, Envelope};
use super::schemas::CreatedRule;

// ---------------------------------------------------------------------------
// Form bodies
// ---------------------------------------------------------------------------

/// Form body for creating a rule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRuleForm {
    /// Host the rule applies to.
    #[schema(example = "example.com")]
    pub host: String,
    /// Serialized rule document.
    #[schema(example = r#"{"start":"https://example.com/","links":["a.story"]}"#)]
    pub json: String,
}

/// Form body for replacing a stored rule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRuleForm {
    /// Decimal rule id.
    #[schema(example = "42")]
    pub id: String,
    /// Host the rule applies to.
    #[schema(example = "example.com")]
    pub host: String,
    /// Serialized rule document.
    pub json: String,
}

/// Form body for a test run.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestRuleForm {
    /// Serialized rule document.
    pub json: String,
    /// Optional start URL overriding the document's own `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

/// Form body carrying only a rule document.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleDocumentForm {
    /// Serialized rule document.
    pub json: String,
}

fn form_body<T>(form: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    form.map(|Form(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Parse a rule id made of decimal digits only.
fn parse_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn path_id(raw: &str) -> Result<u64, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::not_found(format!("no such rule path: {raw}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /spider/rule/all` -- list every stored rule.
#[utoipa::path(
    get,
    path = "/spider/rule/all",
    tag = "Rules",
    summary = "List rules",
    description = "Returns every stored rule ordered by host, then id. `Response` is an array of rule records.",
    responses(
        (status = 200, description = "Envelope whose Response is Vec<RuleRecordSchema>", body = Envelope),
        (status = 500, description = "Store unavailable or a stored rule is corrupt", body = Envelope)
    )
)]
pub async fn list_rules(State(state): State<AppState>) -> Result<Envelope, ApiError> {
    let records = state.registry.list().await?;
    debug!(count = records.len(), "listed rules");
    Envelope::success(&records)
}

/// `GET /spider/rule/{id}` -- fetch one rule.
#[utoipa::path(
    get,
    path = "/spider/rule/{id}",
    tag = "Rules",
    summary = "Get rule",
    params(("id" = u64, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Envelope whose Response is a RuleRecordSchema", body = Envelope),
        (status = 404, description = "No rule with that id", body = Envelope),
        (status = 500, description = "Store unavailable or the stored rule is corrupt", body = Envelope)
    )
)]
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let id = path_id(&id)?;
    let record = state.registry.get(id).await?;
    Envelope::success(&record)
}

/// `GET /spider/rule/delete/{id}` -- delete a rule. Unknown ids succeed.
#[utoipa::path(
    get,
    path = "/spider/rule/delete/{id}",
    tag = "Rules",
    summary = "Delete rule",
    params(("id" = u64, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Rule deleted or already absent", body = Envelope),
        (status = 500, description = "Store unavailable", body = Envelope)
    )
)]
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let id = path_id(&id)?;
    state.registry.delete(id).await?;
    Ok(Envelope::empty())
}

/// `POST /spider/rule/create` -- store a new rule.
#[utoipa::path(
    post,
    path = "/spider/rule/create",
    tag = "Rules",
    summary = "Create rule",
    request_body(content = CreateRuleForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Envelope whose Response is a CreatedRule", body = Envelope),
        (status = 400, description = "Malformed form or rule document", body = Envelope),
        (status = 500, description = "Store unavailable", body = Envelope)
    )
)]
pub async fn create_rule(
    State(state): State<AppState>,
    form: Result<Form<CreateRuleForm>, FormRejection>,
) -> Result<Envelope, ApiError> {
    let form = form_body(form)?;
    let id = state
        .registry
        .create(&form.host, form.json.as_bytes())
        .await?;
    Envelope::success(&CreatedRule { id })
}

/// `POST /spider/rule/update` -- overwrite a stored rule.
#[utoipa::path(
    post,
    path = "/spider/rule/update",
    tag = "Rules",
    summary = "Update rule",
    description = "Replaces the host and document of the rule with the given id. An id that matches no rule is still reported as success, with `Matched: false`.",
    request_body(content = UpdateRuleForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Envelope whose Response is an UpdateOutcomeSchema", body = Envelope),
        (status = 400, description = "Malformed form, id, or rule document", body = Envelope),
        (status = 500, description = "Store unavailable", body = Envelope)
    )
)]
pub async fn update_rule(
    State(state): State<AppState>,
    form: Result<Form<UpdateRuleForm>, FormRejection>,
) -> Result<Envelope, ApiError> {
    let form = form_body(form)?;
    let id = parse_id(form.id.trim())
        .ok_or_else(|| ApiError::bad_request(format!("invalid rule id: {:?}", form.id)))?;
    let outcome = state
        .registry
        .update(id, &form.host, form.json.as_bytes())
        .await?;
    Envelope::success(&outcome)
}

/// `POST /spider/rule/test` -- preview the links a rule extracts from its
/// start page. Nothing is stored.
#[utoipa::path(
    post,
    path = "/spider/rule/test",
    tag = "Rules",
    summary = "Test rule",
    description = "Fetches the rule's start page once and returns the extracted links as `Response`.",
    request_body(content = TestRuleForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Envelope whose Response is an array of URLs", body = Envelope),
        (status = 400, description = "Malformed form, rule document, or start URL", body = Envelope),
        (status = 422, description = "The rule failed while extracting links", body = Envelope),
        (status = 502, description = "The start page could not be fetched", body = Envelope)
    )
)]
pub async fn test_rule(
    State(state): State<AppState>,
    form: Result<Form<TestRuleForm>, FormRejection>,
) -> Result<Envelope, ApiError> {
    let form = form_body(form)?;
    let links = state
        .runner
        .run_test(form.json.as_bytes(), form.start.as_deref())
        .await?;
    Envelope::success(&links)
}

/// `POST /spider/rule/validate` -- check a rule document without storing it.
///
/// The verdict travels in the envelope: an invalid document still answers
/// 200, with `Success: false` and the diagnostic in `Error`.
#[utoipa::path(
    post,
    path = "/spider/rule/validate",
    tag = "Rules",
    summary = "Validate rule",
    request_body(content = RuleDocumentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Validation verdict; Response is the decoded rule when valid", body = Envelope),
        (status = 400, description = "Malformed form", body = Envelope)
    )
)]
pub async fn validate_rule(
    form: Result<Form<RuleDocumentForm>, FormRejection>,
) -> Result<Envelope, ApiError> {
    let form = form_body(form)?;
    match RuleRegistry::validate(form.json.as_bytes()) {
        Ok(rule) => Envelope::success(&rule),
        Err(e) => {
            debug!(error = %e, "rule failed validation");
            Ok(Envelope::failure(e.to_string()))
        }
    }
}
