#![allow(clippy::needless_for_each)]

use super::envelope::Envelope;
use super::rules::{CreateRuleForm, RuleDocumentForm, TestRuleForm, UpdateRuleForm};
use super::schemas::{CreatedRule, HealthResponse, RuleRecordSchema, UpdateOutcomeSchema};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Spider Rule Admin API",
        version = "0.1.0",
        description = "HTTP API for managing crawl rules: store, validate, and preview link extraction against live pages.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Rules", description = "Crawl rule management and test runs")
    ),
    paths(
        super::health::health,
        super::rules::list_rules,
        super::rules::get_rule,
        super::rules::delete_rule,
        super::rules::create_rule,
        super::rules::update_rule,
        super::rules::test_rule,
        super::rules::validate_rule,
    ),
    components(schemas(
        Envelope,
        HealthResponse,
        CreatedRule,
        RuleRecordSchema,
        UpdateOutcomeSchema,
        CreateRuleForm,
        UpdateRuleForm,
        TestRuleForm,
        RuleDocumentForm,
    ))
)]
pub struct ApiDoc;
