//! Prompt golden set: exact compositions and template renderings.
//!
//! Every persona that reaches the model is checked here, so a wording change
//! in any instruction shows up as a failing case rather than drifting silently.

use medchat_llm::prompt::{self, PersonaTable};
use medchat_llm::{compose, sanitize, FixedPersona};

/// A golden composition case for a persona table.
struct GoldenCase {
    /// Human-readable name for the test case.
    name: &'static str,
    /// Which built-in table.
    table: fn() -> PersonaTable,
    /// Category from the request, if any.
    category: Option<&'static str>,
    /// User text.
    text: &'static str,
    /// Exact expected prompt.
    expected: String,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        // ---------------------------------------------------------------
        // Advisor table
        // ---------------------------------------------------------------
        GoldenCase {
            name: "medication_aspirin",
            table: PersonaTable::advisor,
            category: Some("medication"),
            text: "阿司匹林",
            expected: "你现在是一个家庭医生，你可以做一些药物和食物的判断，提供药物建议，告诉药物的使用方法和说明，并且告诉我什么药物或者食物可能会有雨这个药物有冲突。阿司匹林".to_string(),
        },
        GoldenCase {
            name: "condition_headache",
            table: PersonaTable::advisor,
            category: Some("condition"),
            text: "头疼发烧",
            expected: format!("{}头疼发烧", prompt::CONDITION_INSTRUCTION),
        },
        GoldenCase {
            name: "camera_lab_report",
            table: PersonaTable::advisor,
            category: Some("camera"),
            text: "白细胞 12.5",
            expected: format!("{}白细胞 12.5", prompt::CAMERA_INSTRUCTION),
        },
        GoldenCase {
            name: "unknown_category_passthrough",
            table: PersonaTable::advisor,
            category: Some("astrology"),
            text: "hello",
            expected: "hello".to_string(),
        },
        GoldenCase {
            name: "absent_category_passthrough",
            table: PersonaTable::advisor,
            category: None,
            text: "hello",
            expected: "hello".to_string(),
        },
        // ---------------------------------------------------------------
        // Dosage table
        // ---------------------------------------------------------------
        GoldenCase {
            name: "usage_ibuprofen",
            table: PersonaTable::dosage,
            category: Some("usage"),
            text: "布洛芬",
            expected: "你现在是一名家庭医生，这个药物的使用方式是什么（用最精简的话告诉我） 布洛芬".to_string(),
        },
        GoldenCase {
            name: "frequency_ibuprofen",
            table: PersonaTable::dosage,
            category: Some("frequency"),
            text: "布洛芬",
            expected: "你现在是一名家庭医生，请你告诉我这个药物每天使用几次并且在什么时候使用布洛芬".to_string(),
        },
        GoldenCase {
            name: "advisor_category_on_dosage_table",
            table: PersonaTable::dosage,
            category: Some("medication"),
            text: "布洛芬",
            expected: "布洛芬".to_string(),
        },
    ]
}

#[test]
fn golden_compositions_are_exact() {
    for case in golden_cases() {
        let table = (case.table)();
        let composed = compose(&table, case.category, case.text);
        assert_eq!(composed, case.expected, "Golden case '{}'", case.name);
    }
}

#[test]
fn golden_set_covers_every_builtin_category() {
    let cases = golden_cases();
    for table in [PersonaTable::advisor(), PersonaTable::dosage()] {
        for category in table.categories() {
            assert!(
                cases.iter().any(|c| c.category == Some(category)),
                "category '{category}' has no golden case"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed templates
// ---------------------------------------------------------------------------

#[test]
fn fixed_templates_embed_message_once() {
    let message = "最近总是失眠，白天没有精神";
    for persona in FixedPersona::all() {
        let rendered = persona.render(message);
        assert_eq!(
            rendered.matches(message).count(),
            1,
            "Fixed persona '{persona}' must embed the message exactly once"
        );
        assert!(!rendered.contains('{'), "Fixed persona '{persona}' left a placeholder");
    }
}

#[test]
fn fixed_template_headers() {
    assert!(FixedPersona::Condition.render("x").starts_with("你现在是一名专业的医生"));
    assert!(FixedPersona::Medicine.render("x").contains("患者问题：x"));
    assert!(FixedPersona::Psychology.render("x").contains("来访者描述：x"));
    assert!(FixedPersona::AudioSummary.render("x").contains("患者描述/医嘱内容：x"));
}

#[test]
fn typical_markdown_reply_is_cleaned() {
    let reply = "### 用药建议\n\n1. **饭后服用**\n2. 每日 *两次*\n";
    assert_eq!(sanitize(reply), "用药建议\n\n1. 饭后服用\n2. 每日 两次");
}
