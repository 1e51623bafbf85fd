//! Persona instructions and prompt templates.
//!
//! Two shapes of prompt exist:
//!
//! - **Persona tables** for the multi-persona `/chat` endpoints. The request
//!   names a category; the matching instruction is prepended verbatim to the
//!   user's text. Unknown or absent categories add nothing.
//! - **Fixed templates** for single-persona endpoints, where the persona is
//!   baked into the route and the user's text fills a `{message}` slot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Advisor personas (`/chat` on the advisor service)
// ---------------------------------------------------------------------------

/// Medication and food-interaction advice.
pub const MEDICATION_INSTRUCTION: &str = "你现在是一个家庭医生，你可以做一些药物和食物的判断，提供药物建议，告诉药物的使用方法和说明，并且告诉我什么药物或者食物可能会有雨这个药物有冲突。";

/// Simple triage of a described condition.
pub const CONDITION_INSTRUCTION: &str =
    "你现在是一个家庭医生，你可以帮助用户对病情进行简单判断，提供应对措施的建议。";

/// Analysis of text recognised from a photographed label or lab report.
pub const CAMERA_INSTRUCTION: &str = "你现在是一名家庭医生，可以对用户上传的文档内容进行分析，并提供针对药物和病理的建议。如果用户上传的是药物名称或说明书，帮助解释药物用途、推荐用法、剂量和注意事项；如果用户上传的是病理分析报告或化验单，则解释关键指标，识别异常数据，并提供后续治疗建议或健康管理的建议。";

// ---------------------------------------------------------------------------
// Dosage personas (`/chat` on the dosage service)
// ---------------------------------------------------------------------------

/// How a drug is taken, in as few words as possible.
// The trailing space is part of the instruction.
pub const USAGE_INSTRUCTION: &str = "你现在是一名家庭医生，这个药物的使用方式是什么（用最精简的话告诉我） ";

/// How many times a day, and when.
pub const FREQUENCY_INSTRUCTION: &str =
    "你现在是一名家庭医生，请你告诉我这个药物每天使用几次并且在什么时候使用";

// ---------------------------------------------------------------------------
// Fixed `{message}` templates (clinic service)
// ---------------------------------------------------------------------------

pub const CONDITION_TEMPLATE: &str = "你现在是一名专业的医生，请对以下内容进行分析和建议：

1. 症状分析：请分析描述的症状
2. 可能的原因：列出可能导致这些症状的常见原因
3. 初步建议：提供可以在家尝试的缓解方法
4. 生活建议：给出日常生活中的注意事项和预防措施
5. 就医建议：说明在什么情况下需要及时就医

患者描述：{message}

请用专业、易懂的语言回答，注意平衡专业性和可理解性。";

pub const MEDICINE_TEMPLATE: &str = "作为一名专业的药剂师，请对以下用药问题进行解答：

1. 用药分析：分析患者的用药问题
2. 用药建议：提供正确的服药方法和注意事项
3. 药物相互作用：说明是否存在药物相互作用风险
4. 副作用提示：告知可能的副作用和应对方法
5. 特殊提醒：针对特殊人群（如孕妇、儿童、老年人）的用药建议

患者问题：{message}

请用专业且通俗的语言回答，确保患者能够理解。";

pub const PSYCHOLOGY_TEMPLATE: &str = "作为一名专业的心理咨询师，请提供以下帮助：

1. 情感理解：体现对来访者感受的理解和共情
2. 问题分析：对心理困扰进行专业分析
3. 建议指导：提供具体可行的调适建议
4. 资源推荐：推荐合适的心理健康资源
5. 预防建议：预防类似问题再次发生的建议

来访者描述：{message}

请用温和、专业的语言回应，注重建立信任感。";

pub const AUDIO_SUMMARY_TEMPLATE: &str = "作为一名专业的医生，请对以下医嘱内容进行分析和总结：

1. 核心诊断：提取关键的诊断信息
2. 用药建议：总结主要的用药指导
3. 生活建议：提炼重要的生活注意事项
4. 后续跟进：归纳后续就医或观察建议

患者描述/医嘱内容：{message}

请用简洁、清晰的语言总结，确保信息准确且易于理解。";

/// Health service: the evaluation report is appended after a newline.
pub const HEALTH_ANALYSIS_TEMPLATE: &str = "请提供对以下健康评估报告的分析:\n{report}";

/// Render a template by replacing `{key}` placeholders.
///
/// Placeholders with no matching var are left as-is.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

// ---------------------------------------------------------------------------
// PersonaTable
// ---------------------------------------------------------------------------

/// Immutable category → instruction mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonaTable {
    entries: BTreeMap<String, String>,
}

impl PersonaTable {
    /// Build a table from `(category, instruction)` pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The advisor table: `medication`, `condition`, `camera`.
    #[must_use]
    pub fn advisor() -> Self {
        Self::from_entries([
            ("medication", MEDICATION_INSTRUCTION),
            ("condition", CONDITION_INSTRUCTION),
            ("camera", CAMERA_INSTRUCTION),
        ])
    }

    /// The dosage table: `usage`, `frequency`.
    #[must_use]
    pub fn dosage() -> Self {
        Self::from_entries([
            ("usage", USAGE_INSTRUCTION),
            ("frequency", FREQUENCY_INSTRUCTION),
        ])
    }

    /// Return a copy with `overrides` merged over the built-in entries.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (category, instruction) in overrides {
            self.entries.insert(category.clone(), instruction.clone());
        }
        self
    }

    /// Instruction for `category`; empty for unknown or absent categories.
    #[must_use]
    pub fn instruction(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.entries.get(c))
            .map_or("", String::as_str)
    }

    /// `instruction(category) + text`. Never fails, never truncates.
    #[must_use]
    pub fn compose(&self, category: Option<&str>, text: &str) -> String {
        let instruction = self.instruction(category);
        let mut prompt = String::with_capacity(instruction.len() + text.len());
        prompt.push_str(instruction);
        prompt.push_str(text);
        prompt
    }

    /// Known categories, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compose a prompt from `table`. Same contract as [`PersonaTable::compose`].
#[must_use]
pub fn compose(table: &PersonaTable, category: Option<&str>, text: &str) -> String {
    table.compose(category, text)
}

// ---------------------------------------------------------------------------
// FixedPersona
// ---------------------------------------------------------------------------

/// A single-persona endpoint whose template takes the user's `{message}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedPersona {
    /// `/condition_chat`
    Condition,
    /// `/medicine_chat`
    Medicine,
    /// `/psychology_chat`
    Psychology,
    /// Summary step of `/audio_transcribe`.
    AudioSummary,
}

impl FixedPersona {
    /// All fixed personas.
    #[must_use]
    pub fn all() -> &'static [FixedPersona] {
        &[
            FixedPersona::Condition,
            FixedPersona::Medicine,
            FixedPersona::Psychology,
            FixedPersona::AudioSummary,
        ]
    }

    /// The raw template.
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            FixedPersona::Condition => CONDITION_TEMPLATE,
            FixedPersona::Medicine => MEDICINE_TEMPLATE,
            FixedPersona::Psychology => PSYCHOLOGY_TEMPLATE,
            FixedPersona::AudioSummary => AUDIO_SUMMARY_TEMPLATE,
        }
    }

    /// Fill the template with the user's message.
    #[must_use]
    pub fn render(self, message: &str) -> String {
        render_template(self.template(), &[("message", message)])
    }
}

impl fmt::Display for FixedPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FixedPersona::Condition => "condition",
            FixedPersona::Medicine => "medicine",
            FixedPersona::Psychology => "psychology",
            FixedPersona::AudioSummary => "audio_summary",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FixedPersona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "condition" => Ok(FixedPersona::Condition),
            "medicine" => Ok(FixedPersona::Medicine),
            "psychology" => Ok(FixedPersona::Psychology),
            "audio_summary" => Ok(FixedPersona::AudioSummary),
            other => Err(format!("unknown fixed persona: {other}")),
        }
    }
}

/// Prompt for the health service's report analysis.
#[must_use]
pub fn health_analysis_prompt(report: &str) -> String {
    render_template(HEALTH_ANALYSIS_TEMPLATE, &[("report", report)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn medication_prefix_is_exact() {
        let prompt = PersonaTable::advisor().compose(Some("medication"), "阿司匹林");
        assert_eq!(
            prompt,
            "你现在是一个家庭医生，你可以做一些药物和食物的判断，提供药物建议，告诉药物的使用方法和说明，并且告诉我什么药物或者食物可能会有雨这个药物有冲突。阿司匹林"
        );
    }

    #[test]
    fn unknown_or_absent_category_adds_nothing() {
        let table = PersonaTable::advisor();
        assert_eq!(table.compose(Some("weather"), "hello"), "hello");
        assert_eq!(table.compose(None, "hello"), "hello");
        // dosage categories are not advisor categories
        assert_eq!(table.compose(Some("usage"), "hello"), "hello");
    }

    #[test]
    fn usage_keeps_trailing_space() {
        let prompt = PersonaTable::dosage().compose(Some("usage"), "布洛芬");
        assert!(prompt.ends_with("） 布洛芬"));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert("camera".to_string(), "OCR:".to_string());
        overrides.insert("diet".to_string(), "营养师：".to_string());
        let table = PersonaTable::advisor().with_overrides(&overrides);

        assert_eq!(table.compose(Some("camera"), "x"), "OCR:x");
        assert_eq!(table.compose(Some("diet"), "x"), "营养师：x");
        assert_eq!(table.instruction(Some("condition")), CONDITION_INSTRUCTION);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn categories_are_sorted() {
        let table = PersonaTable::advisor();
        let cats: Vec<_> = table.categories().collect();
        assert_eq!(cats, vec!["camera", "condition", "medication"]);
    }

    #[test]
    fn fixed_personas_fill_message_slot() {
        for persona in FixedPersona::all() {
            let rendered = persona.render("头疼三天");
            assert!(rendered.contains("头疼三天"), "{persona}");
            assert!(!rendered.contains("{message}"), "{persona}");
        }
        assert!(FixedPersona::Medicine.render("x").starts_with("作为一名专业的药剂师"));
    }

    #[test]
    fn fixed_persona_name_round_trip() {
        for persona in FixedPersona::all() {
            let parsed: FixedPersona = persona.to_string().parse().expect("parse");
            assert_eq!(parsed, *persona);
        }
        assert!("dentist".parse::<FixedPersona>().is_err());
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render_template("{a} {b}", &[("a", "1")]), "1 {b}");
    }

    #[test]
    fn health_prompt_appends_report_after_newline() {
        assert_eq!(health_analysis_prompt("R"), "请提供对以下健康评估报告的分析:\nR");
    }

    proptest! {
        #[test]
        fn compose_is_prefix_plus_text(
            cat in prop::sample::select(vec!["medication", "condition", "camera", "nope"]),
            text in ".*",
        ) {
            let table = PersonaTable::advisor();
            let prompt = table.compose(Some(cat), &text);
            let instruction = table.instruction(Some(cat));
            prop_assert!(prompt.starts_with(instruction));
            prop_assert!(prompt.ends_with(text.as_str()));
            prop_assert_eq!(prompt.len(), instruction.len() + text.len());
        }
    }
}
