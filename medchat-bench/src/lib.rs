//! Fixtures shared by the MEDCHAT benchmarks.

/// A model reply of roughly `paragraphs` markdown paragraphs, the shape the
/// sanitizer sees in production.
#[must_use]
pub fn markdown_reply(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "### 建议 {i}\n\n**饭后服用**，每日 *两次*。如出现皮疹、头晕等不适，请立即停药并及时就医。\n"
            )
        })
        .collect()
}

/// A typical user question for the persona chat routes.
pub const QUESTION: &str = "我最近一直头疼，晚上睡不好，可以吃布洛芬吗？和降压药一起吃有没有冲突？";
