/// Marker that ends every prompt and precedes the model's answer.
pub const ANSWER_MARKER: &str = "คำตอบ:";

/// Thai instruction templates for grounded and ungrounded questions.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub with_context: String,
    pub without_context: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            with_context: "คุณเป็น AI ที่ช่วยตอบคำถามโดยใช้ข้อมูลที่ให้มา\n\nข้อมูลอ้างอิง:\n{context}\n\nคำถาม: {question}\n\n"
                .to_string(),
            without_context: "คุณเป็น AI ผู้ช่วยตอบคำถาม\n\nคำถาม: {question}\n\n".to_string(),
        }
    }
}

impl PromptTemplate {
    /// Render the prompt. Blank context selects the ungrounded template.
    pub fn render(&self, question: &str, context: Option<&str>) -> String {
        let body = match context.filter(|c| !c.trim().is_empty()) {
            Some(ctx) => fill(&self.with_context, &[("{context}", ctx), ("{question}", question)]),
            None => fill(&self.without_context, &[("{question}", question)]),
        };
        format!("{body}{ANSWER_MARKER}")
    }
}

/// Substitute placeholders in one left-to-right pass. Inserted values are
/// never rescanned, so braces inside documents or questions stay literal.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match slots.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
