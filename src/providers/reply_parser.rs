use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?s)<think>.*?</think>").expect("valid regex");
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex");
}

/// Remove `<think>...</think>` reasoning blocks so only the final answer remains.
pub fn strip_reasoning(content: &str) -> String {
    THINK_BLOCK.replace_all(content, "").trim().to_string()
}

/// Body of the first fenced code block, if the text contains one.
pub fn fenced_block(content: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(content)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reasoning() {
        let content = r#"<think>
Uber is 300, Ola is 300 but faster, Rapido is cheapest.
</think>
Rapido"#;

        assert_eq!(strip_reasoning(content), "Rapido");
        assert_eq!(strip_reasoning("  Ola \n"), "Ola");
    }

    #[test]
    fn test_fenced_block() {
        let content = "Here you go:\n```json\n[{\"service\":\"Mini\",\"price\":200,\"eta\":7}]\n```";
        assert_eq!(
            fenced_block(content),
            Some(r#"[{"service":"Mini","price":200,"eta":7}]"#)
        );
        assert_eq!(fenced_block("[1, 2]"), None);
    }
}
