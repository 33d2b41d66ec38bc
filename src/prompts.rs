pub const ANALYZE: &str = include_str!("../data/prompts/analyze.txt");
pub const AUTOMATE: &str = include_str!("../data/prompts/automate.txt");

/// Text-only prompt used to check whether a model answers at all.
pub const PROBE: &str = "test";

/// Instruction text with surrounding whitespace removed.
pub fn instruction(template: &str) -> &str {
    template.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!instruction(ANALYZE).is_empty());
        assert!(!instruction(AUTOMATE).is_empty());
    }

    #[test]
    fn test_automate_names_required_collections() {
        assert!(AUTOMATE.contains("\"celebrityItems\""));
        assert!(AUTOMATE.contains("\"budgetItems\""));
    }

    #[test]
    fn test_instruction_trims_trailing_newline() {
        assert!(!instruction(ANALYZE).ends_with('\n'));
    }
}
