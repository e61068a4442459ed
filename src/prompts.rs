pub const CHART_SYSTEM: &str = include_str!("../data/prompts/chart_system.txt");
pub const CHART_USER: &str = include_str!("../data/prompts/chart_user.txt");
pub const SUMMARY_SYSTEM: &str = include_str!("../data/prompts/summary_system.txt");
pub const SUMMARY_USER: &str = include_str!("../data/prompts/summary_user.txt");
pub const MIND_MAP_SYSTEM: &str = include_str!("../data/prompts/mind_map_system.txt");
pub const MIND_MAP_USER: &str = include_str!("../data/prompts/mind_map_user.txt");
pub const QUESTIONS_SYSTEM: &str = include_str!("../data/prompts/questions_system.txt");
pub const QUESTIONS_USER: &str = include_str!("../data/prompts/questions_user.txt");
pub const QUESTIONS_FIXED: &str = include_str!("../data/prompts/questions_fixed.txt");
pub const QUESTIONS_INTERACTIVE: &str =
    include_str!("../data/prompts/questions_interactive.txt");
pub const PRESENTATION_SYSTEM: &str = include_str!("../data/prompts/presentation_system.txt");
pub const PRESENTATION_USER: &str = include_str!("../data/prompts/presentation_user.txt");
pub const EXTRACT_TEXT: &str = include_str!("../data/prompts/extract_text.txt");
pub const TRANSCRIBE: &str = include_str!("../data/prompts/transcribe.txt");
pub const TRANSCRIPT_SUMMARY_SYSTEM: &str =
    include_str!("../data/prompts/transcript_summary_system.txt");
pub const TRANSCRIPT_SUMMARY_USER: &str =
    include_str!("../data/prompts/transcript_summary_user.txt");
pub const VIDEO_FROM_TEXT: &str = include_str!("../data/prompts/video_from_text.txt");
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.trim_end().to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Language clause for speech prompts: an explicit target language, or the
/// language of the recording itself.
pub fn language_clause(language: Option<&str>) -> String {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(language) => format!("in {}", language),
        None => "in the same language as the recording".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[&str] = &[
        CHART_SYSTEM,
        CHART_USER,
        SUMMARY_SYSTEM,
        SUMMARY_USER,
        MIND_MAP_SYSTEM,
        MIND_MAP_USER,
        QUESTIONS_SYSTEM,
        QUESTIONS_USER,
        QUESTIONS_FIXED,
        QUESTIONS_INTERACTIVE,
        PRESENTATION_SYSTEM,
        PRESENTATION_USER,
        EXTRACT_TEXT,
        TRANSCRIBE,
        TRANSCRIPT_SUMMARY_SYSTEM,
        TRANSCRIPT_SUMMARY_USER,
        VIDEO_FROM_TEXT,
        CHAT_SYSTEM,
    ];

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_render_trims_trailing_newline() {
        assert_eq!(render("line\n", &[]), "line");
    }

    #[test]
    fn test_prompts_are_non_empty() {
        for prompt in ALL {
            assert!(!prompt.trim().is_empty());
        }
    }

    #[test]
    fn test_document_prompts_mirror_source_language() {
        for prompt in [
            CHART_USER,
            SUMMARY_USER,
            MIND_MAP_USER,
            QUESTIONS_USER,
            PRESENTATION_USER,
            EXTRACT_TEXT,
        ] {
            assert!(prompt.contains("same language"), "{}", prompt);
        }
    }

    #[test]
    fn test_question_prompt_has_placeholders() {
        assert!(QUESTIONS_USER.contains("{{count}}"));
        assert!(QUESTIONS_USER.contains("{{difficulty}}"));
        assert!(QUESTIONS_USER.contains("{{style}}"));
        assert!(QUESTIONS_FIXED.contains("A, B, C, D"));
    }

    #[test]
    fn test_video_from_text_has_placeholders() {
        let rendered = render(VIDEO_FROM_TEXT, &[("prompt", "show a sunrise"), ("text", "dawn")]);
        assert_eq!(
            rendered,
            "Based on the following text, show a sunrise\n\nText: \"\"\"dawn\"\"\""
        );
    }

    #[test]
    fn test_language_clause() {
        assert_eq!(language_clause(Some("Arabic")), "in Arabic");
        assert_eq!(
            language_clause(Some("  ")),
            "in the same language as the recording"
        );
        assert_eq!(language_clause(None), "in the same language as the recording");
    }
}
