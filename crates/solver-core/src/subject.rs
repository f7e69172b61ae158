use serde::{Deserialize, Serialize};

/// Caller-declared subject of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectHint {
    Math,
    Physics,
    Chemistry,
    Chinese,
    English,
    Biology,
    History,
    Geography,
    Other,
}

impl SubjectHint {
    /// Parse an English or Chinese label. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        let hint = match normalized.as_str() {
            "math" | "mathematics" | "數學" => SubjectHint::Math,
            "physics" | "物理" => SubjectHint::Physics,
            "chemistry" | "化學" => SubjectHint::Chemistry,
            "chinese" | "國文" | "中文" => SubjectHint::Chinese,
            "english" | "英文" => SubjectHint::English,
            "biology" | "生物" => SubjectHint::Biology,
            "history" | "歷史" => SubjectHint::History,
            "geography" | "地理" => SubjectHint::Geography,
            "other" | "其他" => SubjectHint::Other,
            _ => return None,
        };
        Some(hint)
    }

    /// Subjects answered by the quantitative configuration
    pub fn is_quantitative(&self) -> bool {
        matches!(self, SubjectHint::Math | SubjectHint::Physics | SubjectHint::Chemistry)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubjectHint::Math => "數學",
            SubjectHint::Physics => "物理",
            SubjectHint::Chemistry => "化學",
            SubjectHint::Chinese => "國文",
            SubjectHint::English => "英文",
            SubjectHint::Biology => "生物",
            SubjectHint::History => "歷史",
            SubjectHint::Geography => "地理",
            SubjectHint::Other => "其他",
        }
    }

    /// Prefix for synthesized fallback titles
    pub fn title_prefix(hint: Option<SubjectHint>) -> String {
        match hint {
            Some(SubjectHint::Other) | None => "作業解題".to_string(),
            Some(subject) => format!("{}解題", subject.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(SubjectHint::parse("Math"), Some(SubjectHint::Math));
        assert_eq!(SubjectHint::parse(" 物理 "), Some(SubjectHint::Physics));
        assert_eq!(SubjectHint::parse("化學"), Some(SubjectHint::Chemistry));
        assert_eq!(SubjectHint::parse("english"), Some(SubjectHint::English));
        assert_eq!(SubjectHint::parse("astrology"), None);
        assert_eq!(SubjectHint::parse(""), None);
    }

    #[test]
    fn test_quantitative_subjects() {
        assert!(SubjectHint::Math.is_quantitative());
        assert!(SubjectHint::Physics.is_quantitative());
        assert!(SubjectHint::Chemistry.is_quantitative());
        assert!(!SubjectHint::History.is_quantitative());
        assert!(!SubjectHint::Other.is_quantitative());
    }

    #[test]
    fn test_title_prefix() {
        assert_eq!(SubjectHint::title_prefix(Some(SubjectHint::Math)), "數學解題");
        assert_eq!(SubjectHint::title_prefix(Some(SubjectHint::Other)), "作業解題");
        assert_eq!(SubjectHint::title_prefix(None), "作業解題");
    }
}
