use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub use_colors: bool,
    pub indent_style: IndentStyle,
    /// Nodes whose one-line form is wider than this are broken over several lines.
    pub max_line_width: Option<usize>,
    /// Suffix typed nodes with `:type`.
    pub include_types: bool,
    /// Suffix positioned nodes with `@line:column`.
    pub include_positions: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent_style: IndentStyle::Spaces(4),
            max_line_width: Some(100),
            include_types: false,
            include_positions: false,
        }
    }
}

impl EmitterConfig {
    /// Uncoloured output, for files and snapshot tests.
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EmitterConfig {
            indent_style: IndentStyle::Tabs,
            include_types: true,
            ..EmitterConfig::plain()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EmitterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.indent_style, IndentStyle::Tabs);
        assert!(back.include_types);
        assert!(!back.use_colors);
    }
}
