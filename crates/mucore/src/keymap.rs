use serde::{Deserialize, Serialize};

/// Generic modifier names used by the editor keymap notation.
const PRIMARY_MODIFIER: &str = "Mod";
const SECONDARY_MODIFIER: &str = "Meta";

/// Target platform for accelerator strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }

    fn primary_modifier(self) -> &'static str {
        match self {
            Self::MacOs => "Cmd",
            Self::Other => "Ctrl",
        }
    }

    fn secondary_modifier(self) -> &'static str {
        "Alt"
    }
}

/// A keymap entry: one key sequence, or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    One(String),
    Many(Vec<String>),
}

impl Binding {
    /// First binding wins when the keymap lists alternatives.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(sequence) => Some(sequence),
            Self::Many(sequences) => sequences.first().map(String::as_str),
        }
    }
}

/// Translate a hyphen-delimited editor key sequence into the platform's
/// accelerator syntax.
///
/// Every segment but the last is a modifier; `Mod` and `Meta` map to the
/// platform's primary and secondary modifier names and anything else passes
/// through unchanged. A single-character key is upper-cased, a named key is
/// kept as-is. A sequence with no modifiers yields the bare key with no `+`.
pub fn translate(sequence: &str, platform: Platform) -> String {
    let segments: Vec<&str> = sequence.split('-').collect();
    let Some((key, modifiers)) = segments.split_last() else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::with_capacity(segments.len());
    for modifier in modifiers {
        let mapped = match *modifier {
            PRIMARY_MODIFIER => platform.primary_modifier(),
            SECONDARY_MODIFIER => platform.secondary_modifier(),
            other => other,
        };
        parts.push(mapped.to_string());
    }

    let mut chars = key.chars();
    let key = match (chars.next(), chars.next()) {
        (Some(only), None) => only.to_uppercase().to_string(),
        _ => (*key).to_string(),
    };
    parts.push(key);

    parts.join("+")
}

/// Translate a keymap entry, using only its first sequence.
pub fn translate_binding(binding: &Binding, platform: Platform) -> Option<String> {
    binding
        .first()
        .map(|sequence| translate(sequence, platform))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_modifier() {
        assert_eq!(translate("Mod-b", Platform::MacOs), "Cmd+B");
        assert_eq!(translate("Mod-b", Platform::Other), "Ctrl+B");
    }

    #[test]
    fn test_secondary_modifier() {
        assert_eq!(translate("Meta-1", Platform::MacOs), "Alt+1");
        assert_eq!(translate("Meta-1", Platform::Other), "Alt+1");
    }

    #[test]
    fn test_named_key_passes_through() {
        assert_eq!(
            translate("Shift-ArrowRight", Platform::MacOs),
            "Shift+ArrowRight"
        );
    }

    #[test]
    fn test_no_modifiers_yields_bare_key() {
        assert_eq!(translate("Enter", Platform::MacOs), "Enter");
        assert_eq!(translate("k", Platform::MacOs), "K");
    }

    #[test]
    fn test_unrecognized_modifier_passes_through() {
        assert_eq!(translate("Hyper-k", Platform::MacOs), "Hyper+K");
    }

    #[test]
    fn test_stacked_modifiers() {
        assert_eq!(
            translate("Shift-Mod-z", Platform::MacOs),
            "Shift+Cmd+Z"
        );
    }

    #[test]
    fn test_first_binding_wins() {
        let binding = Binding::Many(vec!["Mod-b".to_string(), "Mod-B".to_string()]);
        assert_eq!(
            translate_binding(&binding, Platform::MacOs),
            Some("Cmd+B".to_string())
        );
    }

    #[test]
    fn test_empty_binding_list() {
        assert_eq!(translate_binding(&Binding::Many(Vec::new()), Platform::MacOs), None);
    }

    #[test]
    fn test_binding_deserializes_untagged() {
        let one: Binding = serde_json::from_str(r#""Mod-b""#).unwrap();
        assert_eq!(one, Binding::One("Mod-b".to_string()));

        let many: Binding = serde_json::from_str(r#"["Mod-f", "F3"]"#).unwrap();
        assert_eq!(many.first(), Some("Mod-f"));
    }
}
