use serde::{Deserialize, Serialize};
use std::fmt;

use crate::word_count::count_words;

/// Entry from the `/models` listing. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Model {
    /// Value submitted with a generation request: id, falling back to name.
    pub fn value(&self) -> String {
        first_present(&self.id, &self.name)
    }

    /// Label shown in the selector: name, falling back to id.
    pub fn label(&self) -> String {
        first_present(&self.name, &self.id)
    }

    pub fn to_option(&self) -> ModelOption {
        ModelOption {
            value: self.value(),
            label: self.label(),
            disabled: false,
        }
    }
}

fn first_present(primary: &Option<String>, fallback: &Option<String>) -> String {
    primary
        .as_deref()
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.as_deref().filter(|v| !v.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// One entry of the model selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
}

impl ModelOption {
    pub fn placeholder(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
            disabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Write a new multi-chapter novel from the prompt.
    #[default]
    Generate,
    /// Expand the prompt text as an existing chapter.
    Expand,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Generate, Mode::Expand];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Generate => "generate",
            Mode::Expand => "expand",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Generate => "GENERATE",
            Mode::Expand => "EXPAND",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Mode::Generate => Mode::Expand,
            Mode::Expand => Mode::Generate,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /generate`. `genre` is always serialized, as `null` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub mode: Mode,
    pub model: String,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Chapter {
    pub fn word_count(&self) -> usize {
        count_words(&self.content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Novel {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Novel {
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn total_words(&self) -> usize {
        self.chapters.iter().map(Chapter::word_count).sum()
    }
}

/// What the user has entered when a generation is triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationForm {
    pub prompt: String,
    pub mode: Mode,
    pub model: String,
    pub genre: Option<String>,
}

impl GenerationForm {
    pub fn trimmed_prompt(&self) -> &str {
        self.prompt.trim()
    }

    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.trimmed_prompt().to_string(),
            mode: self.mode,
            model: self.model.clone(),
            genre: self.genre.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub models: Option<Vec<Model>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapters: Option<Vec<Chapter>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: Option<&str>, name: Option<&str>) -> Model {
        Model {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn model_value_and_label_fall_back_between_fields() {
        let both = model(Some("m1"), Some("Model One"));
        assert_eq!(both.value(), "m1");
        assert_eq!(both.label(), "Model One");

        let id_only = model(Some("m2"), None);
        assert_eq!(id_only.value(), "m2");
        assert_eq!(id_only.label(), "m2");

        let name_only = model(None, Some("Named"));
        assert_eq!(name_only.value(), "Named");
        assert_eq!(name_only.label(), "Named");

        let empty_id = model(Some(""), Some("Named"));
        assert_eq!(empty_id.value(), "Named");
    }

    #[test]
    fn request_serializes_null_genre_and_lowercase_mode() {
        let form = GenerationForm {
            prompt: "  a quiet village  ".to_string(),
            mode: Mode::Expand,
            model: "m1".to_string(),
            genre: None,
        };
        let json = serde_json::to_value(form.to_request()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "prompt": "a quiet village",
                "mode": "expand",
                "model": "m1",
                "genre": null
            })
        );
    }

    #[test]
    fn mode_cycles_through_all_values() {
        let mut mode = Mode::default();
        for expected in Mode::ALL.iter().cycle().skip(1).take(3) {
            mode = mode.next();
            assert_eq!(mode, *expected);
        }
    }
}
