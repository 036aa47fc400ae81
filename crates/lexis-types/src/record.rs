//! Raw records as emitted by a Wiktionary extraction: one JSON object per
//! word-sense group, newline delimited.

use serde::Deserialize;

/// Form tags that mark table scaffolding rather than an inflected surface form.
const METADATA_FORM_TAGS: &[&str] = &["romanization", "table-tags", "inflection-template", "class"];

/// One parsed source object. Consumed once by the aggregator and dropped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawRecord {
    pub word: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub lang_code: Option<String>,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub senses: Vec<Sense>,
    #[serde(default)]
    pub forms: Vec<Form>,
    #[serde(default)]
    pub related: Vec<RelatedWord>,
    #[serde(default)]
    pub head_templates: Vec<Template>,
    #[serde(default)]
    pub inflection_templates: Vec<Template>,
    #[serde(default)]
    pub etymology_text: Option<String>,
}

impl RawRecord {
    /// Head and inflection templates, in that order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> + '_ {
        self.head_templates
            .iter()
            .chain(self.inflection_templates.iter())
    }

    /// True when every sense only points at another lemma.
    ///
    /// A record without senses is not an inflection record: it still names a
    /// headword of its own.
    pub fn is_pure_inflection(&self) -> bool {
        !self.senses.is_empty() && self.senses.iter().all(Sense::is_inflection_pointer)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Sense {
    #[serde(default)]
    pub glosses: Vec<String>,
    #[serde(default)]
    pub raw_glosses: Vec<String>,
    #[serde(default)]
    pub raw_tags: Vec<String>,
    #[serde(default)]
    pub form_of: Vec<FormOf>,
}

impl Sense {
    pub fn is_inflection_pointer(&self) -> bool {
        !self.form_of.is_empty()
    }

    /// Lemmas this sense declares itself an inflection of.
    pub fn lemma_pointers(&self) -> impl Iterator<Item = &str> + '_ {
        self.form_of
            .iter()
            .map(|f| f.word.trim())
            .filter(|w| !w.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FormOf {
    #[serde(default)]
    pub word: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Form {
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Form {
    /// Romanizations and declension-table headers carry no surface form.
    pub fn is_metadata(&self) -> bool {
        self.tags
            .iter()
            .any(|t| METADATA_FORM_TAGS.contains(&t.as_str()))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RelatedWord {
    #[serde(default)]
    pub word: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expansion: Option<String>,
}
