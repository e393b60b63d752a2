use rfi_core::normalize_name;
use rfi_runtime::{DocSource, KeywordSpec, LibraryDoc};
use rfi_suite::UserKeyword;
use serde::{Deserialize, Serialize};

/// Where an indexed keyword is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocKind {
    Library,
    Resource,
    /// A keyword declared directly in the session suite.
    Suite,
}

impl From<DocSource> for DocKind {
    fn from(source: DocSource) -> Self {
        match source {
            DocSource::Library => DocKind::Library,
            DocSource::Resource => DocKind::Resource,
        }
    }
}

/// Searchable documentation of one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDoc {
    pub name: String,
    /// Library, resource or suite the keyword belongs to.
    pub source: String,
    pub kind: DocKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Identity of a [`KeywordDoc`]: normalized source and keyword name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocKey {
    pub source: String,
    pub name: String,
}

impl KeywordDoc {
    pub fn key(&self) -> DocKey {
        DocKey {
            source: normalize_name(&self.source),
            name: normalize_name(&self.name),
        }
    }

    /// `Source.Name`, the form that is unambiguous across libraries.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.source, self.name)
    }

    /// First line of the documentation.
    pub fn short_doc(&self) -> &str {
        self.doc.lines().next().unwrap_or_default().trim()
    }

    fn from_spec(spec: &KeywordSpec, source: &str, kind: DocKind) -> Self {
        Self {
            name: spec.name.clone(),
            source: source.to_string(),
            kind,
            args: spec.args.clone(),
            doc: spec.doc.clone(),
            tags: spec.tags.clone(),
        }
    }

    /// Every keyword of an imported library or resource.
    pub fn from_library(library: &LibraryDoc) -> Vec<Self> {
        let kind = DocKind::from(library.source);
        library
            .keywords
            .iter()
            .map(|spec| Self::from_spec(spec, &library.name, kind))
            .collect()
    }

    pub fn from_user_keyword(keyword: &UserKeyword, suite: &str) -> Self {
        Self {
            name: keyword.name.clone(),
            source: suite.to_string(),
            kind: DocKind::Suite,
            args: keyword.arguments.clone(),
            doc: keyword.documentation.clone(),
            tags: keyword.tags.clone(),
        }
    }
}
