//! A small, range-preserving parser for Robot Framework style snippets.
//!
//! The parser is line oriented: it splits the input into cells, folds `...`
//! continuation lines into their statement, and builds a structural model of
//! the sections it finds. It does not stop at the first problem; every issue is
//! reported as a [`ParseError`] on [`SnippetModel::errors`].
//!
//! Only the plain statement forms are modelled. Control structures (`FOR`,
//! `IF`, `TRY`, ...) are reported as unsupported.

mod ast;
mod lexer;
mod parser;

pub use ast::{
    Block, BlockSetting, BlockSettingKind, KeywordCall, RunMode, Section, SectionBody,
    SectionKind, Setting, SettingKind, Step, VariableDef,
};
pub use lexer::{split_cells, SEPARATOR_PATTERN};
pub use parser::parse;

use rfi_core::TextRange;

/// A diagnostic produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// 1-based line number.
    pub line: u32,
    pub range: TextRange,
}

/// Raised when one snippet declares both tests and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("One file cannot have both tests and tasks.")]
pub struct ModeConflict;

/// Parsed snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetModel {
    pub sections: Vec<Section>,
    pub errors: Vec<ParseError>,
}

impl SnippetModel {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The run mode implied by the snippet's test and task sections.
    ///
    /// `Ok(None)` when there are no such sections at all.
    pub fn run_mode(&self) -> Result<Option<RunMode>, ModeConflict> {
        let mut mode = None;
        for kind in self.sections.iter().filter_map(|s| s.kind.run_mode()) {
            match mode {
                None => mode = Some(kind),
                Some(existing) if existing != kind => return Err(ModeConflict),
                Some(_) => {}
            }
        }
        Ok(mode)
    }

    pub fn settings(&self) -> impl Iterator<Item = &Setting> {
        self.sections.iter().flat_map(|s| match &s.body {
            SectionBody::Settings(items) => items.as_slice(),
            _ => &[],
        })
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableDef> {
        self.sections.iter().flat_map(|s| match &s.body {
            SectionBody::Variables(items) => items.as_slice(),
            _ => &[],
        })
    }

    /// Tests and tasks, in source order.
    pub fn tests(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| match &s.body {
            SectionBody::Tests(items) => items.as_slice(),
            _ => &[],
        })
    }

    pub fn keywords(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| match &s.body {
            SectionBody::Keywords(items) => items.as_slice(),
            _ => &[],
        })
    }
}
