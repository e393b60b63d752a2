use crate::ast::{
    Block, BlockSetting, BlockSettingKind, KeywordCall, Section, SectionBody, SectionKind, Setting,
    SettingKind, Step, VariableDef,
};
use crate::lexer::{split_lines, RawLine};
use crate::{ParseError, SnippetModel};
use regex::Regex;
use rfi_core::TextRange;
use std::sync::OnceLock;

/// Markers of control structures the line-oriented model does not represent.
const CONTROL_MARKERS: &[&str] = &[
    "FOR", "END", "IF", "ELSE IF", "ELSE", "WHILE", "TRY", "EXCEPT", "FINALLY", "BREAK",
    "CONTINUE", "GROUP",
];

fn variable_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[$@&]\{[^{}]+\}$").expect("variable name regex should compile")
    })
}

fn assignment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[$@&]\{[^{}]+\}\s*=?$").expect("assignment regex should compile")
    })
}

/// A statement after `...` continuation lines have been folded in.
#[derive(Debug)]
struct Statement {
    line: u32,
    range: TextRange,
    indented: bool,
    cells: Vec<String>,
}

/// Parse a snippet. Problems are collected as diagnostics; parsing never stops early.
#[must_use]
pub fn parse(text: &str) -> SnippetModel {
    let mut parser = Parser::default();
    let lines = split_lines(text);

    let mut current: Option<(SectionKind, u32)> = None;
    let mut pending: Vec<Statement> = Vec::new();
    let mut skipping = false;

    for raw in &lines {
        if let Some(header) = raw.header_name() {
            if let Some((kind, line)) = current.take() {
                parser.finish_section(kind, line, std::mem::take(&mut pending));
            }
            match SectionKind::from_header(&header) {
                Some(kind) => {
                    current = Some((kind, raw.line));
                    skipping = false;
                }
                None => {
                    parser.error(
                        raw,
                        format!(
                            "Unrecognized section header '{}'. Valid sections: 'Settings', \
                             'Variables', 'Test Cases', 'Tasks', 'Keywords' and 'Comments'.",
                            raw.text.trim()
                        ),
                    );
                    skipping = true;
                }
            }
            continue;
        }

        // Data before the first header, and inside unknown sections, is ignored.
        if current.is_none() || skipping || raw.is_empty() {
            continue;
        }

        if raw.is_continuation() {
            match pending.last_mut() {
                Some(stmt) => {
                    stmt.cells.extend(raw.data()[1..].iter().cloned());
                    stmt.range = stmt.range.cover(raw.range);
                }
                None => parser.error(raw, "Invalid syntax: '...' has nothing to continue."),
            }
            continue;
        }

        pending.push(Statement {
            line: raw.line,
            range: raw.range,
            indented: raw.is_indented(),
            cells: raw.data().to_vec(),
        });
    }

    if let Some((kind, line)) = current {
        parser.finish_section(kind, line, pending);
    }

    SnippetModel {
        sections: parser.sections,
        errors: parser.errors,
    }
}

#[derive(Default)]
struct Parser {
    sections: Vec<Section>,
    errors: Vec<ParseError>,
}

impl Parser {
    fn error(&mut self, raw: &RawLine, message: impl Into<String>) {
        self.errors.push(ParseError {
            message: message.into(),
            line: raw.line,
            range: raw.range,
        });
    }

    fn stmt_error(&mut self, stmt: &Statement, message: impl Into<String>) {
        self.errors.push(ParseError {
            message: message.into(),
            line: stmt.line,
            range: stmt.range,
        });
    }

    fn finish_section(&mut self, kind: SectionKind, line: u32, statements: Vec<Statement>) {
        let body = match kind {
            SectionKind::Settings => SectionBody::Settings(self.settings(statements)),
            SectionKind::Variables => SectionBody::Variables(self.variables(statements)),
            SectionKind::TestCases | SectionKind::Tasks => {
                SectionBody::Tests(self.blocks(statements, false))
            }
            SectionKind::Keywords => SectionBody::Keywords(self.blocks(statements, true)),
            SectionKind::Comments => SectionBody::Comments,
        };
        self.sections.push(Section { kind, line, body });
    }

    fn settings(&mut self, statements: Vec<Statement>) -> Vec<Setting> {
        let mut out = Vec::new();
        for stmt in statements {
            let Some((name, values)) = stmt.cells.split_first() else {
                continue;
            };
            let Some(kind) = SettingKind::lookup(name) else {
                self.stmt_error(&stmt, format!("Non-existing setting '{name}'."));
                continue;
            };
            let values: Vec<String> = values.to_vec();
            if kind.requires_value() && values.iter().all(|v| v.is_empty()) {
                self.stmt_error(&stmt, format!("Setting '{name}' requires a value."));
                continue;
            }
            out.push(Setting {
                kind,
                name: name.clone(),
                values,
                line: stmt.line,
            });
        }
        out
    }

    fn variables(&mut self, statements: Vec<Statement>) -> Vec<VariableDef> {
        let mut out = Vec::new();
        for stmt in statements {
            let Some((raw_name, values)) = stmt.cells.split_first() else {
                continue;
            };
            let name = raw_name.trim_end_matches('=').trim_end();
            if !variable_name_regex().is_match(name) {
                self.stmt_error(&stmt, format!("Invalid variable name '{raw_name}'."));
                continue;
            }
            if name.starts_with('&') {
                if let Some(bad) = values.iter().find(|v| !v.contains('=')) {
                    self.stmt_error(
                        &stmt,
                        format!(
                            "Invalid dictionary variable item '{bad}'. Items must use \
                             'name=value' syntax or be dictionary variables themselves."
                        ),
                    );
                    continue;
                }
            }
            out.push(VariableDef {
                name: name.to_string(),
                values: values.to_vec(),
                line: stmt.line,
            });
        }
        out
    }

    fn blocks(&mut self, statements: Vec<Statement>, keywords: bool) -> Vec<Block> {
        let mut out: Vec<Block> = Vec::new();
        for stmt in statements {
            if !stmt.indented {
                let Some((name, rest)) = stmt.cells.split_first() else {
                    continue;
                };
                if name.is_empty() {
                    self.stmt_error(&stmt, "Name cannot be empty.");
                    continue;
                }
                out.push(Block {
                    name: name.clone(),
                    line: stmt.line,
                    settings: Vec::new(),
                    body: Vec::new(),
                });
                // `Name    Keyword    arg` puts the first step on the name line.
                if !rest.is_empty() {
                    let first = Statement {
                        line: stmt.line,
                        range: stmt.range,
                        indented: true,
                        cells: rest.to_vec(),
                    };
                    self.step(&first, keywords, &mut out);
                }
                continue;
            }

            if out.is_empty() {
                let what = if keywords { "keyword" } else { "test or task" };
                self.stmt_error(&stmt, format!("Statement is not inside a {what}."));
                continue;
            }
            self.step(&stmt, keywords, &mut out);
        }
        out
    }

    fn step(&mut self, stmt: &Statement, keywords: bool, blocks: &mut [Block]) {
        let Some(block) = blocks.last_mut() else {
            return;
        };
        let Some(first) = stmt.cells.first() else {
            return;
        };

        if let Some(inner) = first.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            match BlockSettingKind::lookup(inner, keywords) {
                Some(kind) => block.settings.push(BlockSetting {
                    kind,
                    values: stmt.cells[1..].to_vec(),
                    line: stmt.line,
                }),
                None => self.stmt_error(stmt, format!("Non-existing setting '{first}'.")),
            }
            return;
        }

        if first == "RETURN" {
            if keywords {
                block.body.push(Step::Return {
                    values: stmt.cells[1..].to_vec(),
                    line: stmt.line,
                });
            } else {
                self.stmt_error(stmt, "RETURN is not allowed in this context.");
            }
            return;
        }

        if CONTROL_MARKERS.contains(&first.as_str()) {
            self.stmt_error(stmt, format!("'{first}' is not supported."));
            return;
        }

        let assign_len = stmt
            .cells
            .iter()
            .take_while(|c| assignment_regex().is_match(c))
            .count();
        let assign: Vec<String> = stmt.cells[..assign_len]
            .iter()
            .map(|c| c.trim_end_matches('=').trim_end().to_string())
            .collect();

        match stmt.cells.get(assign_len) {
            Some(keyword) if !keyword.is_empty() => block.body.push(Step::Call(KeywordCall {
                assign,
                keyword: keyword.clone(),
                args: stmt.cells[assign_len + 1..].to_vec(),
                line: stmt.line,
            })),
            _ => self.stmt_error(stmt, "Keyword name cannot be empty."),
        }
    }
}
