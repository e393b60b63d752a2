//! Evaluation of the small expressions used by conditional keywords.
//!
//! Supported: literals (numbers, quoted strings, `True`, `False`, `None`),
//! comparisons (`==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`), `and`, `or`,
//! `not` and parentheses.

use super::value::{parse_int, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(Value),
    Op(&'static str),
    And,
    Or,
    Not,
    In,
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' || c == ')' {
            out.push(if c == '(' { Token::Open } else { Token::Close });
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            let mut s = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err("unterminated string".to_string()),
                    Some('\\') if i + 1 < chars.len() => {
                        s.push(chars[i + 1]);
                        i += 2;
                    }
                    Some(&ch) if ch == c => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        s.push(ch);
                        i += 1;
                    }
                }
            }
            out.push(Token::Literal(Value::Str(s)));
            continue;
        }
        let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
        if let Some(op) = ["==", "!=", "<=", ">="].into_iter().find(|op| *op == two) {
            out.push(Token::Op(op));
            i += 2;
            continue;
        }
        if c == '<' || c == '>' {
            out.push(Token::Op(if c == '<' { "<" } else { ">" }));
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len()
            && !chars[i].is_whitespace()
            && !matches!(chars[i], '(' | ')' | '=' | '!' | '<' | '>' | '\'' | '"')
        {
            i += 1;
        }
        if start == i {
            return Err(format!("unexpected character '{c}'"));
        }
        let word: String = chars[start..i].iter().collect();
        out.push(match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "True" | "true" => Token::Literal(Value::Bool(true)),
            "False" | "false" => Token::Literal(Value::Bool(false)),
            "None" => Token::Literal(Value::None),
            _ => match parse_int(&word) {
                Some(n) => Token::Literal(Value::Int(n)),
                None => match word.parse::<f64>() {
                    Ok(f) => Token::Literal(Value::Float(f)),
                    Err(_) => return Err(format!("name '{word}' is not defined")),
                },
            },
        });
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Result<Value, String> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = if left.truthy() { left } else { right };
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Value, String> {
        let mut left = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.not()?;
            left = if left.truthy() { right } else { left };
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Value, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Value::Bool(!self.not()?.truthy()));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Value, String> {
        let left = self.atom()?;
        let op = match self.peek() {
            Some(Token::Op(op)) => *op,
            Some(Token::In) => "in",
            Some(Token::Not) if self.tokens.get(self.pos + 1) == Some(&Token::In) => {
                self.pos += 1;
                "not in"
            }
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.atom()?;
        compare(&left, op, &right).map(Value::Bool)
    }

    fn atom(&mut self) -> Result<Value, String> {
        match self.next() {
            Some(Token::Literal(value)) => Ok(value),
            Some(Token::Open) => {
                let value = self.or()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn compare(left: &Value, op: &str, right: &Value) -> Result<bool, String> {
    match op {
        "==" => Ok(left == right),
        "!=" => Ok(left != right),
        "in" | "not in" => {
            let found = match right {
                Value::Str(hay) => hay.contains(&left.to_string()),
                Value::List(items) => items.borrow().contains(left),
                Value::Dict(items) => items.borrow().iter().any(|(k, _)| *k == left.to_string()),
                other => {
                    return Err(format!(
                        "argument of type '{}' is not iterable",
                        other.type_name()
                    ))
                }
            };
            Ok(found == (op == "in"))
        }
        _ => {
            let ordering = match (left, right) {
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => {
                    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                        return Err(format!(
                            "'{op}' not supported between {} and {}",
                            left.type_name(),
                            right.type_name()
                        ));
                    };
                    a.partial_cmp(&b).ok_or_else(|| "cannot compare NaN".to_string())?
                }
            };
            Ok(match op {
                "<" => ordering.is_lt(),
                "<=" => ordering.is_le(),
                ">" => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

impl Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => self.as_float(),
            _ => None,
        }
    }
}

/// Evaluate `expression` and return its truthiness.
pub fn evaluate_condition(expression: &str) -> Result<bool, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("expression is empty".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.or()?;
    if parser.pos != parser.tokens.len() {
        return Err("invalid syntax".to_string());
    }
    Ok(value.truthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(evaluate_condition("1 == 1"), Ok(true));
        assert_eq!(evaluate_condition("'a' != 'a'"), Ok(false));
        assert_eq!(evaluate_condition("2 > 1 and 'x' in 'xyz'"), Ok(true));
        assert_eq!(evaluate_condition("not (3 <= 2) or False"), Ok(true));
        assert_eq!(evaluate_condition("'q' not in 'abc'"), Ok(true));
        assert_eq!(evaluate_condition("True"), Ok(true));
        assert_eq!(evaluate_condition("0"), Ok(false));
    }

    #[test]
    fn reports_errors() {
        assert!(evaluate_condition("bare_word == 1").is_err());
        assert!(evaluate_condition("(1 == 1").is_err());
        assert!(evaluate_condition("").is_err());
        assert!(evaluate_condition("'a' < 1").is_err());
    }
}
