use super::{compile_regex, Args, Library, LibraryKeyword};
use crate::basic::executor::Executor;
use crate::basic::failure::{Failure, KwResult};
use crate::basic::value::Value;

pub(super) static LIBRARY: Library = Library {
    name: "String",
    doc: "Keywords for string manipulation and verification.",
    keywords: KEYWORDS,
};

static KEYWORDS: &[LibraryKeyword] = &[
    LibraryKeyword::new(
        "Convert To Upper Case",
        &["string"],
        "Converts string to upper case.",
        convert_to_upper_case,
    ),
    LibraryKeyword::new(
        "Convert To Lower Case",
        &["string"],
        "Converts string to lower case.",
        convert_to_lower_case,
    ),
    LibraryKeyword::new(
        "Split String",
        &["string", "separator=None", "max_split=-1"],
        "Splits the `string` using `separator` as a delimiter string.",
        split_string,
    ),
    LibraryKeyword::new(
        "Get Line",
        &["string", "line_number"],
        "Returns the specified line from the given `string`.",
        get_line,
    ),
    LibraryKeyword::new(
        "Replace String",
        &["string", "search_for", "replace_with", "count=-1"],
        "Replaces `search_for` in the given `string` with `replace_with`.",
        replace_string,
    ),
    LibraryKeyword::new(
        "Get Regexp Matches",
        &["string", "pattern", "*groups"],
        "Returns a list of all non-overlapping matches in the given string.",
        get_regexp_matches,
    ),
    LibraryKeyword::new(
        "Get Substring",
        &["string", "start", "end=None"],
        "Returns a substring from `start` index to `end` index.",
        get_substring,
    ),
];

/// Python-style slice bounds over `len` characters.
fn bound(index: Option<i64>, len: usize, default: usize) -> usize {
    let Some(index) = index else {
        return default;
    };
    let signed = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { signed + index } else { index };
    usize::try_from(resolved.clamp(0, signed)).unwrap_or(0)
}

fn convert_to_upper_case(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    Ok(Value::Str(args.string().to_uppercase()))
}

fn convert_to_lower_case(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    Ok(Value::Str(args.string().to_lowercase()))
}

fn split_string(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let text = args.string();
    let separator = args.opt_string();
    let max_split = args.int()?;
    let limit = usize::try_from(max_split).ok().map(|n| n + 1);
    let parts: Vec<Value> = match (separator, limit) {
        (Some(sep), Some(limit)) => text.splitn(limit, sep.as_str()).map(Value::from).collect(),
        (Some(sep), None) => text.split(sep.as_str()).map(Value::from).collect(),
        (None, limit) => {
            let mut parts: Vec<Value> = Vec::new();
            let mut rest = text.trim_start();
            while !rest.is_empty() {
                if limit.is_some_and(|limit| parts.len() + 1 == limit) {
                    parts.push(Value::from(rest.trim_end()));
                    break;
                }
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                parts.push(Value::from(&rest[..end]));
                rest = rest[end..].trim_start();
            }
            parts
        }
    };
    Ok(Value::list(parts))
}

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

fn get_line(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let text = args.string();
    let number = args.int()?;
    let all = lines(&text);
    let len = i64::try_from(all.len()).unwrap_or(i64::MAX);
    let ix = if number < 0 { len + number } else { number };
    usize::try_from(ix)
        .ok()
        .and_then(|ix| all.get(ix))
        .map(|line| Value::from(*line))
        .ok_or_else(|| Failure::fail(format!("Line number {number} is out of range.")))
}

fn replace_string(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let text = args.string();
    let (search, replace) = (args.string(), args.string());
    let count = args.int()?;
    Ok(Value::Str(match usize::try_from(count) {
        Ok(count) => text.replacen(search.as_str(), &replace, count),
        Err(_) => text.replace(search.as_str(), &replace),
    }))
}

fn get_regexp_matches(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let text = args.string();
    let regex = compile_regex(&args.string())?;
    let groups: Vec<String> = args.rest().iter().map(Value::to_string).collect();
    let mut out = Vec::new();
    for captures in regex.captures_iter(&text) {
        let group = |name: &str| -> Value {
            let found = match name.parse::<usize>() {
                Ok(ix) => captures.get(ix),
                Err(_) => captures.name(name),
            };
            found.map_or(Value::None, |m| Value::from(m.as_str()))
        };
        match groups.as_slice() {
            [] => out.push(group("0")),
            [single] => out.push(group(single)),
            many => out.push(Value::list(many.iter().map(|name| group(name)).collect())),
        }
    }
    Ok(Value::list(out))
}

fn get_substring(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let chars: Vec<char> = args.string().chars().collect();
    let start = bound(Some(args.int()?), chars.len(), 0);
    let end = bound(args.opt_int()?, chars.len(), chars.len());
    let picked: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Value::Str(picked))
}
