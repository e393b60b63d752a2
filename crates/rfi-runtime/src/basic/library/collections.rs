use super::{failure, Args, Library, LibraryKeyword};
use crate::basic::executor::Executor;
use crate::basic::failure::{Failure, KwResult};
use crate::basic::value::{ListRef, Value};

pub(super) static LIBRARY: Library = Library {
    name: "Collections",
    doc: "Keywords for handling lists and dictionaries.",
    keywords: KEYWORDS,
};

static KEYWORDS: &[LibraryKeyword] = &[
    LibraryKeyword::new(
        "Append To List",
        &["list_", "*values"],
        "Adds `values` to the end of `list`.",
        append_to_list,
    ),
    LibraryKeyword::new(
        "Insert Into List",
        &["list_", "index", "value"],
        "Inserts `value` into `list` to the position specified with `index`.",
        insert_into_list,
    ),
    LibraryKeyword::new(
        "Remove From List",
        &["list_", "index"],
        "Removes and returns the value specified with an `index` from `list`.",
        remove_from_list,
    ),
    LibraryKeyword::new(
        "Get From List",
        &["list_", "index"],
        "Returns the value specified with an `index` from `list`.",
        get_from_list,
    ),
    LibraryKeyword::new("Sort List", &["list_"], "Sorts the given list in place.", sort_list),
    LibraryKeyword::new(
        "List Should Contain Value",
        &["list_", "value", "msg=None"],
        "Fails if the `value` is not found from `list`.",
        list_should_contain_value,
    ),
    LibraryKeyword::new(
        "Set To Dictionary",
        &["dictionary", "*key_value_pairs", "**items"],
        "Adds the given `key_value_pairs` and `items` to the `dictionary`.",
        set_to_dictionary,
    ),
    LibraryKeyword::new(
        "Get From Dictionary",
        &["dictionary", "key"],
        "Returns a value from the given `dictionary` based on the given `key`.",
        get_from_dictionary,
    ),
    LibraryKeyword::new(
        "Get Dictionary Keys",
        &["dictionary", "sort_keys=True"],
        "Returns keys of the given `dictionary` as a list.",
        get_dictionary_keys,
    ),
];

/// Python-style index: negative values count from the end.
fn index(list: &ListRef, index: i64, insert: bool) -> KwResult<usize> {
    let len = list.borrow().len();
    let signed = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { signed + index } else { index };
    let upper = if insert { signed } else { signed - 1 };
    if insert {
        return Ok(usize::try_from(resolved.clamp(0, upper)).unwrap_or(0));
    }
    usize::try_from(resolved)
        .ok()
        .filter(|_| resolved <= upper)
        .ok_or_else(|| {
            Failure::fail(format!(
                "Given index {index} is out of the range 0-{}.",
                len.saturating_sub(1)
            ))
        })
}

fn render(list: &ListRef) -> String {
    let items: Vec<String> = list.borrow().iter().map(Value::to_string).collect();
    format!("[ {} ]", items.join(" | "))
}

fn append_to_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let values = args.rest();
    list.borrow_mut().extend(values);
    Ok(Value::None)
}

fn insert_into_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let at = index(&list, args.int()?, true)?;
    let value = args.value();
    list.borrow_mut().insert(at, value);
    Ok(Value::None)
}

fn remove_from_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let at = index(&list, args.int()?, false)?;
    let removed = list.borrow_mut().remove(at);
    Ok(removed)
}

fn get_from_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let at = index(&list, args.int()?, false)?;
    let value = list.borrow()[at].clone();
    Ok(value)
}

fn sort_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let mut items = list.borrow_mut();
    let numeric = items
        .iter()
        .all(|item| matches!(item, Value::Int(_) | Value::Float(_) | Value::Bool(_)));
    if numeric {
        items.sort_by(|a, b| {
            let (a, b) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
            a.total_cmp(&b)
        });
    } else {
        items.sort_by_key(Value::to_string);
    }
    Ok(Value::None)
}

fn list_should_contain_value(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let list = args.list()?;
    let value = args.value();
    let msg = args.opt_string();
    if list.borrow().contains(&value) {
        return Ok(Value::None);
    }
    Err(failure(msg, || {
        format!("{} does not contain value '{value}'.", render(&list))
    }))
}

fn put(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn set_to_dictionary(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let dict = args.dict()?;
    let pairs = args.rest();
    if pairs.len() % 2 != 0 {
        return Err(Failure::fail(
            "Adding data to a dictionary failed. There should be even number of key-value-pairs.",
        ));
    }
    let items = args.entries();
    let mut entries = dict.borrow_mut();
    for pair in pairs.chunks(2) {
        put(&mut entries, pair[0].to_string(), pair[1].clone());
    }
    for (key, value) in items {
        put(&mut entries, key, value);
    }
    Ok(Value::None)
}

fn get_from_dictionary(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let dict = args.dict()?;
    let key = args.string();
    let value = dict
        .borrow()
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.clone());
    value.ok_or_else(|| Failure::fail(format!("Dictionary does not contain key '{key}'.")))
}

fn sorted_entries(args: &mut Args) -> KwResult<Vec<(String, Value)>> {
    let dict = args.dict()?;
    let sort = args.flag();
    let mut entries = dict.borrow().clone();
    if sort {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(entries)
}

fn get_dictionary_keys(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let entries = sorted_entries(args)?;
    Ok(Value::list(entries.into_iter().map(|(k, _)| Value::Str(k)).collect()))
}
