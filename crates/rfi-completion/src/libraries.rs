use rfi_fuzzy::rank;

/// Libraries shipped with the test language itself.
pub const STANDARD_LIBRARIES: &[&str] = &[
    "BuiltIn",
    "Collections",
    "DateTime",
    "Dialogs",
    "OperatingSystem",
    "Process",
    "Screenshot",
    "String",
    "Telnet",
    "XML",
];

/// Phrases that introduce a library name, longest first.
const LIBRARY_PHRASES: [&str; 4] = [
    "get library instance ",
    "reload library ",
    "import library ",
    "library ",
];

/// Whether `line` names a library: a `Library` setting or one of the
/// keywords taking a library name.
pub fn is_library_line(line: &str) -> bool {
    let line = line.to_lowercase();
    line.starts_with("library ")
        || line.contains("import library ")
        || line.contains("reload library ")
        || line.contains("get library instance")
}

/// Lower-case `needle` and drop the longest library phrase it starts with.
pub fn library_needle(needle: &str) -> String {
    let needle = needle.to_lowercase();
    LIBRARY_PHRASES
        .iter()
        .find_map(|phrase| needle.strip_prefix(phrase))
        .map(str::to_string)
        .unwrap_or(needle)
}

/// Rank the standard libraries and `extra` names against `needle`.
pub fn complete_libraries(needle: &str, extra: &[String]) -> Vec<String> {
    let names = STANDARD_LIBRARIES
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str));
    rank(needle, names)
        .into_iter()
        .map(|ranked| ranked.candidate.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_library_lines() {
        assert!(is_library_line("Library    Coll"));
        assert!(is_library_line("LIBRARY    Coll"));
        assert!(is_library_line("Suite Setup    Import Library    Coll"));
        assert!(is_library_line("Suite Setup    Get Library Instance    Bu"));
        assert!(!is_library_line("Resource    common.resource"));
        assert!(!is_library_line("Library"));
    }

    #[test]
    fn strips_the_longest_phrase_only() {
        assert_eq!(library_needle("Coll"), "coll");
        assert_eq!(library_needle("Library Coll"), "coll");
        assert_eq!(library_needle("Import Library Coll"), "coll");
        assert_eq!(library_needle("get library instance bu"), "bu");
        assert_eq!(library_needle("library library x"), "library x");
    }

    #[test]
    fn ranks_standard_and_extra_libraries() {
        assert_eq!(complete_libraries("coll", &[]), vec!["Collections"]);
        let extra = vec!["SeleniumLibrary".to_string()];
        assert_eq!(
            complete_libraries("sel", &extra),
            vec!["SeleniumLibrary"]
        );
        assert!(complete_libraries("zzz", &extra).is_empty());
    }
}
