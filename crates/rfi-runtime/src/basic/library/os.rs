use super::{failure, Args, Library, LibraryKeyword};
use crate::basic::executor::Executor;
use crate::basic::failure::{Failure, KwResult};
use crate::basic::value::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) static LIBRARY: Library = Library {
    name: "OperatingSystem",
    doc: "Keywords for files, directories and environment variables.",
    keywords: KEYWORDS,
};

static KEYWORDS: &[LibraryKeyword] = &[
    LibraryKeyword::new(
        "Create File",
        &["path", "content=", "encoding=UTF-8"],
        "Creates a file with the given content.",
        create_file,
    ),
    LibraryKeyword::new(
        "Get File",
        &["path", "encoding=UTF-8"],
        "Returns the contents of a specified file.",
        get_file,
    ),
    LibraryKeyword::new(
        "Remove File",
        &["path"],
        "Removes a file with the given path.",
        remove_file,
    ),
    LibraryKeyword::new(
        "File Should Exist",
        &["path", "msg=None"],
        "Fails unless the given `path` points to an existing file.",
        file_should_exist,
    ),
    LibraryKeyword::new(
        "Create Directory",
        &["path"],
        "Creates the specified directory, including missing parents.",
        create_directory,
    ),
    LibraryKeyword::new(
        "Directory Should Exist",
        &["path", "msg=None"],
        "Fails unless the given path points to an existing directory.",
        directory_should_exist,
    ),
    LibraryKeyword::new(
        "Join Path",
        &["base", "*parts"],
        "Joins the given path part(s) to the given base path.",
        join_path,
    ),
    LibraryKeyword::new(
        "Get Environment Variable",
        &["name", "default=None"],
        "Returns the value of an environment variable with the given name.",
        get_environment_variable,
    ),
];

fn path_arg(exec: &Executor<'_, '_>, args: &mut Args) -> PathBuf {
    exec.resolve_path(&args.string())
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> Failure {
    Failure::fail(format!("{action} '{}' failed: {err}", path.display()))
}

fn check_encoding(encoding: &str) -> KwResult<()> {
    match encoding.to_ascii_uppercase().replace('-', "").as_str() {
        "UTF8" | "SYSTEM" | "ASCII" => Ok(()),
        _ => Err(Failure::fail(format!("Unsupported encoding '{encoding}'."))),
    }
}

fn create_file(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    let content = args.string();
    check_encoding(&args.string())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_failure("Creating directory", parent, err))?;
    }
    fs::write(&path, content).map_err(|err| io_failure("Creating file", &path, err))?;
    exec.log("INFO", &format!("Created file '{}'.", path.display()))?;
    Ok(Value::None)
}

fn get_file(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    check_encoding(&args.string())?;
    fs::read_to_string(&path)
        .map(Value::Str)
        .map_err(|err| io_failure("Reading file", &path, err))
}

fn remove_file(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    if path.is_dir() {
        return Err(Failure::fail(format!(
            "Path '{}' is not a file.",
            path.display()
        )));
    }
    match fs::remove_file(&path) {
        Ok(()) => Ok(Value::None),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            exec.log("INFO", &format!("File '{}' does not exist.", path.display()))?;
            Ok(Value::None)
        }
        Err(err) => Err(io_failure("Removing file", &path, err)),
    }
}

fn file_should_exist(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    let msg = args.opt_string();
    if path.is_file() {
        return Ok(Value::None);
    }
    Err(failure(msg, || format!("File '{}' does not exist.", path.display())))
}

fn create_directory(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    if path.is_file() {
        return Err(Failure::fail(format!(
            "Path '{}' is not a directory.",
            path.display()
        )));
    }
    fs::create_dir_all(&path).map_err(|err| io_failure("Creating directory", &path, err))?;
    Ok(Value::None)
}

fn directory_should_exist(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let path = path_arg(exec, args);
    let msg = args.opt_string();
    if path.is_dir() {
        return Ok(Value::None);
    }
    Err(failure(msg, || format!("Directory '{}' does not exist.", path.display())))
}

fn join_path(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let mut path = PathBuf::from(args.string());
    for part in args.rest() {
        path.push(part.to_string());
    }
    Ok(Value::Str(path.display().to_string()))
}

fn get_environment_variable(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let name = args.string();
    let default = args.value();
    match std::env::var(&name) {
        Ok(value) => Ok(Value::Str(value)),
        Err(_) if !default.is_none() => Ok(default),
        Err(_) => Err(Failure::fail(format!(
            "Environment variable '{name}' does not exist."
        ))),
    }
}

