//! REPL command parsing and validation.

use std::path::PathBuf;

use dfp_core::{ensure_trailing_slash, split_path, RemotePath};
use thiserror::Error;

/// A validated REPL command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { folder: String },
    Get { remote: RemotePath, local: PathBuf },
    Put { local: PathBuf, remote: RemotePath },
    Mkdir { folder: String },
    Exit,
}

/// Why a REPL line was rejected before touching the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid command. Available commands: LIST, GET, PUT, MKDIR, EXIT/QUIT")]
    Unknown,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("local file doesn't exist: {0}")]
    LocalFileMissing(PathBuf),
}

/// Parse one REPL line; `Ok(None)` for blank input.
///
/// Commands are uppercase; EXIT/QUIT work in any case.
///
/// # Errors
/// Returns `InputError` for unknown commands, wrong arity, or a missing
/// local file on PUT.
pub fn parse_line(line: &str) -> Result<Option<Command>, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return Ok(Some(Command::Exit));
    }

    if let Some(rest) = strip_command(trimmed, "LIST") {
        let folder = rest.trim();
        let folder = if folder.is_empty() {
            "/".to_string()
        } else {
            ensure_trailing_slash(folder)
        };
        return Ok(Some(Command::List { folder }));
    }

    if let Some(rest) = strip_command(trimmed, "GET") {
        let (remote_arg, local_arg) = two_args(rest, "GET <remote-path> <local-path>")?;
        let remote = named_remote(remote_arg, "GET <remote-path> <local-path>")?;
        let local = local_with_default_name(local_arg, &remote.name);
        return Ok(Some(Command::Get { remote, local }));
    }

    if let Some(rest) = strip_command(trimmed, "PUT") {
        let (local_arg, remote_arg) = two_args(rest, "PUT <local-path> <remote-path>")?;
        let local = PathBuf::from(local_arg);
        if !local.is_file() {
            return Err(InputError::LocalFileMissing(local));
        }
        let mut remote = RemotePath::parse(remote_arg);
        if remote.name.is_empty() {
            // Remote path named only a folder: keep the local basename.
            let (_, local_name) = split_path(local_arg);
            remote.name = local_name;
        }
        if remote.name.is_empty() {
            return Err(InputError::Usage("PUT <local-path> <remote-path>"));
        }
        return Ok(Some(Command::Put { local, remote }));
    }

    if let Some(rest) = strip_command(trimmed, "MKDIR") {
        let mut args = rest.split_whitespace();
        let (Some(folder), None) = (args.next(), args.next()) else {
            return Err(InputError::Usage("MKDIR <remote-folder>"));
        };
        return Ok(Some(Command::Mkdir {
            folder: ensure_trailing_slash(folder),
        }));
    }

    Err(InputError::Unknown)
}

/// Match `LIST`, `LIST <args>` but not `LISTX`.
fn strip_command<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(' ') {
        Some(rest)
    } else {
        None
    }
}

fn two_args<'a>(rest: &'a str, usage: &'static str) -> Result<(&'a str, &'a str), InputError> {
    let mut args = rest.split_whitespace();
    match (args.next(), args.next(), args.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(InputError::Usage(usage)),
    }
}

fn named_remote(arg: &str, usage: &'static str) -> Result<RemotePath, InputError> {
    let remote = RemotePath::parse(arg);
    if remote.name.is_empty() {
        return Err(InputError::Usage(usage));
    }
    Ok(remote)
}

fn local_with_default_name(arg: &str, default_name: &str) -> PathBuf {
    let (folder, name) = split_path(arg);
    let name = if name.is_empty() {
        default_name.to_string()
    } else {
        name
    };
    PathBuf::from(folder).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \n").unwrap(), None);
    }

    #[test]
    fn exit_is_case_insensitive() {
        for line in ["EXIT", "exit", "Quit", "QUIT"] {
            assert_eq!(parse_line(line).unwrap(), Some(Command::Exit));
        }
    }

    #[test]
    fn bare_list_targets_the_root() {
        assert_eq!(
            parse_line("LIST").unwrap(),
            Some(Command::List {
                folder: "/".to_string()
            })
        );
    }

    #[test]
    fn list_folder_gains_a_trailing_slash() {
        assert_eq!(
            parse_line("LIST docs").unwrap(),
            Some(Command::List {
                folder: "docs/".to_string()
            })
        );
    }

    #[test]
    fn get_splits_remote_and_local() {
        let command = parse_line("GET docs/readme.md /tmp/out.md").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Get {
                remote: RemotePath {
                    folder: "docs/".to_string(),
                    name: "readme.md".to_string(),
                },
                local: PathBuf::from("/tmp/out.md"),
            }
        );
    }

    #[test]
    fn get_local_folder_inherits_remote_name() {
        let command = parse_line("GET readme.md /tmp/").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Get {
                remote: RemotePath {
                    folder: String::new(),
                    name: "readme.md".to_string(),
                },
                local: PathBuf::from("/tmp/readme.md"),
            }
        );
    }

    #[test]
    fn get_requires_two_arguments() {
        assert!(matches!(
            parse_line("GET onlyone").unwrap_err(),
            InputError::Usage(_)
        ));
    }

    #[test]
    fn put_requires_an_existing_local_file() {
        let err = parse_line("PUT /definitely/not/here.bin remote.bin").unwrap_err();
        assert!(matches!(err, InputError::LocalFileMissing(_)));
    }

    #[test]
    fn mkdir_normalises_the_folder() {
        assert_eq!(
            parse_line("MKDIR docs").unwrap(),
            Some(Command::Mkdir {
                folder: "docs/".to_string()
            })
        );
    }

    #[test]
    fn mkdir_rejects_extra_arguments() {
        assert!(matches!(
            parse_line("MKDIR a b").unwrap_err(),
            InputError::Usage(_)
        ));
    }

    #[test]
    fn lowercase_commands_are_unknown() {
        assert_eq!(parse_line("list").unwrap_err(), InputError::Unknown);
        assert_eq!(parse_line("LISTX").unwrap_err(), InputError::Unknown);
    }
}
