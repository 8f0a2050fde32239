//! pbx - command-line tool for Xcode project.pbxproj files
//!
//! Usage: pbx [OPTIONS] [FILE]
//!
//! Reads a project (from FILE or stdin), optionally edits it, and writes it
//! back out as a project file or transcoded to YAML or TOML.
//!
//! Options:
//!   -t, --to <FORMAT>              Output format: pbxproj, yaml, toml
//!   -o, --output <FILE>            Write output to FILE instead of stdout
//!   -w, --write                    Write the project back to FILE
//!   --check                        Only check that the input reads
//!   --target <NAME>                Target for --add-file and --add-framework
//!   --add-file <REAL> <PROJECT>    Reference a file and build it
//!   --add-framework <NAME>         Link a system framework
//!   --weak                         Link the preceding framework weakly
//!   --remove-file <PROJECT_PATH>   Remove a file and its build files
//!   --project-name <NAME>          Name used in the project's list comment
//!   -v, --verbose                  More diagnostics (repeatable)
//!   -h, --help                     Print help
//!   -V, --version                  Print version

mod logging;
mod transcode;

use libpbx::{file_types, EditSession, Project, SourceTree, WriteOptions};
use std::fs;
use std::io::{self, Read, Write};
use std::process;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Pbxproj,
    Yaml,
    Toml,
}

/// One requested change, applied in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    AddFile { real: String, project: String },
    AddFramework { name: String, weak: bool },
    RemoveFile(String),
}

impl Edit {
    fn needs_target(&self) -> bool {
        !matches!(self, Edit::RemoveFile(_))
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut to_format: Option<&str> = None;
    let mut write_back = false;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut input_path: Option<&str> = None;
    let mut target: Option<&str> = None;
    let mut project_name: Option<&str> = None;
    let mut edits: Vec<Edit> = Vec::new();
    let mut verbosity: u8 = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("pbx {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-t" | "--to" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -t requires a format argument");
                    process::exit(1);
                }
                if parse_format(&args[i]).is_none() {
                    eprintln!("Error: Unknown format: {}", args[i]);
                    process::exit(1);
                }
                to_format = Some(&args[i]);
            }
            "-w" | "--write" => {
                write_back = true;
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "--check" => {
                check_only = true;
            }
            "--target" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --target requires a target name");
                    process::exit(1);
                }
                target = Some(&args[i]);
            }
            "--add-file" => {
                if i + 2 >= args.len() {
                    eprintln!("Error: --add-file requires a real path and a project path");
                    process::exit(1);
                }
                edits.push(Edit::AddFile {
                    real: args[i + 1].clone(),
                    project: args[i + 2].clone(),
                });
                i += 2;
            }
            "--add-framework" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --add-framework requires a framework name");
                    process::exit(1);
                }
                edits.push(Edit::AddFramework {
                    name: args[i].clone(),
                    weak: false,
                });
            }
            "--weak" => match edits.last_mut() {
                Some(Edit::AddFramework { weak, .. }) => *weak = true,
                _ => {
                    eprintln!("Error: --weak must follow --add-framework");
                    process::exit(1);
                }
            },
            "--remove-file" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --remove-file requires a project path");
                    process::exit(1);
                }
                edits.push(Edit::RemoveFile(args[i].clone()));
            }
            "--project-name" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --project-name requires a name");
                    process::exit(1);
                }
                project_name = Some(&args[i]);
            }
            "-v" | "--verbose" => {
                verbosity = verbosity.saturating_add(1);
            }
            "-" => {
                // Explicit stdin
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input files specified");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    logging::init(verbosity);

    let output_format = to_format.and_then(parse_format).unwrap_or(Format::Pbxproj);
    let options = match project_name {
        Some(name) => WriteOptions {
            project_name: name.to_string(),
        },
        None => WriteOptions::default(),
    };

    // Validate options
    if write_back && output_file.is_some() {
        eprintln!("Error: --write and --output are mutually exclusive");
        process::exit(1);
    }
    if write_back && output_format != Format::Pbxproj {
        eprintln!("Error: --write only writes pbxproj");
        process::exit(1);
    }
    if edits.iter().any(Edit::needs_target) && target.is_none() {
        eprintln!("Error: --add-file and --add-framework require --target");
        process::exit(1);
    }

    if write_back {
        let Some(path) = input_path else {
            eprintln!("Error: --write requires an input file");
            process::exit(1);
        };
        process::exit(edit_in_place(path, target, &edits, options));
    }

    let input = match input_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    let exit_code = process_input(
        &input,
        input_path,
        output_format,
        output_file,
        check_only,
        target,
        &edits,
        &options,
    );
    process::exit(exit_code);
}

fn parse_format(s: &str) -> Option<Format> {
    match s {
        "pbxproj" => Some(Format::Pbxproj),
        "yaml" | "yml" => Some(Format::Yaml),
        "toml" => Some(Format::Toml),
        _ => None,
    }
}

/// Read, edit and write one project file through an edit session.
fn edit_in_place(path: &str, target: Option<&str>, edits: &[Edit], options: WriteOptions) -> i32 {
    let mut session = match EditSession::open(path) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    session.set_write_options(options);

    if let Err(e) = apply_edits(&mut session, target, edits) {
        eprintln!("Error: {}", e);
        session.discard();
        return 1;
    }

    match session.close() {
        Ok(()) => {
            info!(path, edits = edits.len(), "project written");
            0
        }
        Err(e) => {
            eprintln!("Error writing {}: {}", path, e);
            1
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_input(
    input: &str,
    input_path: Option<&str>,
    output_format: Format,
    output_file: Option<&str>,
    check_only: bool,
    target: Option<&str>,
    edits: &[Edit],
    options: &WriteOptions,
) -> i32 {
    let filename = input_path.unwrap_or("<stdin>");
    let mut project = match Project::read_from_string_with_filename(input, Some(filename)) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if check_only {
        println!("{}: ok", filename);
        return 0;
    }

    if let Err(e) = apply_edits(&mut project, target, edits) {
        eprintln!("Error: {}", e);
        return 1;
    }

    let output = match output_format {
        Format::Pbxproj => project.write_to_string_with(options),
        Format::Yaml => match transcode::yaml::encode(&transcode::project_tree(&project)) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        Format::Toml => transcode::toml::encode(&transcode::project_tree(&project)),
    };

    match output_file {
        Some(path) => {
            if let Err(e) = fs::write(path, &output) {
                eprintln!("Error writing {}: {}", path, e);
                return 1;
            }
            debug!(path, bytes = output.len(), "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()) {
                eprintln!("Error writing stdout: {}", e);
                return 1;
            }
        }
    }
    0
}

/// Apply `edits` in order, stopping at the first failure.
fn apply_edits(project: &mut Project, target: Option<&str>, edits: &[Edit]) -> Result<(), String> {
    if edits.is_empty() {
        return Ok(());
    }
    let target = match target {
        Some(name) => Some(
            project
                .target_guid_by_name(name)
                .ok_or_else(|| format!("No target named {}", name))?,
        ),
        None => None,
    };

    for edit in edits {
        debug!(?edit, "applying edit");
        match (edit, &target) {
            (Edit::AddFile { real, project: path }, Some(target)) => {
                let file = project
                    .add_file(real, path, SourceTree::Source)
                    .map_err(|e| e.to_string())?;
                if file_types::is_buildable(&file_types::extension(real)) {
                    project
                        .add_file_to_build(target, &file)
                        .map_err(|e| e.to_string())?;
                }
            }
            (Edit::AddFramework { name, weak }, Some(target)) => {
                project
                    .add_framework_to_project(target, name, *weak)
                    .map_err(|e| e.to_string())?;
            }
            (Edit::RemoveFile(path), _) => {
                let file = project
                    .find_file_guid_by_project_path(path)
                    .ok_or_else(|| format!("No file at project path {}", path))?;
                project.remove_file(&file).map_err(|e| e.to_string())?;
            }
            (_, None) => return Err("--add-file and --add-framework require --target".to_string()),
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "pbx - Xcode project.pbxproj command-line tool

USAGE:
    pbx [OPTIONS] [FILE]

ARGS:
    [FILE]    Input project file (reads from stdin if not provided)

OPTIONS:
    -t, --to <FORMAT>              Output format [default: pbxproj]
                                   Supported: pbxproj, yaml, toml

    -o, --output <FILE>            Write output to the specified file

    -w, --write                    Write the edited project back to FILE

    --check                        Check if input reads (exit 0 if valid, 1 if invalid)

    --target <NAME>                Native target that --add-file and
                                   --add-framework build into

    --add-file <REAL> <PROJECT>    Reference REAL at PROJECT in the group tree
                                   and add it to the matching build phase

    --add-framework <NAME>         Link a system framework, e.g. StoreKit.framework

    --weak                         Link the preceding --add-framework weakly

    --remove-file <PROJECT_PATH>   Remove a file, its build files and its place
                                   in the group tree

    --project-name <NAME>          Project name used in the configuration list
                                   comment [default: {}]

    -v, --verbose                  Increase diagnostics on stderr (repeatable);
                                   RUST_LOG overrides

    -h, --help                     Print help
    -V, --version                  Print version

EXAMPLES:
    pbx --check project.pbxproj
    pbx -t yaml project.pbxproj
    pbx -w --target Unity-iPhone --add-framework StoreKit.framework --weak project.pbxproj
    pbx -w --remove-file Classes/Old.m project.pbxproj",
        libpbx::DEFAULT_PROJECT_NAME
    );
}
