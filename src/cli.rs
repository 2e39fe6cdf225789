//! Command-line parsing.
//!
//! The classic spelling of the multi-letter flags uses a single dash
//! (`-mat`, `-mesh`, `-atf`, `-regex`). Those are rewritten to their
//! double-dash form before clap sees them, so both spellings work.

use std::ffi::OsString;
use std::path::PathBuf;
use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use crate::rename::{EntityKind, MatchMode, RenameOperation};
use crate::scene::Format;


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cli {
    pub input: PathBuf,
    /// Defaults to `input`.
    pub output: PathBuf,
    /// `-mat` and `-mesh` operations in command-line order.
    pub operations: Vec<RenameOperation>,
    /// `-atf`: re-save as GLB.
    pub binary: bool,
    pub mode: MatchMode,
}

impl Cli {
    /// The storage variant to write, given the one the input was read in.
    pub fn output_format(&self, input: Format) -> Format {
        if self.binary { Format::Binary } else { input }
    }
}


pub fn command() -> Command {
    Command::new("scene-rename")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rename materials and mesh nodes in a glTF scene, optionally re-saving it as GLB")
        .override_usage(
            "scene-rename -i <INPUT> [-o <OUTPUT>] [-mat <OLD> <NEW>]... \
             [-mesh <OLD> <NEW>]... [-atf] [-regex]")
        .arg(Arg::new("input")
            .short('i')
            .long("input")
            .value_name("INPUT")
            .value_parser(value_parser!(PathBuf))
            .allow_hyphen_values(true)
            .required(true)
            .help("Scene file to read (.gltf or .glb)"))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUTPUT")
            .value_parser(value_parser!(PathBuf))
            .allow_hyphen_values(true)
            .help("Where to write the result; overwrites INPUT if omitted"))
        .arg(rename_arg("mat", "Rename materials named OLD to NEW"))
        .arg(rename_arg("mesh", "Replace OLD with NEW in the names of mesh nodes"))
        .arg(Arg::new("atf")
            .long("atf")
            .action(ArgAction::SetTrue)
            .help("Save the result as binary glTF (.glb)"))
        .arg(Arg::new("regex")
            .long("regex")
            .action(ArgAction::SetTrue)
            .help("Treat OLD as a regular expression and NEW as its replacement"))
}

fn rename_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .num_args(2)
        .value_names(["OLD", "NEW"])
        .value_parser(value_parser!(String))
        .allow_hyphen_values(true)
        .action(ArgAction::Append)
        .help(help)
}


/// Rewrites single-dash long flags to double-dash, leaving flag values
/// alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out = Vec::new();
    out.extend(args.next());

    while let Some(arg) = args.next() {
        let (rewritten, values) = match arg.to_str() {
            Some("-mat") | Some("--mat") => (Some("--mat"), 2),
            Some("-mesh") | Some("--mesh") => (Some("--mesh"), 2),
            Some("-atf") => (Some("--atf"), 0),
            Some("-regex") => (Some("--regex"), 0),
            Some("-i") | Some("--input") | Some("-o") | Some("--output") => (None, 1),
            _ => (None, 0),
        };
        match rewritten {
            Some(flag) => out.push(OsString::from(flag)),
            None => out.push(arg),
        }
        out.extend(args.by_ref().take(values));
    }

    out
}

/// Parses a full argument vector, program name first.
///
/// Help and version requests come back as errors of kind
/// [`ErrorKind::DisplayHelp`] / [`ErrorKind::DisplayVersion`].
pub fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut cmd = command();
    let matches = cmd.try_get_matches_from_mut(normalize_args(args))?;

    let mut ordered = Vec::new();
    collect_operations(&matches, "mat", EntityKind::Material, &mut ordered);
    collect_operations(&matches, "mesh", EntityKind::Mesh, &mut ordered);
    ordered.sort_by_key(|&(index, _)| index);
    let operations = ordered.into_iter().map(|(_, op)| op).collect::<Vec<_>>();

    let binary = matches.get_flag("atf");
    if operations.is_empty() && !binary {
        return Err(cmd.error(
            ErrorKind::MissingRequiredArgument,
            "no rename operations (-mat, -mesh) or format conversion (-atf) specified",
        ));
    }

    let input = match matches.get_one::<PathBuf>("input") {
        Some(input) => input.clone(),
        None => return Err(cmd.error(ErrorKind::MissingRequiredArgument, "input file not specified")),
    };
    let output = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| input.clone());
    let mode = if matches.get_flag("regex") { MatchMode::Regex } else { MatchMode::Literal };

    Ok(Cli { input, output, operations, binary, mode })
}

/// Pairs up the values of a two-valued, repeatable flag, keyed by the
/// command-line position of each pair.
fn collect_operations(
    matches: &ArgMatches,
    id: &str,
    kind: EntityKind,
    out: &mut Vec<(usize, RenameOperation)>,
) {
    let (values, indices) = match (matches.get_many::<String>(id), matches.indices_of(id)) {
        (Some(values), Some(indices)) => (values.collect::<Vec<_>>(), indices.collect::<Vec<_>>()),
        _ => return,
    };
    for (pair, index) in values.chunks(2).zip(indices.chunks(2)) {
        if let [old, new] = pair {
            out.push((index[0], RenameOperation::new(kind, old.as_str(), new.as_str())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        parse_from(std::iter::once("scene-rename").chain(args.iter().copied()))
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn rewrites_single_dash_flags_but_not_values() {
        let args = normalize_args(vec![
            "prog", "-i", "-atf", "-mat", "-regex", "-mesh", "-atf", "-regex",
        ]);
        assert_eq!(args, vec![
            "prog", "-i", "-atf", "--mat", "-regex", "-mesh", "--atf", "--regex",
        ]);
    }

    #[test]
    fn keeps_operation_order_across_flags() {
        let cli = parse(&[
            "-i", "in.gltf",
            "-mesh", "A", "B",
            "-mat", "Red", "Green",
            "-mesh", "B", "C",
        ]).unwrap();
        assert_eq!(cli.operations, vec![
            RenameOperation::mesh("A", "B"),
            RenameOperation::material("Red", "Green"),
            RenameOperation::mesh("B", "C"),
        ]);
        assert_eq!(cli.output, PathBuf::from("in.gltf"));
        assert_eq!(cli.mode, MatchMode::Literal);
        assert!(!cli.binary);
    }

    #[test]
    fn reads_output_mode_and_conversion() {
        let cli = parse(&["-i", "in.gltf", "-o", "out.glb", "-atf", "-regex"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("out.glb"));
        assert!(cli.binary);
        assert_eq!(cli.mode, MatchMode::Regex);
        assert!(cli.operations.is_empty());
        assert_eq!(cli.output_format(Format::Json), Format::Binary);
    }

    #[test]
    fn double_dash_spellings_work() {
        let cli = parse(&["--input", "a.glb", "--mat", "x", "y", "--regex"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("a.glb"));
        assert_eq!(cli.operations, vec![RenameOperation::material("x", "y")]);
        assert_eq!(cli.output_format(Format::Binary), Format::Binary);
    }

    #[test]
    fn names_may_start_with_a_dash() {
        let cli = parse(&["-i", "a.gltf", "-mesh", "-old", "-new"]).unwrap();
        assert_eq!(cli.operations, vec![RenameOperation::mesh("-old", "-new")]);
    }

    #[test]
    fn rejects_missing_work_and_bad_arguments() {
        let err = parse(&["-i", "a.gltf"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = parse(&["-mat", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        assert!(parse(&["-i", "a.gltf", "-mat", "only-one"]).is_err());
        assert!(parse(&["-i", "a.gltf", "-bogus"]).is_err());
    }

    #[test]
    fn help_is_reported_as_display_help() {
        let err = parse(&["-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
