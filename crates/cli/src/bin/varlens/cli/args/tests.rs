use clap::{CommandFactory, FromArgMatches};

use super::options::{PeopleArg, SortArg, SubFilterArg};
use super::{CliArgs, OutputFormat};

fn parse(args: &[&str]) -> CliArgs {
	let mut matches = CliArgs::command().get_matches_from(args.iter().copied());
	CliArgs::from_arg_matches_mut(&mut matches).expect("parses")
}

#[test]
fn command_definition_is_consistent() {
	CliArgs::command().debug_assert();
}

#[test]
fn parse_cli_accepts_default_arguments() {
	let parsed = parse(&["varlens"]);
	assert_eq!(parsed.output, OutputFormat::Plain);
	assert_eq!(parsed.page, 0);
	assert!(parsed.scopes.is_empty());
}

#[test]
fn list_flags_split_on_commas_and_repeat() {
	let parsed = parse(&[
		"varlens",
		"-e",
		"json,vap",
		"-s",
		"Saves/scene/",
		"-s",
		"Custom/",
		"--people",
		"single,dual",
		"--sub",
		"female,items",
		"--sort",
		"size-largest",
		"-vv",
	]);
	assert_eq!(parsed.extensions, Some(vec!["json".to_string(), "vap".to_string()]));
	assert_eq!(parsed.scopes, vec!["Saves/scene/", "Custom/"]);
	assert_eq!(parsed.people, vec![PeopleArg::Single, PeopleArg::Dual]);
	assert_eq!(parsed.sub_filters, vec![SubFilterArg::Female, SubFilterArg::Items]);
	assert_eq!(parsed.sort, Some(SortArg::SizeLargest));
	assert_eq!(parsed.verbose, 2);
}

#[test]
fn rating_outside_star_range_is_rejected() {
	let result = CliArgs::command().try_get_matches_from(["varlens", "--rating", "6"]);
	assert!(result.is_err());
}
