//! Binding a real clap command into the resolver through the flag capabilities.

use std::collections::HashSet;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use flagbind::config::{ConfigFormat, Resolver, ValueSource};
use flagbind::flags::{ClapValueSet, FlagValue, FlagValueSet, StaticFlag, StaticFlagSet, flag_names};
use serde_json::json;

fn host_command() -> Command {
    Command::new("svc").arg(Arg::new("host").long("host").default_value("localhost"))
}

fn parse(command: &Command, args: &[&str]) -> ArgMatches {
    command
        .clone()
        .try_get_matches_from(std::iter::once("svc").chain(args.iter().copied()))
        .unwrap()
}

fn snapshot(set: &dyn FlagValueSet) -> Vec<(String, String, String, bool)> {
    let mut flags = Vec::new();
    set.visit_all(&mut |flag| {
        flags.push((
            flag.name().to_string(),
            flag.value_string(),
            flag.value_type().to_string(),
            flag.has_changed(),
        ))
    });
    flags
}

#[test]
fn test_host_scenario() {
    let command = host_command();

    let defaults = parse(&command, &[]);
    let set = ClapValueSet::new(&command, &defaults).unwrap();
    assert_eq!(
        snapshot(&set),
        vec![(
            "host".to_string(),
            "localhost".to_string(),
            "string".to_string(),
            false
        )]
    );

    let explicit = parse(&command, &["--host", "example.com"]);
    let set = ClapValueSet::new(&command, &explicit).unwrap();
    let flags = snapshot(&set);
    assert_eq!(flags[0].1, "example.com");
    assert!(flags[0].3);
}

#[test]
fn test_every_flag_visited_exactly_once() {
    const NAMES: [&str; 10] = [
        "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india",
        "juliet",
    ];
    let command = NAMES
        .iter()
        .fold(Command::new("svc"), |cmd, name| cmd.arg(Arg::new(*name).long(*name)));
    let matches = parse(&command, &["--delta", "x"]);
    let set = ClapValueSet::new(&command, &matches).unwrap();

    let names = flag_names(&set);
    let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(names.len(), NAMES.len());
    assert_eq!(distinct, NAMES.iter().copied().collect::<HashSet<_>>());
}

#[test]
fn test_same_declared_type_same_tag() {
    let command = Command::new("svc")
        .arg(Arg::new("a").long("a").value_parser(value_parser!(i64)))
        .arg(Arg::new("b").long("b").value_parser(value_parser!(i64)).default_value("1"))
        .arg(Arg::new("x").long("x").action(ArgAction::SetTrue))
        .arg(Arg::new("y").long("y").action(ArgAction::SetTrue));
    let matches = parse(&command, &["--a", "5", "--y"]);
    let set = ClapValueSet::new(&command, &matches).unwrap();

    let tags: Vec<String> = snapshot(&set).into_iter().map(|f| f.2).collect();
    assert_eq!(tags, vec!["int64", "int64", "bool", "bool"]);
}

#[test]
fn test_resolver_only_sees_capabilities() {
    let command = Command::new("svc")
        .arg(Arg::new("host").long("host").default_value("localhost"))
        .arg(
            Arg::new("port")
                .long("port")
                .value_parser(value_parser!(u16))
                .default_value("8080"),
        );
    let matches = parse(&command, &["--port", "8080"]);
    let set = ClapValueSet::new(&command, &matches).unwrap();

    let mut resolver = Resolver::new().with_env_lookup(|_| None);
    resolver.bind_flag_values(&set);
    resolver.merge_config_str(ConfigFormat::Toml, "host = \"db.internal\"\nport = 9000").unwrap();

    // Unset flag yields to the config file.
    let host = resolver.resolve("host").unwrap().unwrap();
    assert_eq!(host.value, json!("db.internal"));

    // Explicit flag wins even though it equals its default.
    let port = resolver.resolve("port").unwrap().unwrap();
    assert_eq!(port.value, json!(8080));
    assert_eq!(port.source, ValueSource::Flag);
}

#[test]
fn test_clap_and_static_sets_bind_identically() {
    let command = host_command();
    let matches = parse(&command, &["--host", "example.com"]);
    let clap_set = ClapValueSet::new(&command, &matches).unwrap();

    let mut static_set = StaticFlagSet::new();
    static_set.insert(StaticFlag::new("host", "localhost", "string")).unwrap();
    static_set.set("host", "example.com").unwrap();

    assert_eq!(snapshot(&clap_set), snapshot(&static_set));
}

#[test]
fn test_subcommand_flags() {
    let command = Command::new("svc").subcommand(
        Command::new("serve").arg(
            Arg::new("workers")
                .long("workers")
                .value_parser(value_parser!(u32))
                .default_value("2"),
        ),
    );
    let matches = parse(&command, &["serve", "--workers", "8"]);

    let serve = command.find_subcommand("serve").unwrap();
    let serve_matches = matches.subcommand_matches("serve").unwrap();
    let set = ClapValueSet::new(serve, serve_matches).unwrap();

    assert_eq!(
        snapshot(&set),
        vec![(
            "workers".to_string(),
            "8".to_string(),
            "uint32".to_string(),
            true
        )]
    );
}

#[test]
fn test_accessors_repeatable() {
    let command = host_command();
    let matches = parse(&command, &["--host", "a"]);
    let set = ClapValueSet::new(&command, &matches).unwrap();

    assert_eq!(snapshot(&set), snapshot(&set));
    set.visit_all(&mut |flag: &dyn FlagValue| {
        assert_eq!(flag.value_string(), flag.value_string());
        assert_eq!(flag.value_type(), flag.value_type());
        assert_eq!(flag.has_changed(), flag.has_changed());
    });
}

#[test]
fn test_every_accepted_command_line_resolves() {
    let command = Command::new("svc")
        .arg(
            Arg::new("tls")
                .long("tls")
                .value_parser(clap::builder::BoolishValueParser::new()),
        )
        .arg(Arg::new("ratio").long("ratio").value_parser(value_parser!(f64)))
        .arg(Arg::new("tag").long("tag").action(ArgAction::Append));
    let matches = parse(&command, &["--tls", "yes", "--ratio", "inf", "--tag", ""]);
    let set = ClapValueSet::new(&command, &matches).unwrap();

    let mut resolver = Resolver::new().with_env_lookup(|_| None);
    resolver.bind_flag_values(&set);

    assert_eq!(resolver.get::<bool>("tls").unwrap(), Some(true));
    assert_eq!(resolver.resolve("ratio").unwrap().unwrap().value, json!("inf"));
    assert_eq!(resolver.get::<Vec<String>>("tag").unwrap(), Some(vec![String::new()]));
    assert_eq!(resolver.all_settings().unwrap().len(), 3);
}
