//! CLI structure tests.

use clap::Parser;
use mimir::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn parse_run() {
    let cli = Cli::try_parse_from(vec!["mimir", "run", "plan.md"]).unwrap();

    match cli.command {
        Commands::Run { plan, dry_run } => {
            assert_eq!(plan, PathBuf::from("plan.md"));
            assert!(!dry_run);
        }
        _ => panic!("Wrong top-level command"),
    }
    assert!(!cli.json);
    assert!(cli.config.is_none());
}

#[test]
fn parse_run_dry_run_with_json() {
    let cli = Cli::try_parse_from(vec!["mimir", "run", "plan.md", "--dry-run", "--json"]).unwrap();

    match cli.command {
        Commands::Run { dry_run, .. } => assert!(dry_run),
        _ => panic!("Wrong top-level command"),
    }
    assert!(cli.json);
}

#[test]
fn parse_global_config_flag() {
    let cli = Cli::try_parse_from(vec![
        "mimir",
        "plan",
        "plan.md",
        "--config",
        "custom.yaml",
    ])
    .unwrap();

    match cli.command {
        Commands::Plan { plan } => assert_eq!(plan, PathBuf::from("plan.md")),
        _ => panic!("Wrong top-level command"),
    }
    assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
}

#[test]
fn parse_graph() {
    let cli = Cli::try_parse_from(vec!["mimir", "graph", "plan.md"]).unwrap();
    assert!(matches!(cli.command, Commands::Graph { .. }));
}

#[test]
fn missing_plan_argument_fails() {
    assert!(Cli::try_parse_from(vec!["mimir", "run"]).is_err());
}

#[test]
fn unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(vec!["mimir", "deploy", "plan.md"]).is_err());
}
