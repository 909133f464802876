use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from(["keel", "migrate", "--env", "dev,test", "-p", "proj"]).unwrap();
    assert!(matches!(cli.command, Commands::Migrate));
    assert_eq!(cli.global.env.as_deref(), Some("dev,test"));
    assert_eq!(cli.global.project_dir, "proj");
    assert!(!cli.global.verbose);
}

#[test]
fn test_status_output_default_and_json() {
    let cli = Cli::try_parse_from(["keel", "status"]).unwrap();
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, StatusOutput::Table),
        other => panic!("unexpected command {other:?}"),
    }

    let cli = Cli::try_parse_from(["keel", "status", "-o", "json"]).unwrap();
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, StatusOutput::Json),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_new_requires_name() {
    assert!(Cli::try_parse_from(["keel", "new"]).is_err());

    let cli = Cli::try_parse_from(["keel", "new", "add_keyspace", "--extension", "cql"]).unwrap();
    match cli.command {
        Commands::New(args) => {
            assert_eq!(args.name, "add_keyspace");
            assert_eq!(args.extension.as_str(), "cql");
        }
        other => panic!("unexpected command {other:?}"),
    }
}
