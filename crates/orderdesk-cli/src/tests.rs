use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["orderdesk", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["orderdesk", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_stores_leads_command() {
    let cli = Cli::try_parse_from(["orderdesk", "stores", "leads"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Stores {
            command: StoresCommands::Leads
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["orderdesk"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn import_defaults() {
    let cli = Cli::try_parse_from(["orderdesk", "import", "orders.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            ref file,
            actor_id: None,
            actor_role: ActorRole::Admin,
            fuzzy_threshold: None,
            dry_run: false,
            json: false,
        }) if file == &PathBuf::from("orders.csv")
    ));
}

#[test]
fn import_with_all_flags() {
    let cli = Cli::try_parse_from([
        "orderdesk",
        "import",
        "orders.csv",
        "--actor-id",
        "7",
        "--actor-role",
        "sub-salesman",
        "--fuzzy-threshold",
        "0.9",
        "--dry-run",
        "--json",
    ])
    .unwrap();

    let Some(Commands::Import {
        actor_id,
        actor_role,
        fuzzy_threshold,
        dry_run,
        json,
        ..
    }) = cli.command
    else {
        panic!("expected import command");
    };
    assert_eq!(actor_id, Some(7));
    assert_eq!(actor_role, ActorRole::Subsalesman);
    assert_eq!(fuzzy_threshold, Some(0.9));
    assert!(dry_run);
    assert!(json);
}

#[test]
fn import_requires_a_file() {
    assert!(Cli::try_parse_from(["orderdesk", "import"]).is_err());
}

#[test]
fn import_rejects_threshold_outside_unit_interval() {
    assert!(
        Cli::try_parse_from(["orderdesk", "import", "o.csv", "--fuzzy-threshold", "1.5"]).is_err()
    );
    assert!(
        Cli::try_parse_from(["orderdesk", "import", "o.csv", "--fuzzy-threshold", "high"])
            .is_err()
    );
}

#[test]
fn import_rejects_unknown_role() {
    assert!(
        Cli::try_parse_from(["orderdesk", "import", "o.csv", "--actor-role", "owner"]).is_err()
    );
}
