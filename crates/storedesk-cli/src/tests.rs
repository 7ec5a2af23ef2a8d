use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["storedesk", "db", "ping"]).expect("expected valid cli args");

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
        Cli::try_parse_from(["storedesk", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn db_seed_is_not_a_command() {
    assert!(Cli::try_parse_from(["storedesk", "db", "seed"]).is_err());
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["storedesk"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults_to_auto_without_screenshot() {
    let cli = Cli::try_parse_from(["storedesk", "scrape", "https://shop.example.com/p/1"]).unwrap();
    let Some(Commands::Scrape {
        url,
        mode,
        screenshot,
        analysis,
    }) = cli.command
    else {
        panic!("unexpected command variant");
    };
    assert_eq!(url, "https://shop.example.com/p/1");
    assert_eq!(mode, ScrapeMode::Auto);
    assert!(!screenshot);
    assert!(!analysis);
}

#[test]
fn scrape_accepts_mode_and_flags() {
    let cli = Cli::try_parse_from([
        "storedesk",
        "scrape",
        "https://smartstore.naver.com/shop/products/1",
        "--mode",
        "browser",
        "--screenshot",
        "--analysis",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            mode: ScrapeMode::Browser,
            screenshot: true,
            analysis: true,
            ..
        })
    ));
}

#[test]
fn scrape_rejects_unknown_mode() {
    let result = Cli::try_parse_from([
        "storedesk",
        "scrape",
        "https://shop.example.com",
        "--mode",
        "headless",
    ]);
    assert!(result.is_err());
}

#[test]
fn scrape_requires_url() {
    assert!(Cli::try_parse_from(["storedesk", "scrape"]).is_err());
}

#[test]
fn parses_validate_url() {
    let cli =
        Cli::try_parse_from(["storedesk", "validate-url", "https://m.coupang.com/vp/1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::ValidateUrl { ref url }) if url == "https://m.coupang.com/vp/1"
    ));
}

#[test]
fn parses_carriers_subcommands() {
    let cli = Cli::try_parse_from(["storedesk", "carriers", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Carriers {
            command: CarrierCommands::List
        })
    ));

    let cli = Cli::try_parse_from(["storedesk", "carriers", "predict", "6865-1234-5678"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Carriers {
            command: CarrierCommands::Predict { ref tracking_number }
        }) if tracking_number == "6865-1234-5678"
    ));
}

#[test]
fn track_store_and_memo_are_optional() {
    let cli = Cli::try_parse_from(["storedesk", "track", "CJ", "123456789012"]).unwrap();
    let Some(Commands::Track {
        carrier,
        tracking_number,
        store,
        memo,
    }) = cli.command
    else {
        panic!("unexpected command variant");
    };
    assert_eq!(carrier, "CJ");
    assert_eq!(tracking_number, "123456789012");
    assert!(store.is_none());
    assert!(memo.is_none());
}

#[test]
fn track_with_store_and_memo() {
    let cli = Cli::try_parse_from([
        "storedesk",
        "track",
        "HANJIN",
        "TEST01",
        "--store",
        "store-1",
        "--memo",
        "gift wrap",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Track {
            store: Some(ref s),
            memo: Some(ref m),
            ..
        }) if s == "store-1" && m == "gift wrap"
    ));
}

#[test]
fn trackings_list_parses_status_filter() {
    let cli = Cli::try_parse_from([
        "storedesk",
        "trackings",
        "list",
        "--store",
        "store-1",
        "--status",
        "in-progress",
    ])
    .unwrap();
    let Some(Commands::Trackings {
        command: TrackingCommands::List { store, status },
    }) = cli.command
    else {
        panic!("unexpected command variant");
    };
    assert_eq!(store, "store-1");
    assert_eq!(status.map(DeliveryStatus::from), Some(DeliveryStatus::InProgress));
}

#[test]
fn trackings_list_requires_store() {
    assert!(Cli::try_parse_from(["storedesk", "trackings", "list"]).is_err());
}

#[test]
fn trackings_delete_parses_id() {
    let cli = Cli::try_parse_from(["storedesk", "trackings", "delete", "42", "--store", "s"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Trackings {
            command: TrackingCommands::Delete { id: 42, .. }
        })
    ));
}

#[test]
fn trackings_delete_rejects_non_numeric_id() {
    let result = Cli::try_parse_from(["storedesk", "trackings", "delete", "abc", "--store", "s"]);
    assert!(result.is_err());
}

#[test]
fn deliveries_check_defaults() {
    let cli = Cli::try_parse_from(["storedesk", "deliveries", "check"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Deliveries {
            command: DeliveryCommands::Check {
                store: None,
                limit: None
            }
        })
    ));
}

#[test]
fn deliveries_check_with_store_and_limit() {
    let cli = Cli::try_parse_from([
        "storedesk",
        "deliveries",
        "check",
        "--store",
        "store-1",
        "--limit",
        "25",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Deliveries {
            command: DeliveryCommands::Check {
                store: Some(ref s),
                limit: Some(25)
            }
        }) if s == "store-1"
    ));
}

#[test]
fn deliveries_watch_collects_repeated_stores() {
    let cli = Cli::try_parse_from([
        "storedesk",
        "deliveries",
        "watch",
        "--store",
        "a",
        "--store",
        "b",
    ])
    .unwrap();
    let Some(Commands::Deliveries {
        command: DeliveryCommands::Watch { stores },
    }) = cli.command
    else {
        panic!("unexpected command variant");
    };
    assert_eq!(stores, vec!["a", "b"]);
}

#[test]
fn deliveries_watch_without_stores_is_empty() {
    let cli = Cli::try_parse_from(["storedesk", "deliveries", "watch"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Deliveries {
            command: DeliveryCommands::Watch { ref stores }
        }) if stores.is_empty()
    ));
}
