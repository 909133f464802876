use super::*;

#[test]
fn test_database_file() {
    assert_eq!(database_file("duckdb:warehouse.duckdb"), Some("warehouse.duckdb"));
    assert_eq!(database_file("sqlite:/var/lib/app.db"), Some("/var/lib/app.db"));
    assert_eq!(database_file("duckdb::memory:"), None);
    assert_eq!(database_file("sqlite:"), None);
    assert_eq!(database_file("postgres://host/app"), None);
    assert_eq!(database_file("no-scheme"), None);
}

#[test]
fn test_resolve_url_relative_to_root() {
    let root = Path::new("/srv/project");
    assert_eq!(
        resolve_url(root, "duckdb:data/warehouse.duckdb"),
        format!("duckdb:{}", root.join("data/warehouse.duckdb").display())
    );
    assert_eq!(resolve_url(root, "sqlite:/abs/app.db"), "sqlite:/abs/app.db");
    assert_eq!(resolve_url(root, "duckdb::memory:"), "duckdb::memory:");
    assert_eq!(
        resolve_url(root, "jdbc:mysql://localhost/app"),
        "jdbc:mysql://localhost/app"
    );
}

#[test]
fn test_calculate_column_widths() {
    let widths = calculate_column_widths(
        &["VERSION", "NAME"],
        &[
            vec!["001".to_string(), "create_books".to_string()],
            vec!["20240101120000".to_string(), "x".to_string()],
        ],
    );
    assert_eq!(widths, vec![14, 12]);
}

#[test]
fn test_load_project_from_dir_and_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keel.yml"), "url: \"duckdb::memory:\"\n").unwrap();
    std::fs::write(
        dir.path().join("other.yml"),
        "url: \"sqlite::memory:\"\nledger_table: history\n",
    )
    .unwrap();

    let mut global = GlobalArgs {
        verbose: false,
        project_dir: dir.path().display().to_string(),
        config: None,
        env: None,
    };
    let project = load_project(&global).unwrap();
    assert_eq!(project.config.url, "duckdb::memory:");

    global.config = Some(dir.path().join("other.yml").display().to_string());
    let project = load_project(&global).unwrap();
    assert_eq!(project.config.ledger_table, "history");
}

#[test]
fn test_load_project_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let global = GlobalArgs {
        verbose: false,
        project_dir: dir.path().display().to_string(),
        config: None,
        env: None,
    };
    let err = load_project(&global).unwrap_err();
    assert!(format!("{err:#}").contains("E001"));
}
