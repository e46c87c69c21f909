use std::path::PathBuf;

use d2_slides::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};
use d2_slides::options::{DiagramProps, LayoutEngine};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".d2slidesrc");
    let content = r#"
# comment
--sketch

--theme grape-soda

--d2-bin=/opt/d2/bin/d2
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.sketch);
    assert_eq!(flags.theme.as_deref(), Some("grape-soda"));
    assert_eq!(flags.d2_bin, Some(PathBuf::from("/opt/d2/bin/d2")));
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".d2slidesrc");
    let content = "--watch\n--appearance light\n--layout elk --pad 40\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "d2-slides".to_string(),
        "--appearance".to_string(),
        "dark".to_string(),
        "--fit".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.fit, "cli flags should be applied");
    assert_eq!(effective.appearance, Some(ThemeMode::Dark), "cli should override appearance");
    assert_eq!(
        effective.layout,
        Some(LayoutEngine::Elk),
        "file config should be preserved when CLI does not override"
    );
    assert_eq!(effective.pad, Some(40.0));
}

#[test]
fn test_merged_flags_shape_diagram_props() {
    let file = parse_flag_tokens(&["--theme=terminal".to_string(), "--sketch".to_string()]);
    let cli = parse_flag_tokens(&["--theme=4".to_string()]);
    let props = file.union(&cli).apply_to(DiagramProps::new("a -> b"));

    assert_eq!(props.theme_id, Some(4));
    assert!(props.sketch);
    assert_eq!(props.code, "a -> b");
}
