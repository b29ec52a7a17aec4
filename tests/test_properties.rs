//! Integration tests for property tables and the script built-ins

#[path = "common/mod.rs"]
mod common;
#[allow(unused_imports)]
use common::{drain, scanner_for, scanner_for_file, ScriptDir};

use bscript::{ScanError, ENVIRONMENT_LABEL};

#[test]
fn set_property_guarded_first_write_wins() {
    let (mut scanner, _) = scanner_for("setProperty ?X=1\nsetProperty ?X=2\n");
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert_eq!(registry.global("X"), Some("1"));
}

#[test]
fn set_property_unguarded_overwrites() {
    let (mut scanner, _) = scanner_for("setProperty X=1\nsetProperty X=2\n");
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert_eq!(registry.global("X"), Some("2"));
}

#[test]
fn set_property_expands_key_and_value() {
    let (mut scanner, _) = scanner_for(
        "setProperty suffix=prod\nsetProperty host.${suffix}=db.${suffix}.local\n",
    );
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert_eq!(registry.global("host.prod"), Some("db.prod.local"));
}

#[test]
fn properties_loads_a_flat_table() {
    let dir = ScriptDir::new();
    let props = dir.write("conn.props", "host=localhost\nport=5432\n# note\n");
    let (mut scanner, _) = scanner_for(&format!("properties db={}\n", props.display()));
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert_eq!(registry.get("db", "host"), Some("localhost"));
    assert_eq!(registry.get("db", "port"), Some("5432"));
}

#[test]
fn properties_merges_into_existing_label() {
    let dir = ScriptDir::new();
    let first = dir.write("first.props", "a=1\nb=1\n");
    let second = dir.write("second.props", "b=2\nc=3\n");
    let (mut scanner, _) = scanner_for(&format!(
        "properties t={}\nproperties t={}\n",
        first.display(),
        second.display()
    ));
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert_eq!(registry.get("t", "a"), Some("1"));
    assert_eq!(registry.get("t", "b"), Some("2"));
    assert_eq!(registry.get("t", "c"), Some("3"));
}

#[test]
fn optional_missing_properties_file_is_empty_contribution() {
    let (mut scanner, _) = scanner_for("properties P=?missing.props\nnext\n");
    assert_eq!(drain(&mut scanner), vec!["next"]);
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert!(registry.has_table("P"));
    assert_eq!(registry.table_len("P"), 0);
}

#[test]
fn required_missing_properties_file_errors() {
    let (mut scanner, _) = scanner_for("properties P=missing.props\n");
    assert!(matches!(
        scanner.has_next_line(),
        Err(ScanError::NotFound { .. })
    ));
}

#[test]
fn optional_then_undefined_macro_scenario() {
    // the `properties` line alone must be error-free; the failure comes
    // from the later undefined reference
    let (mut scanner, _) = scanner_for(
        "# header\nproperties P=?missing.props\nsetProperty Y=${P:does-not-exist}\nprint Y=${Y}\n",
    );
    match scanner.has_next_line() {
        Err(ScanError::Macro(_)) => {}
        other => panic!("expected a macro error, got {:?}", other),
    }
    // the optional table was still registered before the failure
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert!(registry.has_table("P"));
}

#[test]
fn environment_seeding_feeds_macros() {
    std::env::set_var("BSCRIPT_IT_VAR", "seeded");
    let buf = common::SharedBuf::default();
    let mut scanner = bscript::Scanner::script(
        bscript::PropertyRegistry::shared(),
        std::rc::Rc::new(common::BasicEvaluator),
    )
    .unwrap()
    .with_output(Box::new(buf.clone()))
    .with_environment();
    scanner.open_literal("inline", "got ${BSCRIPT_IT_VAR}\n", true, false);
    assert_eq!(scanner.next_line().unwrap(), "got seeded");
    let registry = scanner.registry();
    let registry = registry.borrow();
    assert!(registry.has_table(ENVIRONMENT_LABEL));
}

#[test]
fn labels_are_never_removed() {
    let dir = ScriptDir::new();
    let props = dir.write("a.props", "k=v\n");
    let (mut scanner, _) = scanner_for(&format!(
        "properties one={}\nproperties two={}\nsetProperty g=1\n",
        props.display(),
        props.display()
    ));
    assert!(!scanner.has_next_line().unwrap());
    let registry = scanner.registry();
    let registry = registry.borrow();
    let labels: Vec<&str> = registry.labels().collect();
    assert_eq!(labels, vec!["one", "two", bscript::GLOBALS_LABEL]);
}
