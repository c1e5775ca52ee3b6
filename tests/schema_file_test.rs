use anyhow::Result;
use deckparse::config::schema_file::SchemaFile;
use deckparse::{DeckError, ParseOptions, Parser, SchemaRegistry};
use std::sync::Arc;

const AQUIFER_SCHEMAS: &str = r#"
[[keyword]]
name = "AQUCT"
records = "unbounded"

[[keyword.items]]
name = "ID"
type = "int"

[[keyword.items]]
name = "DATUM_DEPTH"
type = "float"
dimension = "Length"

[[keyword.items]]
name = "PERM"
type = "float"
default = 100

[[keyword]]
name = "VFPINJ"
records = 2

[[keyword.variants]]
items = [
    { name = "TABLE", type = "int" },
    { name = "DATUM", type = "float" },
]

[[keyword.variants]]
items = [{ name = "FLOWS", type = "float", tail = true }]

[[keyword]]
name = "NOGRAV"
records = "none"
"#;

fn registry() -> Result<Arc<SchemaRegistry>> {
    let mut registry = SchemaRegistry::builtin()?;
    SchemaFile::from_toml_str(AQUIFER_SCHEMAS)?.register_into(&mut registry)?;
    Ok(Arc::new(registry))
}

#[test]
fn test_parse_with_loaded_schemas() -> Result<()> {
    let parser = Parser::new(registry()?, ParseOptions::strict());
    let deck = parser.parse_str(
        "NOGRAV\nAQUCT\n1 2000 * /\n2 2100 250 /\n/\nVFPINJ\n1 7000 /\n\n100 200 300 /\n",
        "AQ.DATA",
    )?;

    assert_eq!(deck.keyword_names(), vec!["NOGRAV", "AQUCT", "VFPINJ"]);

    let aquifer = deck.first("AQUCT").unwrap();
    assert_eq!(aquifer.records().len(), 2);
    let first = aquifer.record(0).unwrap();
    assert_eq!(first.item("PERM").unwrap().float(0), Some(100.0));
    assert!(first.item("PERM").unwrap().is_defaulted(0));
    assert!(first.item("DATUM_DEPTH").unwrap().unit_convertible());

    let vfp = deck.first("VFPINJ").unwrap();
    assert_eq!(vfp.record(0).unwrap().item("TABLE").unwrap().int(0), Some(1));
    assert_eq!(vfp.record(1).unwrap().item("FLOWS").unwrap().len(), 3);
    Ok(())
}

#[test]
fn test_strict_mode_with_loaded_schema() -> Result<()> {
    let parser = Parser::new(registry()?, ParseOptions::strict());
    let err = parser
        .parse_str("AQUCT\n1 2000 /\n/\n", "AQ.DATA")
        .unwrap_err();

    assert!(matches!(
        err,
        DeckError::MissingRequiredItem { ref item, .. } if item == "PERM"
    ));
    Ok(())
}

#[test]
fn test_duplicate_schema_is_rejected() -> Result<()> {
    let mut registry = SchemaRegistry::builtin()?;
    let duplicate = SchemaFile::from_toml_str(
        "[[keyword]]\nname = \"start\"\n[[keyword.items]]\nname = \"DAY\"\ntype = \"int\"\n",
    )?;

    let err = duplicate.register_into(&mut registry).unwrap_err();
    assert!(matches!(err, DeckError::DuplicateKeyword { ref keyword } if keyword == "START"));
    assert_eq!(err.category(), deckparse::utils::error::ErrorCategory::Schema);
    Ok(())
}

#[test]
fn test_invalid_schema_default() -> Result<()> {
    let mut registry = SchemaRegistry::new();
    let bad = SchemaFile::from_toml_str(
        "[[keyword]]\nname = \"BAD\"\n[[keyword.items]]\nname = \"N\"\ntype = \"int\"\ndefault = \"many\"\n",
    )?;

    assert!(matches!(
        bad.register_into(&mut registry),
        Err(DeckError::InvalidSchema { .. })
    ));
    assert!(registry.is_empty());
    Ok(())
}
