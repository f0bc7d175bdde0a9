//! Integration tests for package scanning and mapper location resolution

mod common;

use common::{RecordingParser, StaticDataSource};
use mapforge_orm::{
    global_type_index, register_type, ConfigurationAssembler, ResourceScanner, ScanError,
    StaticTypeIndex, TypeFilter, TypeIndex, TypeMetadata, GLOBAL_TYPE_INDEX,
};
use serial_test::serial;
use std::fs;
use std::sync::Arc;

fn index() -> Arc<StaticTypeIndex> {
    let index = StaticTypeIndex::new();
    index.register(TypeMetadata::class("a.b.Account"));
    index.register(TypeMetadata::class("a.b.c.Ledger"));
    index.register(TypeMetadata::class("a.b.c.d.Entry"));
    index.register(TypeMetadata::class("a.bc.Lookalike"));
    index.register(TypeMetadata::class("x.y.Elsewhere"));
    index.register_with_loader(TypeMetadata::class("a.b.Exploding"), |meta| {
        Err(format!("initializer of {} panicked", meta.name).into())
    });
    index.register_unreadable("a.b.Corrupt", "truncated metadata");
    Arc::new(index)
}

#[test]
fn test_wildcard_pattern_covers_subpackages_only() {
    let scanner = ResourceScanner::new(index());

    let result = scanner.scan("a.b.*", &TypeFilter::any()).unwrap();

    assert!(result.contains("a.b.Account"));
    assert!(result.contains("a.b.c.Ledger"));
    assert!(result.contains("a.b.c.d.Entry"));
    assert!(!result.contains("a.bc.Lookalike"));
    assert!(!result.contains("x.y.Elsewhere"));
}

#[test]
fn test_failing_candidates_are_excluded_not_fatal() {
    let scanner = ResourceScanner::new(index());

    let result = scanner.scan("a.b", &TypeFilter::any()).unwrap();

    assert!(!result.contains("a.b.Exploding"));
    assert!(!result.contains("a.b.Corrupt"));
    assert_eq!(result.len(), 3);
    assert_eq!(result.excluded().len(), 2);
    assert!(result
        .excluded()
        .iter()
        .any(|e| matches!(e, ScanError::LoadFailure { type_name, .. } if type_name == "a.b.Exploding")));
    assert!(result
        .excluded()
        .iter()
        .any(|e| matches!(e, ScanError::MetadataUnreadable { .. })));
}

#[test]
fn test_overlapping_patterns_are_deduplicated() {
    let index = index();
    let scanner = ResourceScanner::new(index.clone());

    let result = scanner
        .scan("a.b.c, a.b.*; a.b.c.d\ta.b.c", &TypeFilter::any())
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.excluded().len(), 2);
    // one load per accepted type plus the failing loader
    assert_eq!(index.load_count(), 4);
}

#[test]
fn test_single_segment_wildcard() {
    let scanner = ResourceScanner::new(index());

    let result = scanner.scan("a.*.c", &TypeFilter::any()).unwrap();

    assert!(result.contains("a.b.c.Ledger"));
    assert!(result.contains("a.b.c.d.Entry"));
    assert!(!result.contains("a.b.Account"));
}

#[test]
#[serial]
fn test_global_index_registration() {
    register_type(TypeMetadata::class("global.scan.Widget"));
    assert!(GLOBAL_TYPE_INDEX.is_registered("global.scan.Widget"));

    let entries = global_type_index().entries().unwrap();
    assert!(entries.iter().any(|e| e.location() == "global/scan/Widget"));

    let result = ResourceScanner::global()
        .scan("global.scan", &TypeFilter::any())
        .unwrap();
    assert!(result.contains("global.scan.Widget"));
}

#[test]
fn test_mapper_locations_from_directory_pattern() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("mappers/user")).unwrap();
    fs::create_dir_all(dir.path().join("mappers/order")).unwrap();
    fs::write(dir.path().join("mappers/user/UserMapper.map"), "statement user.find select 1").unwrap();
    fs::write(dir.path().join("mappers/order/OrderMapper.map"), "statement order.find select 2").unwrap();
    fs::write(dir.path().join("mappers/order/notes.txt"), "fail").unwrap();

    let parser = Arc::new(RecordingParser::new());
    let mut assembler = ConfigurationAssembler::new();
    assembler.set_data_source(StaticDataSource::new("H2"));
    assembler.set_descriptor_parser(parser.clone());
    assembler.set_type_index(Arc::new(StaticTypeIndex::new()));
    assembler
        .set_mapper_locations_pattern(dir.path(), "mappers/**/*.map")
        .unwrap();

    let factory = assembler.build().unwrap();

    let events = parser.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].contains("OrderMapper.map"));
    assert!(events[1].contains("UserMapper.map"));
    assert!(factory.mapped_statement("user.find").is_some());
    assert!(factory.mapped_statement("order.find").is_some());
}

#[test]
fn test_mapper_location_pattern_without_matches() {
    let dir = tempfile::tempdir().unwrap();
    let parser = Arc::new(RecordingParser::new());
    let mut assembler = ConfigurationAssembler::new();
    assembler.set_data_source(StaticDataSource::new("H2"));
    assembler.set_descriptor_parser(parser.clone());
    assembler.set_type_index(Arc::new(StaticTypeIndex::new()));
    assembler
        .set_mapper_locations_pattern(&dir.path().join("missing"), "**/*.map")
        .unwrap();

    let factory = assembler.build().unwrap();

    assert_eq!(factory.configuration().mapped_statement_count(), 0);
    assert!(parser.events().is_empty());
}

#[test]
fn test_panicking_loader_does_not_abort_build() {
    let index = StaticTypeIndex::new();
    index.register(TypeMetadata::class("app.model.User"));
    index.register_with_loader(TypeMetadata::class("app.model.Cursed"), |_| {
        panic!("class initializer threw")
    });
    let parser = Arc::new(RecordingParser::new());
    let mut assembler = ConfigurationAssembler::new();
    assembler.set_data_source(StaticDataSource::new("H2"));
    assembler.set_descriptor_parser(parser);
    assembler.set_type_index(Arc::new(index));
    assembler.set_type_aliases_package("app.model");

    let factory = assembler.build().unwrap();

    let aliases = factory.configuration().type_aliases();
    assert!(aliases.contains("user"));
    assert!(!aliases.contains("cursed"));
}
