use common::{config::ManglingVersion, diagnostics::Span};
use driver::{DriverDataBase, SymbolError};
use hir::{
    HirDb,
    analysis::ty::ty_def::{AdtTy, Ty},
    hir_def::{DefId, SelfParam, TypePath, TypeRef},
};

fn session(toml: &str) -> DriverDataBase {
    DriverDataBase::from_toml(toml).unwrap()
}

/// `trait fmt::Display { fn fmt(&self) -> bool; }` and `struct Point;`
fn display_point(db: &mut DriverDataBase) -> DefId {
    db.items_mut().add_trait("fmt::Display", |t| {
        t.method("fmt", |f| {
            f.self_param(SelfParam::Ref).ret(TypeRef::path("bool"));
        });
    });
    db.items_mut().add_struct("Point", &[])
}

fn adt(def: DefId, name: &str) -> Ty {
    Ty::Adt(AdtTy {
        def,
        name: name.into(),
        args: vec![],
    })
}

#[test]
fn configuration_drives_the_session() {
    let db = session(
        r#"
[crate]
name = "shapes"

[analysis]
recursion-limit = 4

[codegen]
mangling = "v0"
"#,
    );
    assert_eq!(db.config().crate_name, "shapes");
    assert_eq!(db.items().crate_name(), "shapes");
    assert_eq!(db.context().recursion_limit(), 4);
    assert_eq!(db.mangler().version(), ManglingVersion::V0);

    assert!(DriverDataBase::from_toml("[crate").is_err());
}

#[test]
fn invalid_configuration_values_are_warnings() {
    let mut db = session(
        r#"
[analysis]
recursion-limit = 0

[codegen]
mangling = "v1"
"#,
    );
    assert_eq!(db.context().recursion_limit(), 128);
    assert_eq!(db.mangler().version(), ManglingVersion::Legacy);

    let diags = db.run_analysis();
    assert_eq!(diags.len(), 2);
    assert!(!diags.has_errors());
    assert_eq!(diags.error_codes(), ["E9002", "E9003"]);
}

#[test]
fn diagnostics_render_against_sources() {
    let _guard = test_utils::setup_tracing_from_env();
    let mut db = DriverDataBase::default();
    let file = db.add_file("example.ty", "struct Point;\nimpl Missing for Point {}\n");
    display_point(&mut db);
    db.items_mut().add_impl(TypeRef::path("Point"), |i| {
        i.for_trait(TypePath::parse("Missing").with_span(Span::from_offsets(file, 19, 26)));
    });

    let diags = db.run_analysis();
    assert!(diags.has_errors());
    assert_eq!(diags.error_codes(), ["E2001"]);

    let rendered = diags.format_diags(&db).unwrap();
    let rendered: Vec<_> = rendered.lines().map(str::trim_end).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    error[E2001]: `Missing` is not found
      ┌─ example.ty:2:6
      │
    2 │ impl Missing for Point {}
      │      ^^^^^^^ `Missing` is not found
    ");
}

#[test]
fn clean_crates_have_no_diagnostics() {
    let mut db = DriverDataBase::default();
    display_point(&mut db);
    db.items_mut().add_impl(TypeRef::path("Point"), |i| {
        i.for_trait(TypePath::parse("fmt::Display")).method("fmt");
    });

    let diags = db.run_analysis();
    assert!(diags.is_empty());
    assert_eq!(diags.format_diags(&db).unwrap(), "");
}

#[test]
fn legacy_trait_item_symbols() {
    let mut db = session("[crate]\nname = \"example\"\n");
    let point = display_point(&mut db);

    let symbol = db
        .trait_item_symbol(&adt(point, "Point"), &TypePath::parse("fmt::Display"), "fmt")
        .unwrap();
    assert_eq!(
        symbol,
        "_ZN7example47_$LT$Point$u20$as$u20$example..fmt..Display$GT$3fmt17h17ee28199dae3707E"
    );
}

#[test]
fn v0_trait_item_symbols() {
    let mut db = session("[crate]\nname = \"example\"\n[codegen]\nmangling = \"v0\"\n");
    let point = display_point(&mut db);

    let symbol = db
        .trait_item_symbol(&adt(point, "Point"), &TypePath::parse("Display"), "fmt")
        .unwrap();
    assert_eq!(symbol, "_RNvXC7exampleNtC7example5PointNtNtC7example3fmt7Display3fmt");
}

#[test]
fn trait_item_symbol_errors() {
    let mut db = DriverDataBase::default();
    let point = display_point(&mut db);
    let receiver = adt(point, "Point");

    let err = db
        .trait_item_symbol(&receiver, &TypePath::parse("Debug"), "fmt")
        .unwrap_err();
    assert!(matches!(err, SymbolError::UnresolvedTrait(ref path) if path == "Debug"));

    let err = db
        .trait_item_symbol(&receiver, &TypePath::parse("Display"), "write")
        .unwrap_err();
    assert_eq!(err.to_string(), "trait `Display` has no item `write`");

    let err = db
        .trait_item_symbol(&Ty::Error, &TypePath::parse("Display"), "fmt")
        .unwrap_err();
    assert!(matches!(err, SymbolError::Mangle(_)));
}
