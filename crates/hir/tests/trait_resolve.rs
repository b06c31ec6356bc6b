
use std::rc::Rc;

use common::{config::AnalysisConfig, diagnostics::Span};
use hir::{
    HirDb,
    analysis::ty::{
        context::TraitResolveState,
        diagnostics::{TraitLowerDiag, TyDiag},
        trait_def::AssocItemKind,
        ty_def::Ty,
    },
    hir_def::{
        Body, BodyUse, GenericParam, HirIdAllocator, SelfParam, Trait, TraitItemKind, TypeParam,
        TypeRef,
    },
};
use test_db::{TestDb, path};

fn type_param(ids: &mut HirIdAllocator, name: &str) -> GenericParam {
    GenericParam::Type(TypeParam {
        hir_id: ids.alloc(),
        name: name.into(),
        bounds: vec![],
        default: None,
        span: Span::default(),
    })
}

#[test]
fn resolution_is_idempotent() {
    let mut db = TestDb::new();
    let display = db.tree.add_trait("fmt::Display", |t| {
        t.method("fmt", |f| {
            f.self_param(SelfParam::Ref).ret(TypeRef::path("bool"));
        });
    });

    let mut tcx = db.tcx();
    let first = tcx.resolve_trait(&path("fmt::Display"));
    let second = tcx.resolve_trait(&path("Display"));
    assert!(!first.is_error());
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.items().len(), 1);
    assert_eq!(
        tcx.cx.trait_state(display),
        Some(TraitResolveState::BodiesResolved)
    );
    assert_eq!(tcx.cx.trait_references().count(), 1);
}

#[test]
fn lookup_only_reads_the_cache() {
    let mut db = TestDb::new();
    db.tree.add_trait("Marker", |_| {});

    let mut tcx = db.tcx();
    assert!(tcx.lookup_trait(&path("Marker")).is_error());

    let resolved = tcx.resolve_trait(&path("Marker"));
    let looked_up = tcx.lookup_trait(&path("crate::Marker"));
    assert!(Rc::ptr_eq(&resolved, &looked_up));
}

#[test]
fn receiver_is_the_first_parameter() {
    let mut db = TestDb::new();
    db.tree.insert_trait("Swapped", |def_id, ids| Trait {
        def_id,
        name: "Swapped".into(),
        generic_params: vec![type_param(ids, "T"), type_param(ids, "Self")],
        super_traits: vec![],
        items: vec![],
        span: Span::default(),
    });
    db.tree.add_trait("Borrow", |t| {
        t.lifetime_param("a").type_param("T");
    });

    let mut tcx = db.tcx();
    let swapped = tcx.resolve_trait(&path("Swapped"));
    let names: Vec<_> = swapped
        .trait_substs()
        .iter()
        .map(|mapping| mapping.param().name.as_str())
        .collect();
    assert_eq!(names, ["Self", "T"]);
    assert!(swapped.receiver().unwrap().is_trait_self());

    let borrow = tcx.resolve_trait(&path("Borrow"));
    assert_eq!(borrow.trait_substs().len(), 2);

    let predicate = tcx.predicate_from_bound(
        &path("Borrow").with_type_args([TypeRef::path("u8")]),
        &Default::default(),
        false,
    );
    assert!(!predicate.is_error(tcx.cx));
    assert_eq!(
        predicate.used_arguments().len(),
        predicate.substitutions().len()
    );
}

#[test]
fn receiver_inherits_the_trait_and_its_super_traits() {
    let mut db = TestDb::new();
    let base = db.tree.add_trait("Base", |_| {});
    let derived = db.tree.add_trait("Derived", |t| {
        t.super_trait(path("Base"));
    });

    let mut tcx = db.tcx();
    let derived_ref = tcx.resolve_trait(&path("Derived"));
    let base_ref = tcx.resolve_trait(&path("Base"));

    let receiver = Ty::Param(derived_ref.receiver().unwrap().clone());
    let bounds = tcx.cx.bounds_of(&receiver).unwrap();
    assert_eq!(bounds.num_specified_bounds(), 2);
    assert!(bounds.contains_trait(derived));
    assert!(bounds.contains_trait(base));
    assert_eq!(
        bounds.bounds_as_string(tcx.db),
        "bounds:[example::Derived + example::Base]"
    );

    assert_eq!(derived_ref.super_traits().len(), 1);
    assert!(derived_ref.satisfies_bound(tcx.cx, &base_ref));
    assert!(!base_ref.satisfies_bound(tcx.cx, &derived_ref));
}

#[test]
fn projections_see_associated_types_of_super_traits() {
    let mut db = TestDb::new();
    db.tree.add_trait("Base", |t| {
        t.assoc_type("Out", None);
    });
    db.tree.add_trait("Sub", |t| {
        t.super_trait(path("Base"));
    });
    db.tree.add_trait("User", |t| {
        t.method("f", |f| {
            f.bounded_type_param("T", [path("Sub")])
                .self_param(SelfParam::Ref)
                .param("x", TypeRef::path("T::Out"));
        });
    });

    let user = db.tcx().resolve_trait(&path("User"));
    assert!(db.diags().is_empty());
    assert_eq!(
        user.lookup_trait_item("f").unwrap().ty().to_string(),
        "fn(&Self, <T as Base>::Out) -> ()"
    );
}

#[test]
fn default_bodies_may_refer_to_their_own_trait() {
    let mut db = TestDb::new();
    let foo = db.tree.add_trait("Foo", |t| {
        t.method("required", |f| {
            f.self_param(SelfParam::Ref);
        })
        .method("provided", |f| {
            f.self_param(SelfParam::Ref).body(Body::new([
                BodyUse::Bound(path("Foo")),
                BodyUse::AssocItem {
                    trait_path: path("Foo"),
                    item: "required".into(),
                },
            ]));
        })
        .method("generic", |f| {
            f.bounded_type_param("U", [path("Foo")])
                .self_param(SelfParam::Ref)
                .param("u", TypeRef::path("U"));
        });
    });

    let mut tcx = db.tcx();
    let foo_ref = tcx.resolve_trait(&path("Foo"));
    assert_eq!(foo_ref.items().len(), 3);
    assert!(foo_ref.items().iter().all(|item| !item.is_error()));
    assert_eq!(tcx.cx.diags().count(), 0);
    assert_eq!(
        tcx.cx.trait_state(foo),
        Some(TraitResolveState::BodiesResolved)
    );

    let generic = foo_ref
        .lookup_trait_item_by_kind("generic", AssocItemKind::Fn)
        .unwrap();
    assert_eq!(generic.ty().to_string(), "fn(&Self, U) -> ()");

    let Some(TraitItemKind::Func(func)) = tcx.db.trait_def(foo).and_then(|t| t.item("generic")).map(|item| &item.kind)
    else {
        panic!("`generic` is a method");
    };
    let u = func.generic_params[0].as_type().unwrap().hir_id;
    let u_bounds = tcx.cx.param_bounds(u).unwrap();
    assert!(u_bounds.contains_trait(foo));
    assert!(!u_bounds.specified_bounds()[0].is_error(tcx.cx));
}

#[test]
fn unknown_item_in_default_body_is_reported() {
    let mut db = TestDb::new();
    db.tree.add_trait("Foo", |t| {
        t.method("provided", |f| {
            f.self_param(SelfParam::Ref).body(Body::new([BodyUse::AssocItem {
                trait_path: path("Foo"),
                item: "missing".into(),
            }]));
        });
    });

    db.tcx().resolve_trait(&path("Foo"));
    assert_eq!(db.diag_codes(), ["E4006"]);
}

#[test]
fn super_trait_cycle_is_reported_once() {
    let _guard = test_utils::setup_tracing_from_env();
    let mut db = TestDb::new();
    db.tree.add_trait("A", |t| {
        t.super_trait(path("B"));
    });
    db.tree.add_trait("B", |t| {
        t.super_trait(path("A"));
    });

    let diags = db.run_passes();
    let codes: Vec<_> = diags.iter().map(|diag| diag.error_code.to_string()).collect();
    assert_eq!(codes, ["E4001"]);
    insta::assert_snapshot!(diags[0].notes.join("\n"), @"cycle: `A` -> `B` -> `A`");

    let mut tcx = db.tcx();
    let a = tcx.resolve_trait(&path("A"));
    let b = tcx.resolve_trait(&path("B"));
    assert!(!a.is_error() && !b.is_error());
    assert_eq!(a.super_traits().len(), 1);
    assert!(b.super_traits().is_empty());
    assert_eq!(tcx.cx.diags().count(), 0);
}

#[test]
fn method_bounds_on_a_trait_being_resolved_are_not_cycles() {
    let mut db = TestDb::new();
    let a = db.tree.add_trait("A", |t| {
        t.method("f", |f| {
            f.bounded_type_param("T", [path("B")]);
        });
    });
    db.tree.add_trait("B", |t| {
        t.super_trait(path("A"));
    });

    let mut tcx = db.tcx();
    tcx.resolve_trait(&path("A"));
    let b_ref = tcx.resolve_trait(&path("B"));
    assert_eq!(tcx.cx.diags().count(), 0);

    let super_a = &b_ref.super_traits()[0];
    assert_eq!(super_a.trait_id(), Some(a));
    assert!(!super_a.is_error(tcx.cx));
}

#[test]
fn recursion_limit_stops_deep_chains() {
    let mut db = TestDb::with_config(AnalysisConfig { recursion_limit: 2 });
    db.tree.add_trait("A", |t| {
        t.super_trait(path("B"));
    });
    db.tree.add_trait("B", |t| {
        t.super_trait(path("C"));
    });
    db.tree.add_trait("C", |t| {
        t.super_trait(path("D"));
    });
    db.tree.add_trait("D", |_| {});

    let mut tcx = db.tcx();
    assert!(!tcx.resolve_trait(&path("A")).is_error());
    let b_ref = tcx.resolve_trait(&path("B"));
    assert!(b_ref.super_traits().is_empty());
    assert!(matches!(
        tcx.cx.diags().next(),
        Some(TyDiag::TraitLower(TraitLowerDiag::RecursionLimitReached { trait_name, limit: 2, .. }))
            if trait_name == "C"
    ));

    // A fresh request starts at depth zero again.
    assert!(!tcx.resolve_trait(&path("C")).is_error());
}

#[test]
fn duplicate_items_keep_the_first_declaration() {
    let mut db = TestDb::new();
    db.tree.add_trait("Dup", |t| {
        t.method("a", |f| {
            f.self_param(SelfParam::Ref);
        })
        .method("a", |f| {
            f.self_param(SelfParam::Value);
        });
    });

    let dup = db.tcx().resolve_trait(&path("Dup"));
    assert_eq!(dup.items().len(), 1);
    assert_eq!(dup.items()[0].ty().to_string(), "fn(&Self) -> ()");
    assert_eq!(db.diag_codes(), ["E4003"]);
}

#[test]
fn unresolvable_paths_yield_the_error_reference() {
    let mut db = TestDb::new();
    db.tree.add_struct("Point", &[]);

    let mut tcx = db.tcx();
    assert!(tcx.resolve_trait(&path("Missing")).is_error());
    assert!(tcx.resolve_trait(&path("Point")).is_error());
    assert_eq!(db.diag_codes(), ["E2001", "E2003"]);
}

#[test]
#[should_panic(expected = "has no implicit `Self` parameter")]
fn missing_receiver_is_an_internal_error() {
    let mut db = TestDb::new();
    db.tree.insert_trait("Broken", |def_id, ids| Trait {
        def_id,
        name: "Broken".into(),
        generic_params: vec![type_param(ids, "T")],
        super_traits: vec![],
        items: vec![],
        span: Span::default(),
    });

    db.tcx().resolve_trait(&path("Broken"));
}

#[test]
fn trait_items_are_typed_against_the_receiver() {
    let mut db = TestDb::new();
    db.tree.add_trait("Iterator", |t| {
        t.assoc_type("Item", None)
            .assoc_const("LEN", TypeRef::path("usize"), None)
            .method("next", |f| {
                f.self_param(SelfParam::RefMut)
                    .ret(TypeRef::path("Self::Item"));
            })
            .method("size_hint", |f| {
                f.self_param(SelfParam::Ref)
                    .ret(TypeRef::path("usize"))
                    .body(Body::default());
            });
    });

    let iter = db.tcx().resolve_trait(&path("Iterator"));
    let rendered: Vec<_> = iter
        .items()
        .iter()
        .map(|item| format!("{} {:?} {} {}", item.identifier(), item.kind(), item.is_optional(), item.ty()))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    Item Type false Item
    LEN Const false usize
    next Fn false fn(&mut Self) -> <Self as Iterator>::Item
    size_hint Fn true fn(&Self) -> usize
    ");
    assert!(db.diags().is_empty());
}
