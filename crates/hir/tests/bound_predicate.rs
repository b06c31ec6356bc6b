
use common::diagnostics::Span;
use hir::{
    analysis::ty::{
        bound::{AppliedArgs, TypeBoundPredicate},
        diagnostics::{TyDiag, TyLowerDiag},
        trait_lower::TraitArgError,
        ty_def::{AdtTy, Ty, UintTy},
        ty_lower::GenericScope,
    },
    hir_def::{AssocTypeBinding, HirId, SelfParam, TypeRef},
};
use test_db::{TestDb, display_point, fn_like, path};

#[test]
fn extra_arguments_set_the_error_flag() {
    let mut db = TestDb::new();
    db.tree.add_trait("Into", |t| {
        t.type_param("T");
    });

    let mut tcx = db.tcx();
    let into = tcx.resolve_trait(&path("Into"));
    let mut predicate = TypeBoundPredicate::new(&into, Span::default());
    assert!(predicate.requires_generic_args(tcx.cx));
    let before = predicate.used_arguments().len();

    let err = predicate
        .apply_generic_arguments(&AppliedArgs::from_types([Ty::Bool, Ty::Char], Span::default()))
        .unwrap_err();
    assert_eq!(err, TraitArgError::ArgNumMismatch { expected: 1, given: 2 });
    assert!(predicate.has_error_flag());
    assert!(predicate.is_error(tcx.cx));
    assert_eq!(predicate.used_arguments().len(), before);

    let written = path("Into").with_type_args([TypeRef::path("bool"), TypeRef::path("char")]);
    let predicate = tcx.predicate_from_bound(&written, &GenericScope::default(), false);
    assert!(predicate.has_error_flag());
    assert_eq!(db.diag_codes(), ["E4004"]);
}

#[test]
fn missing_items_are_inert() {
    let mut db = TestDb::new();
    display_point(&mut db.tree);

    let mut tcx = db.tcx();
    let display = tcx.resolve_trait(&path("Display"));
    let predicate = TypeBoundPredicate::new(&display, Span::default());

    let item = predicate.lookup_associated_item(tcx.cx, "missing_name");
    assert!(item.is_error());
    assert!(!item.needs_implementation());
    assert!(item.raw_item().is_none());
    assert_eq!(item.get_tyty_for_receiver(&Ty::Bool), Ty::Error);
    assert!(!predicate.contains_item(tcx.cx, "missing_name"));

    let error = TypeBoundPredicate::error();
    assert!(error.is_error(tcx.cx));
    assert!(error.lookup_associated_item(tcx.cx, "fmt").is_error());
    assert!(!error.contains_item(tcx.cx, "fmt"));
}

#[test]
fn fn_like_accepts_two_arguments() {
    let mut db = TestDb::new();
    fn_like(&mut db.tree);
    let point = db.tree.add_struct("Point", &[]);

    let mut tcx = db.tcx();
    let fn_like = tcx.resolve_trait(&path("FnLike"));
    let mut predicate = TypeBoundPredicate::new(&fn_like, Span::default());
    assert!(predicate.requires_generic_args(tcx.cx));

    let t = Ty::param(HirId::from_u32(1000), "T");
    predicate
        .apply_generic_arguments(&AppliedArgs::from_types(
            [Ty::reference(t.clone()), Ty::reference(t)],
            Span::default(),
        ))
        .unwrap();
    assert!(predicate.requires_generic_args(tcx.cx));
    assert!(!predicate.is_error(tcx.cx));
    assert_eq!(predicate.used_arguments().len(), predicate.substitutions().len());

    let point_ty = Ty::Adt(AdtTy {
        def: point,
        name: "Point".into(),
        args: vec![],
    });
    let call = predicate.lookup_associated_item(tcx.cx, "call");
    assert!(call.needs_implementation());
    assert_eq!(
        call.get_tyty_for_receiver(&point_ty).to_string(),
        "fn(&Point, &T) -> &T"
    );
    // The predicate's own receiver slot is untouched.
    assert_eq!(predicate.receiver(), None);
}

#[test]
fn defaults_are_filled_with_the_receiver() {
    let mut db = TestDb::new();
    db.tree.add_trait("ops::Add", |t| {
        t.defaulted_type_param("Rhs", TypeRef::self_ty())
            .assoc_type("Output", None)
            .method("add", |f| {
                f.self_param(SelfParam::Value)
                    .param("rhs", TypeRef::path("Rhs"))
                    .ret(TypeRef::path("Self::Output"));
            });
    });

    let mut tcx = db.tcx();
    let scope = GenericScope::default();
    let u32_ty = Ty::Uint(UintTy::U32);

    let mut implicit = tcx.predicate_from_bound(&path("Add"), &scope, false);
    implicit.bind_receiver(u32_ty.clone());
    let add = implicit.lookup_associated_item(tcx.cx, "add");
    assert_eq!(
        add.get_tyty_for_receiver(&u32_ty).to_string(),
        "fn(u32, u32) -> <u32 as Add>::Output"
    );
    assert_eq!(implicit.pretty_print(tcx.db), "example::ops::Add<u32>");

    let explicit = tcx.predicate_from_bound(
        &path("ops::Add").with_type_args([TypeRef::path("u8")]),
        &scope,
        false,
    );
    let add = explicit.lookup_associated_item(tcx.cx, "add");
    assert_eq!(
        add.get_tyty_for_receiver(&u32_ty).to_string(),
        "fn(u32, u8) -> <u32 as Add>::Output"
    );

    // Associated types are returned as declared.
    let output = explicit.lookup_associated_item(tcx.cx, "Output");
    assert_eq!(output.get_tyty_for_receiver(&u32_ty).to_string(), "Output");
    assert!(tcx.cx.diags().next().is_none());
}

#[test]
fn defaulted_arguments_follow_the_bounded_parameter() {
    let mut db = TestDb::new();
    db.tree.add_trait("ops::Add", |t| {
        t.defaulted_type_param("Rhs", TypeRef::self_ty());
    });
    db.tree.add_struct("Wrapper", &["T"]);
    let imp = db.tree.add_impl(
        TypeRef::Path(path("Wrapper").with_type_args([TypeRef::path("T")])),
        |i| {
            i.bounded_type_param("T", [path("Add")]);
        },
    );

    assert!(db.run_passes().is_empty());
    let t = db.tree.impl_block(imp).generic_params[0]
        .as_type()
        .unwrap()
        .hir_id;
    let bounds = db.cx.param_bounds(t).unwrap();
    assert_eq!(bounds.bounds_as_string(&db.tree), "bounds:[example::ops::Add<T>]");
}

#[test]
fn lifetime_arguments_must_come_first() {
    let mut db = TestDb::new();
    db.tree.add_trait("Borrow", |t| {
        t.lifetime_param("a").type_param("T");
    });

    let scope = GenericScope::default();
    let mut tcx = db.tcx();
    let leading = path("Borrow").with_generic_args(
        vec![
            hir::hir_def::GenericArg::Lifetime("a".into()),
            hir::hir_def::GenericArg::Type(TypeRef::path("str")),
        ],
        vec![],
    );
    assert!(!tcx.predicate_from_bound(&leading, &scope, false).has_error_flag());

    let trailing = path("Borrow").with_generic_args(
        vec![
            hir::hir_def::GenericArg::Type(TypeRef::path("str")),
            hir::hir_def::GenericArg::Lifetime("a".into()),
        ],
        vec![],
    );
    assert!(tcx.predicate_from_bound(&trailing, &scope, false).has_error_flag());
    assert_eq!(db.diag_codes(), ["E4005"]);
}

#[test]
fn associated_type_bindings_are_recorded() {
    let mut db = TestDb::new();
    db.tree.add_trait("Iterator", |t| {
        t.assoc_type("Item", None);
    });

    let scope = GenericScope::default();
    let mut tcx = db.tcx();
    let item = path("Iterator").with_generic_args(
        vec![],
        vec![AssocTypeBinding {
            name: "Item".into(),
            ty: TypeRef::path("u8"),
        }],
    );
    let predicate = tcx.predicate_from_bound(&item, &scope, false);
    assert_eq!(
        predicate.assoc_type_binding("Item"),
        Some(&Ty::Uint(UintTy::U8))
    );
    assert!(!predicate.requires_generic_args(tcx.cx));

    let elem = path("Iterator").with_generic_args(
        vec![],
        vec![AssocTypeBinding {
            name: "Elem".into(),
            ty: TypeRef::path("u8"),
        }],
    );
    tcx.predicate_from_bound(&elem, &scope, false);
    assert_eq!(db.diag_codes(), ["E4007"]);
}

#[test]
fn trait_objects_require_object_safety() {
    let mut db = TestDb::new();
    db.tree.add_trait("Shape", |t| {
        t.assoc_type("Unit", None).method("area", |f| {
            f.self_param(SelfParam::Ref).ret(TypeRef::path("u32"));
        });
    });
    db.tree.add_trait("Factory", |t| {
        t.assoc_const("ID", TypeRef::path("u32"), None)
            .method("create", |f| {
                f.ret(TypeRef::self_ty());
            })
            .method("map", |f| {
                f.type_param("U").self_param(SelfParam::Ref).param("u", TypeRef::path("U"));
            });
    });
    db.tree.add_trait("Wrapper", |t| {
        t.super_trait(path("Factory"));
    });

    let scope = GenericScope::default();
    let mut tcx = db.tcx();
    let shape = tcx.lower_ty(&TypeRef::dyn_trait([path("Shape")]), &scope);
    assert_eq!(shape.to_string(), "dyn Shape");

    let factory = tcx.lower_ty(&TypeRef::dyn_trait([path("Factory")]), &scope);
    assert_eq!(factory, Ty::Error);
    let wrapper = tcx.lower_ty(&TypeRef::reference(TypeRef::dyn_trait([path("Wrapper")])), &scope);
    assert_eq!(wrapper, Ty::reference(Ty::Error));

    let diags = db.diags();
    let [
        TyDiag::TyLower(TyLowerDiag::NotObjectSafe { violations, super_traits, .. }),
        TyDiag::TyLower(TyLowerDiag::NotObjectSafe { violations: wrapper_violations, super_traits: wrapper_supers, .. }),
    ] = diags.as_slice()
    else {
        panic!("expected two object-safety diagnostics, got {diags:?}");
    };
    let rendered: Vec<_> = violations.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        [
            "associated const `ID` is not allowed",
            "associated function `create` has no `self` receiver",
            "method `map` has generic type parameters",
        ]
    );
    assert!(super_traits.is_empty());
    assert!(wrapper_violations.is_empty());
    let wrapper_supers: Vec<_> = wrapper_supers.iter().map(|name| name.as_str()).collect();
    assert_eq!(wrapper_supers, ["Factory"]);
}

#[test]
fn object_safety_of_a_trait_being_resolved_is_checked_later() {
    let mut db = TestDb::new();
    db.tree.add_trait("Node", |t| {
        t.method("next", |f| {
            f.self_param(SelfParam::Ref)
                .ret(TypeRef::reference(TypeRef::dyn_trait([path("Node")])));
        });
    });
    db.tree.add_trait("Builder", |t| {
        t.method("build", |f| {
            f.ret(TypeRef::reference(TypeRef::dyn_trait([path("Builder")])));
        });
    });

    let mut tcx = db.tcx();
    let node = tcx.resolve_trait(&path("Node"));
    assert_eq!(node.items()[0].ty().to_string(), "fn(&Self) -> &dyn Node");
    assert!(tcx.cx.diags().next().is_none());

    tcx.resolve_trait(&path("Builder"));
    assert_eq!(db.diag_codes(), ["E3003"]);
}
