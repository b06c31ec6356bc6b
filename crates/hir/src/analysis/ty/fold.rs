use super::{
    subst::SubstitutionArgumentMappings,
    ty_def::{DynBound, DynTy, FnTy, ProjectionTy, Ty},
};

pub trait TyFoldable
where
    Self: Sized,
{
    fn super_fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder;

    fn fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        self.super_fold_with(folder)
    }
}

pub trait TyFolder {
    fn fold_ty(&mut self, ty: Ty) -> Ty;
}

impl TyFoldable for Ty {
    fn super_fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        match self {
            Ty::Tuple(elems) => Ty::Tuple(elems.fold_with(folder)),
            Ty::Adt(mut adt) => {
                adt.args = adt.args.fold_with(folder);
                Ty::Adt(adt)
            }
            Ty::Ref(mutability, inner) => Ty::Ref(mutability, inner.fold_with(folder)),
            Ty::Ptr(mutability, inner) => Ty::Ptr(mutability, inner.fold_with(folder)),
            Ty::Array(elem, len) => Ty::Array(elem.fold_with(folder), len),
            Ty::Slice(elem) => Ty::Slice(elem.fold_with(folder)),
            Ty::Fn(func) => Ty::Fn(func.fold_with(folder)),
            Ty::Projection(proj) => Ty::Projection(ProjectionTy {
                self_ty: proj.self_ty.fold_with(folder),
                ..proj
            }),
            Ty::Dynamic(dyn_ty) => Ty::Dynamic(DynTy {
                bounds: dyn_ty
                    .bounds
                    .into_iter()
                    .map(|bound| DynBound {
                        args: bound.args.fold_with(folder),
                        ..bound
                    })
                    .collect(),
            }),
            Ty::Bool
            | Ty::Char
            | Ty::Str
            | Ty::Never
            | Ty::Int(_)
            | Ty::Uint(_)
            | Ty::Float(_)
            | Ty::Param(_)
            | Ty::Placeholder(_)
            | Ty::Infer(_)
            | Ty::Error => self,
        }
    }

    fn fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        folder.fold_ty(self)
    }
}

impl TyFoldable for FnTy {
    fn super_fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        FnTy {
            receiver: self.receiver.map(|receiver| receiver.fold_with(folder)),
            params: self.params.fold_with(folder),
            ret: self.ret.fold_with(folder),
            ..self
        }
    }
}

impl<T> TyFoldable for Box<T>
where
    T: TyFoldable,
{
    fn super_fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        Box::new((*self).fold_with(folder))
    }
}

impl<T> TyFoldable for Vec<T>
where
    T: TyFoldable,
{
    fn super_fold_with<F>(self, folder: &mut F) -> Self
    where
        F: TyFolder,
    {
        self.into_iter()
            .map(|inner| inner.fold_with(folder))
            .collect()
    }
}

/// Replaces every parameter bound in `mappings` by its argument.
pub struct SubstFolder<'a> {
    mappings: &'a SubstitutionArgumentMappings,
}

impl<'a> SubstFolder<'a> {
    pub fn new(mappings: &'a SubstitutionArgumentMappings) -> Self {
        Self { mappings }
    }
}

impl TyFolder for SubstFolder<'_> {
    fn fold_ty(&mut self, ty: Ty) -> Ty {
        if let Ty::Param(param) = &ty {
            if let Some(arg) = self.mappings.lookup(param) {
                return arg.clone();
            }
        }
        ty.super_fold_with(self)
    }
}

/// Specializes `ty` under `mappings`. Unbound parameters are kept as they are;
/// the error sentinel yields the error type.
pub fn specialize(ty: &Ty, mappings: &SubstitutionArgumentMappings) -> Ty {
    if mappings.is_error() {
        return Ty::Error;
    }
    ty.clone().fold_with(&mut SubstFolder::new(mappings))
}
