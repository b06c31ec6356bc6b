use std::fmt;

use codespan_reporting::{
    files,
    term::{
        self,
        termcolor::{BufferWriter, ColorChoice},
    },
};
use common::{
    config::Config,
    diagnostics::{CompleteDiagnostic, FileId, Severity},
};
use hir::{
    HirDb,
    analysis::{
        analysis_pass::initialize_analysis_pass,
        diagnostics::DiagnosticVoucher,
        ty::{
            bound::TypeBoundPredicate,
            context::{TyCtxt, TypeCheckContext},
            ty_def::Ty,
        },
    },
    hir_def::{CanonicalPath, ItemTree, Namespace, TypePath},
};
use mangle::{MangleError, Mangler};
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::diagnostics::{SourceFiles, ToCsDiag, cmp_complete_diagnostics, config_diagnostic};

/// One compilation session: configuration, the crate's declarations, the
/// analysis context and the sources diagnostics point into.
pub struct DriverDataBase {
    config: Config,
    items: ItemTree,
    cx: TypeCheckContext,
    files: SourceFiles,
}

impl Default for DriverDataBase {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl DriverDataBase {
    pub fn new(config: Config) -> Self {
        Self {
            items: ItemTree::new(config.crate_name.clone()),
            cx: TypeCheckContext::new(config.analysis),
            files: SourceFiles::new(),
            config,
        }
    }

    /// Builds a session from the contents of a `tyres.toml` file.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config = Config::parse(content)?;
        if let Some(diags) = config.formatted_diagnostics() {
            debug!("configuration diagnostics:\n{diags}");
        }
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn items(&self) -> &ItemTree {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemTree {
        &mut self.items
    }

    pub fn context(&self) -> &TypeCheckContext {
        &self.cx
    }

    pub fn tcx(&mut self) -> TyCtxt<'_, '_> {
        TyCtxt::new(&self.items, &mut self.cx)
    }

    /// Registers a source file and returns the id spans should use.
    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> FileId {
        let id = self.files.add(name.into(), source.into());
        FileId::from_u32(id as u32)
    }

    pub fn run_analysis(&mut self) -> DiagnosticsCollection {
        let mut pass_manager = initialize_analysis_pass();
        let mut diags = pass_manager.run_on_module(&self.items, &mut self.cx);
        diags.extend(
            self.config
                .diagnostics
                .iter()
                .map(|diag| Box::new(config_diagnostic(diag)) as _),
        );
        info!(
            crate_name = %self.config.crate_name,
            diags = diags.len(),
            "analysis finished"
        );
        DiagnosticsCollection(diags)
    }

    pub fn mangler(&self) -> Mangler {
        Mangler::new(self.config.codegen.mangling)
    }

    pub fn mangle(&self, ty: &Ty, path: &CanonicalPath) -> Result<String, MangleError> {
        self.mangler().mangle_item(&self.items, ty, path)
    }

    /// The symbol of `item` of the trait at `trait_path`, implemented for
    /// `receiver`. The item is typed against the receiver and lives under a
    /// `<Receiver as Trait>` segment.
    pub fn trait_item_symbol(
        &mut self,
        receiver: &Ty,
        trait_path: &TypePath,
        item: &str,
    ) -> Result<String, SymbolError> {
        let mut tcx = TyCtxt::new(&self.items, &mut self.cx);
        let trait_ref = tcx.resolve_trait(trait_path);
        let Some(trait_id) = trait_ref.def_id() else {
            return Err(SymbolError::UnresolvedTrait(trait_path.plain()));
        };

        let mut predicate = TypeBoundPredicate::new(&trait_ref, trait_path.span);
        predicate.bind_receiver(receiver.clone());
        let item_ref = predicate.lookup_associated_item(tcx.cx, item);
        if item_ref.is_error() {
            return Err(SymbolError::UnknownItem {
                trait_name: trait_ref.name().clone(),
                item: SmolStr::new(item),
            });
        }
        let item_ty = item_ref.get_tyty_for_receiver(receiver);

        let Some(trait_path) = self.items.canonical_path(trait_id) else {
            return Err(SymbolError::UnresolvedTrait(trait_path.plain()));
        };
        let trait_args = predicate
            .used_arguments()
            .iter()
            .skip(1)
            .map(|arg| arg.ty().cloned().unwrap_or_else(|| Ty::Param(arg.param().clone())))
            .collect();
        let path = CanonicalPath::crate_root(self.config.crate_name.clone())
            .join_trait_impl(receiver.clone(), trait_path.with_generic_args(trait_args))
            .join(item, Namespace::Value);
        Ok(self.mangle(&item_ty, &path)?)
    }

    fn emit_to(
        &self,
        diags: &[CompleteDiagnostic],
        writer: &BufferWriter,
    ) -> Result<term::termcolor::Buffer, files::Error> {
        let mut buffer = writer.buffer();
        let config = term::Config::default();
        for diag in diags {
            term::emit(&mut buffer, &config, &self.files, &diag.to_cs(&self.files))?;
        }
        Ok(buffer)
    }
}

#[derive(Debug)]
pub enum SymbolError {
    UnresolvedTrait(String),
    UnknownItem { trait_name: SmolStr, item: SmolStr },
    Mangle(MangleError),
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTrait(path) => write!(f, "trait `{path}` does not resolve"),
            Self::UnknownItem { trait_name, item } => {
                write!(f, "trait `{trait_name}` has no item `{item}`")
            }
            Self::Mangle(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SymbolError {}

impl From<MangleError> for SymbolError {
    fn from(err: MangleError) -> Self {
        Self::Mangle(err)
    }
}

/// The diagnostics of one analysis run, in the order the passes reported
/// them. Rendering sorts them by location and removes duplicates.
pub struct DiagnosticsCollection(Vec<Box<dyn DiagnosticVoucher>>);

impl DiagnosticsCollection {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.finalize()
            .iter()
            .any(|diag| diag.severity == Severity::Error)
    }

    pub fn error_codes(&self) -> Vec<String> {
        self.finalize()
            .iter()
            .map(|diag| diag.error_code.to_string())
            .collect()
    }

    /// Writes the diagnostics to stderr.
    pub fn emit(&self, db: &DriverDataBase) -> Result<(), files::Error> {
        let writer = BufferWriter::stderr(ColorChoice::Auto);
        let buffer = db.emit_to(&self.finalize(), &writer)?;
        writer.print(&buffer)?;
        Ok(())
    }

    /// Renders the diagnostics without colors.
    pub fn format_diags(&self, db: &DriverDataBase) -> Result<String, files::Error> {
        let writer = BufferWriter::stderr(ColorChoice::Never);
        let buffer = db.emit_to(&self.finalize(), &writer)?;
        Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
    }

    fn finalize(&self) -> Vec<CompleteDiagnostic> {
        let mut diags: Vec<_> = self.0.iter().map(|diag| diag.to_complete()).collect();
        diags.sort_by(cmp_complete_diagnostics);
        diags.dedup();
        diags
    }
}
