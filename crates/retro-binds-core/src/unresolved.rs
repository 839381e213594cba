//! Unresolved export declarations.
//!
//! These are the plain-data records a scanner produces from annotated source
//! before any type is looked up. [`ExportResolver`](crate::ExportResolver)
//! turns them into a resolved [`ExportedClass`](crate::ExportedClass).

use crate::{ExportKind, Location, ManagedType};

/// An explicit native-type override on a parameter or return slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeOverride {
    /// Native type name replacing the mapped or primitive name.
    pub name: Option<String>,
    /// Native module that must be imported for `name`.
    pub module: Option<String>,
    /// Pass a pointer argument as a native reference instead.
    pub by_ref: bool,
    /// Const-qualify the native type. Ignored for by-value positions.
    pub is_const: bool,
}

impl NativeOverride {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }
}

/// A parameter as declared.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ManagedType,
    pub native: Option<NativeOverride>,
    pub location: Location,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: ManagedType, location: Location) -> Self {
        Self {
            name: name.into(),
            ty,
            native: None,
            location,
        }
    }

    pub fn with_native(mut self, native: NativeOverride) -> Self {
        self.native = Some(native);
        self
    }
}

/// A method as declared, with its Rust (snake_case) name.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub ret: ManagedType,
    pub native_return: Option<NativeOverride>,
    pub location: Location,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: ManagedType::Unit,
            native_return: None,
            location,
        }
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ret: ManagedType) -> Self {
        self.ret = ret;
        self
    }

    pub fn with_native_return(mut self, native: NativeOverride) -> Self {
        self.native_return = Some(native);
        self
    }
}

/// An exported trait as declared.
#[derive(Debug, Clone)]
pub struct ExportDecl {
    /// Trait name; doubles as the registry module name.
    pub name: String,
    /// Managed module path containing the declaration, e.g. `interop::math`.
    pub managed_namespace: String,
    /// Explicit native namespace override.
    pub native_namespace: Option<String>,
    pub kind: ExportKind,
    /// Managed type whose mapping supplies the native namespace.
    pub subject: Option<String>,
    pub methods: Vec<MethodDecl>,
    pub location: Location,
}

impl ExportDecl {
    pub fn new(
        name: impl Into<String>,
        managed_namespace: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            name: name.into(),
            managed_namespace: managed_namespace.into(),
            native_namespace: None,
            kind: ExportKind::default(),
            subject: None,
            methods: Vec::new(),
            location,
        }
    }

    pub fn with_native_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.native_namespace = Some(namespace.into());
        self
    }

    pub fn with_kind(mut self, kind: ExportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}
