//! The type mapping table.
//!
//! Every managed value type that crosses the boundary by value is registered
//! here with its native name and, optionally, the native module declaring it.
//! The table is built in two phases, mirroring the builder/registry split used
//! elsewhere in the workspace:
//!
//! ```text
//! TypeMapBuilder (mutable)          TypeMap (immutable)
//!   register(Color)        build()    resolve("Color") -> "retro::Color"
//!   register(Transform)   ───────►    layout_of("Color") -> 16 bytes
//!   register(EntityId)                iter() in registration order
//! ```
//!
//! `build()` validates every field (primitive or another mapped type, never a
//! reference, pointer or unknown type), rejects by-value recursion and
//! computes C layouts for the configured [`TargetLayout`]. Errors are
//! collected so one run reports all of them.

use rustc_hash::FxHashMap;

use crate::{
    BindsError, Layout, Location, ManagedType, PrimitiveKind, StructLayout, TargetLayout,
};

/// One field of a blittable struct, in declaration order.
#[derive(Debug, Clone)]
pub struct BlittableField {
    pub name: String,
    pub ty: ManagedType,
    pub location: Location,
}

impl BlittableField {
    pub fn new(name: impl Into<String>, ty: ManagedType, location: Location) -> Self {
        Self {
            name: name.into(),
            ty,
            location,
        }
    }
}

/// The shape of a blittable type.
#[derive(Debug, Clone)]
pub enum BlittableShape {
    /// `#[repr(C)]` struct with named fields.
    Struct { fields: Vec<BlittableField> },
    /// Fieldless enum backed by an integer `repr`.
    Enum {
        repr: PrimitiveKind,
        variants: Vec<String>,
    },
}

impl BlittableShape {
    /// Structural equality, ignoring source locations.
    fn same_as(&self, other: &BlittableShape) -> bool {
        match (self, other) {
            (BlittableShape::Struct { fields: a }, BlittableShape::Struct { fields: b }) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.name == y.name && x.ty == y.ty)
            }
            (
                BlittableShape::Enum {
                    repr: ra,
                    variants: va,
                },
                BlittableShape::Enum {
                    repr: rb,
                    variants: vb,
                },
            ) => ra == rb && va == vb,
            _ => false,
        }
    }
}

/// A managed value type mapped to a native type.
#[derive(Debug, Clone)]
pub struct BlittableType {
    /// Managed type name (final path segment).
    pub managed: String,
    /// Module path declaring the managed type, e.g. `interop::types`.
    pub managed_namespace: String,
    /// Native spelling, e.g. `retro::Color`.
    pub native_name: String,
    /// Native module declaring the type, e.g. `retro.core`.
    pub native_module: Option<String>,
    pub shape: BlittableShape,
    pub location: Location,
}

impl BlittableType {
    pub fn new(
        managed: impl Into<String>,
        native_name: impl Into<String>,
        shape: BlittableShape,
        location: Location,
    ) -> Self {
        Self {
            managed: managed.into(),
            managed_namespace: String::new(),
            native_name: native_name.into(),
            native_module: None,
            shape,
            location,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.native_module = Some(module.into());
        self
    }

    pub fn with_managed_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.managed_namespace = namespace.into();
        self
    }

    /// `interop::types::Color`, or the bare name at the crate root.
    pub fn managed_path(&self) -> String {
        if self.managed_namespace.is_empty() {
            self.managed.clone()
        } else {
            format!("{}::{}", self.managed_namespace, self.managed)
        }
    }

    /// Namespace part of the native name (`retro` for `retro::Color`).
    pub fn native_namespace(&self) -> Option<&str> {
        self.native_name.rsplit_once("::").map(|(ns, _)| ns)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, BlittableShape::Enum { .. })
    }

    fn same_mapping(&self, other: &BlittableType) -> bool {
        self.native_name == other.native_name
            && self.native_module == other.native_module
            && self.shape.same_as(&other.shape)
    }
}

/// Mutable registration phase of the type mapping table.
#[derive(Debug, Default)]
pub struct TypeMapBuilder {
    target: TargetLayout,
    types: Vec<BlittableType>,
    index: FxHashMap<String, usize>,
}

impl TypeMapBuilder {
    pub fn new(target: TargetLayout) -> Self {
        Self {
            target,
            types: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Register a mapping.
    ///
    /// Registering an identical mapping again is a no-op. A different mapping
    /// for an already registered managed type is a `ConflictingMapping`.
    pub fn register(&mut self, ty: BlittableType) -> Result<(), BindsError> {
        if let Some(&idx) = self.index.get(&ty.managed) {
            let existing = &self.types[idx];
            if existing.same_mapping(&ty) {
                return Ok(());
            }
            return Err(BindsError::ConflictingMapping {
                managed: ty.managed,
                existing: existing.native_name.clone(),
                first: existing.location.clone(),
                location: ty.location,
            });
        }

        self.index.insert(ty.managed.clone(), self.types.len());
        self.types.push(ty);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validate all mappings and compute their layouts.
    ///
    /// # Errors
    ///
    /// Returns every unknown, unsupported or recursive field type found.
    pub fn build(self) -> Result<TypeMap, Vec<BindsError>> {
        let mut pass = LayoutPass {
            builder: &self,
            visits: FxHashMap::default(),
            layouts: FxHashMap::default(),
            errors: Vec::new(),
        };

        for ty in &self.types {
            pass.visit(&ty.managed);
        }

        let LayoutPass {
            layouts, errors, ..
        } = pass;

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TypeMap {
            target: self.target,
            types: self.types,
            index: self.index,
            layouts,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
    Failed,
}

struct LayoutPass<'a> {
    builder: &'a TypeMapBuilder,
    visits: FxHashMap<String, Visit>,
    layouts: FxHashMap<String, StructLayout>,
    errors: Vec<BindsError>,
}

impl LayoutPass<'_> {
    fn visit(&mut self, managed: &str) -> Option<Layout> {
        match self.visits.get(managed) {
            Some(Visit::Done) => return self.layouts.get(managed).map(|l| l.layout),
            Some(Visit::Failed) => return None,
            Some(Visit::InProgress) => {
                self.visits.insert(managed.to_string(), Visit::Failed);
                let location = self.location_of(managed);
                self.errors.push(BindsError::RecursiveLayout {
                    managed: managed.to_string(),
                    location,
                });
                return None;
            }
            None => {}
        }

        let builder = self.builder;
        let Some(&idx) = builder.index.get(managed) else {
            return None;
        };
        let ty = &builder.types[idx];
        self.visits.insert(managed.to_string(), Visit::InProgress);

        let layout = match &ty.shape {
            BlittableShape::Enum { repr, .. } => {
                if repr.is_integer() {
                    Some(StructLayout::scalar(repr.layout(&builder.target)))
                } else {
                    self.errors.push(BindsError::UnsupportedType {
                        managed: repr.rust_name().to_string(),
                        context: format!("repr of enum `{}`", ty.managed),
                        reason: "enum repr must be an integer type".to_string(),
                        location: ty.location.clone(),
                    });
                    None
                }
            }
            BlittableShape::Struct { fields } => {
                let mut placed = Vec::with_capacity(fields.len());
                let mut ok = true;
                for field in fields {
                    match self.field_layout(&ty.managed, field) {
                        Some(layout) => placed.push((field.name.clone(), layout)),
                        None => ok = false,
                    }
                }
                ok.then(|| StructLayout::c_struct(placed))
            }
        };

        // A recursion error may already have marked this type as failed.
        if self.visits.get(managed) == Some(&Visit::Failed) {
            return None;
        }

        match layout {
            Some(layout) => {
                let result = layout.layout;
                self.layouts.insert(managed.to_string(), layout);
                self.visits.insert(managed.to_string(), Visit::Done);
                Some(result)
            }
            None => {
                self.visits.insert(managed.to_string(), Visit::Failed);
                None
            }
        }
    }

    fn field_layout(&mut self, owner: &str, field: &BlittableField) -> Option<Layout> {
        let context = || format!("field `{}` of `{}`", field.name, owner);

        let unsupported = |reason: &str| BindsError::UnsupportedType {
            managed: field.ty.to_string(),
            context: context(),
            reason: reason.to_string(),
            location: field.location.clone(),
        };

        match &field.ty {
            ManagedType::Unit => {
                self.errors.push(unsupported("unit fields have no native layout"));
                None
            }
            ManagedType::Ref { .. } | ManagedType::Ptr { .. } => {
                self.errors.push(unsupported(
                    "blittable types cannot hold references or pointers",
                ));
                None
            }
            ManagedType::Path(_) if field.ty.is_opaque() => {
                self.errors
                    .push(unsupported("`c_void` is only valid behind a pointer"));
                None
            }
            ManagedType::Path(_) => {
                if let Some(kind) = field.ty.as_primitive() {
                    return Some(kind.layout(&self.builder.target));
                }

                let ident = field.ty.ident().unwrap_or_default();
                if !self.builder.index.contains_key(ident) {
                    self.errors.push(BindsError::UnregisteredType {
                        managed: field.ty.to_string(),
                        context: context(),
                        location: field.location.clone(),
                    });
                    return None;
                }
                self.visit(ident)
            }
        }
    }

    fn location_of(&self, managed: &str) -> Location {
        self.builder
            .index
            .get(managed)
            .map(|&idx| self.builder.types[idx].location.clone())
            .unwrap_or_default()
    }
}

/// Immutable, validated type mapping table.
#[derive(Debug, Clone)]
pub struct TypeMap {
    target: TargetLayout,
    types: Vec<BlittableType>,
    index: FxHashMap<String, usize>,
    layouts: FxHashMap<String, StructLayout>,
}

impl TypeMap {
    /// An empty table, only primitives resolve.
    pub fn empty(target: TargetLayout) -> Self {
        Self {
            target,
            types: Vec::new(),
            index: FxHashMap::default(),
            layouts: FxHashMap::default(),
        }
    }

    pub fn target(&self) -> &TargetLayout {
        &self.target
    }

    /// Look up the mapping for a managed type name. Qualified paths resolve by
    /// their last segment.
    pub fn get(&self, managed: &str) -> Option<&BlittableType> {
        let ident = managed.rsplit("::").next().unwrap_or(managed);
        self.index.get(ident).map(|&idx| &self.types[idx])
    }

    /// Native name of a mapped type, or `None` when it is not registered.
    pub fn resolve(&self, managed: &str) -> Option<&str> {
        self.get(managed).map(|ty| ty.native_name.as_str())
    }

    pub fn contains(&self, managed: &str) -> bool {
        self.get(managed).is_some()
    }

    /// Computed layout of a mapped type.
    pub fn layout_of(&self, managed: &str) -> Option<&StructLayout> {
        let ty = self.get(managed)?;
        self.layouts.get(&ty.managed)
    }

    /// Size and alignment of any type that can appear in a signature.
    ///
    /// References and pointers occupy a pointer slot. Unit has no layout.
    pub fn layout_of_type(&self, ty: &ManagedType) -> Option<Layout> {
        match ty {
            ManagedType::Unit => None,
            ManagedType::Ref { .. } | ManagedType::Ptr { .. } => {
                Some(Layout::pointer(&self.target))
            }
            ManagedType::Path(name) => match ty.as_primitive() {
                Some(kind) => Some(kind.layout(&self.target)),
                None => self.layout_of(name).map(|l| l.layout),
            },
        }
    }

    /// All mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlittableType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
