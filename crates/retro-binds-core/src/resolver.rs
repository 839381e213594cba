//! Export declaration resolution.
//!
//! Turns scanned [`ExportDecl`]s into [`ExportedClass`]es by resolving each
//! parameter and return type against the [`TypeMap`]. For every position the
//! native type name comes from, in priority order:
//!
//! 1. an explicit [`NativeOverride`] name,
//! 2. the type mapping table entry for the managed type,
//! 3. the built-in primitive mapping.
//!
//! If none applies the declaration fails with its location. Indirection is
//! derived from the managed type:
//!
//! | managed        | native                          |
//! |----------------|---------------------------------|
//! | `T`            | `T` (const/by_ref ignored)      |
//! | `&T`           | `const T&`                      |
//! | `&mut T`       | `T&` (`const T&` with is_const) |
//! | `*const T`     | `const T*` (`const T&` by_ref)  |
//! | `*mut T`       | `T*` (`T&` with by_ref)         |
//! | `*mut c_void`  | `void*`                         |

use rustc_hash::{FxHashMap, FxHashSet};

use crate::naming::{to_pascal_case, to_snake_case};
use crate::{
    BindsError, ExportDecl, ExportedClass, ExportedMethod, Location, ManagedType, MethodDecl,
    NativeOverride, NativeType, Parameter, Passing, ReturnSlot, ReturnSlotPolicy, TypeMap,
};

/// Method names the generated `<Name>Binds` type defines for itself.
pub const RESERVED_METHOD_NAMES: &[&str] = &["resolve_all", "call_sites"];

/// Resolves export declarations against a type map.
///
/// A resolver instance represents one generator run: it remembers every
/// export it has resolved so duplicate exports across files are reported.
pub struct ExportResolver<'a> {
    types: &'a TypeMap,
    policy: ReturnSlotPolicy,
    seen: FxHashMap<String, Location>,
}

/// Per-class accumulator for imports and used blittable types.
#[derive(Default)]
struct ClassUses {
    imports: Vec<String>,
    used_types: Vec<String>,
}

impl ClassUses {
    fn import(&mut self, module: &str) {
        if !self.imports.iter().any(|m| m == module) {
            self.imports.push(module.to_string());
        }
    }

    fn use_type(&mut self, managed: &str) {
        if !self.used_types.iter().any(|t| t == managed) {
            self.used_types.push(managed.to_string());
        }
    }
}

impl<'a> ExportResolver<'a> {
    pub fn new(types: &'a TypeMap, policy: ReturnSlotPolicy) -> Self {
        Self {
            types,
            policy,
            seen: FxHashMap::default(),
        }
    }

    /// Resolve a batch of declarations, collecting every error.
    pub fn resolve_all<'d>(
        &mut self,
        decls: impl IntoIterator<Item = &'d ExportDecl>,
    ) -> Result<Vec<ExportedClass>, Vec<BindsError>> {
        let mut classes = Vec::new();
        let mut errors = Vec::new();

        for decl in decls {
            match self.resolve(decl) {
                Ok(class) => classes.push(class),
                Err(mut errs) => errors.append(&mut errs),
            }
        }

        if errors.is_empty() {
            Ok(classes)
        } else {
            Err(errors)
        }
    }

    /// Resolve one declaration.
    pub fn resolve(&mut self, decl: &ExportDecl) -> Result<ExportedClass, Vec<BindsError>> {
        let mut errors = Vec::new();

        let key = qualified(&decl.managed_namespace, &decl.name);
        if let Some(first) = self.seen.get(&key) {
            errors.push(BindsError::DuplicateExport {
                name: key.clone(),
                first: first.clone(),
                location: decl.location.clone(),
            });
        } else {
            self.seen.insert(key, decl.location.clone());
        }

        let mut uses = ClassUses::default();

        let mapped_namespace = match &decl.subject {
            Some(subject) => match self.types.get(subject) {
                Some(ty) => {
                    uses.use_type(&ty.managed);
                    if let Some(module) = &ty.native_module {
                        uses.import(module);
                    }
                    ty.native_namespace().map(str::to_string)
                }
                None => {
                    errors.push(BindsError::UnregisteredType {
                        managed: subject.clone(),
                        context: format!("subject of export `{}`", decl.name),
                        location: decl.location.clone(),
                    });
                    None
                }
            },
            None => None,
        };

        let mut methods = Vec::with_capacity(decl.methods.len());
        let mut method_names: FxHashSet<String> = FxHashSet::default();

        for method in &decl.methods {
            if RESERVED_METHOD_NAMES.contains(&method.name.as_str()) {
                errors.push(BindsError::InvalidDeclaration {
                    message: format!(
                        "method `{}` of `{}` clashes with the generated `{}Binds::{}`",
                        method.name, decl.name, decl.name, method.name
                    ),
                    location: method.location.clone(),
                });
                continue;
            }

            let export_name = to_pascal_case(&method.name);
            if !method_names.insert(export_name.clone()) {
                errors.push(BindsError::DuplicateMethod {
                    class: decl.name.clone(),
                    method: method.name.clone(),
                    location: method.location.clone(),
                });
                continue;
            }

            match self.resolve_method(&decl.name, method, export_name, &mut uses) {
                Ok(resolved) => methods.push(resolved),
                Err(mut errs) => errors.append(&mut errs),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut imports = uses.imports;
        imports.sort();
        imports.dedup();

        Ok(ExportedClass {
            name: decl.name.clone(),
            managed_namespace: decl.managed_namespace.clone(),
            native_namespace_override: decl.native_namespace.clone(),
            mapped_namespace,
            kind: decl.kind,
            methods,
            imports,
            used_types: uses.used_types,
            location: decl.location.clone(),
        })
    }

    fn resolve_method(
        &self,
        class: &str,
        method: &MethodDecl,
        export_name: String,
        uses: &mut ClassUses,
    ) -> Result<ExportedMethod, Vec<BindsError>> {
        let mut errors = Vec::new();
        let mut params = Vec::with_capacity(method.params.len());
        let mut param_names: FxHashSet<&str> = FxHashSet::default();

        for param in &method.params {
            if !param_names.insert(param.name.as_str()) {
                errors.push(BindsError::DuplicateParameter {
                    class: class.to_string(),
                    method: method.name.clone(),
                    param: param.name.clone(),
                    location: param.location.clone(),
                });
                continue;
            }

            let context = format!("parameter `{}` of `{}::{}`", param.name, class, method.name);
            if param.ty.is_unit() {
                errors.push(BindsError::UnsupportedType {
                    managed: "()".to_string(),
                    context,
                    reason: "parameters cannot be unit".to_string(),
                    location: param.location.clone(),
                });
                continue;
            }

            let resolved = self.resolve_position(
                &param.ty,
                param.native.as_ref(),
                &context,
                &param.location,
                uses,
            );
            match resolved {
                Ok((native, passing, size)) => params.push(Parameter {
                    name: param.name.clone(),
                    managed: param.ty.clone(),
                    native,
                    passing,
                    size,
                }),
                Err(err) => errors.push(err),
            }
        }

        let ret = if method.ret.is_unit() {
            Some(ReturnSlot::void())
        } else if matches!(method.ret, ManagedType::Ref { .. }) {
            errors.push(BindsError::UnsupportedType {
                managed: method.ret.to_string(),
                context: format!("return type of `{}::{}`", class, method.name),
                reason: "references cannot be returned across the boundary, return a pointer"
                    .to_string(),
                location: method.location.clone(),
            });
            None
        } else {
            let context = format!("return type of `{}::{}`", class, method.name);
            match self.resolve_position(
                &method.ret,
                method.native_return.as_ref(),
                &context,
                &method.location,
                uses,
            ) {
                Ok((native, _, size)) => Some(ReturnSlot {
                    managed: method.ret.clone(),
                    native,
                    size,
                }),
                Err(err) => {
                    errors.push(err);
                    None
                }
            }
        };

        let Some(ret) = ret else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut block_size: usize = params.iter().map(|p| p.size).sum();
        if self.policy == ReturnSlotPolicy::Included {
            block_size += ret.size;
        }

        Ok(ExportedMethod {
            name: method.name.clone(),
            export_name,
            native_name: to_snake_case(&method.name),
            params,
            ret,
            block_size,
            location: method.location.clone(),
        })
    }

    /// Resolve the native type, passing mode and slot size of one position.
    fn resolve_position(
        &self,
        ty: &ManagedType,
        native: Option<&NativeOverride>,
        context: &str,
        location: &Location,
        uses: &mut ClassUses,
    ) -> Result<(NativeType, Passing, usize), BindsError> {
        let unsupported = |reason: &str| BindsError::UnsupportedType {
            managed: ty.to_string(),
            context: context.to_string(),
            reason: reason.to_string(),
            location: location.clone(),
        };

        let default = NativeOverride::default();
        let over = native.unwrap_or(&default);

        let (target, passing, is_const) = match ty {
            ManagedType::Unit => return Err(unsupported("unit cannot be passed")),
            ManagedType::Path(_) => (ty, Passing::Value, false),
            ManagedType::Ref { mutable, inner } => {
                (inner.as_ref(), Passing::Reference, !*mutable || over.is_const)
            }
            ManagedType::Ptr { mutable, inner } => {
                let passing = if over.by_ref {
                    Passing::Reference
                } else {
                    Passing::Pointer
                };
                (inner.as_ref(), passing, !*mutable || over.is_const)
            }
        };

        if !matches!(target, ManagedType::Path(_)) {
            return Err(unsupported("only one level of indirection is supported"));
        }

        if let Some(module) = &over.module {
            uses.import(module);
        }

        let base = if target.is_opaque() {
            if passing != Passing::Pointer {
                return Err(unsupported("`c_void` can only be passed by pointer"));
            }
            over.name.clone().unwrap_or_else(|| "void".to_string())
        } else if let Some(name) = &over.name {
            if let Some(mapped) = target.ident().and_then(|id| self.types.get(id)) {
                uses.use_type(&mapped.managed);
            }
            name.clone()
        } else if let Some(mapped) = target.ident().and_then(|id| self.types.get(id)) {
            uses.use_type(&mapped.managed);
            if let Some(module) = &mapped.native_module {
                uses.import(module);
            }
            mapped.native_name.clone()
        } else if let Some(kind) = target.as_primitive() {
            kind.native_name().to_string()
        } else {
            return Err(BindsError::UnregisteredType {
                managed: target.to_string(),
                context: context.to_string(),
                location: location.clone(),
            });
        };

        let native = match passing {
            Passing::Value => NativeType::value(base),
            Passing::Reference => NativeType::reference(base).with_const(is_const),
            Passing::Pointer => NativeType::pointer(base).with_const(is_const),
        };

        let size = match passing {
            Passing::Value => match self.types.layout_of_type(target) {
                Some(layout) => layout.size,
                None => {
                    return Err(BindsError::UnregisteredType {
                        managed: target.to_string(),
                        context: format!("{context} (by-value size unknown)"),
                        location: location.clone(),
                    });
                }
            },
            Passing::Reference | Passing::Pointer => self.types.target().pointer_size,
        };

        Ok((native, passing, size))
    }
}

fn qualified(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}::{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BlittableField, BlittableShape, BlittableType, ExportKind, ParamDecl, Span, TargetLayout,
        TypeMapBuilder,
    };

    fn loc(line: u32) -> Location {
        Location::new("interop/math.rs", Span::point(line, 5))
    }

    fn path(name: &str) -> ManagedType {
        ManagedType::path(name)
    }

    fn type_map() -> TypeMap {
        let f32_field = |n: &str| BlittableField::new(n, path("f32"), loc(1));
        let mut builder = TypeMapBuilder::new(TargetLayout::default());
        builder
            .register(
                BlittableType::new(
                    "Color",
                    "retro::Color",
                    BlittableShape::Struct {
                        fields: vec![f32_field("r"), f32_field("g"), f32_field("b"), f32_field("a")],
                    },
                    loc(1),
                )
                .with_module("retro.core"),
            )
            .unwrap();
        builder
            .register(
                BlittableType::new(
                    "Transform",
                    "retro::Transform",
                    BlittableShape::Struct {
                        fields: (0..10).map(|i| f32_field(&format!("m{i}"))).collect(),
                    },
                    loc(2),
                )
                .with_module("retro.core"),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn add_decl() -> ExportDecl {
        ExportDecl::new("MathModule", "interop::math", loc(10)).method(
            MethodDecl::new("add", loc(11))
                .param(ParamDecl::new("a", path("i32"), loc(11)))
                .param(ParamDecl::new("b", path("i32"), loc(11)))
                .returns(path("i32")),
        )
    }

    #[test]
    fn add_has_eight_byte_block() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let class = resolver.resolve(&add_decl()).unwrap();

        let add = &class.methods[0];
        assert_eq!(add.export_name, "Add");
        assert_eq!(add.native_name, "add");
        assert_eq!(add.block_size, 8);
        assert_eq!(add.ret.native.render(), "int32");
        assert_eq!(class.module_name(), "MathModule");
    }

    #[test]
    fn return_slot_can_be_included() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Included);
        let class = resolver.resolve(&add_decl()).unwrap();
        assert_eq!(class.methods[0].block_size, 12);
    }

    #[test]
    fn override_beats_mapping_beats_primitive() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("EntityExporter", "interop::entity", loc(20))
            .with_subject("Transform")
            .method(
                MethodDecl::new("get_entity_transform_offset", loc(21))
                    .param(
                        ParamDecl::new("id", path("u64"), loc(21)).with_native(
                            NativeOverride::named("retro::EntityId").with_module("retro.entity"),
                        ),
                    )
                    .param(ParamDecl::new(
                        "transform",
                        ManagedType::reference(path("Transform"), false),
                        loc(22),
                    ))
                    .param(ParamDecl::new("scale", path("f32"), loc(22)))
                    .returns(path("i32")),
            );

        let class = resolver.resolve(&decl).unwrap();
        let method = &class.methods[0];
        let names: Vec<_> = method.params.iter().map(|p| p.native_type_name()).collect();
        assert_eq!(names, vec!["retro::EntityId", "const retro::Transform&", "float"]);
        assert_eq!(method.export_name, "GetEntityTransformOffset");
        assert_eq!(method.block_size, 8 + 8 + 4);
        assert!(method.params[1].is_reference());
        assert!(method.params[1].is_const());

        assert_eq!(class.imports, vec!["retro.core", "retro.entity"]);
        assert_eq!(class.used_types, vec!["Transform"]);
        assert_eq!(class.native_namespace(), "retro");
    }

    #[test]
    fn pointer_rules() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Raw", "interop", loc(30)).method(
            MethodDecl::new("poke", loc(31))
                .param(ParamDecl::new(
                    "data",
                    ManagedType::pointer(path("c_void"), true),
                    loc(31),
                ))
                .param(
                    ParamDecl::new("color", ManagedType::pointer(path("Color"), false), loc(31))
                        .with_native(NativeOverride::default().by_ref()),
                )
                .param(
                    ParamDecl::new("count", path("u32"), loc(31))
                        .with_native(NativeOverride::default().constant().by_ref()),
                ),
        );
        let class = resolver.resolve(&decl).unwrap();
        let names: Vec<_> = class.methods[0]
            .params
            .iter()
            .map(|p| p.native_type_name())
            .collect();
        assert_eq!(names, vec!["void*", "const retro::Color&", "uint32"]);
        assert_eq!(class.methods[0].block_size, 8 + 8 + 4);
        assert!(class.methods[0].ret.is_void());
        assert_eq!(class.native_namespace(), "interop");
    }

    #[test]
    fn unregistered_parameter_type_fails_at_declaration() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Physics", "interop", loc(40)).method(
            MethodDecl::new("push", loc(41)).param(ParamDecl::new("force", path("Vec3"), loc(42))),
        );
        let errors = resolver.resolve(&decl).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], BindsError::UnregisteredType { .. }));
        assert_eq!(errors[0].location().span.line, 42);
        assert!(errors[0].to_string().contains("parameter `force`"));
    }

    #[test]
    fn duplicate_export_across_calls() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let result = resolver.resolve_all([&add_decl(), &add_decl()]);
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], BindsError::DuplicateExport { .. }));
    }

    #[test]
    fn same_name_in_other_namespace_is_allowed() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let mut other = add_decl();
        other.managed_namespace = "interop::other".into();
        let classes = resolver.resolve_all([&add_decl(), &other]).unwrap();
        assert_eq!(classes.len(), 2);
    }

    #[test]
    fn duplicate_method_and_parameter() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Dup", "interop", loc(50))
            .with_kind(ExportKind::Struct)
            .method(MethodDecl::new("tick", loc(51)))
            .method(MethodDecl::new("tick", loc(52)))
            .method(
                MethodDecl::new("set", loc(53))
                    .param(ParamDecl::new("x", path("i32"), loc(53)))
                    .param(ParamDecl::new("x", path("i32"), loc(54))),
            );
        let errors = resolver.resolve(&decl).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], BindsError::DuplicateMethod { .. }));
        assert!(matches!(errors[1], BindsError::DuplicateParameter { .. }));
    }

    #[test]
    fn stub_helper_names_are_rejected() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Scene", "interop", loc(80))
            .method(MethodDecl::new("registry", loc(81)).returns(path("i32")))
            .method(MethodDecl::new("resolve_all", loc(82)))
            .method(MethodDecl::new("call_sites", loc(83)));
        let errors = resolver.resolve(&decl).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], BindsError::InvalidDeclaration { .. }));
        assert_eq!(errors[0].location().span.line, 82);
        assert!(errors[0].to_string().contains("`SceneBinds::resolve_all`"));
        assert_eq!(errors[1].location().span.line, 83);
    }

    #[test]
    fn unknown_subject_is_reported() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Audio", "interop", loc(60)).with_subject("Sound");
        let errors = resolver.resolve(&decl).unwrap_err();
        assert!(errors[0].to_string().contains("subject of export `Audio`"));
    }

    #[test]
    fn reference_returns_are_rejected() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = ExportDecl::new("Scene", "interop", loc(70)).method(
            MethodDecl::new("root", loc(71))
                .returns(ManagedType::reference(path("Transform"), false)),
        );
        let errors = resolver.resolve(&decl).unwrap_err();
        assert!(matches!(errors[0], BindsError::UnsupportedType { .. }));
    }

    #[test]
    fn explicit_namespace_wins() {
        let types = type_map();
        let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
        let decl = add_decl()
            .with_subject("Color")
            .with_native_namespace("retro::math");
        let class = resolver.resolve(&decl).unwrap();
        assert_eq!(class.native_namespace(), "retro::math");
    }
}
