use folio_reflect::{
    builtin, PropertyCategory, PropertyDescriptor, PropertyFlags, ReflectedTypeDescriptor,
    RegistryError, TypeFlags, TypeKind, TypeRegistry,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn widget_v1() -> ReflectedTypeDescriptor {
    ReflectedTypeDescriptor::new("Widget")
        .with_plugin("engine")
        .with_version(1)
        .with_property(PropertyDescriptor::member("x", builtin::I32))
}

fn widget_v2() -> ReflectedTypeDescriptor {
    widget_v1()
        .with_version(2)
        .with_property(PropertyDescriptor::member("y", builtin::I32))
}

// ── Built-in types ───────────────────────────────────────────────

#[test]
fn builtin_registry_knows_primitives_and_document_types() {
    let reg = TypeRegistry::with_builtin_types();
    for name in [
        builtin::BOOL,
        builtin::I32,
        builtin::F64,
        builtin::STRING,
        builtin::UUID,
        builtin::DOCUMENT_ROOT,
        builtin::DOCUMENT_INFO,
    ] {
        let ty = reg.find(name).unwrap_or_else(|| panic!("missing {name}"));
        assert_eq!(reg.get(ty).unwrap().kind(), TypeKind::Native);
    }
    let root = reg.find(builtin::DOCUMENT_ROOT).unwrap();
    assert!(reg.get(root).unwrap().is_abstract());
}

#[test]
fn empty_registry_has_nothing() {
    let reg = TypeRegistry::new();
    assert!(reg.is_empty());
    assert!(reg.find(builtin::BOOL).is_none());
}

#[test]
fn native_type_cannot_be_registered_twice() {
    let mut reg = TypeRegistry::with_builtin_types();
    let err = reg
        .register_native(&ReflectedTypeDescriptor::new(builtin::BOOL))
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateType(builtin::BOOL.to_string()));
}

// ── Phantom registration ─────────────────────────────────────────

#[test]
fn first_announcement_creates_phantom_type() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();

    let entry = reg.get(ty).unwrap();
    assert_eq!(entry.name(), "Widget");
    assert!(entry.is_phantom());
    assert!(entry.flags().contains(TypeFlags::PHANTOM));
    assert_eq!(entry.properties().len(), 1);
    assert_eq!(reg.find("Widget"), Some(ty));
}

#[test]
fn identical_announcement_does_not_bump_revision() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();
    let revision = reg.revision();
    let type_revision = reg.get(ty).unwrap().revision();

    let again = reg.register_or_update(&widget_v1()).unwrap();

    assert_eq!(again, ty);
    assert_eq!(reg.revision(), revision);
    assert_eq!(reg.get(ty).unwrap().revision(), type_revision);
}

#[test]
fn changed_announcement_updates_in_place() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();
    let revision = reg.revision();

    let updated = reg.register_or_update(&widget_v2()).unwrap();

    assert_eq!(updated, ty);
    assert!(reg.revision() > revision);
    let entry = reg.get(ty).unwrap();
    assert_eq!(entry.type_version(), 2);
    assert_eq!(entry.revision(), 1);
    let names: Vec<&str> = entry.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert!(reg.matches(ty, &widget_v2()));
    assert!(!reg.matches(ty, &widget_v1()));
}

#[test]
fn version_only_change_refreshes_version_without_invalidation() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();
    let revision = reg.revision();

    reg.register_or_update(&widget_v1().with_version(7)).unwrap();

    assert_eq!(reg.revision(), revision);
    assert_eq!(reg.get(ty).unwrap().type_version(), 7);
}

#[test]
fn default_only_change_refreshes_defaults_without_invalidation() {
    let with_default = |version: u32, value: i32| {
        ReflectedTypeDescriptor::new("Widget")
            .with_plugin("engine")
            .with_version(version)
            .with_property(
                PropertyDescriptor::member("x", builtin::I32).with_default(json!(value)),
            )
    };
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&with_default(1, 1)).unwrap();
    let revision = reg.revision();

    reg.register_or_update(&with_default(2, 7)).unwrap();

    assert_eq!(reg.revision(), revision);
    assert_eq!(reg.initial_values(ty), vec![("x".to_string(), json!(7))]);
    let back = reg.get(ty).unwrap().to_descriptor();
    assert_eq!(back.properties[0].default_value, Some(json!(7)));
}

#[test]
fn announcement_for_native_type_is_ignored() {
    let mut reg = TypeRegistry::with_builtin_types();
    let info = reg.find(builtin::DOCUMENT_INFO).unwrap();
    let revision = reg.revision();

    let ty = reg
        .register_or_update(&ReflectedTypeDescriptor::new(builtin::DOCUMENT_INFO))
        .unwrap();

    assert_eq!(ty, info);
    assert_eq!(reg.revision(), revision);
    assert_eq!(reg.get(info).unwrap().kind(), TypeKind::Native);
}

#[test]
fn native_registration_supersedes_phantom_and_keeps_ref() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();
    let native = reg.register_native(&widget_v2()).unwrap();
    assert_eq!(native, ty);
    let entry = reg.get(ty).unwrap();
    assert_eq!(entry.kind(), TypeKind::Native);
    assert!(!entry.flags().contains(TypeFlags::PHANTOM));
}

// ── Failures ─────────────────────────────────────────────────────

#[test]
fn map_property_is_rejected_and_nothing_is_registered() {
    let mut reg = TypeRegistry::with_builtin_types();
    let len = reg.len();
    let desc = ReflectedTypeDescriptor::new("Lookup")
        .with_property(PropertyDescriptor::map("entries", builtin::STRING));

    let err = reg.register_or_update(&desc).unwrap_err();

    assert!(matches!(
        err,
        RegistryError::UnsupportedCategory { category: PropertyCategory::Map, .. }
    ));
    assert_eq!(reg.len(), len);
    assert!(reg.find("Lookup").is_none());
}

#[test]
fn map_property_in_update_leaves_previous_shape() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg.register_or_update(&widget_v1()).unwrap();
    let bad = widget_v1().with_property(PropertyDescriptor::map("m", builtin::I32));

    assert!(reg.register_or_update(&bad).is_err());
    assert!(reg.matches(ty, &widget_v1()));
}

#[test]
fn duplicate_property_names_are_rejected() {
    let mut reg = TypeRegistry::with_builtin_types();
    let desc = widget_v1().with_property(PropertyDescriptor::member("x", builtin::F32));
    let err = reg.register_or_update(&desc).unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateProperty {
            type_name: "Widget".to_string(),
            property: "x".to_string(),
        }
    );
}

#[test]
fn empty_type_name_is_invalid() {
    let mut reg = TypeRegistry::new();
    let err = reg.register_or_update(&ReflectedTypeDescriptor::new("")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDescriptor(_)));
}

#[test]
fn constant_without_value_is_invalid() {
    let mut reg = TypeRegistry::new();
    let mut prop = PropertyDescriptor::constant("pi", builtin::F64, json!(3.14));
    prop.constant_value = None;
    let err = reg
        .register_or_update(&ReflectedTypeDescriptor::new("Maths").with_property(prop))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDescriptor(_)));
}

// ── Parent resolution ────────────────────────────────────────────

#[test]
fn unresolved_parent_registers_type_and_reports_it() {
    let mut reg = TypeRegistry::with_builtin_types();
    let desc = ReflectedTypeDescriptor::new("Button").with_parent("Widget");

    let err = reg.register_or_update(&desc).unwrap_err();

    let ty = err.registered_type().unwrap();
    assert!(matches!(err, RegistryError::UnresolvedParent { ref parent, .. } if parent == "Widget"));
    let entry = reg.get(ty).unwrap();
    assert_eq!(entry.parent(), None);
    assert_eq!(entry.parent_name(), Some("Widget"));
    assert!(entry.has_unresolved_parent());
}

#[test]
fn late_parent_is_linked_when_it_arrives() {
    let mut reg = TypeRegistry::with_builtin_types();
    let button = reg
        .register_or_update(&ReflectedTypeDescriptor::new("Button").with_parent("Widget"))
        .unwrap_err()
        .registered_type()
        .unwrap();

    let widget = reg.register_or_update(&widget_v1()).unwrap();

    assert_eq!(reg.get(button).unwrap().parent(), Some(widget));
    assert!(reg.is_derived_from(button, widget));
    assert!(reg.register_or_update(&ReflectedTypeDescriptor::new("Button").with_parent("Widget")).is_ok());
}

#[test]
fn parent_cycle_is_not_linked() {
    let mut reg = TypeRegistry::new();
    let a = reg
        .register_or_update(&ReflectedTypeDescriptor::new("A").with_parent("B"))
        .unwrap_err()
        .registered_type()
        .unwrap();
    // B links to A; relinking A to B would close a cycle, so A stays open.
    let b = reg
        .register_or_update(&ReflectedTypeDescriptor::new("B").with_parent("A"))
        .unwrap();

    assert_eq!(reg.get(b).unwrap().parent(), Some(a));
    assert!(reg.get(a).unwrap().has_unresolved_parent());
    let linked = [a, b]
        .iter()
        .filter(|t| reg.get(**t).unwrap().parent().is_some())
        .count();
    assert_eq!(linked, 1);
    assert!(reg.ancestors(a).len() <= 2);
    assert!(reg.ancestors(b).len() <= 2);
}

#[test]
fn self_parent_is_invalid() {
    let mut reg = TypeRegistry::new();
    let err = reg
        .register_or_update(&ReflectedTypeDescriptor::new("Loop").with_parent("Loop"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDescriptor(_)));
}

// ── Inheritance ──────────────────────────────────────────────────

#[test]
fn properties_include_inherited_ones_base_first() {
    let mut reg = TypeRegistry::with_builtin_types();
    let widget = reg.register_or_update(&widget_v1()).unwrap();
    let button = reg
        .register_or_update(
            &ReflectedTypeDescriptor::new("Button")
                .with_parent("Widget")
                .with_property(PropertyDescriptor::member("label", builtin::STRING)),
        )
        .unwrap();

    let names: Vec<&str> = reg.properties(button).iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["x", "label"]);
    assert!(reg.property(button, "x").is_some());
    assert!(reg.property(widget, "label").is_none());
    assert!(!reg.is_derived_from(widget, button));
}

#[test]
fn initial_values_use_defaults_then_zero_values() {
    let mut reg = TypeRegistry::with_builtin_types();
    let ty = reg
        .register_or_update(
            &ReflectedTypeDescriptor::new("Light")
                .with_property(PropertyDescriptor::member("intensity", builtin::F32).with_default(json!(1.5)))
                .with_property(PropertyDescriptor::member("name", builtin::STRING))
                .with_property(PropertyDescriptor::member("broken", builtin::BOOL).with_default(json!("no")))
                .with_property(PropertyDescriptor::array("tags", builtin::STRING))
                .with_property(PropertyDescriptor::constant("kind", builtin::STRING, json!("light")))
                .with_property(PropertyDescriptor::function("toggle", builtin::BOOL)),
        )
        .unwrap();

    assert_eq!(
        reg.initial_values(ty),
        vec![
            ("intensity".to_string(), json!(1.5)),
            ("name".to_string(), json!("")),
            ("broken".to_string(), json!(false)),
            ("tags".to_string(), json!([])),
        ]
    );
}

// ── Teardown ─────────────────────────────────────────────────────

#[test]
fn clear_phantoms_keeps_native_types() {
    let mut reg = TypeRegistry::with_builtin_types();
    let natives = reg.len();
    reg.register_or_update(&widget_v1()).unwrap();
    reg.register_or_update(&ReflectedTypeDescriptor::new("Gizmo")).unwrap();

    assert_eq!(reg.clear_phantoms(), 2);
    assert_eq!(reg.len(), natives);
    assert!(reg.find("Widget").is_none());
}

#[test]
fn unregistering_parent_unlinks_children() {
    let mut reg = TypeRegistry::with_builtin_types();
    reg.register_or_update(&widget_v1()).unwrap();
    let button = reg
        .register_or_update(&ReflectedTypeDescriptor::new("Button").with_parent("Widget"))
        .unwrap();

    assert!(reg.unregister_phantom("Widget"));
    assert!(reg.get(button).unwrap().has_unresolved_parent());
    assert!(!reg.unregister_phantom(builtin::BOOL));
}

#[test]
fn reregistered_phantom_keeps_its_type_ref() {
    let mut reg = TypeRegistry::with_builtin_types();
    let first = reg.register_or_update(&widget_v1()).unwrap();

    assert!(reg.unregister_phantom("Widget"));
    assert!(reg.get(first).is_none());

    let second = reg.register_or_update(&widget_v2()).unwrap();
    assert_eq!(second, first);
    assert_eq!(reg.type_name(first), Some("Widget"));
    assert!(reg.get(first).unwrap().revision() > 0);
}

#[test]
fn native_registration_reclaims_retired_phantom_slot() {
    let mut reg = TypeRegistry::with_builtin_types();
    let phantom = reg.register_or_update(&widget_v1()).unwrap();
    let button = reg
        .register_or_update(&ReflectedTypeDescriptor::new("Button").with_parent("Widget"))
        .unwrap();
    reg.unregister_phantom("Widget");

    let native = reg.register_native(&widget_v1()).unwrap();

    assert_eq!(native, phantom);
    assert_eq!(reg.get(native).unwrap().kind(), TypeKind::Native);
    assert_eq!(reg.get(button).unwrap().parent(), Some(native));
}

#[test]
fn descriptor_roundtrips_through_registry() {
    let mut reg = TypeRegistry::with_builtin_types();
    let desc = widget_v2().with_property(
        PropertyDescriptor::set("layers", builtin::STRING).with_flags(PropertyFlags::HIDDEN),
    );
    let ty = reg.register_or_update(&desc).unwrap();
    let back = reg.get(ty).unwrap().to_descriptor();
    assert!(reg.matches(ty, &back));
    assert_eq!(back.properties, desc.properties);
}
