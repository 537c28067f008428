//! Integration tests for the mapping phase.
//!
//! These run the full pipeline (discovery, class pass, member pass) over in-memory
//! class models and check the properties renamed code relies on at runtime:
//! overrides share one name, kept symbols never move, and unmapped lookups are
//! the identity.

use std::{collections::BTreeSet, sync::Arc};

use classcloak::{
    config::{MemberRule, NamingMode, ObfuscationConfig},
    engine::ObfuscationEngine,
    hierarchy::HierarchyModel,
    mapping::{MappingManager, MappingStore},
    model::{ClassInfo, MemberAccess},
    Result,
};

const OBJECT: &str = "java/lang/Object";

fn config() -> ObfuscationConfig {
    ObfuscationConfig::default()
        .with_prefixes("a", "f", "m")
        .with_parallel(false)
}

fn run(classes: Vec<ClassInfo>, config: ObfuscationConfig) -> Result<MappingStore> {
    let engine = ObfuscationEngine::new(config)?;
    Ok(engine.run(&classes)?.store)
}

fn method(store: &MappingStore, owner: &str, name: &str, descriptor: &str) -> Option<String> {
    store.get_obfuscated_method(owner, name, descriptor)
}

#[test]
fn subclass_inherits_method_name() -> Result<()> {
    let store = run(
        vec![
            ClassInfo::new("p/A", Some(OBJECT)).with_method("foo", "()V"),
            ClassInfo::new("p/B", Some("p/A")).with_method("foo", "()V"),
        ],
        config(),
    )?;

    assert_eq!(store.get_obfuscated_class("p/A").as_deref(), Some("a1"));
    assert_eq!(store.get_obfuscated_class("p/B").as_deref(), Some("a2"));
    assert_eq!(method(&store, "p/A", "foo", "()V").as_deref(), Some("m1"));
    assert_eq!(method(&store, "p/B", "foo", "()V").as_deref(), Some("m1"));
    Ok(())
}

#[test]
fn override_family_is_independent_of_discovery_order() -> Result<()> {
    let a = ClassInfo::new("p/A", Some(OBJECT)).with_method("foo", "()V");
    let b = ClassInfo::new("p/B", Some("p/A")).with_method("foo", "()V");
    let c = ClassInfo::new("p/C", Some("p/A")).with_method("foo", "()V");

    let orders = [
        vec![a.clone(), b.clone(), c.clone()],
        vec![c.clone(), b.clone(), a.clone()],
        vec![b.clone(), c.clone(), a.clone()],
        vec![c, a, b],
    ];

    for order in orders {
        let store = run(order, config())?;
        let names: BTreeSet<_> = ["p/A", "p/B", "p/C"]
            .iter()
            .map(|owner| method(&store, owner, "foo", "()V"))
            .collect();
        assert_eq!(names.len(), 1, "family split into {names:?}");
        assert!(names.iter().all(Option::is_some));
        assert_eq!(store.method_count(), 3);
    }
    Ok(())
}

#[test]
fn interface_name_reaches_indirect_implementors() -> Result<()> {
    let store = run(
        vec![
            ClassInfo::new("p/Y", Some("p/Base")).with_method("bar", "()V"),
            ClassInfo::new("p/X", Some(OBJECT))
                .implementing(&["p/I"])
                .with_method("bar", "()V"),
            ClassInfo::new("p/Base", Some(OBJECT)).implementing(&["p/I"]),
            ClassInfo::interface("p/I", &[]).with_method("bar", "()V"),
        ],
        config(),
    )?;

    let name = method(&store, "p/I", "bar", "()V");
    assert!(name.is_some());
    assert_eq!(method(&store, "p/X", "bar", "()V"), name);
    assert_eq!(method(&store, "p/Y", "bar", "()V"), name);
    Ok(())
}

#[test]
fn kept_override_survives_sibling_propagation() -> Result<()> {
    let config = config().keep_method(MemberRule::new("p/C", "foo"));
    let store = run(
        vec![
            ClassInfo::new("p/A", Some(OBJECT)).with_method("foo", "()V"),
            ClassInfo::new("p/B", Some("p/A")).with_method("foo", "()V"),
            ClassInfo::new("p/C", Some("p/A")).with_method("foo", "()V"),
            ClassInfo::new("p/D", Some("p/C")).with_method("foo", "()V"),
        ],
        config,
    )?;

    assert_eq!(method(&store, "p/C", "foo", "()V"), None);
    assert!(store.is_method_kept("p/C", "foo", "()V"));

    let renamed = method(&store, "p/A", "foo", "()V");
    assert!(renamed.is_some());
    assert_eq!(method(&store, "p/B", "foo", "()V"), renamed);
    assert_eq!(method(&store, "p/D", "foo", "()V"), renamed);
    Ok(())
}

#[test]
fn fresh_names_avoid_members_that_keep_their_name() -> Result<()> {
    let config = config()
        .keep_method(MemberRule::new("p/A", "m1"))
        .keep_field(MemberRule::new("p/A", "f1"));
    let store = run(
        vec![
            ClassInfo::new("p/A", Some(OBJECT))
                .with_field("f1", "I")
                .with_method("m1", "()V")
                .with_method("foo", "()V"),
            ClassInfo::new("p/B", Some("p/A"))
                .with_field("count", "I")
                .with_method("bar", "()V"),
        ],
        config,
    )?;

    assert!(store.is_method_kept("p/A", "m1", "()V"));
    assert!(store.is_field_kept("p/A", "f1"));
    assert_eq!(method(&store, "p/A", "foo", "()V").as_deref(), Some("m2"));
    assert_eq!(method(&store, "p/B", "bar", "()V").as_deref(), Some("m3"));
    assert_eq!(store.get_obfuscated_field("p/B", "count").as_deref(), Some("f2"));
    Ok(())
}

#[test]
fn fresh_names_avoid_subclass_signatures() -> Result<()> {
    // p/B keeps m1()V; handing m1 to p/A.foo would make it an accidental override
    let config = config().keep_method(MemberRule::new("p/B", "m1"));
    let store = run(
        vec![
            ClassInfo::new("p/A", Some(OBJECT)).with_method("foo", "()V"),
            ClassInfo::new("p/B", Some("p/A")).with_method("m1", "()V"),
        ],
        config,
    )?;

    assert!(store.is_method_kept("p/B", "m1", "()V"));
    assert_eq!(method(&store, "p/A", "foo", "()V").as_deref(), Some("m2"));
    Ok(())
}

#[test]
fn library_override_is_pinned() -> Result<()> {
    let store = run(
        vec![
            ClassInfo::new("lib/Handler", Some(OBJECT))
                .with_method("handle", "(Ljava/lang/String;)Z")
                .as_library(),
            ClassInfo::new("p/MyHandler", Some("lib/Handler"))
                .with_method("handle", "(Ljava/lang/String;)Z")
                .with_method("helper", "()V"),
        ],
        config(),
    )?;

    assert_eq!(store.get_obfuscated_class("lib/Handler"), None);
    assert_eq!(store.get_obfuscated_class("p/MyHandler").as_deref(), Some("a1"));
    assert_eq!(method(&store, "p/MyHandler", "handle", "(Ljava/lang/String;)Z"), None);
    assert!(store.is_method_kept("p/MyHandler", "handle", "(Ljava/lang/String;)Z"));
    assert_eq!(method(&store, "p/MyHandler", "helper", "()V").as_deref(), Some("m1"));
    Ok(())
}

#[test]
fn runtime_wiring_is_never_renamed() -> Result<()> {
    let store = run(
        vec![ClassInfo::new("p/App", Some(OBJECT))
            .with_method("<init>", "()V")
            .with_method("<clinit>", "()V")
            .with_method("access$000", "(Lp/App;)I")
            .with_method_access("compareTo", "(Ljava/lang/Object;)I", MemberAccess::BRIDGE)
            .with_method_access(
                "main",
                "([Ljava/lang/String;)V",
                MemberAccess::PUBLIC | MemberAccess::STATIC,
            )
            .with_method("toString", "()Ljava/lang/String;")
            .with_method("run", "()V")],
        config(),
    )?;

    assert_eq!(store.method_count(), 1);
    assert_eq!(method(&store, "p/App", "run", "()V").as_deref(), Some("m1"));
    assert!(store.is_method_kept("p/App", "main", "([Ljava/lang/String;)V"));
    assert!(store.is_method_kept("p/App", "toString", "()Ljava/lang/String;"));
    Ok(())
}

#[test]
fn unmapped_lookups_return_the_original() -> Result<()> {
    let classes = vec![
        ClassInfo::new("p/A", Some(OBJECT))
            .with_field("count", "I")
            .with_method("foo", "()V"),
        ClassInfo::new("q/Other", Some(OBJECT)).with_method("bar", "()V"),
    ];
    let config = config().with_package_scope("p");
    let hierarchy = Arc::new(HierarchyModel::from_classes(&classes));
    let manager = MappingManager::from_config(&config, hierarchy);

    let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
    manager.generate_class_mappings(&names)?;
    for class in &classes {
        manager.generate_member_mappings(class)?;
    }

    assert_eq!(manager.get_class_mapping("p/A"), "a1");
    assert_eq!(manager.get_class_mapping("q/Other"), "q/Other");
    assert_eq!(manager.get_class_mapping("x/Unknown"), "x/Unknown");
    assert_eq!(manager.get_field_mapping("p/A", "count"), "f1");
    assert_eq!(manager.get_field_mapping("p/A", "missing"), "missing");
    assert_eq!(manager.get_method_mapping("q/Other", "bar", "()V"), "bar");
    assert_eq!(manager.get_method_mapping("p/A", "foo", "(I)V"), "foo");
    Ok(())
}

#[test]
fn alphabetic_class_names() -> Result<()> {
    let classes: Vec<ClassInfo> = (0..27)
        .map(|i| ClassInfo::new(&format!("p/C{i:02}"), Some(OBJECT)))
        .collect();
    let store = run(
        classes,
        config().with_mode(NamingMode::SequentialAlphabetic),
    )?;

    assert_eq!(store.get_obfuscated_class("p/C00").as_deref(), Some("a"));
    assert_eq!(store.get_obfuscated_class("p/C25").as_deref(), Some("z"));
    assert_eq!(store.get_obfuscated_class("p/C26").as_deref(), Some("aa"));
    Ok(())
}

#[test]
fn random_mode_with_seed_is_reproducible() -> Result<()> {
    let classes: Vec<ClassInfo> = (0..40)
        .map(|i| {
            ClassInfo::new(&format!("p/C{i}"), Some(OBJECT))
                .with_field("value", "I")
                .with_method("compute", "()I")
        })
        .collect();
    let config = config().with_mode(NamingMode::RandomShort).with_seed(7);

    let first = run(classes.clone(), config.clone())?;
    let second = run(classes, config)?;
    assert_eq!(first.tables(), second.tables());

    let names: BTreeSet<String> = first.class_mappings().into_values().collect();
    assert_eq!(names.len(), 40);
    assert!(names.iter().all(|n| n.len() == 4 && n.bytes().all(|b| b.is_ascii_lowercase())));
    Ok(())
}

#[test]
fn seed_is_reproducible_with_the_default_thread_pool() -> Result<()> {
    let classes = wide_model();
    let config = ObfuscationConfig::default()
        .with_mode(NamingMode::RandomShort)
        .with_seed(42);
    assert!(config.parallel);

    let first = run(classes.clone(), config.clone())?;
    for _ in 0..8 {
        let again = run(classes.clone(), config.clone())?;
        assert_eq!(first.tables(), again.tables());
    }
    Ok(())
}

/// Three-level hierarchy with an interface on every second leaf.
fn wide_model() -> Vec<ClassInfo> {
    let mut classes = vec![
        ClassInfo::interface("p/Visitor", &[]).with_method("visit", "(Lp/Node;)V"),
        ClassInfo::new("p/Node", Some(OBJECT))
            .with_field("id", "I")
            .with_method("accept", "(Lp/Visitor;)V")
            .with_method("size", "()I"),
    ];
    for i in 0..16 {
        let mid = format!("p/Mid{i}");
        classes.push(
            ClassInfo::new(&mid, Some("p/Node"))
                .with_field("weight", "J")
                .with_method("size", "()I"),
        );
        for j in 0..4 {
            let mut leaf = ClassInfo::new(&format!("p/Leaf{i}_{j}"), Some(&mid))
                .with_method("accept", "(Lp/Visitor;)V")
                .with_method(&format!("own{j}"), "()V");
            if j % 2 == 0 {
                leaf = leaf
                    .implementing(&["p/Visitor"])
                    .with_method("visit", "(Lp/Node;)V");
            }
            classes.push(leaf);
        }
    }
    classes
}

#[test]
fn parallel_run_keeps_families_consistent() -> Result<()> {
    let classes = wide_model();
    let sequential = run(classes.clone(), config())?;
    let parallel = run(classes.clone(), config().with_parallel(true))?;

    assert_eq!(sequential.class_mappings(), parallel.class_mappings());
    assert_eq!(sequential.field_count(), parallel.field_count());
    assert_eq!(sequential.method_count(), parallel.method_count());

    for store in [&sequential, &parallel] {
        let accept = method(store, "p/Node", "accept", "(Lp/Visitor;)V");
        let size = method(store, "p/Node", "size", "()I");
        let visit = method(store, "p/Visitor", "visit", "(Lp/Node;)V");
        assert!(accept.is_some() && size.is_some() && visit.is_some());

        for class in &classes {
            for m in &class.methods {
                let expected = match m.name.as_str() {
                    "accept" => &accept,
                    "size" => &size,
                    "visit" => &visit,
                    _ => continue,
                };
                assert_eq!(&method(store, &class.name, &m.name, &m.descriptor), expected);
            }
        }
    }
    Ok(())
}

#[test]
fn reverse_lookup_of_engine_output() -> Result<()> {
    let store = run(
        vec![ClassInfo::new("p/A", Some(OBJECT))
            .with_field("count", "I")
            .with_method("foo", "()V")],
        config(),
    )?;

    assert_eq!(store.get_original_name("a1").as_deref(), Some("p/A"));
    assert_eq!(store.get_original_name("a1.f1").as_deref(), Some("p/A.count"));
    assert_eq!(store.get_original_name("a1.m1").as_deref(), Some("p/A.foo()V"));
    assert_eq!(store.get_original_name("zz"), None);
    Ok(())
}
