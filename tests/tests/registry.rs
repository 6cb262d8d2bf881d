//! Trigger registration and reload integration tests.

use std::sync::Arc;
use std::thread;
use warden_tests::prelude::*;

mod registration {
    use super::*;
    use pretty_assertions::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("invalid_registration")
            .table("items", TableSchema::new())
            .step(
                "register_valid",
                Op::register("items", EventKind::BeforeInsert, "record.tag = \"v1\""),
                |a| a.ok(),
            )
            .step(
                "register_syntax_error",
                Op::register("items", EventKind::BeforeInsert, "record.tag = "),
                |a| a.error_kind(ErrorKind::Compile).error("syntax error"),
            )
            .step(
                "register_unknown_name",
                Op::register("items", EventKind::BeforeInsert, "record.tag = undefined_thing"),
                |a| a.error_kind(ErrorKind::Compile),
            )
            .step("previous_trigger_still_active", Op::insert("items", record! {}), |a| {
                a.executed(true).field("tag", "v1")
            })
            .step(
                "replace",
                Op::register("items", EventKind::BeforeInsert, "record.tag = \"v2\""),
                |a| a.ok(),
            )
            .step("replacement_active", Op::insert("items", record! {}), |a| {
                a.field("tag", "v2")
            })
            .step(
                "unregister",
                Op::unregister("items", EventKind::BeforeInsert),
                |a| a.ok(),
            )
            .step("no_trigger", Op::insert("items", record! {}), |a| {
                a.executed(false).absent("tag").rows(3)
            })
    }

    #[test]
    fn test_failed_registration_keeps_prior_trigger() {
        scenario().run().unwrap();
    }

    #[test]
    fn test_registry_state_unchanged_by_invalid_source() {
        // GIVEN
        let pipeline = Scenario::new("lookup_before_after").run().unwrap();
        let table = TableId::from("items");
        pipeline
            .register_trigger("items", EventKind::BeforeUpdate, "record.a = 1")
            .unwrap();
        let before = pipeline.registry().lookup(&table, EventKind::BeforeUpdate).unwrap();

        // WHEN
        let result = pipeline.register_trigger("items", EventKind::BeforeUpdate, "if {");
        let missing = pipeline.register_trigger("items", EventKind::BeforeDelete, "if {");

        // THEN
        assert!(result.is_err());
        assert!(missing.is_err());
        let after = pipeline.registry().lookup(&table, EventKind::BeforeUpdate).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!pipeline.registry().has_trigger(&table, EventKind::BeforeDelete));
        assert_eq!(pipeline.registry().len(), 1);
    }
}

mod reload {
    use super::*;
    use pretty_assertions::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("reload_from_storage")
            .table("items", TableSchema::new())
            .table("logs", TableSchema::new())
            .step(
                "store_insert_trigger",
                Op::store_trigger("items", EventKind::BeforeInsert, Some("record.source = \"stored\"")),
                |a| a.ok(),
            )
            .step(
                "store_broken_trigger",
                Op::store_trigger("logs", EventKind::BeforeInsert, Some("record.x = ")),
                |a| a.ok(),
            )
            .step("not_loaded_yet", Op::insert("items", record! {}), |a| {
                a.executed(false)
            })
            .step("reload", Op::reload(), |a| a.loaded(1).rejected(1))
            .step("reload_again", Op::reload(), |a| a.loaded(1).rejected(1))
            .step("loaded", Op::insert("items", record! {}), |a| {
                a.executed(true).field("source", "stored")
            })
            .step("broken_skipped", Op::insert("logs", record! {}), |a| a.executed(false))
            .step(
                "register_outside_storage",
                Op::register("logs", EventKind::BeforeUpdate, "record.y = 1"),
                |a| a.ok(),
            )
            .step(
                "clear_stored",
                Op::store_trigger("items", EventKind::BeforeInsert, None),
                |a| a.ok(),
            )
            .step("reload_replaces_everything", Op::reload(), |a| a.loaded(0).rejected(1))
            .step("cleared", Op::insert("items", record! {}), |a| a.executed(false))
    }

    #[test]
    fn test_reload_mirrors_storage() {
        scenario().run().unwrap();
    }

    #[test]
    fn test_reload_is_idempotent() {
        // GIVEN
        let pipeline = Scenario::new("reload_idempotent")
            .table("items", TableSchema::new().trigger(EventKind::BeforeInsert, "record.a = 1"))
            .table(
                "orders",
                TableSchema::new()
                    .trigger(EventKind::BeforeUpdate, "record.b = 2")
                    .trigger(EventKind::BeforeDelete, "reject(\"no\")"),
            )
            .run()
            .unwrap();
        let registry = pipeline.registry();
        let snapshot = || {
            let mut entries = Vec::new();
            for table in registry.tables() {
                for kind in EventKind::ALL {
                    if let Some(def) = registry.lookup(&table, kind) {
                        entries.push((table.clone(), kind, def.source.clone()));
                    }
                }
            }
            entries
        };

        // WHEN
        let first = pipeline.reload_triggers().unwrap();
        let after_first = snapshot();
        let second = pipeline.reload_triggers().unwrap();
        let after_second = snapshot();

        // THEN
        assert_eq!(first, second);
        assert_eq!(first.loaded, 3);
        assert_eq!(after_first, after_second);
        assert_eq!(after_first.len(), 3);
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_concurrent_mutations_see_whole_triggers() {
        // GIVEN
        let pipeline = Arc::new(
            Scenario::new("concurrent")
                .table("items", TableSchema::new())
                .run()
                .unwrap(),
        );
        pipeline
            .register_trigger("items", EventKind::BeforeInsert, "record.a = 0\nrecord.b = 0")
            .unwrap();

        // WHEN
        let writer = {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                for i in 1..50 {
                    let source = format!("record.a = {i}\nrecord.b = {i}");
                    pipeline
                        .register_trigger("items", EventKind::BeforeInsert, source)
                        .unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                thread::spawn(move || {
                    let table = TableId::from("items");
                    (0..50)
                        .map(|_| pipeline.insert(&table, record! {}).unwrap())
                        .all(|outcome| outcome.get("a") == outcome.get("b"))
                })
            })
            .collect();

        // THEN
        writer.join().unwrap();
        for reader in readers {
            assert!(reader.join().unwrap());
        }
        let table = TableId::from("items");
        assert_eq!(pipeline.storage().row_count(&table), Ok(200));
    }
}
