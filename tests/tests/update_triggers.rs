//! Update pipeline integration tests.

use std::sync::{Arc, Mutex};
use std::thread;
use warden_core::{Clock, FixedClock, PrimaryKey};
use warden_pipeline::{MutationResult, RowWrite, StorageResult};
use warden_registry::TriggerSource;
use warden_tests::prelude::*;

fn accounts() -> TableSchema {
    TableSchema::new()
        .column(ColumnDef::new("owner").required())
        .column(ColumnDef::new("balance").default_value(0))
        .column(ColumnDef::new("created_at").default_now())
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

mod delta {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Forwards to `MemoryStorage` and remembers every update it was asked
    /// to apply, directly or through `write_row`.
    struct RecordingStorage {
        inner: MemoryStorage,
        updates: Mutex<Vec<(PrimaryKey, Record)>>,
    }

    impl Storage for RecordingStorage {
        fn primary_key(&self, table_id: &TableId) -> StorageResult<String> {
            self.inner.primary_key(table_id)
        }

        fn get_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<Option<Record>> {
            self.inner.get_record(table_id, key)
        }

        fn write_row(
            &self,
            table_id: &TableId,
            key: PrimaryKey,
            decide: &mut dyn FnMut(&Record) -> MutationResult<RowWrite>,
        ) -> MutationResult<bool> {
            self.inner.write_row(table_id, key, &mut |current| {
                let write = decide(current)?;
                if let RowWrite::Update(changes) = &write {
                    self.updates.lock().unwrap().push((key, changes.clone()));
                }
                Ok(write)
            })
        }

        fn fill_defaults(&self, table_id: &TableId, record: &mut Record) -> StorageResult<()> {
            self.inner.fill_defaults(table_id, record)
        }

        fn insert_record(&self, table_id: &TableId, record: Record) -> StorageResult<PrimaryKey> {
            self.inner.insert_record(table_id, record)
        }

        fn update_record(
            &self,
            table_id: &TableId,
            key: PrimaryKey,
            changes: Record,
        ) -> StorageResult<()> {
            self.updates.lock().unwrap().push((key, changes.clone()));
            self.inner.update_record(table_id, key, changes)
        }

        fn delete_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<()> {
            self.inner.delete_record(table_id, key)
        }

        fn list_records(
            &self,
            table_id: &TableId,
            limit: usize,
            offset: usize,
        ) -> StorageResult<Vec<Record>> {
            self.inner.list_records(table_id, limit, offset)
        }

        fn search_records(
            &self,
            table_id: &TableId,
            conditions: &Record,
        ) -> StorageResult<Vec<Record>> {
            self.inner.search_records(table_id, conditions)
        }

        fn list_trigger_definitions(&self) -> StorageResult<Vec<TriggerSource>> {
            self.inner.list_trigger_definitions()
        }
    }

    fn pipeline() -> (MutationPipeline<RecordingStorage>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start()));
        let inner = MemoryStorage::new().with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        inner.create_table("accounts", accounts()).unwrap();
        let storage = Arc::new(RecordingStorage {
            inner,
            updates: Mutex::new(Vec::new()),
        });
        let pipeline = MutationPipeline::from_config(
            &EngineConfig::default(),
            storage,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (pipeline, clock)
    }

    #[test]
    fn test_untouched_fields_are_not_persisted() {
        // GIVEN
        let (pipeline, clock) = pipeline();
        let table = TableId::from("accounts");
        pipeline
            .insert(&table, record! { "owner" => "ann", "balance" => 100, "note" => "vip" })
            .unwrap();
        pipeline
            .register_trigger("accounts", EventKind::BeforeUpdate, "print(old_record.balance)")
            .unwrap();
        clock.advance(Duration::seconds(90));

        // WHEN
        let outcome = pipeline.update(&table, 1, record! { "balance" => 150 }).unwrap();

        // THEN
        let stamped = start() + Duration::seconds(90);
        let updates = pipeline.storage().updates.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec![(1, record! { "balance" => 150, "updated_at" => stamped })]
        );
        assert_eq!(outcome.diagnostics, vec!["100".to_string()]);
        assert_eq!(outcome.get("note"), Some(&Value::from("vip")));
        assert_eq!(outcome.get("created_at"), Some(&Value::Timestamp(start())));
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        // GIVEN
        let (pipeline, _) = pipeline();
        let table = TableId::from("accounts");
        pipeline.insert(&table, record! { "owner" => "ann", "balance" => 100 }).unwrap();

        // WHEN
        pipeline
            .update(&table, 1, record! { "owner" => "ann", "id" => 5 })
            .unwrap();

        // THEN
        let updates = pipeline.storage().updates.lock().unwrap().clone();
        assert_eq!(updates, vec![(1, record! { "updated_at" => start() })]);
    }
}

mod stamping {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("update_stamping")
            .table("accounts", accounts())
            .step(
                "seed",
                Op::insert("accounts", record! { "owner" => "ann", "balance" => 100 }),
                |a| a.ok(),
            )
            .step("later", Op::advance_clock(3600), |a| a)
            .step(
                "no_trigger",
                Op::update("accounts", 1, record! { "balance" => 120 }),
                |a| {
                    a.executed(false)
                        .field("balance", 120)
                        .field("updated_at", start() + Duration::hours(1))
                        .field("created_at", start())
                },
            )
            .step(
                "register_timestamp_override",
                Op::register(
                    "accounts",
                    EventKind::BeforeUpdate,
                    "record.updated_at = @2030-01-01T00:00:00Z\nrecord.created_at = @1999-01-01",
                ),
                |a| a.ok(),
            )
            .step(
                "snippet_timestamp_wins_but_creation_time_is_kept",
                Op::update("accounts", 1, record! { "balance" => 130 }),
                |a| {
                    a.executed(true)
                        .field("updated_at", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
                        .field("created_at", start())
                        .persisted(
                            1,
                            record! {
                                "balance" => 130,
                                "created_at" => start(),
                                "id" => 1i64,
                                "owner" => "ann",
                                "updated_at" => Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                            },
                        )
                },
            )
    }

    #[test]
    fn test_modification_timestamp_is_stamped_and_overridable() {
        scenario().run().unwrap();
    }
}

mod derived_fields {
    use super::*;

    const TOTAL: &str = r#"
        record.total = record.price * record.qty
        if record.total != old_record.total {
            record.repriced = true
        }
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("update_derived_fields")
            .table("orders", TableSchema::new())
            .step(
                "seed",
                Op::insert("orders", record! { "price" => 5, "qty" => 2, "total" => 10 }),
                |a| a.ok(),
            )
            .step("register", Op::register("orders", EventKind::BeforeUpdate, TOTAL), |a| a.ok())
            .step("change_qty", Op::update("orders", 1, record! { "qty" => 3 }), |a| {
                a.field("total", 15).field("repriced", true).field("price", 5)
            })
    }

    #[test]
    fn test_trigger_derived_values_are_persisted() {
        scenario().run().unwrap();
    }
}

mod failures {
    use super::*;

    pub fn scenario() -> Scenario {
        let original = record! {
            "balance" => 100,
            "created_at" => start(),
            "id" => 1i64,
            "owner" => "ann",
        };
        Scenario::new("update_failures")
            .table("accounts", accounts())
            .step(
                "seed",
                Op::insert("accounts", record! { "owner" => "ann", "balance" => 100 }),
                |a| a.ok(),
            )
            .step(
                "register",
                Op::register(
                    "accounts",
                    EventKind::BeforeUpdate,
                    "if record.balance < 0 { reject(\"overdraft\", \"balance was \" + str(old_record.balance)) }",
                ),
                |a| a.ok(),
            )
            .step(
                "overdraft",
                Op::update("accounts", 1, record! { "balance" => -5 }),
                |a| {
                    a.error_kind(ErrorKind::Validation)
                        .error_messages(&["overdraft", "balance was 100"])
                        .persisted(1, original.clone())
                },
            )
            .step("missing_row", Op::update("accounts", 99, record! { "balance" => 1 }), |a| {
                a.error_kind(ErrorKind::NotFound).error("record 99 not found")
            })
            .step(
                "required_field_cleared",
                Op::update("accounts", 1, record! { "owner" => Value::Null }),
                |a| a.error_kind(ErrorKind::Persistence).persisted(1, original.clone()),
            )
            .step(
                "old_record_is_read_only",
                Op::register("accounts", EventKind::BeforeUpdate, "old_record.balance = 0"),
                |a| a.error_kind(ErrorKind::Compile).error("old_record"),
            )
    }

    #[test]
    fn test_failed_update_leaves_row_untouched() {
        scenario().run().unwrap();
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        // GIVEN
        let pipeline = Arc::new(
            Scenario::new("concurrent_increments")
                .table("counters", TableSchema::new())
                .step(
                    "seed",
                    Op::insert("counters", record! { "n" => 0 }),
                    |a| a.ok(),
                )
                .step(
                    "register",
                    Op::register(
                        "counters",
                        EventKind::BeforeUpdate,
                        "record.n = old_record.n + 1",
                    ),
                    |a| a.ok(),
                )
                .run()
                .unwrap(),
        );

        // WHEN
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                thread::spawn(move || {
                    let table = TableId::from("counters");
                    for _ in 0..100 {
                        pipeline.update(&table, 1, Record::new()).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // THEN
        let row = pipeline.get(&TableId::from("counters"), 1).unwrap().unwrap();
        assert_eq!(row.get("n"), Some(&Value::Int(400)));
    }
}
