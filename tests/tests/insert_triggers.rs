//! Insert pipeline integration tests.

use warden_tests::prelude::*;

fn users() -> TableSchema {
    TableSchema::new()
        .column(ColumnDef::new("name").required())
        .column(ColumnDef::new("email").unique())
        .column(ColumnDef::new("status").default_value("active"))
        .column(ColumnDef::new("created_at").default_now())
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

mod without_trigger {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("insert_without_trigger")
            .table("users", users())
            .step(
                "insert_with_caller_key",
                Op::insert("users", record! { "name" => "X", "email" => "A@B.COM", "id" => 77 }),
                |a| {
                    a.executed(false)
                        .record(record! {
                            "created_at" => start(),
                            "email" => "A@B.COM",
                            "id" => 1i64,
                            "name" => "X",
                            "status" => "active",
                        })
                        .rows(1)
                },
            )
            .step(
                "second_insert_gets_next_key",
                Op::insert("users", record! { "name" => "Y" }),
                |a| a.field("id", 2i64).field("status", "active").rows(2),
            )
    }

    #[test]
    fn test_record_persisted_as_supplied_plus_defaults_and_key() {
        scenario().run().unwrap();
    }
}

mod normalization {
    use super::*;

    const NORMALIZE: &str = r#"
        // normalise the address and try to pick our own key
        record.email = lower(trim(record.email))
        record.id = 12345
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("normalize_email")
            .table("users", users())
            .step(
                "register",
                Op::register("users", EventKind::BeforeInsert, NORMALIZE),
                |a| a.ok(),
            )
            .step(
                "insert",
                Op::insert("users", record! { "name" => "X", "email" => " A@B.COM " }),
                |a| {
                    a.executed(true)
                        .field("email", "a@b.com")
                        .field("id", 1i64)
                        .field("name", "X")
                        .persisted(
                            1,
                            record! {
                                "created_at" => start(),
                                "email" => "a@b.com",
                                "id" => 1i64,
                                "name" => "X",
                                "status" => "active",
                            },
                        )
                },
            )
    }

    #[test]
    fn test_trigger_rewrites_field_but_not_primary_key() {
        scenario().run().unwrap();
    }
}

mod defaults_before_trigger {
    use super::*;

    const DERIVE: &str = r#"
        import datetime
        if record.status == "active" {
            record.note = "default seen"
        }
        record.created_year = datetime.year(record.created_at)
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("defaults_before_trigger")
            .table("users", users())
            .step("register", Op::register("users", EventKind::BeforeInsert, DERIVE), |a| a.ok())
            .step("insert", Op::insert("users", record! { "name" => "X" }), |a| {
                a.field("note", "default seen").field("created_year", 2024)
            })
            .step(
                "explicit_value_overrides_default",
                Op::insert("users", record! { "name" => "Y", "status" => "banned" }),
                |a| a.field("status", "banned").absent("note"),
            )
    }

    #[test]
    fn test_trigger_sees_schema_defaults() {
        scenario().run().unwrap();
    }
}

mod rejection {
    use super::*;

    const VALIDATE: &str = r#"
        if len(record.name) < 2 {
            reject("name too short")
        }
        print("accepted", record.name)
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("insert_rejection")
            .table("users", users())
            .step("register", Op::register("users", EventKind::BeforeInsert, VALIDATE), |a| a.ok())
            .step("rejected", Op::insert("users", record! { "name" => "X" }), |a| {
                a.error_kind(ErrorKind::Validation)
                    .error_messages(&["name too short"])
                    .rows(0)
            })
            .step("accepted", Op::insert("users", record! { "name" => "Xavier" }), |a| {
                a.diagnostics(&["accepted Xavier"]).field("id", 1i64).rows(1)
            })
    }

    #[test]
    fn test_rejected_insert_creates_no_row() {
        scenario().run().unwrap();
    }
}

mod runtime_failure {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("insert_runtime_failure")
            .table("users", users())
            .step(
                "register",
                Op::register("users", EventKind::BeforeInsert, "record.ratio = record.a / record.b"),
                |a| a.ok(),
            )
            .step(
                "divide_by_zero",
                Op::insert("users", record! { "name" => "X", "a" => 1, "b" => 0 }),
                |a| a.error_kind(ErrorKind::Runtime).error("division by zero").rows(0),
            )
            .step(
                "field_of_null",
                Op::register("users", EventKind::BeforeInsert, "record.x = record.missing.deeper"),
                |a| a.ok(),
            )
            .step("read_through_null", Op::insert("users", record! { "name" => "X" }), |a| {
                a.error_kind(ErrorKind::Runtime).rows(0)
            })
    }

    #[test]
    fn test_runtime_failure_aborts_insert() {
        scenario().run().unwrap();
    }
}

mod persistence_failure {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("insert_persistence_failure")
            .table("users", users())
            .step(
                "register",
                Op::register("users", EventKind::BeforeInsert, "record.email = lower(record.email)"),
                |a| a.ok(),
            )
            .step(
                "first",
                Op::insert("users", record! { "name" => "X", "email" => "a@b.com" }),
                |a| a.ok().rows(1),
            )
            .step(
                "duplicate_after_normalization",
                Op::insert("users", record! { "name" => "Y", "email" => "A@B.com" }),
                |a| a.error_kind(ErrorKind::Persistence).error("email").rows(1),
            )
            .step("missing_required", Op::insert("users", record! { "email" => "c@d" }), |a| {
                a.error_kind(ErrorKind::Persistence).error("name").rows(1)
            })
            .step("unknown_table", Op::insert("ghosts", record! {}), |a| {
                a.error_kind(ErrorKind::Persistence).error("unknown table")
            })
    }

    #[test]
    fn test_storage_rejection_is_reported() {
        scenario().run().unwrap();
    }
}
