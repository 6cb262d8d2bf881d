//! Delete pipeline integration tests.

use warden_tests::prelude::*;

fn invoices() -> TableSchema {
    TableSchema::new()
        .column(ColumnDef::new("number").required().unique())
        .column(ColumnDef::new("status").default_value("draft"))
}

mod veto {
    use super::*;

    const GUARD: &str = r#"
        if old_record.status == "paid" {
            reject("paid invoices cannot be deleted")
        }
        record.status = "deleting"
        print("deleting", old_record.number)
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("delete_veto")
            .table("invoices", invoices())
            .step(
                "seed_paid",
                Op::insert("invoices", record! { "number" => "INV-1", "status" => "paid" }),
                |a| a.ok(),
            )
            .step(
                "seed_draft",
                Op::insert("invoices", record! { "number" => "INV-2" }),
                |a| a.ok().rows(2),
            )
            .step("register", Op::register("invoices", EventKind::BeforeDelete, GUARD), |a| a.ok())
            .step("delete_paid", Op::delete("invoices", 1), |a| {
                a.error_kind(ErrorKind::Validation)
                    .error("paid invoices cannot be deleted")
                    .rows(2)
                    .persisted(
                        1,
                        record! { "id" => 1i64, "number" => "INV-1", "status" => "paid" },
                    )
            })
            .step("delete_draft", Op::delete("invoices", 2), |a| {
                a.executed(true)
                    .record(record! { "id" => 2i64, "number" => "INV-2", "status" => "draft" })
                    .diagnostics(&["deleting INV-2"])
                    .rows(1)
                    .gone(2)
            })
            .step("delete_again", Op::delete("invoices", 2), |a| {
                a.error_kind(ErrorKind::NotFound).rows(1)
            })
    }

    #[test]
    fn test_trigger_can_veto_deletion() {
        scenario().run().unwrap();
    }
}

mod without_trigger {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("delete_without_trigger")
            .table("invoices", invoices())
            .step(
                "seed",
                Op::insert("invoices", record! { "number" => "INV-9" }),
                |a| a.ok(),
            )
            .step("delete", Op::delete("invoices", 1), |a| {
                a.executed(false).field("number", "INV-9").rows(0)
            })
            .step(
                "key_is_not_reused",
                Op::insert("invoices", record! { "number" => "INV-9" }),
                |a| a.field("id", 2i64).rows(1),
            )
    }

    #[test]
    fn test_delete_returns_snapshot() {
        scenario().run().unwrap();
    }
}

mod runtime_failure {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("delete_runtime_failure")
            .table("invoices", invoices())
            .step(
                "seed",
                Op::insert("invoices", record! { "number" => "INV-3" }),
                |a| a.ok(),
            )
            .step(
                "register",
                Op::register("invoices", EventKind::BeforeDelete, "let n = int(old_record.number)"),
                |a| a.ok(),
            )
            .step("delete", Op::delete("invoices", 1), |a| {
                a.error_kind(ErrorKind::Runtime).rows(1)
            })
    }

    #[test]
    fn test_any_trigger_failure_keeps_row() {
        scenario().run().unwrap();
    }
}
