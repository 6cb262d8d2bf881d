//! Capability enforcement integration tests.

use warden_tests::prelude::*;

fn small_budget() -> SandboxConfig {
    SandboxConfig {
        max_steps: 2_000,
        max_duration_ms: None,
        max_string_bytes: 4_096,
        max_value_bytes: 1 << 20,
        ..SandboxConfig::default()
    }
}

mod static_rejection {
    use super::*;

    pub fn scenario() -> Scenario {
        let mut scenario = Scenario::new("static_capability_rejection").table("notes", TableSchema::new());
        let sources = [
            ("import_os", "record.ok = true\nimport os"),
            ("import_after_loop", "for x in [1, 2] { record.n = x }\nimport subprocess"),
            ("open_file", "record.body = open(\"/etc/passwd\")"),
            ("dunder_field", "record.cls = record.__class__"),
            ("dunder_local", "let __builtins__ = 1"),
            ("host_method", "record.system()"),
        ];
        for (name, source) in sources {
            scenario = scenario.step(
                name,
                Op::register("notes", EventKind::BeforeInsert, source),
                |a| a.error_kind(ErrorKind::Capability).error("capability violation"),
            );
        }
        scenario.step("nothing_registered", Op::insert("notes", record! {}), |a| {
            a.executed(false).absent("ok").rows(1)
        })
    }

    #[test]
    fn test_disallowed_operations_never_register() {
        scenario().run().unwrap();
    }
}

mod quotas {
    use super::*;

    const SPIN: &str = r#"
        record.touched = true
        while true { }
    "#;

    const BLOWUP: &str = r#"
        let s = "ab"
        while true { s = s + s }
        record.big = s
    "#;

    const NESTING: &str = r#"
        let xs = range(50000)
        let i = 0
        while i < 40 {
            xs = [xs, xs]
            i = i + 1
        }
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("quota_violations")
            .sandbox(small_budget())
            .table("notes", TableSchema::new())
            .step(
                "seed",
                Op::insert("notes", record! { "title" => "first" }),
                |a| a.ok().rows(1),
            )
            .step("register_spin", Op::register("notes", EventKind::BeforeInsert, SPIN), |a| {
                a.ok()
            })
            .step("insert_spins", Op::insert("notes", record! { "title" => "x" }), |a| {
                a.error_kind(ErrorKind::Capability).rows(1)
            })
            .step(
                "register_blowup",
                Op::register("notes", EventKind::BeforeUpdate, BLOWUP),
                |a| a.ok(),
            )
            .step(
                "update_blows_up",
                Op::update("notes", 1, record! { "title" => "second" }),
                |a| {
                    a.error_kind(ErrorKind::Capability)
                        .persisted(1, record! { "id" => 1i64, "title" => "first" })
                },
            )
            .step(
                "register_nesting",
                Op::register("notes", EventKind::BeforeDelete, NESTING),
                |a| a.ok(),
            )
            .step("delete_nests", Op::delete("notes", 1), |a| {
                a.error_kind(ErrorKind::Capability)
                    .error_pattern("value size")
                    .persisted(1, record! { "id" => 1i64, "title" => "first" })
            })
    }

    #[test]
    fn test_exhausted_quota_aborts_without_persistence() {
        scenario().run().unwrap();
    }
}

mod allowed_modules {
    use super::*;

    const ENRICH: &str = r#"
        import re, datetime, math, json
        if not re.is_match("^[A-Z]{3}-[0-9]+$", record.code) {
            reject("bad code: " + record.code)
        }
        record.expires = datetime.add_days(datetime.now(), 30)
        record.area = math.pow(record.side, 2)
        record.meta = json.encode({"code": record.code})
    "#;

    pub fn scenario() -> Scenario {
        Scenario::new("allowed_modules")
            .table("parts", TableSchema::new())
            .step("register", Op::register("parts", EventKind::BeforeInsert, ENRICH), |a| a.ok())
            .step(
                "valid",
                Op::insert("parts", record! { "code" => "ABC-12", "side" => 3 }),
                |a| {
                    a.field("area", 9)
                        .field("expires", Utc.with_ymd_and_hms(2024, 2, 14, 10, 30, 0).unwrap())
                        .field("meta", "{\"code\":\"ABC-12\"}")
                        .rows(1)
                },
            )
            .step(
                "invalid",
                Op::insert("parts", record! { "code" => "abc", "side" => 1 }),
                |a| a.error_messages(&["bad code: abc"]).rows(1),
            )
    }

    #[test]
    fn test_allow_listed_modules_are_usable() {
        scenario().run().unwrap();
    }
}
