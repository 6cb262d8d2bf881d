//! The fixed capability set visible to snippets.
//!
//! Every function a snippet can call is listed here with its arity. The
//! sandbox implements exactly these entries; anything else is either unknown
//! (a compile error) or explicitly forbidden (a capability violation).

/// Signature of a callable: name and accepted argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnSig {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` means variadic.
    pub max_args: Option<usize>,
}

impl FnSig {
    const fn new(name: &'static str, min_args: usize, max_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
        }
    }

    const fn variadic(name: &'static str, min_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: None,
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// An allow-listed module and its functions.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSig {
    pub name: &'static str,
    pub functions: &'static [FnSig],
}

impl ModuleSig {
    pub fn function(&self, name: &str) -> Option<&'static FnSig> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Names bound by the evaluator for every run.
pub const RECORD: &str = "record";
pub const OLD_RECORD: &str = "old_record";

/// Global builtins, always in scope.
pub const BUILTINS: &[FnSig] = &[
    // strings
    FnSig::new("len", 1, 1),
    FnSig::new("lower", 1, 1),
    FnSig::new("upper", 1, 1),
    FnSig::new("trim", 1, 1),
    FnSig::new("substring", 2, 3),
    FnSig::new("starts_with", 2, 2),
    FnSig::new("ends_with", 2, 2),
    FnSig::new("contains", 2, 2),
    FnSig::new("replace", 3, 3),
    FnSig::new("split", 2, 2),
    FnSig::new("join", 2, 2),
    // conversion
    FnSig::new("str", 1, 1),
    FnSig::new("int", 1, 1),
    FnSig::new("float", 1, 1),
    FnSig::new("type_of", 1, 1),
    // numbers
    FnSig::new("abs", 1, 1),
    FnSig::new("floor", 1, 1),
    FnSig::new("ceil", 1, 1),
    FnSig::new("round", 1, 2),
    FnSig::variadic("min", 1),
    FnSig::variadic("max", 1),
    FnSig::new("sum", 1, 1),
    // nulls
    FnSig::variadic("coalesce", 1),
    FnSig::new("is_null", 1, 1),
    // collections
    FnSig::new("keys", 1, 1),
    FnSig::new("values", 1, 1),
    FnSig::new("has", 2, 2),
    FnSig::new("push", 2, 2),
    FnSig::new("range", 1, 3),
    // effects
    FnSig::variadic("print", 0),
    FnSig::variadic("reject", 1),
];

pub const MODULES: &[ModuleSig] = &[
    ModuleSig {
        name: "re",
        functions: &[
            FnSig::new("is_match", 2, 2),
            FnSig::new("find", 2, 2),
            FnSig::new("find_all", 2, 2),
            FnSig::new("replace", 3, 3),
        ],
    },
    ModuleSig {
        name: "datetime",
        functions: &[
            FnSig::new("now", 0, 0),
            FnSig::new("date", 3, 3),
            FnSig::new("datetime", 3, 6),
            FnSig::new("parse", 1, 1),
            FnSig::new("iso", 1, 1),
            FnSig::new("year", 1, 1),
            FnSig::new("month", 1, 1),
            FnSig::new("day", 1, 1),
            FnSig::new("hour", 1, 1),
            FnSig::new("minute", 1, 1),
            FnSig::new("second", 1, 1),
            FnSig::new("weekday", 1, 1),
            FnSig::new("add_days", 2, 2),
            FnSig::new("add_seconds", 2, 2),
            FnSig::new("diff_seconds", 2, 2),
            FnSig::new("format", 2, 2),
        ],
    },
    ModuleSig {
        name: "time",
        functions: &[FnSig::new("epoch", 0, 0), FnSig::new("epoch_millis", 0, 0)],
    },
    ModuleSig {
        name: "math",
        functions: &[
            FnSig::new("sqrt", 1, 1),
            FnSig::new("pow", 2, 2),
            FnSig::new("floor", 1, 1),
            FnSig::new("ceil", 1, 1),
            FnSig::new("pi", 0, 0),
            FnSig::new("e", 0, 0),
        ],
    },
    ModuleSig {
        name: "decimal",
        functions: &[
            FnSig::new("parse", 1, 1),
            FnSig::new("round", 2, 2),
            FnSig::new("to_float", 1, 1),
        ],
    },
    ModuleSig {
        name: "uuid",
        functions: &[FnSig::new("v4", 0, 0), FnSig::new("parse", 1, 1)],
    },
    ModuleSig {
        name: "json",
        functions: &[FnSig::new("encode", 1, 1), FnSig::new("decode", 1, 1)],
    },
];

/// Host primitives that must never be reachable. Referencing one is a
/// capability violation rather than an unknown name.
pub const FORBIDDEN: &[&str] = &[
    "open",
    "exec",
    "eval",
    "compile",
    "globals",
    "locals",
    "vars",
    "dir",
    "getattr",
    "setattr",
    "delattr",
    "hasattr",
    "input",
    "exit",
    "quit",
    "system",
    "spawn",
    "env",
    "getenv",
    "setenv",
    "socket",
    "connect",
    "file",
    "read_file",
    "write_file",
    "breakpoint",
    "import_module",
    "os",
    "sys",
    "subprocess",
];

pub fn builtin(name: &str) -> Option<&'static FnSig> {
    BUILTINS.iter().find(|f| f.name == name)
}

pub fn module(name: &str) -> Option<&'static ModuleSig> {
    MODULES.iter().find(|m| m.name == name)
}

pub fn is_module(name: &str) -> bool {
    module(name).is_some()
}

pub fn is_forbidden(name: &str) -> bool {
    FORBIDDEN.contains(&name)
}

pub fn is_dunder(name: &str) -> bool {
    name.starts_with("__")
}

/// Names a snippet may not rebind.
pub fn is_reserved(name: &str) -> bool {
    name == RECORD || name == OLD_RECORD || builtin(name).is_some() || is_module(name)
}
