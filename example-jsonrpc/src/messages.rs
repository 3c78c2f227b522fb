//! Arguments and replies shared by the demo server and client. JSON-RPC puts no
//! constraints on these beyond serde.

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Args {
    pub a: i64,
    pub b: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quotient {
    pub quo: i64,
    pub rem: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Echo {
    pub message: String,
    pub nanotime: u64,
}
