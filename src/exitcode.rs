//! Process exit codes, following BSD `sysexits.h`.

pub const OK: i32 = 0;

/// Bad command line, or a date field that does not fit the node
pub const USAGE: i32 = 64;

/// Bad XML, unsupported document or unplaceable dates
pub const DATAERR: i32 = 65;

/// Handle not present in the tree
pub const NOINPUT: i32 = 66;

pub const SOFTWARE: i32 = 70;

pub const IOERR: i32 = 74;

pub const CONFIG: i32 = 78;
