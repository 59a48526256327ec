//! SQL identifier quoting.
//!
//! These functions escape the quote character of their style by doubling
//! it, so any input yields a single well-formed identifier. They do not
//! validate or filter names: callers must not pass untrusted identifiers
//! expecting them to be rejected.

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`).
///
/// # Examples
///
/// ```
/// use joinsql_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("user\"name"), "\"user\"\"name\"");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// Embedded backticks are escaped by doubling them (`` ` `` → ``` `` ```).
///
/// # Examples
///
/// ```
/// use joinsql_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("users"), "`users`");
/// assert_eq!(quote_ident_mysql("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a SQL identifier using SQL Server bracket quoting.
///
/// Only the closing bracket needs escaping (`]` → `]]`).
///
/// # Examples
///
/// ```
/// use joinsql_core::quote_ident_mssql;
///
/// assert_eq!(quote_ident_mssql("users"), "[users]");
/// assert_eq!(quote_ident_mssql("a]b"), "[a]]b]");
/// ```
#[inline]
pub fn quote_ident_mssql(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}
