//! Keyset (cursor) pagination.
//!
//! Pages are addressed by the sort-key values of a boundary row. `first` and
//! `after` page forward; `last` and `before` page backward, which flips every
//! sort direction so the rows nearest the cursor come first. Callers reverse
//! backward pages before presenting them.

use crate::clause::{Limit, Order};
use crate::condition::Conditions;
use crate::config::CompilerConfig;
use crate::cursor::Cursor;
use crate::dialect::Dialect;
use crate::join::PageOptions;
use crate::select::PagedSelect;
use joinsql_core::{ConfigErrorKind, Error, OrderColumn, RelationNode, Result, SortDirection, Value};
use std::cmp::Ordering;

/// Lexicographic "strictly past the cursor" predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekPredicate {
    /// Unquoted alias the columns belong to.
    pub table: String,
    /// Columns with their effective (possibly flipped) directions.
    pub columns: Vec<OrderColumn>,
    /// Cursor values aligned with `columns`.
    pub values: Vec<Value>,
}

impl SeekPredicate {
    /// Render the predicate.
    ///
    /// Uses a row-value comparison when every column shares a direction and
    /// the dialect supports it, otherwise the expanded OR form.
    pub fn render(&self, dialect: Dialect) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| dialect.qualify(&self.table, &c.column))
            .collect();
        let vals: Vec<String> = self.values.iter().map(|v| dialect.literal(v)).collect();

        if cols.len() == 1 {
            return format!("{} {} {}", cols[0], operator(self.columns[0].direction), vals[0]);
        }

        let uniform = self
            .columns
            .windows(2)
            .all(|w| w[0].direction == w[1].direction);
        if uniform && dialect.supports_row_value_comparison() {
            if let Some(first) = self.columns.first() {
                return format!(
                    "({}) {} ({})",
                    cols.join(", "),
                    operator(first.direction),
                    vals.join(", ")
                );
            }
        }

        // (c1 op v1 OR (c1 = v1 AND (c2 op v2 OR (c2 = v2 AND c3 op v3))))
        let n = cols.len();
        let mut expr = format!(
            "{} {} {}",
            cols[n - 1],
            operator(self.columns[n - 1].direction),
            vals[n - 1]
        );
        for i in (0..n - 1).rev() {
            expr = format!(
                "({c} {op} {v} OR ({c} = {v} AND {expr}))",
                c = cols[i],
                op = operator(self.columns[i].direction),
                v = vals[i],
            );
        }
        expr
    }

    /// Does a row (sort-key values in column order) lie strictly past the
    /// cursor? NULLs compare as unknown and are never admitted.
    pub fn admits(&self, row: &[Value]) -> bool {
        for ((column, cursor), value) in self.columns.iter().zip(&self.values).zip(row) {
            let wanted = match column.direction {
                SortDirection::Asc => Ordering::Greater,
                SortDirection::Desc => Ordering::Less,
            };
            match value.sql_cmp(cursor) {
                Some(Ordering::Equal) => {}
                Some(ord) => return ord == wanted,
                None => return false,
            }
        }
        false
    }
}

fn operator(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => ">",
        SortDirection::Desc => "<",
    }
}

/// An interpreted keyset page.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetPage {
    pub limit: Limit,
    /// Effective order (flipped when `backward`).
    pub order: Order,
    pub predicate: Option<SeekPredicate>,
    /// Rows come out nearest-to-cursor first and must be reversed.
    pub backward: bool,
}

/// Interpret a node's arguments for keyset pagination.
///
/// The sort key comes from the node, else from its junction. No tie-break
/// columns are added: a sort key that is not unique gives unstable pages.
pub fn interpret_keyset(node: &RelationNode, config: &CompilerConfig) -> Result<KeysetPage> {
    let (table, sort_key) = if let Some(key) = &node.sort_key {
        (node.alias.as_str(), key.as_slice())
    } else if let Some((alias, key)) = node
        .junction
        .as_ref()
        .and_then(|j| j.sort_key.as_ref().map(|k| (j.alias.as_str(), k.as_slice())))
    {
        (alias, key)
    } else {
        return Err(invalid(node, "keyset pagination requires a sort_key"));
    };
    if sort_key.is_empty() {
        return Err(invalid(node, "sort_key must name at least one column"));
    }

    let args = &node.args;
    match (args.first, args.last, &args.after, &args.before) {
        (Some(_), Some(_), _, _) => {
            return Err(invalid(node, "`first` and `last` cannot be combined"));
        }
        (Some(_), None, _, Some(_)) => {
            return Err(invalid(node, "`before` cannot be used with `first`"));
        }
        (None, Some(_), Some(_), _) => {
            return Err(invalid(node, "`after` cannot be used with `last`"));
        }
        (None, None, Some(_), Some(_)) => {
            return Err(invalid(node, "`after` and `before` cannot be combined"));
        }
        _ => {}
    }

    let backward = args.last.is_some() || (args.first.is_none() && args.before.is_some());
    let limit = config.page_limit(args.first.or(args.last), &node.alias)?;

    let base = Order::new(table, sort_key.to_vec());
    let order = if backward { base.reversed() } else { base };

    let cursor = if backward { &args.before } else { &args.after };
    let predicate = match cursor {
        Some(encoded) => {
            let values = Cursor::decode(encoded)?.aligned_values(sort_key)?;
            Some(SeekPredicate {
                table: table.to_string(),
                columns: order.columns.clone(),
                values,
            })
        }
        None => None,
    };

    Ok(KeysetPage {
        limit,
        order,
        predicate,
        backward,
    })
}

fn invalid(node: &RelationNode, message: &str) -> Error {
    Error::config_for(ConfigErrorKind::InvalidPagination, node.alias.clone(), message)
}

/// Render a keyset-paginated select. The seek predicate is appended after
/// every other condition.
pub fn keyset_paging_select(
    dialect: Dialect,
    table: &str,
    conditions: &Conditions,
    page: &KeysetPage,
    alias: &str,
    options: &PageOptions,
) -> String {
    let mut conditions = conditions.clone();
    conditions.push(page.predicate.as_ref().map(|p| p.render(dialect)));
    let filter = if options.uncorrelated_body(dialect) {
        conditions.render_uncorrelated()
    } else {
        conditions.render()
    };
    PagedSelect {
        table,
        alias,
        filter,
        order: &page.order,
        limit: page.limit,
        offset: None,
    }
    .to_sql(dialect, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinsql_core::{Args, CursorErrorKind, Junction};

    fn sort_key() -> Vec<OrderColumn> {
        vec![OrderColumn::desc("created_at"), OrderColumn::desc("id")]
    }

    fn posts(args: Args) -> RelationNode {
        RelationNode::new("posts", "p").sort_key(sort_key()).args(args)
    }

    fn cursor(created_at: &str, id: i64) -> String {
        Cursor::new()
            .with("created_at", created_at)
            .with("id", id)
            .encode()
            .unwrap()
    }

    #[test]
    fn forward_page_uses_row_value_comparison() {
        let node = posts(Args::new().first(10).after(cursor("2024-01-05", 42)));
        let page = interpret_keyset(&node, &CompilerConfig::default()).unwrap();
        assert!(!page.backward);
        assert_eq!(page.limit, Limit::Rows(10));
        let pred = page.predicate.as_ref().unwrap();
        assert_eq!(
            pred.render(Dialect::Postgres),
            "(\"p\".\"created_at\", \"p\".\"id\") < ('2024-01-05', 42)"
        );
    }

    #[test]
    fn expanded_form_without_row_values() {
        let node = posts(Args::new().first(10).after(cursor("2024-01-05", 42)));
        let page = interpret_keyset(&node, &CompilerConfig::default()).unwrap();
        let pred = page.predicate.unwrap();
        assert_eq!(
            pred.render(Dialect::MsSql),
            "([p].[created_at] < '2024-01-05' OR ([p].[created_at] = '2024-01-05' AND [p].[id] < 42))"
        );
    }

    #[test]
    fn mixed_directions_always_expand() {
        let pred = SeekPredicate {
            table: "p".into(),
            columns: vec![OrderColumn::asc("a"), OrderColumn::desc("b"), OrderColumn::asc("c")],
            values: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        };
        assert_eq!(
            pred.render(Dialect::Postgres),
            "(\"p\".\"a\" > 1 OR (\"p\".\"a\" = 1 AND (\"p\".\"b\" < 2 OR (\"p\".\"b\" = 2 AND \"p\".\"c\" > 3))))"
        );
    }

    #[test]
    fn single_column() {
        let pred = SeekPredicate {
            table: "p".into(),
            columns: vec![OrderColumn::asc("id")],
            values: vec![Value::Int(9)],
        };
        assert_eq!(pred.render(Dialect::Oracle), "\"p\".\"id\" > 9");
    }

    #[test]
    fn backward_page_flips_directions() {
        let node = posts(Args::new().last(5).before(cursor("2024-01-05", 42)));
        let page = interpret_keyset(&node, &CompilerConfig::default()).unwrap();
        assert!(page.backward);
        assert_eq!(
            page.order.to_sql(Dialect::Postgres),
            "\"p\".\"created_at\" ASC, \"p\".\"id\" ASC"
        );
        assert_eq!(
            page.predicate.unwrap().render(Dialect::Postgres),
            "(\"p\".\"created_at\", \"p\".\"id\") > ('2024-01-05', 42)"
        );
    }

    #[test]
    fn contradictory_arguments() {
        let c = cursor("2024-01-05", 1);
        for args in [
            Args::new().first(1).last(1),
            Args::new().first(1).before(c.clone()),
            Args::new().last(1).after(c.clone()),
            Args::new().after(c.clone()).before(c.clone()),
        ] {
            let err = interpret_keyset(&posts(args), &CompilerConfig::default()).unwrap_err();
            assert_eq!(err.config_kind(), Some(ConfigErrorKind::InvalidPagination));
        }
    }

    #[test]
    fn cursor_must_match_sort_key() {
        let bad = Cursor::new().with("id", 3_i64).encode().unwrap();
        let err = interpret_keyset(&posts(Args::new().first(2).after(bad)), &CompilerConfig::default())
            .unwrap_err();
        assert_eq!(err.cursor_kind(), Some(CursorErrorKind::MissingColumn));
    }

    #[test]
    fn successive_pages_are_strictly_monotonic() {
        // Rows sorted by (created_at DESC, id DESC).
        let rows: Vec<Vec<Value>> = vec![
            vec!["2024-01-07".into(), Value::Int(9)],
            vec!["2024-01-07".into(), Value::Int(4)],
            vec!["2024-01-06".into(), Value::Int(8)],
            vec!["2024-01-05".into(), Value::Int(12)],
            vec!["2024-01-05".into(), Value::Int(3)],
            vec!["2024-01-04".into(), Value::Int(1)],
        ];
        let page_size = 2;
        let mut seen: Vec<Vec<Value>> = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut args = Args::new().first(page_size);
            if let Some(c) = &after {
                args = args.after(c.clone());
            }
            let page = interpret_keyset(&posts(args), &CompilerConfig::default()).unwrap();
            let page_rows: Vec<Vec<Value>> = rows
                .iter()
                .filter(|r| page.predicate.as_ref().is_none_or(|p| p.admits(r)))
                .take(page_size as usize)
                .cloned()
                .collect();
            let Some(last) = page_rows.last() else { break };
            after = Some(Cursor::from_row(&sort_key(), last).encode().unwrap());
            seen.extend(page_rows);
        }
        assert_eq!(seen, rows);
    }

    #[test]
    fn junction_sort_key_and_total() {
        let node = RelationNode::new("tags", "t")
            .junction(Junction::new("post_tags", "pt").sort_key(vec![OrderColumn::asc("tag_id")]))
            .args(Args::new().first(3));
        let page = interpret_keyset(&node, &CompilerConfig::default()).unwrap();
        assert_eq!(page.order.table, "pt");
        let sql = keyset_paging_select(
            Dialect::Postgres,
            "post_tags",
            &Conditions::new(),
            &page,
            "pt",
            &PageOptions::default(),
        );
        assert!(sql.contains("ORDER BY \"pt\".\"tag_id\" ASC\nLIMIT 3"));
        assert_eq!(sql.matches("COUNT(*) OVER ()").count(), 1);
    }

    #[test]
    fn seek_predicate_is_appended_last() {
        let node = posts(Args::new().first(2).after(cursor("2024-01-05", 42)));
        let page = interpret_keyset(&node, &CompilerConfig::default()).unwrap();
        let mut conds = Conditions::new();
        conds.push(Some("\"p\".\"published\"".to_string()));
        let sql = keyset_paging_select(
            Dialect::Postgres,
            "posts",
            &conds,
            &page,
            "p",
            &PageOptions::default(),
        );
        assert!(sql.contains(
            "WHERE \"p\".\"published\" AND (\"p\".\"created_at\", \"p\".\"id\") < ('2024-01-05', 42)\n"
        ));
    }
}
