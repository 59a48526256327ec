//! User-supplied SQL callbacks attached to relation nodes.
//!
//! A relation node may carry a `filter` predicate and join conditions. Both
//! are asynchronous: the compiler awaits each one in a fixed order and only
//! renders the node's fragments once all of them resolved. Callbacks get the
//! caller's [`Cx`], so cancellation and budgets flow through their own
//! contract.

use crate::Error;
use crate::node::{Args, RelationNode};
use asupersync::{Cx, Outcome};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future returned by callbacks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque caller context passed through to every callback untouched.
pub type Context = dyn Any + Send + Sync;

/// What a `filter` predicate sees.
#[derive(Clone, Copy)]
pub struct PredicateScope<'a> {
    /// Quoted alias of the table the predicate applies to.
    pub table: &'a str,
    /// Arguments of the relation being compiled.
    pub args: &'a Args,
    /// Caller context.
    pub context: &'a Context,
    /// The relation node being compiled.
    pub node: &'a RelationNode,
}

impl<'a> PredicateScope<'a> {
    /// Downcast the caller context.
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        self.context.downcast_ref::<T>()
    }
}

impl fmt::Debug for PredicateScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateScope")
            .field("table", &self.table)
            .field("args", &self.args)
            .field("node", &self.node.alias)
            .finish_non_exhaustive()
    }
}

/// What a join condition sees.
#[derive(Clone, Copy)]
pub struct JoinScope<'a> {
    /// Quoted alias of the left-hand (parent or junction) table.
    pub parent: &'a str,
    /// Quoted alias of the right-hand (junction or child) table.
    pub child: &'a str,
    /// Arguments of the relation being compiled.
    pub args: &'a Args,
    /// Caller context.
    pub context: &'a Context,
    /// The relation node being compiled.
    pub node: &'a RelationNode,
}

impl<'a> JoinScope<'a> {
    /// Downcast the caller context.
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        self.context.downcast_ref::<T>()
    }
}

impl fmt::Debug for JoinScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinScope")
            .field("parent", &self.parent)
            .field("child", &self.child)
            .field("args", &self.args)
            .field("node", &self.node.alias)
            .finish_non_exhaustive()
    }
}

/// A `filter` callback producing an optional WHERE fragment.
///
/// Returning `Outcome::Ok(None)` (or an empty string) contributes nothing.
pub trait Predicate: Send + Sync {
    fn render<'a>(
        &'a self,
        cx: &'a Cx,
        scope: PredicateScope<'a>,
    ) -> BoxFuture<'a, Outcome<Option<String>, Error>>;
}

/// A join-condition callback producing the ON expression between two aliases.
pub trait JoinCondition: Send + Sync {
    fn render<'a>(
        &'a self,
        cx: &'a Cx,
        scope: JoinScope<'a>,
    ) -> BoxFuture<'a, Outcome<String, Error>>;
}

struct FilterFn<F>(F);

impl<F> Predicate for FilterFn<F>
where
    F: Fn(PredicateScope<'_>) -> Option<String> + Send + Sync,
{
    fn render<'a>(
        &'a self,
        _cx: &'a Cx,
        scope: PredicateScope<'a>,
    ) -> BoxFuture<'a, Outcome<Option<String>, Error>> {
        let sql = (self.0)(scope);
        Box::pin(async move { Outcome::Ok(sql) })
    }
}

struct FilterAsync<F>(F);

impl<F, Fut> Predicate for FilterAsync<F>
where
    F: Fn(&Cx, PredicateScope<'_>) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<Option<String>, Error>> + Send + 'static,
{
    fn render<'a>(
        &'a self,
        cx: &'a Cx,
        scope: PredicateScope<'a>,
    ) -> BoxFuture<'a, Outcome<Option<String>, Error>> {
        Box::pin((self.0)(cx, scope))
    }
}

struct JoinFn<F>(F);

impl<F> JoinCondition for JoinFn<F>
where
    F: Fn(JoinScope<'_>) -> String + Send + Sync,
{
    fn render<'a>(
        &'a self,
        _cx: &'a Cx,
        scope: JoinScope<'a>,
    ) -> BoxFuture<'a, Outcome<String, Error>> {
        let sql = (self.0)(scope);
        Box::pin(async move { Outcome::Ok(sql) })
    }
}

struct JoinAsync<F>(F);

impl<F, Fut> JoinCondition for JoinAsync<F>
where
    F: Fn(&Cx, JoinScope<'_>) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<String, Error>> + Send + 'static,
{
    fn render<'a>(
        &'a self,
        cx: &'a Cx,
        scope: JoinScope<'a>,
    ) -> BoxFuture<'a, Outcome<String, Error>> {
        Box::pin((self.0)(cx, scope))
    }
}

/// Wrap a synchronous closure as a `filter` predicate.
///
/// ```
/// use joinsql_core::filter_fn;
///
/// let active = filter_fn(|scope| Some(format!("{}.active = TRUE", scope.table)));
/// # let _ = active;
/// ```
pub fn filter_fn<F>(f: F) -> Arc<dyn Predicate>
where
    F: Fn(PredicateScope<'_>) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(FilterFn(f))
}

/// Wrap an asynchronous closure as a `filter` predicate.
///
/// The closure runs synchronously against the scope and returns an owned
/// future, so anything borrowed from the scope must be copied out first.
pub fn filter_async<F, Fut>(f: F) -> Arc<dyn Predicate>
where
    F: Fn(&Cx, PredicateScope<'_>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<Option<String>, Error>> + Send + 'static,
{
    Arc::new(FilterAsync(f))
}

/// Wrap a synchronous closure as a join condition.
///
/// ```
/// use joinsql_core::join_fn;
///
/// let on = join_fn(|scope| format!("{}.id = {}.user_id", scope.parent, scope.child));
/// # let _ = on;
/// ```
pub fn join_fn<F>(f: F) -> Arc<dyn JoinCondition>
where
    F: Fn(JoinScope<'_>) -> String + Send + Sync + 'static,
{
    Arc::new(JoinFn(f))
}

/// Wrap an asynchronous closure as a join condition.
pub fn join_async<F, Fut>(f: F) -> Arc<dyn JoinCondition>
where
    F: Fn(&Cx, JoinScope<'_>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<String, Error>> + Send + 'static,
{
    Arc::new(JoinAsync(f))
}
