//! Ordered fallback chains.
//!
//! A chain runs its strategies in order; the first one that resolves wins.
//! When every strategy declines, the chain's default produces the value, so
//! running a chain cannot fail.

use async_trait::async_trait;
use tracing::debug;

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Resolved(T),
    NotApplicable,
}

#[async_trait]
pub trait Strategy<C, T>: Send + Sync
where
    C: Sync,
    T: Send,
{
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &C) -> Attempt<T>;
}

type DefaultFn<'a, C, T> = Box<dyn Fn(&C) -> T + Send + Sync + 'a>;

pub struct FallbackChain<'a, C, T> {
    label: &'static str,
    steps: Vec<Box<dyn Strategy<C, T> + 'a>>,
    default: DefaultFn<'a, C, T>,
}

impl<'a, C, T> FallbackChain<'a, C, T>
where
    C: Sync,
    T: Send,
{
    pub fn new(label: &'static str, default: impl Fn(&C) -> T + Send + Sync + 'a) -> Self {
        Self {
            label,
            steps: Vec::new(),
            default: Box::new(default),
        }
    }

    pub fn then(mut self, step: impl Strategy<C, T> + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Names of the strategies in evaluation order, followed by `"default"`.
    pub fn order(&self) -> Vec<&'static str> {
        self.steps
            .iter()
            .map(|step| step.name())
            .chain(std::iter::once("default"))
            .collect()
    }

    pub async fn run(&self, ctx: &C) -> T {
        debug!(chain = self.label, order = ?self.order(), "running fallback chain");
        for step in &self.steps {
            if let Attempt::Resolved(value) = step.attempt(ctx).await {
                debug!(chain = self.label, strategy = step.name(), "resolved");
                return value;
            }
        }

        debug!(chain = self.label, strategy = "default", "resolved");
        (self.default)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct Fixed {
        name: &'static str,
        answer: Option<u32>,
        calls: Arc<AtomicUsize>,
    }

    fn fixed(name: &'static str, answer: Option<u32>) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Fixed { name, answer, calls: calls.clone() }, calls)
    }

    #[async_trait]
    impl Strategy<u32, u32> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, ctx: &u32) -> Attempt<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(v) => Attempt::Resolved(v + ctx),
                None => Attempt::NotApplicable,
            }
        }
    }

    #[tokio::test]
    async fn first_resolving_strategy_wins_and_later_ones_are_skipped() {
        let (skip, skip_calls) = fixed("skip", None);
        let (hit, hit_calls) = fixed("hit", Some(10));
        let (never, never_calls) = fixed("never", Some(99));

        let chain = FallbackChain::new("test", |_: &u32| 0u32)
            .then(skip)
            .then(hit)
            .then(never);

        assert_eq!(chain.run(&1).await, 11);
        assert_eq!(skip_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(never_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_runs_when_every_strategy_declines() {
        let (a, _) = fixed("a", None);
        let (b, _) = fixed("b", None);
        let chain = FallbackChain::new("test", |ctx: &u32| ctx * 100).then(a).then(b);

        assert_eq!(chain.run(&3).await, 300);
    }

    #[test]
    fn order_lists_default_last() {
        let (a, _) = fixed("a", None);
        let chain = FallbackChain::new("test", |_: &u32| 0u32).then(a);
        assert_eq!(chain.order(), vec!["a", "default"]);
    }
}
