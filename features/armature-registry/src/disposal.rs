use std::sync::Arc;

use crate::types::DynError;

/// A bean that must be torn down explicitly at registry shutdown
pub trait DisposableBean: Send + Sync {
    /// Release whatever the bean holds
    ///
    /// Invoked exactly once, from the thread running the teardown sweep.
    fn destroy(&self) -> Result<(), DynError>;
}

/// Ordered table of disposers, keyed by singleton name
///
/// Keeps first-registration positions; re-registering a name swaps the
/// disposer in place so the teardown order stays reproducible.
#[derive(Default)]
pub(crate) struct DisposerTable {
    disposers: Vec<(String, Arc<dyn DisposableBean>)>,
}

impl DisposerTable {
    pub(crate) fn insert(&mut self, name: &str, bean: Arc<dyn DisposableBean>) {
        match self.disposers.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = bean,
            None => self.disposers.push((name.to_string(), bean)),
        }
    }

    /// Hands the whole table over for teardown, leaving it empty
    pub(crate) fn take(&mut self) -> Vec<(String, Arc<dyn DisposableBean>)> {
        std::mem::take(&mut self.disposers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl DisposableBean for Noop {
        fn destroy(&self) -> Result<(), DynError> {
            Ok(())
        }
    }

    #[test]
    fn re_registering_keeps_the_original_position() {
        let mut table = DisposerTable::default();
        table.insert("a", Arc::new(Noop));
        table.insert("b", Arc::new(Noop));
        table.insert("a", Arc::new(Noop));

        let names: Vec<_> = table.take().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
