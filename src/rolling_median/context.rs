use std::ops::{Index, IndexMut};

use super::WindowSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableCause {
    /// fewer rows than the window size, no full window exists anywhere
    ShortPartition,
    /// the first window holds a null
    NullInBootstrap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackfillState {
    Uninitialized,
    Ready {
        window_size: WindowSize,
        first_median: f64,
    },
    Unavailable {
        window_size: WindowSize,
        cause: UnavailableCause,
    },
}

/// per-partition state. leaves `Uninitialized` exactly once, on the partition's first row
#[derive(Debug, Clone)]
pub struct BackfillContext {
    state: BackfillState,
}

impl Default for BackfillContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BackfillContext {
    pub fn new() -> Self {
        Self {
            state: BackfillState::Uninitialized,
        }
    }

    pub fn state(&self) -> BackfillState {
        self.state
    }

    pub fn window_size(&self) -> Option<WindowSize> {
        match self.state {
            BackfillState::Uninitialized => None,
            BackfillState::Ready { window_size, .. }
            | BackfillState::Unavailable { window_size, .. } => Some(window_size),
        }
    }

    /// cached median of the first window, if bootstrap succeeded
    pub fn first_median(&self) -> Option<f64> {
        match self.state {
            BackfillState::Ready { first_median, .. } => Some(first_median),
            _ => None,
        }
    }

    pub(super) fn bootstrapped(&mut self, window_size: WindowSize, first_median: f64) {
        debug_assert_eq!(self.state, BackfillState::Uninitialized);
        self.state = BackfillState::Ready {
            window_size,
            first_median,
        };
    }

    pub(super) fn unavailable(&mut self, window_size: WindowSize, cause: UnavailableCause) {
        debug_assert_eq!(self.state, BackfillState::Uninitialized);
        self.state = BackfillState::Unavailable { window_size, cause };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionHandle(usize);

/// partition-scoped storage for contexts. a slot lives from `open` to `close`
/// and is recycled afterwards; a stale handle panics on indexing.
#[derive(Debug, Default)]
pub struct ContextArena {
    slots: Vec<Option<BackfillContext>>,
    free: Vec<usize>,
}

impl ContextArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) -> PartitionHandle {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(BackfillContext::new());
                PartitionHandle(idx)
            }
            None => {
                self.slots.push(Some(BackfillContext::new()));
                PartitionHandle(self.slots.len() - 1)
            }
        }
    }

    pub fn close(&mut self, handle: PartitionHandle) -> Option<BackfillContext> {
        let ctx = self.slots.get_mut(handle.0).and_then(Option::take);
        if ctx.is_some() {
            self.free.push(handle.0);
        }
        ctx
    }

    pub fn get_mut(&mut self, handle: PartitionHandle) -> Option<&mut BackfillContext> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl Index<PartitionHandle> for ContextArena {
    type Output = BackfillContext;

    fn index(&self, handle: PartitionHandle) -> &Self::Output {
        match self.slots.get(handle.0) {
            Some(Some(ctx)) => ctx,
            _ => panic!("partition handle {} is not open", handle.0),
        }
    }
}

impl IndexMut<PartitionHandle> for ContextArena {
    fn index_mut(&mut self, handle: PartitionHandle) -> &mut Self::Output {
        match self.get_mut(handle) {
            Some(ctx) => ctx,
            None => panic!("partition handle {} is not open", handle.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{BackfillContext, BackfillState, ContextArena, UnavailableCause};
    use crate::rolling_median::WindowSize;

    #[test]
    fn test_context_transitions() {
        let ws = WindowSize::new(Some(3)).unwrap();

        let mut ctx = BackfillContext::new();
        assert_eq!(ctx.state(), BackfillState::Uninitialized);
        assert_eq!(ctx.window_size(), None);
        assert_eq!(ctx.first_median(), None);

        ctx.bootstrapped(ws, 2.0);
        assert_eq!(ctx.window_size(), Some(ws));
        assert_eq!(ctx.first_median(), Some(2.0));

        let mut ctx = BackfillContext::default();
        ctx.unavailable(ws, UnavailableCause::NullInBootstrap);
        assert_eq!(
            ctx.state(),
            BackfillState::Unavailable {
                window_size: ws,
                cause: UnavailableCause::NullInBootstrap
            }
        );
        assert_eq!(ctx.first_median(), None);
    }

    #[test]
    fn test_arena_reuses_slots() {
        let ws = WindowSize::new(Some(1)).unwrap();
        let mut arena = ContextArena::new();

        let a = arena.open();
        let b = arena.open();
        assert_ne!(a, b);
        assert_eq!(arena.live(), 2);

        arena[a].bootstrapped(ws, 10.0);
        assert_eq!(arena[a].first_median(), Some(10.0));
        assert_eq!(arena[b].first_median(), None);

        let closed = arena.close(a).unwrap();
        assert_eq!(closed.first_median(), Some(10.0));
        assert_eq!(arena.live(), 1);
        assert!(arena.get_mut(a).is_none());
        assert!(arena.close(a).is_none());

        // recycled slot starts fresh
        let c = arena.open();
        assert_eq!(c, a);
        assert_eq!(arena[c].state(), BackfillState::Uninitialized);
        assert_eq!(arena.live(), 2);
    }

    #[test]
    #[should_panic]
    fn test_arena_stale_handle() {
        let mut arena = ContextArena::new();
        let a = arena.open();
        arena.close(a);
        let _ = arena[a].state();
    }
}
