use proptest::prelude::*;
use spark_observables::registry::{ListenerEntry, ListenerRegistry, Strategy as Repr};
use spark_observables::{
    ChangeHandle, InvalidationHandle, ListChangeHandle, change_listener, invalidation_listener,
    list_listener,
};

type Registry = ListenerRegistry<ChangeHandle<i32>, ListChangeHandle<i32>>;

const POOL: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Invalidation,
    Change,
    Structural,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(Kind, usize),
    Remove(Kind, usize),
}

fn kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Invalidation),
        Just(Kind::Change),
        Just(Kind::Structural)
    ]
}

fn op() -> impl Strategy<Value = Op> {
    (kind(), 0..POOL, any::<bool>()).prop_map(|(kind, index, add)| {
        if add {
            Op::Add(kind, index)
        } else {
            Op::Remove(kind, index)
        }
    })
}

struct Pool {
    invalidation: Vec<InvalidationHandle>,
    change: Vec<ChangeHandle<i32>>,
    structural: Vec<ListChangeHandle<i32>>,
}

impl Pool {
    fn new() -> Self {
        Self {
            invalidation: (0..POOL).map(|_| invalidation_listener(|_| {})).collect(),
            change: (0..POOL).map(|_| change_listener(|_, _: &i32, _: &i32| {})).collect(),
            structural: (0..POOL).map(|_| list_listener(|_| {})).collect(),
        }
    }

    fn apply(&self, registry: Registry, op: Op) -> Registry {
        match op {
            Op::Add(Kind::Invalidation, i) => registry.add_invalidation(self.invalidation[i].clone()),
            Op::Add(Kind::Change, i) => registry.add_change(self.change[i].clone()),
            Op::Add(Kind::Structural, i) => registry.add_structural(self.structural[i].clone()),
            Op::Remove(Kind::Invalidation, i) => registry.remove_invalidation(&self.invalidation[i]),
            Op::Remove(Kind::Change, i) => registry.remove_change(&self.change[i]),
            Op::Remove(Kind::Structural, i) => registry.remove_structural(&self.structural[i]),
        }
    }
}

/// Registered listeners, in registration order, per kind.
#[derive(Default)]
struct Model {
    lists: [Vec<usize>; 3],
}

impl Model {
    fn apply(&mut self, op: Op) {
        match op {
            Op::Add(kind, i) => {
                let list = &mut self.lists[kind as usize];
                if !list.contains(&i) {
                    list.push(i);
                }
            }
            Op::Remove(kind, i) => self.lists[kind as usize].retain(|&j| j != i),
        }
    }

    fn expected_strategy(&self) -> Repr {
        let total: usize = self.lists.iter().map(Vec::len).sum();
        match total {
            0 => Repr::Empty,
            1 if self.lists[0].len() == 1 => Repr::SingleInvalidation,
            1 if self.lists[1].len() == 1 => Repr::SingleChange,
            1 => Repr::SingleStructural,
            _ => Repr::Generic,
        }
    }
}

fn same<L: ListenerEntry>(actual: &[L], pool: &[L], expected: &[usize]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(listener, &i)| listener.same_listener(&pool[i]))
}

proptest! {
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let pool = Pool::new();
        let mut registry = Registry::default();
        let mut model = Model::default();

        for op in ops {
            registry = pool.apply(registry, op);
            model.apply(op);

            prop_assert!(same(&registry.invalidation_listeners(), &pool.invalidation, &model.lists[0]));
            prop_assert!(same(&registry.change_listeners(), &pool.change, &model.lists[1]));
            prop_assert!(same(&registry.structural_listeners(), &pool.structural, &model.lists[2]));
            prop_assert_eq!(registry.strategy(), model.expected_strategy());
        }
    }
}

#[test]
fn growth_never_loses_listeners() {
    let all: Vec<InvalidationHandle> = (0..75).map(|_| invalidation_listener(|_| {})).collect();
    let mut registry = Registry::default();
    for (count, listener) in all.iter().enumerate() {
        registry = registry.add_invalidation(listener.clone());
        let current = registry.invalidation_listeners();
        assert_eq!(current.len(), count + 1);
        assert!(same(&current, &all, &(0..=count).collect::<Vec<_>>()));
    }
}
