//! Property tests for undo/redo reversibility.
//!
//! Random edit scripts are applied step by step; undoing every step must walk
//! back through the exact intermediate graphs, and redoing them must restore
//! the final one, persistent ids included.

mod common;

use std::sync::Arc;

use proptest::{
    prelude::{prop_assert, prop_assert_eq},
    proptest,
};
use spotgraph_core::features::builtin::{LINK_COUNT, POSITION_X};
use spotgraph_core::features::{FeatureModel, FeatureRegistry};
use spotgraph_core::{EngineConfig, Model, VertexAttrs};

use common::{apply, proptest_config, script_strategy, snapshot};

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn test_undo_walks_back_through_every_step(script in script_strategy(40)) {
        let mut model = Model::new(common::registry());
        let mut history = vec![snapshot(&model)];
        for op in &script {
            if apply(&mut model, op) {
                history.push(snapshot(&model));
            }
        }

        for expected in history.iter().rev().skip(1) {
            prop_assert!(model.undo().unwrap());
            prop_assert_eq!(&snapshot(&model), expected);
        }
        prop_assert!(!model.undo().unwrap());
    }

    #[test]
    fn test_undo_then_redo_restores_final_graph(script in script_strategy(40)) {
        let mut model = Model::new(common::registry());
        let mut steps = 0;
        for op in &script {
            if apply(&mut model, op) {
                steps += 1;
            }
        }
        let end = snapshot(&model);

        for _ in 0..steps {
            prop_assert!(model.undo().unwrap());
        }
        prop_assert!(model.graph().vertex_count() == 0);
        for _ in 0..steps {
            prop_assert!(model.redo().unwrap());
        }
        prop_assert!(!model.redo().unwrap());
        prop_assert_eq!(snapshot(&model), end);
    }

    #[test]
    fn test_incremental_values_match_fresh_compute(
        script in script_strategy(30),
        split in 0usize..30
    ) {
        let mut model = Model::new(common::registry());
        let split = split.min(script.len());
        for op in &script[..split] {
            apply(&mut model, op);
        }
        model.compute(POSITION_X).unwrap();
        model.compute(LINK_COUNT).unwrap();
        for op in &script[split..] {
            apply(&mut model, op);
        }
        model.undo().unwrap();

        let mut fresh = FeatureModel::new(common::registry());
        for key in [POSITION_X, LINK_COUNT] {
            model.compute(key).unwrap();
            fresh.compute(key, model.graph()).unwrap();
            prop_assert_eq!(fresh.values(key).unwrap(), model.features().values(key).unwrap());
        }
    }
}

#[test]
fn test_eviction_limits_history() {
    let registry = Arc::new(FeatureRegistry::with_builtins());
    let mut config = EngineConfig::default();
    config.undo.capacity = 3;
    let mut model = Model::with_config(registry, config);

    for t in 0..5 {
        model
            .add_vertex(VertexAttrs::new(t, [0.0; 3], 1.0))
            .unwrap();
    }
    assert_eq!(model.journal().evicted(), 2);

    let mut undone = 0;
    while model.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(model.graph().vertex_count(), 2);
}
