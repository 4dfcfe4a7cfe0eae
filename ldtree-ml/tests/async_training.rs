//! Background training handoff
//!
//! ## Test Scope
//!
//! - Snapshot isolation: rows added after launch are not trained on
//! - Single in-flight run gate
//! - Finished results wait for the owner to apply them
//! - Old tree stays live until the owner applies the new one
//! - Dropping the owner mid-run is harmless

mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::{guard_table, xor_table};
use ldtree_ml::{LearningTree, MLError, TrainingJob, TreeConfig};

/// Upper bound for any background run in these tests
const TRAINING_DEADLINE: Duration = Duration::from_secs(10);

fn agent_with_columns(names: &[&str]) -> LearningTree {
    let mut agent = LearningTree::new(TreeConfig::default());
    for name in names {
        agent.add_column(name).unwrap();
    }
    agent
}

fn poll_until_done(agent: &mut LearningTree) -> Result<ldtree_ml::TreeStats, MLError> {
    let deadline = Instant::now() + TRAINING_DEADLINE;
    loop {
        match agent.poll_training() {
            Ok(stats) => return Ok(stats),
            Err(nb::Error::Other(err)) => return Err(err),
            Err(nb::Error::WouldBlock) => {
                assert!(Instant::now() < deadline, "training did not finish in time");
                thread::sleep(Duration::from_millis(1));
            }
        }
    }
}

#[test]
fn async_result_matches_sync_training() {
    let mut agent = agent_with_columns(&["a", "b", "action"]);
    for row in [[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]] {
        agent.add_row(&row).unwrap();
    }

    agent.train_async().unwrap();
    assert!(agent.is_training());
    poll_until_done(&mut agent).unwrap();
    assert!(!agent.is_training());

    let expected = ldtree_ml::train(&xor_table()).unwrap();
    assert_eq!(agent.tree(), Some(&expected));
}

#[test]
fn snapshot_ignores_later_rows() {
    let mut agent = agent_with_columns(&["x", "action"]);
    agent.add_row(&[0, 1]).unwrap();
    agent.add_row(&[1, 1]).unwrap();

    agent.train_async().unwrap();
    // Conflicting evidence arrives while the worker runs
    for _ in 0..50 {
        agent.add_row(&[1, 2]).unwrap();
    }
    agent.wait_for_training().unwrap();

    // Snapshot only ever saw action 1
    agent.refresh_states(&[1]);
    for _ in 0..20 {
        assert_eq!(agent.eval(), Some(1));
    }
    assert_eq!(agent.total_row_count(), 52);
}

#[test]
fn second_request_is_rejected_not_queued() {
    let mut agent = agent_with_columns(&["x", "action"]);
    agent.add_row(&[0, 0]).unwrap();

    agent.train_async().unwrap();
    assert!(matches!(agent.train_async(), Err(MLError::AlreadyTraining)));
    agent.wait_for_training().unwrap();

    assert!(matches!(
        agent.wait_for_training(),
        Err(MLError::NotTraining)
    ));
    // Gate reopens after completion
    agent.train_async().unwrap();
    agent.wait_for_training().unwrap();
}

#[test]
fn finished_result_waits_until_applied() {
    let mut agent = agent_with_columns(&["x", "action"]);
    agent.add_row(&[0, 3]).unwrap();
    assert!(!agent.is_result_ready());

    agent.train_async().unwrap();
    let deadline = Instant::now() + TRAINING_DEADLINE;
    while !agent.is_result_ready() {
        assert!(Instant::now() < deadline, "training did not finish in time");
        thread::sleep(Duration::from_millis(1));
    }

    // Worker is done but nothing was applied yet
    assert!(agent.is_training());
    assert!(agent.tree().is_none());

    poll_until_done(&mut agent).unwrap();
    assert!(!agent.is_training());
    assert!(!agent.is_result_ready());
    agent.refresh_states(&[0]);
    assert_eq!(agent.eval(), Some(3));
}

#[test]
fn insufficient_schema_fails_before_launch() {
    let mut agent = agent_with_columns(&["action"]);
    assert!(matches!(
        agent.train_async(),
        Err(MLError::InsufficientSchema { columns: 1 })
    ));
    assert!(!agent.is_training());
}

#[test]
fn old_tree_serves_until_new_one_is_applied() {
    let mut agent = agent_with_columns(&["x", "action"]);
    agent.add_row(&[0, 7]).unwrap();
    agent.create_decision_tree().unwrap();

    agent.remove_row(0).unwrap();
    agent.add_row(&[0, 8]).unwrap();
    agent.train_async().unwrap();

    // Until polled, evaluation keeps using the previous tree
    agent.refresh_states(&[0]);
    assert_eq!(agent.eval(), Some(7));

    poll_until_done(&mut agent).unwrap();
    assert_eq!(agent.eval(), Some(8));
}

#[test]
fn dropping_owner_mid_training_is_harmless() {
    let mut agent = agent_with_columns(&["a", "b", "action"]);
    for row in [[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]] {
        agent.add_row(&row).unwrap();
    }
    agent.train_async().unwrap();
    drop(agent);

    // Other runs proceed normally while the orphaned worker winds down
    let tree = TrainingJob::spawn(guard_table()).unwrap().wait().unwrap();
    assert!(tree.node_count() > 1);
}
