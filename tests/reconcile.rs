//! End-to-end reconciliation tests against the bundled clients.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io;

use zktree::client::{ClientResult, CoordinationClient, LocalClient, MemoryClient, NamespacedClient};
use zktree::error::{ClientError, ExecuteError, ZkTreeError};
use zktree::planner::{ActionHandler, Confirmation, ReportingHandler, SilentHandler};
use zktree::tree::path;
use zktree::{Action, ActionKind, DiffEngine, ExecutionMode, LiveTree, Node, Reconciler};

/// Memory client that refuses writes to one path.
struct FailingClient {
    inner: MemoryClient,
    fail_on: &'static str,
}

#[async_trait]
impl CoordinationClient for FailingClient {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        self.inner.get_value(path).await
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        self.inner.get_children(path).await
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        if path == self.fail_on {
            return Err(ClientError::backend("session expired"));
        }
        self.inner.create(path, value).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        if path == self.fail_on {
            return Err(ClientError::backend("session expired"));
        }
        self.inner.delete(path).await
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.inner.set_value(path, value).await
    }

    fn backend_type(&self) -> &'static str {
        "failing"
    }
}

/// Handler that records every action it sees and declines one key.
#[derive(Default)]
struct RecordingHandler {
    seen: Vec<Action>,
    decline: Option<&'static str>,
}

impl ActionHandler for RecordingHandler {
    fn handle(&mut self, action: &Action) -> io::Result<()> {
        self.seen.push(action.clone());
        Ok(())
    }

    fn confirm(&mut self, action: &Action) -> io::Result<Confirmation> {
        if self.decline == Some(action.key()) {
            Ok(Confirmation::Declined)
        } else {
            Ok(Confirmation::Approved)
        }
    }
}

fn desired_tree() -> Node {
    Node::root(vec![
        Node::new("app", "v2").with_children(vec![
            Node::new("db", "postgres").with_child(Node::new("pool", "10")),
            Node::new("cache", "redis"),
        ]),
        Node::new("locks", "").with_ignore(true),
        Node::new("feature", "on"),
    ])
}

fn live_tree() -> Node {
    Node::root(vec![
        Node::new("app", "v1").with_children(vec![
            Node::new("db", "mysql"),
            Node::new("legacy", "x").with_child(Node::new("leaf", "y")),
        ]),
        Node::new("locks", "").with_child(Node::new("lock-0001", "host-a")),
        Node::new("stale", "").with_child(Node::new("deep", "").with_child(Node::new("deeper", ""))),
    ])
}

/// Asserts no action depends on a node that does not exist at that point.
fn assert_structurally_ordered(live: &Node, actions: &[Action]) {
    let mut present: HashSet<String> = HashSet::new();
    collect_paths(live, path::ROOT, &mut present);

    for action in actions {
        match action.kind() {
            ActionKind::Create => {
                let parent = path::parent(action.key()).unwrap_or(path::ROOT);
                assert!(present.contains(parent), "{action} before its parent");
                present.insert(action.key().to_string());
            }
            ActionKind::Delete => {
                assert!(
                    !present.iter().any(|p| p != action.key() && path::is_within(p, action.key())),
                    "{action} before its descendants"
                );
                present.remove(action.key());
            }
            ActionKind::SetValue => assert!(present.contains(action.key())),
        }
    }
}

fn collect_paths(node: &Node, node_path: &str, out: &mut HashSet<String>) {
    out.insert(node_path.to_string());
    for child in &node.children {
        collect_paths(child, &path::join(node_path, child.name()), out);
    }
}

#[tokio::test]
async fn scenario_a_creates_missing_child() {
    let live = LiveTree::new(MemoryClient::new());
    let desired = Node::root(vec![Node::new("a", "1")]);

    let plan = Reconciler::new(&live).plan(&desired).await.expect("plan");
    assert_eq!(plan.actions, vec![Action::create("/a", "1")]);
}

#[tokio::test]
async fn scenario_b_deletes_children_first() {
    let live = LiveTree::new(MemoryClient::from_tree(&Node::root(vec![
        Node::new("a", "1").with_child(Node::new("b", "2")),
    ])));

    let plan = Reconciler::new(&live).plan(&Node::root(vec![])).await.expect("plan");
    assert_eq!(plan.actions, vec![Action::delete("/a/b"), Action::delete("/a")]);
}

#[tokio::test]
async fn scenario_c_sets_changed_value() {
    let live = LiveTree::new(MemoryClient::from_tree(&Node::root(vec![Node::new("a", "1")])));
    let desired = Node::root(vec![Node::new("a", "2")]);

    let plan = Reconciler::new(&live).plan(&desired).await.expect("plan");
    assert_eq!(plan.actions, vec![Action::set_value("/a", "2", "1")]);
    assert_eq!(plan.actions[0].old_value(), Some("1"));
}

#[tokio::test]
async fn scenario_d_ignored_subtree_is_untouched() {
    let live = LiveTree::new(MemoryClient::from_tree(&Node::root(vec![
        Node::new("a", "1").with_child(Node::new("b", "")),
    ])));
    let desired = Node::root(vec![Node::new("a", "X").with_ignore(true)]);

    let plan = Reconciler::new(&live).plan(&desired).await.expect("plan");
    assert!(plan.is_empty());
}

#[tokio::test]
async fn scenario_e_report_only_prints_and_never_writes() {
    let live = LiveTree::new(MemoryClient::new());
    let desired = Node::root(vec![Node::new("a", "1")]);
    let mut handler = ReportingHandler::new(Vec::new());

    let result = Reconciler::new(&live)
        .reconcile(&desired, &mut handler, ExecutionMode::ReportOnly)
        .await
        .expect("report-only run");

    assert_eq!(result.report.reported.len(), 1);
    assert_eq!(live.client().write_count(), 0);
    assert_eq!(
        String::from_utf8(handler.into_inner()).expect("utf8"),
        "CREATE- key: /a\n"
    );
}

#[tokio::test]
async fn apply_is_idempotent() {
    let live = LiveTree::new(MemoryClient::from_tree(&live_tree()));
    let desired = desired_tree();
    let reconciler = Reconciler::new(&live);

    let first = reconciler
        .reconcile(&desired, &mut SilentHandler, ExecutionMode::Apply)
        .await
        .expect("first run");
    assert!(first.success);
    assert!(!first.report.applied.is_empty());

    let second = reconciler.plan(&desired).await.expect("second plan");
    assert!(second.is_empty(), "unexpected actions: {second}");
}

#[tokio::test]
async fn apply_keeps_ignored_subtree_and_removes_the_rest() {
    let live = LiveTree::new(MemoryClient::from_tree(&live_tree()));

    Reconciler::new(&live)
        .reconcile(&desired_tree(), &mut SilentHandler, ExecutionMode::Apply)
        .await
        .expect("apply");

    let after = live.client().to_tree().await;
    assert_eq!(after.find("/locks/lock-0001").map(|n| n.value.as_str()), Some("host-a"));
    assert!(after.find("/stale").is_none());
    assert!(after.find("/app/legacy").is_none());
    assert_eq!(after.find("/app/db/pool").map(|n| n.value.as_str()), Some("10"));
    assert_eq!(after.find("/app").map(|n| n.value.as_str()), Some("v2"));
}

#[tokio::test]
async fn emitted_order_is_structurally_valid() {
    let live = live_tree();
    let desired = desired_tree();

    let actions = DiffEngine::new().diff(&desired, &live);
    assert_structurally_ordered(&live, &actions);

    let reversed = DiffEngine::new().diff(&live, &desired);
    assert_structurally_ordered(&desired, &reversed);
}

#[tokio::test]
async fn equal_trees_produce_no_handler_calls() {
    let live = LiveTree::new(MemoryClient::from_tree(&desired_tree()));
    let mut handler = RecordingHandler::default();

    let result = Reconciler::new(&live)
        .reconcile(&desired_tree(), &mut handler, ExecutionMode::Apply)
        .await
        .expect("no-op run");

    assert!(result.plan.is_empty());
    assert!(handler.seen.is_empty());
    assert_eq!(live.client().write_count(), 0);
}

#[tokio::test]
async fn failure_stops_run_and_reports_applied_prefix() {
    let client = FailingClient {
        inner: MemoryClient::new(),
        fail_on: "/a/b",
    };
    let live = LiveTree::new(client);
    let desired = Node::root(vec![
        Node::new("a", "1").with_child(Node::new("b", "2")),
        Node::new("c", "3"),
    ]);

    let err = Reconciler::new(&live)
        .reconcile(&desired, &mut SilentHandler, ExecutionMode::Apply)
        .await
        .expect_err("create of /a/b fails");

    match &err {
        ZkTreeError::Execute(ExecuteError::ActionFailed { applied, failed, .. }) => {
            assert_eq!(applied, &vec![Action::create("/a", "1")]);
            assert_eq!(failed.key(), "/a/b");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing after the failure reached the service.
    assert!(live.client().inner.get_value("/c").await.is_err());
}

#[tokio::test]
async fn declined_action_is_seen_but_not_applied() {
    let live = LiveTree::new(MemoryClient::new());
    let desired = Node::root(vec![Node::new("a", "1"), Node::new("b", "2")]);
    let mut handler = RecordingHandler {
        decline: Some("/a"),
        ..RecordingHandler::default()
    };

    let result = Reconciler::new(&live)
        .reconcile(&desired, &mut handler, ExecutionMode::Apply)
        .await
        .expect("run");

    assert_eq!(handler.seen.len(), 2);
    assert_eq!(result.report.skipped, vec![Action::create("/a", "1")]);
    assert!(!result.success);
    assert_eq!(
        live.client().get_value("/b").await.expect("b created"),
        b"2".to_vec()
    );
}

#[tokio::test]
async fn namespaced_apply_lands_under_base_path() {
    let namespaced = NamespacedClient::new(MemoryClient::new(), "/env/prod").expect("namespace");
    let live = LiveTree::new(namespaced);

    Reconciler::new(&live)
        .reconcile(
            &Node::root(vec![Node::new("a", "1")]),
            &mut SilentHandler,
            ExecutionMode::Apply,
        )
        .await
        .expect("apply");

    let memory = live.into_inner().into_inner();
    assert_eq!(
        memory.get_value("/env/prod/a").await.expect("namespaced node"),
        b"1".to_vec()
    );
}

#[tokio::test]
async fn malformed_tree_leaves_namespace_uncreated() {
    let namespaced = NamespacedClient::new(MemoryClient::new(), "/env/prod").expect("namespace");
    let live = LiveTree::new(namespaced);
    let desired = Node::root(vec![
        Node::new("a", "1"),
        Node::new("b", "2"),
        Node::new("a", "3"),
    ]);

    let err = Reconciler::new(&live)
        .reconcile(&desired, &mut SilentHandler, ExecutionMode::Apply)
        .await
        .expect_err("duplicate sibling names");
    assert!(matches!(err, ZkTreeError::Tree(_)));

    let memory = live.into_inner().into_inner();
    assert_eq!(memory.write_count(), 0);
    assert!(memory.get_value("/env").await.is_err());
}

#[tokio::test]
async fn local_store_persists_between_runs() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let desired = desired_tree();

    {
        let live = LiveTree::new(LocalClient::with_base_dir(dir.path()));
        Reconciler::new(&live)
            .reconcile(&desired, &mut SilentHandler, ExecutionMode::Apply)
            .await
            .expect("apply");
    }

    let live = LiveTree::new(LocalClient::with_base_dir(dir.path()));
    let drift = Reconciler::new(&live).check_drift(&desired).await.expect("drift");
    assert!(drift.is_converged(), "{drift}");
}
