//! Property-based tests running the Runtime against the simulated backend.
//!
//! Tests verify that invariants hold under arbitrary operation sequences,
//! including replies delivered in shuffled order. Every render checks the
//! standard invariants; the oracle at the end compares against the backend.

use darkchat_app::{KeyInput, Runtime};
use darkchat_harness::{InvariantRegistry, SharedBackend, SimBackend, SimDriver, run_until_idle, start};
use proptest::prelude::*;

/// User-level operation.
#[derive(Debug, Clone)]
enum Op {
    /// Open the direct picker and pick the entry at this index.
    StartDirect(usize),
    /// Move the sidebar selection.
    Select { forward: bool },
    /// Type and send a message.
    Send(String),
    /// Another user messages al.
    PeerMessage(usize),
    /// Another user adds al to a new group.
    PeerGroup(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..3).prop_map(Op::StartDirect),
        2 => any::<bool>().prop_map(|forward| Op::Select { forward }),
        3 => "[a-z ]{0,8}".prop_map(Op::Send),
        2 => (0usize..3).prop_map(Op::PeerMessage),
        1 => (0usize..3).prop_map(Op::PeerGroup),
    ]
}

/// An operation, optionally with its replies held and released shuffled.
fn step_strategy() -> impl Strategy<Value = (Op, Option<u64>)> {
    (op_strategy(), proptest::option::of(any::<u64>()))
}

struct World {
    backend: SharedBackend,
    al: String,
    peers: Vec<String>,
}

fn world() -> World {
    let mut backend = SimBackend::new();
    let al = backend.add_user("al", "al@example.com", "pw");
    let peers = ["bo", "cy", "di"]
        .iter()
        .map(|name| backend.add_user(name, &format!("{name}@example.com"), "pw"))
        .collect();
    World { backend: backend.shared(), al, peers }
}

fn inject(runtime: &mut Runtime<SimDriver>, world: &World, op: &Op) {
    let driver = runtime.driver_mut();
    match op {
        Op::StartDirect(index) => {
            driver.press(KeyInput::Ctrl('n'));
            for _ in 0..*index {
                driver.press(KeyInput::Down);
            }
            driver.press(KeyInput::Enter);
        },
        Op::Select { forward } => {
            driver.press(if *forward { KeyInput::Down } else { KeyInput::Up });
        },
        Op::Send(text) => {
            driver.type_text(text);
            driver.press(KeyInput::Enter);
        },
        Op::PeerMessage(index) => {
            let peer = &world.peers[index % world.peers.len()];
            world.backend.lock().seed_direct(peer, &world.al, "ping");
        },
        Op::PeerGroup(index) => {
            let peer = &world.peers[index % world.peers.len()];
            world.backend.lock().seed_group("team", &[peer.as_str(), world.al.as_str()]);
        },
    }
}

async fn run(steps: Vec<(Op, Option<u64>)>) {
    let world = world();
    let driver = SimDriver::new("al", world.backend.clone())
        .with_invariants(InvariantRegistry::standard());
    let mut runtime = Runtime::new(driver);

    start(&mut runtime).await.expect("start");
    let driver = runtime.driver_mut();
    driver.type_text("al@example.com");
    driver.press(KeyInput::Tab);
    driver.type_text("pw");
    driver.press(KeyInput::Enter);
    run_until_idle(&mut runtime).await.expect("login");

    for (op, shuffle) in &steps {
        if shuffle.is_some() {
            runtime.driver_mut().hold_replies(true);
        }
        inject(&mut runtime, &world, op);
        run_until_idle(&mut runtime).await.expect("idle");

        if let Some(seed) = shuffle {
            runtime.driver_mut().hold_replies(false);
            runtime.driver_mut().release_held_shuffled(*seed);
            run_until_idle(&mut runtime).await.expect("idle after release");
        }
    }

    // Settle with one last refresh so the list reflects the backend.
    let actions = runtime.app_mut().list_conversations();
    runtime.process_actions(actions).await.expect("refresh");
    run_until_idle(&mut runtime).await.expect("idle");

    let backend = world.backend.lock();
    for peer in &world.peers {
        assert!(backend.direct_count(&world.al, peer) <= 1, "backend holds two chats with {peer}");
        let listed = runtime
            .app()
            .conversations()
            .items()
            .iter()
            .filter(|c| c.is_direct_with(peer) && !c.is_synthetic())
            .count();
        assert_eq!(listed, backend.direct_count(&world.al, peer), "sidebar disagrees about {peer}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_arbitrary_operations(steps in prop::collection::vec(step_strategy(), 1..25)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().expect("tokio runtime");
        rt.block_on(run(steps));
    }
}
