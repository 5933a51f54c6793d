//! End-to-end session tests over scripted connections and a real
//! state file.

use rowsync_protocol::CursorSnapshot;
use rowsync_server::{
    MemoryRowStore, ScriptedConnection, ServerConfig, SyncServer, TomlStateStore,
};
use std::path::Path;

fn server_with_state(
    state_path: &Path,
) -> SyncServer<MemoryRowStore, TomlStateStore> {
    let config = ServerConfig::default()
        .with_tables(["Orders", "Customers"])
        .with_state_path(state_path);
    let state = TomlStateStore::open(state_path);
    SyncServer::new(config, MemoryRowStore::new(), state)
}

#[test]
fn sync_session_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("cursors.toml");
    std::fs::write(&state_path, "[LastID]\nOrders = 5\nCustomers = 2\n").unwrap();

    let mut server = server_with_state(&state_path);
    assert_eq!(server.watermarks().get("Orders"), 5);
    assert_eq!(server.watermarks().get("Customers"), 2);

    let mut conn = ScriptedConnection::new([
        // 3 Orders rows, none for Customers.
        r#"{"Orders":[{"id":6},{"id":7},{"id":8}],"Customers":[]}"#,
        // Unrecognized table: rejected, watermarks untouched.
        r#"{"Invoices":[{"id":1}]}"#,
        "88",
    ]);
    server.serve_connection(&mut conn).unwrap();
    let sent = conn.sent();

    assert_eq!(sent.len(), 2);
    let first = CursorSnapshot::decode(&sent[0]).unwrap();
    assert_eq!(first.get("Orders"), 8);
    assert_eq!(first.get("Customers"), 2);

    let second = CursorSnapshot::decode(&sent[1]).unwrap();
    assert_eq!(second.get("Orders"), 8);
    assert_eq!(second.get("Customers"), 2);

    // Sentinel persisted the final counts.
    let reopened = TomlStateStore::open(&state_path);
    let entries: Vec<_> = reopened.entries("LastID").collect();
    assert_eq!(entries, vec![("Customers", 2), ("Orders", 8)]);
}

#[test]
fn watermarks_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("cursors.toml");

    {
        let mut server = server_with_state(&state_path);
        server
            .serve_connection(ScriptedConnection::new([
                r#"{"Orders":[{"id":1},{"id":2}],"Customers":[{"id":1}]}"#,
                "88",
            ]))
            .unwrap();
    }

    // A fresh process loads the flushed counts, never lower.
    let server = server_with_state(&state_path);
    assert_eq!(server.watermarks().get("Orders"), 2);
    assert_eq!(server.watermarks().get("Customers"), 1);
}

#[test]
fn failed_batches_never_move_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("cursors.toml");
    std::fs::write(&state_path, "[LastID]\nOrders = 5\nCustomers = 2\n").unwrap();

    let mut server = server_with_state(&state_path);
    server
        .serve_connection(ScriptedConnection::new([
            "garbage",
            r#"{"Invoices":[]}"#,
            r#"{"Orders":"not an array"}"#,
            "88",
        ]))
        .unwrap();

    let reopened = TomlStateStore::open(&state_path);
    let entries: Vec<_> = reopened.entries("LastID").collect();
    assert_eq!(entries, vec![("Customers", 2), ("Orders", 5)]);
}

#[test]
fn transport_failure_preserves_applied_batches() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("cursors.toml");

    let mut server = server_with_state(&state_path);
    let result = server.serve_connection(
        ScriptedConnection::new([r#"{"Orders":[{"id":1}]}"#]).fail_when_drained(),
    );
    assert!(result.is_err());

    // The batch applied before the failure was flushed.
    let server = server_with_state(&state_path);
    assert_eq!(server.watermarks().get("Orders"), 1);
}
