mod common;

use common::{echo_hi, node, Harness, Reply, ScriptedRemote};
use shell_core::execution::ExecutionId;
use shell_core::handler::ExecutionMessageHandler;
use shell_core::queue::{spawn_consumer, ChannelBus, ExecutionMessage, MessageBus, SpoolBus};
use shell_core::script::{NewScript, ScriptDefinition, ScriptId, ScriptUpdate};
use shell_core::service::ShellScriptService;
use shell_core::status::CommandStatus;
use shell_core::store::ExecutionStore;
use shell_core::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

fn handler_for(h: &Harness) -> ExecutionMessageHandler {
    ExecutionMessageHandler::new(h.service.clone(), h.scripts(), h.executions())
}

#[tokio::test]
async fn scheduled_execution_runs_to_completion() {
    let h = Harness::new(ScriptedRemote::succeeding("hi\n"));
    let script = h.script(echo_hi()).await;
    let scheduled = h.service.schedule(&script, &node()).await.unwrap();

    handler_for(&h)
        .handle(ExecutionMessage::new(scheduled.id))
        .await
        .unwrap();

    let record = h.record(scheduled.id).await;
    assert_eq!(record.status, CommandStatus::Completed);
    assert_eq!(record.exit_code, Some(0));
    assert_eq!(record.result.as_deref(), Some("hi\n"));
    assert!(record.executed_at.is_some());
    // The queued record is reused, not duplicated.
    assert_eq!(h.all_records().await.len(), 1);
    assert_eq!(h.remote.commands().len(), 3);
}

#[tokio::test]
async fn second_delivery_of_the_same_job_is_a_no_op() {
    let h = Harness::new(ScriptedRemote::succeeding("hi\n"));
    let script = h.script(echo_hi()).await;
    let scheduled = h.service.schedule(&script, &node()).await.unwrap();
    let handler = handler_for(&h);

    handler.handle(ExecutionMessage::new(scheduled.id)).await.unwrap();
    let after_first = h.record(scheduled.id).await;

    handler.handle(ExecutionMessage::new(scheduled.id)).await.unwrap();

    assert_eq!(h.record(scheduled.id).await, after_first);
    assert_eq!(h.remote.commands().len(), 3);
}

#[tokio::test]
async fn unknown_execution_id_is_dropped_quietly() {
    let h = Harness::new(ScriptedRemote::succeeding(""));

    handler_for(&h)
        .handle(ExecutionMessage::new(ExecutionId(404)))
        .await
        .unwrap();

    assert!(h.all_records().await.is_empty());
    assert!(h.remote.commands().is_empty());
}

#[tokio::test]
async fn record_that_is_not_pending_is_left_alone() {
    let h = Harness::new(ScriptedRemote::succeeding(""));
    let script = h.script(echo_hi()).await;
    let mut record = h.service.schedule(&script, &node()).await.unwrap();
    record.mark_running();
    h.executions().save(&record).await.unwrap();

    handler_for(&h)
        .handle(ExecutionMessage::new(record.id))
        .await
        .unwrap();

    assert_eq!(h.record(record.id).await, record);
    assert!(h.remote.commands().is_empty());
}

#[tokio::test]
async fn failing_run_ends_failed() {
    let h = Harness::new(ScriptedRemote::new(
        Reply::status(shell_core::RemoteStatus::Failed, "permission denied"),
        Reply::completed(""),
        Reply::completed(""),
    ));
    let script = h.script(echo_hi()).await;
    let scheduled = h.service.schedule(&script, &node()).await.unwrap();

    handler_for(&h)
        .handle(ExecutionMessage::new(scheduled.id))
        .await
        .unwrap();

    let record = h.record(scheduled.id).await;
    assert_eq!(record.status, CommandStatus::Failed);
    assert!(record.result.unwrap().contains("permission denied"));
}

#[tokio::test]
async fn script_disabled_after_scheduling_is_not_run() {
    let h = Harness::new(ScriptedRemote::succeeding("ran"));
    let script = h
        .script(NewScript {
            use_sudo: true,
            ..echo_hi()
        })
        .await;
    let scheduled = h.service.schedule(&script, &node()).await.unwrap();
    h.service
        .update_script(
            script.id,
            ScriptUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    handler_for(&h)
        .handle(ExecutionMessage::new(scheduled.id))
        .await
        .unwrap();

    let record = h.record(scheduled.id).await;
    assert_eq!(record.status, CommandStatus::Failed);
    assert_eq!(record.exit_code, Some(1));
    let result = record.result.unwrap();
    assert!(result.starts_with("async execution error:"), "{}", result);
    assert!(result.contains("is disabled"), "{}", result);
    assert!(h.remote.commands().is_empty());
    assert!(h.staged_files().is_empty());
}

#[tokio::test]
async fn missing_script_fails_the_record_at_handler_level() {
    let h = Harness::new(ScriptedRemote::succeeding(""));
    let orphan = ScriptDefinition::from_draft(ScriptId(99), NewScript::new("gone", "true"));
    let record = h.executions().create(&orphan, &node()).await.unwrap();

    handler_for(&h)
        .handle(ExecutionMessage::new(record.id))
        .await
        .unwrap();

    let record = h.record(record.id).await;
    assert_eq!(record.status, CommandStatus::Failed);
    assert_eq!(record.exit_code, Some(1));
    let result = record.result.unwrap();
    assert!(result.starts_with("async execution error:"), "{}", result);
    assert!(result.contains("Script not found: 99"), "{}", result);
    assert!(h.remote.commands().is_empty());
}

#[tokio::test]
async fn channel_consumer_drives_scheduled_records() {
    let remote = Arc::new(ScriptedRemote::succeeding("from the queue"));
    let store = Arc::new(MemoryStore::new());
    let (bus, receiver) = ChannelBus::new();
    let temp = tempfile::tempdir().unwrap();
    let service = Arc::new(
        ShellScriptService::new(remote.clone(), store.clone(), store.clone(), Arc::new(bus))
            .with_settings(shell_core::ServiceSettings {
                temp_script_dir: temp.path().join("staging"),
                remote_script_dir: "/tmp".into(),
                transfer_timeout: 30,
            }),
    );
    let handler = Arc::new(ExecutionMessageHandler::new(
        service.clone(),
        store.clone(),
        store.clone(),
    ));
    let _consumer = spawn_consumer(receiver, handler);

    let script = service.create_script(echo_hi()).await.unwrap();
    let scheduled = service.schedule(&script, &node()).await.unwrap();
    assert_eq!(scheduled.status, CommandStatus::Pending);

    let mut status = CommandStatus::Pending;
    for _ in 0..100 {
        status = service
            .find_execution(scheduled.id)
            .await
            .unwrap()
            .unwrap()
            .status;
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, CommandStatus::Completed);
}

#[tokio::test]
async fn spool_bus_hands_jobs_to_the_handler_and_clears_them() {
    let h = Harness::new(ScriptedRemote::succeeding("spooled"));
    let spool_dir = h.temp.path().join("queue");
    let spool = SpoolBus::new(spool_dir.clone());
    let script = h.script(echo_hi()).await;

    let first = h.executions().create(&script, &node()).await.unwrap();
    let second = h.executions().create(&script, &node()).await.unwrap();
    spool.dispatch(ExecutionMessage::new(first.id)).await.unwrap();
    spool.dispatch(ExecutionMessage::new(second.id)).await.unwrap();

    let pending = spool.pending().unwrap();
    assert_eq!(pending.len(), 2);

    let processed = spool.drain(&handler_for(&h)).await.unwrap();

    assert_eq!(processed, 2);
    assert!(spool.pending().unwrap().is_empty());
    for id in [first.id, second.id] {
        assert_eq!(h.record(id).await.status, CommandStatus::Completed);
    }
}
