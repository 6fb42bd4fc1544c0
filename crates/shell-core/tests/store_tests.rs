use shell_core::error::ShellError;
use shell_core::node::Node;
use shell_core::script::{NewScript, ScriptId};
use shell_core::status::CommandStatus;
use shell_core::store::{ExecutionStore, ScriptStore};
use shell_core::{FileStore, MemoryStore};
use std::sync::Arc;

fn stores(root: &std::path::Path) -> Vec<(Arc<dyn ScriptStore>, Arc<dyn ExecutionStore>)> {
    let memory = Arc::new(MemoryStore::new());
    let file = Arc::new(FileStore::open(root));
    vec![
        (memory.clone() as Arc<dyn ScriptStore>, memory as Arc<dyn ExecutionStore>),
        (file.clone() as Arc<dyn ScriptStore>, file as Arc<dyn ExecutionStore>),
    ]
}

#[tokio::test]
async fn ids_are_assigned_sequentially() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, executions) in stores(temp.path()) {
        let a = scripts.create(NewScript::new("a", "true")).await.unwrap();
        let b = scripts.create(NewScript::new("b", "true")).await.unwrap();
        assert_eq!(a.id, ScriptId(1));
        assert_eq!(b.id, ScriptId(2));

        let node = Node::local("local");
        let first = executions.create(&a, &node).await.unwrap();
        let second = executions.create(&a, &node).await.unwrap();
        assert_eq!(second.id.0, first.id.0 + 1);
        assert_eq!(first.status, CommandStatus::Pending);
    }
}

#[tokio::test]
async fn invalid_definitions_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, _) in stores(temp.path()) {
        let cases = [
            NewScript::new("   ", "echo"),
            NewScript::new("x".repeat(101), "echo"),
            NewScript::new("ok", ""),
            NewScript {
                working_directory: Some("d".repeat(201)),
                ..NewScript::new("ok", "echo")
            },
            NewScript {
                timeout: Some(0),
                ..NewScript::new("ok", "echo")
            },
        ];
        for draft in cases {
            let err = scripts.create(draft).await.unwrap_err();
            assert!(matches!(err, ShellError::Validation(_)), "{}", err);
        }
        assert!(scripts.list().await.unwrap().is_empty());

        let max = scripts
            .create(NewScript::new("x".repeat(100), "echo"))
            .await
            .unwrap();
        assert_eq!(max.name.len(), 100);
    }
}

#[tokio::test]
async fn save_requires_an_existing_script() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, _) in stores(temp.path()) {
        let mut script = scripts.create(NewScript::new("a", "true")).await.unwrap();
        script.content = "false".into();
        scripts.save(&script).await.unwrap();
        assert_eq!(scripts.find(script.id).await.unwrap().unwrap().content, "false");

        script.id = ScriptId(77);
        assert!(matches!(
            scripts.save(&script).await,
            Err(ShellError::ScriptNotFound(ScriptId(77)))
        ));
    }
}

#[tokio::test]
async fn enabled_scripts_are_ordered_by_name() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, _) in stores(temp.path()) {
        scripts.create(NewScript::new("zeta", "true")).await.unwrap();
        let mut off = scripts.create(NewScript::new("beta", "true")).await.unwrap();
        scripts.create(NewScript::new("alpha", "true")).await.unwrap();
        off.enabled = false;
        scripts.save(&off).await.unwrap();

        let names: Vec<_> = scripts
            .find_all_enabled()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }
}

#[tokio::test]
async fn tag_lookup_matches_any_tag() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, _) in stores(temp.path()) {
        scripts
            .create(NewScript {
                tags: Some(vec!["db".into(), "backup".into()]),
                ..NewScript::new("dump", "pg_dump")
            })
            .await
            .unwrap();
        scripts
            .create(NewScript {
                tags: Some(vec!["web".into()]),
                ..NewScript::new("reload", "nginx -s reload")
            })
            .await
            .unwrap();
        scripts.create(NewScript::new("untagged", "true")).await.unwrap();

        let found = scripts
            .find_by_tags(&["backup".into(), "web".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(scripts.find_by_tags(&["none".into()]).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn execution_queries_return_newest_first() {
    let temp = tempfile::tempdir().unwrap();
    for (scripts, executions) in stores(temp.path()) {
        let script = scripts.create(NewScript::new("a", "true")).await.unwrap();
        let web = Node::ssh("web", "10.0.0.1", "ops");
        let first = executions.create(&script, &web).await.unwrap();
        let second = executions.create(&script, &web).await.unwrap();

        let mut finished = second.clone();
        finished.mark_running();
        finished.mark_finished(CommandStatus::Completed, "ok".into(), 0.5);
        executions.save(&finished).await.unwrap();

        let ids: Vec<_> = executions
            .find_by_node("web")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, [second.id, first.id]);

        let completed = executions
            .find_by_status(CommandStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, finished.id);
        assert_eq!(completed[0].result.as_deref(), Some("ok"));
        assert_eq!(
            executions
                .find_by_node_and_script("web", script.id)
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(executions.find_by_node("db").await.unwrap().is_empty());
        assert!(executions.find_by_script(ScriptId(9)).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn file_store_survives_reopening() {
    let temp = tempfile::tempdir().unwrap();
    let script_id;
    let execution_id;
    {
        let store = FileStore::open(temp.path());
        let script = ScriptStore::create(&store, NewScript::new("persist", "echo"))
            .await
            .unwrap();
        let record = ExecutionStore::create(&store, &script, &Node::local("local"))
            .await
            .unwrap();
        script_id = script.id;
        execution_id = record.id;
    }

    let store = FileStore::open(temp.path());
    let script = ScriptStore::find(&store, script_id).await.unwrap().unwrap();
    assert_eq!(script.name, "persist");
    let record = ExecutionStore::find(&store, execution_id).await.unwrap().unwrap();
    assert_eq!(record.script_id, script_id);
    assert_eq!(record.node, Node::local("local"));

    let next = ScriptStore::create(&store, NewScript::new("next", "echo"))
        .await
        .unwrap();
    assert_eq!(next.id, ScriptId(2));
}
