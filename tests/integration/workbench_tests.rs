//! Workbench facade behavior that needs no live agent.

use bytesmith::config::AppSettings;
use bytesmith::workbench::Workbench;
use bytesmith::AppError;

fn workbench_in(dir: &tempfile::TempDir) -> Workbench {
    let path = dir.path().join("config.json");
    let (workbench, _events) = Workbench::with_config_path(path).expect("workbench");
    workbench
}

/// A fresh workbench exposes the default agent catalog, annotated with
/// install status.
#[tokio::test]
async fn fresh_workbench_lists_default_agents() {
    let dir = tempfile::tempdir().unwrap();
    let workbench = workbench_in(&dir);

    let agents = workbench.list_available_agents().await;
    let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();

    assert!(names.contains(&"opencode"));
    assert!(names.contains(&"claude-code-acp"));
    // None of the well-known agents should report installed on a bare CI
    // box, but the flag must at least be consistent with PATH lookup.
    for agent in &agents {
        assert_eq!(
            agent.installed,
            bytesmith::agent::discovery::is_installed(&agent.command)
        );
    }
}

/// Connecting to an unconfigured agent is a not-found error.
#[tokio::test]
async fn connect_unknown_agent_fails() {
    let dir = tempfile::tempdir().unwrap();
    let workbench = workbench_in(&dir);

    let result = workbench.connect_agent("no-such-agent", "/tmp").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

/// Prompt operations against unknown connections fail with not-found.
#[tokio::test]
async fn prompt_operations_require_a_connection() {
    let dir = tempfile::tempdir().unwrap();
    let workbench = workbench_in(&dir);

    let send = workbench.send_prompt("ghost-conn", "s", "hi").await;
    assert!(matches!(send, Err(AppError::NotFound(_))));

    let cancel = workbench.cancel_prompt("ghost-conn", "s").await;
    assert!(matches!(cancel, Err(AppError::NotFound(_))));
}

/// Settings persist through save and reload.
#[tokio::test]
async fn settings_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    {
        let (workbench, _events) =
            Workbench::with_config_path(path.clone()).expect("workbench");
        workbench
            .save_settings(AppSettings {
                theme: "light".to_owned(),
                default_agent: "gemini".to_owned(),
                default_cwd: "/work".to_owned(),
                auto_approve: true,
            })
            .await
            .expect("save settings");
    }

    let (reloaded, _events) = Workbench::with_config_path(path).expect("workbench");
    let settings = reloaded.get_settings().await;
    assert_eq!(settings.theme, "light");
    assert_eq!(settings.default_agent, "gemini");
    assert!(settings.auto_approve);
}

/// Directory listings put directories first, then sort by name.
#[tokio::test]
async fn list_files_sorts_directories_first() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("tree");
    std::fs::create_dir_all(root.join("zdir")).unwrap();
    std::fs::create_dir_all(root.join("adir")).unwrap();
    std::fs::write(root.join("afile.txt"), "x").unwrap();
    std::fs::write(root.join("bfile.txt"), "yy").unwrap();

    let workbench = workbench_in(&dir);
    let entries = workbench
        .list_files(root.to_str().unwrap())
        .await
        .expect("list");

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["adir", "zdir", "afile.txt", "bfile.txt"]);
    assert!(entries[0].is_dir);
    assert!(!entries[2].is_dir);
    assert_eq!(entries[3].size, 2);
}

/// Session queries degrade gracefully with no sessions.
#[tokio::test]
async fn session_queries_with_no_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let workbench = workbench_in(&dir);

    assert!(workbench.get_session_history("none").await.is_none());
    assert!(workbench.list_sessions().await.is_empty());
    workbench.delete_session("none").await;
    assert!(workbench.list_connections().await.is_empty());
}

/// Permission responses with no pending dialog are ignored.
#[tokio::test]
async fn respond_permission_without_dialog_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let workbench = workbench_in(&dir);
    workbench.respond_permission("conn-1", "opt-1").await;
}
