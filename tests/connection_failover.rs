//! Establishment protocol: retries, failover and offline fallback.

mod common;

use common::{fast_supervisor, BACKUP, PRIMARY};
use kvlink::connection::{
    ConnectError, ConnectionState, FailureKind, FaultPlan, ServerFaults, ServerRole,
};

#[tokio::test]
async fn clean_start_connects_to_primary() {
    let (supervisor, connector) = fast_supervisor(3, FaultPlan::none());

    supervisor.establish().await.unwrap();

    assert_eq!(supervisor.state(), ConnectionState::ConnectedPrimary);
    assert!(supervisor.is_connected());
    assert_eq!(
        supervisor.current_server_address(),
        format!("{}:{}", PRIMARY.0, PRIMARY.1)
    );
    assert_eq!(connector.attempts(ServerRole::Primary), 1);
    assert_eq!(connector.attempts(ServerRole::Backup), 0);
}

#[tokio::test]
async fn establish_is_idempotent_while_connected() {
    let (supervisor, connector) = fast_supervisor(3, FaultPlan::none());
    supervisor.establish().await.unwrap();
    let before = supervisor.status();

    supervisor.establish().await.unwrap();

    assert_eq!(supervisor.status(), before);
    assert_eq!(connector.attempts(ServerRole::Primary), 1);
    assert_eq!(connector.attempts(ServerRole::Backup), 0);
}

#[tokio::test]
async fn transient_failures_within_budget_stay_on_primary() {
    for retries in 0..=4 {
        for failures in 0..=retries {
            let plan = FaultPlan::none().with_primary(ServerFaults::transient(failures));
            let (supervisor, connector) = fast_supervisor(retries, plan);

            supervisor.establish().await.unwrap();

            assert_eq!(
                supervisor.state(),
                ConnectionState::ConnectedPrimary,
                "retries={retries} failures={failures}"
            );
            assert_eq!(connector.attempts(ServerRole::Primary), failures + 1);
            assert_eq!(connector.attempts(ServerRole::Backup), 0);
        }
    }
}

#[tokio::test]
async fn exhausted_transient_budget_fails_over_to_backup() {
    let plan = FaultPlan::none().with_primary(ServerFaults::transient(3));
    let (supervisor, connector) = fast_supervisor(2, plan);

    supervisor.establish().await.unwrap();

    assert_eq!(supervisor.state(), ConnectionState::ConnectedBackup);
    assert_eq!(connector.attempts(ServerRole::Primary), 3);
    assert_eq!(connector.attempts(ServerRole::Backup), 1);
}

#[tokio::test]
async fn permanent_primary_failure_skips_retries() {
    let plan = FaultPlan::none().with_primary(ServerFaults::permanent());
    let (supervisor, connector) = fast_supervisor(5, plan);

    supervisor.establish().await.unwrap();

    assert_eq!(connector.attempts(ServerRole::Primary), 1);
    assert_eq!(connector.attempts(ServerRole::Backup), 1);
    assert_eq!(supervisor.state(), ConnectionState::ConnectedBackup);
    assert_eq!(
        supervisor.current_server_address(),
        format!("{}:{}", BACKUP.0, BACKUP.1)
    );
}

#[tokio::test]
async fn unreachable_permanent_primary_makes_one_attempt() {
    let plan = FaultPlan::none().with_primary(ServerFaults::unreachable(FailureKind::Permanent));
    let (supervisor, connector) = fast_supervisor(3, plan);

    supervisor.establish().await.unwrap();

    assert_eq!(connector.attempts(ServerRole::Primary), 1);
    assert_eq!(supervisor.state(), ConnectionState::ConnectedBackup);
}

#[tokio::test]
async fn backup_is_tried_exactly_once() {
    let plan = FaultPlan::none()
        .with_primary(ServerFaults::unreachable(FailureKind::Transient))
        .with_backup(ServerFaults::unreachable(FailureKind::Transient));
    let (supervisor, connector) = fast_supervisor(2, plan);

    let err = supervisor.establish().await.unwrap_err();

    assert!(err.is_offline());
    assert_eq!(connector.attempts(ServerRole::Primary), 3);
    assert_eq!(connector.attempts(ServerRole::Backup), 1);
}

#[tokio::test]
async fn both_servers_down_goes_offline() {
    let plan = FaultPlan::none()
        .with_primary(ServerFaults::permanent())
        .with_backup(ServerFaults::permanent());
    let (supervisor, _) = fast_supervisor(3, plan);

    let err = supervisor.establish().await.unwrap_err();

    match &err {
        ConnectError::Offline { last } => {
            assert!(matches!(
                **last,
                ConnectError::Permanent {
                    role: ServerRole::Backup,
                    ..
                }
            ));
        }
        other => panic!("expected offline error, got {other:?}"),
    }
    assert!(err.to_string().contains("Offline mode"));
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    assert!(!supervisor.is_connected());
    assert_eq!(supervisor.status().handle_id, None);
    assert_eq!(supervisor.current_server_address(), "Disconnected");
}

#[tokio::test]
async fn offline_supervisor_can_be_reestablished() {
    // Primary and backup each reject their first attempt only.
    let plan = FaultPlan::none()
        .with_primary(ServerFaults::permanent())
        .with_backup(ServerFaults::permanent());
    let (supervisor, connector) = fast_supervisor(0, plan);

    assert!(supervisor.establish().await.is_err());
    supervisor.establish().await.unwrap();

    assert_eq!(supervisor.state(), ConnectionState::ConnectedPrimary);
    assert_eq!(connector.attempts(ServerRole::Primary), 2);
    assert_eq!(connector.attempts(ServerRole::Backup), 1);
}
