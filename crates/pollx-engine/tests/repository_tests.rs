// Integration tests for the repository façade

mod common;

use common::{cast, lunch_poll, repository};
use pollx_core::{ExErrorKind, Role, User};
use uuid::Uuid;

#[test]
fn test_lunch_scenario_through_facade() {
    let cast = cast();
    let mut repo = repository(&cast);
    let mut poll = lunch_poll(&cast.admin);
    let sub_poll_id = poll.sub_polls()[0].id();
    let sushi = poll.sub_polls()[0].options()[1].id();

    repo.upsert_poll(&poll).unwrap();
    let stored = repo.get_poll(poll.id()).unwrap();
    assert_eq!(stored.sub_polls().len(), 1);
    assert_eq!(stored.option_count(), 2);

    poll.sub_poll_mut(sub_poll_id)
        .unwrap()
        .remove_option(sushi)
        .unwrap();
    let report = repo.upsert_poll(&poll).unwrap();
    assert_eq!(report.options.deleted, 1);

    let stored = repo.get_poll(poll.id()).unwrap();
    assert_eq!(stored, poll);
    assert_eq!(stored.sub_polls()[0].options()[0].title, "Pizza");
}

#[test]
fn test_get_polls_returns_every_full_tree() {
    let cast = cast();
    let mut repo = repository(&cast);
    let mut first = lunch_poll(&cast.admin);
    first.sub_polls_mut()[0].options_mut()[0].add_vote(cast.ann.clone());
    let second = lunch_poll(&cast.admin);
    repo.upsert_poll(&first).unwrap();
    repo.upsert_poll(&second).unwrap();

    let polls = repo.get_polls().unwrap();
    assert_eq!(polls, vec![first, second]);
}

#[test]
fn test_get_unknown_poll_maps_to_404() {
    let cast = cast();
    let repo = repository(&cast);

    let err = repo.get_poll(Uuid::now_v7()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.kind().http_status(), 404);
    assert_eq!(err.op(), Some("poll_get"));
    assert!(err.request_id().is_some());
}

#[test]
fn test_invalid_tree_maps_to_422() {
    let cast = cast();
    let mut repo = repository(&cast);
    let mut poll = lunch_poll(&cast.admin);
    poll.admin.id = Uuid::nil();

    let err = repo.upsert_poll(&poll).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(err.kind().http_status(), 422);
    assert!(repo.get_polls().unwrap().is_empty());
}

#[test]
fn test_unregistered_voter_is_rejected_before_writing() {
    let cast = cast();
    let mut repo = repository(&cast);
    let existing = lunch_poll(&cast.admin);
    repo.upsert_poll(&existing).unwrap();

    let ghost = User::new("Ghost", "ghost@example.com", Role::RegularUser);
    let mut poll = lunch_poll(&cast.admin);
    poll.sub_polls_mut()[0].options_mut()[0].add_vote(cast.ann.clone());
    poll.sub_polls_mut()[0].options_mut()[1].add_vote(ghost.clone());

    let err = repo.upsert_poll(&poll).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.entity_id(), Some(ghost.id.to_string().as_str()));
    assert_eq!(err.op(), Some("poll_upsert"));

    assert!(repo.get_poll(poll.id()).unwrap_err().is_not_found());
    assert_eq!(repo.get_polls().unwrap(), vec![existing]);
}

#[test]
fn test_unregistered_admin_is_rejected() {
    let cast = cast();
    let mut repo = repository(&cast);
    let stranger = User::new("Stranger", "stranger@example.com", Role::PollAdmin);

    let err = repo.upsert_poll(&lunch_poll(&stranger)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.entity_id(), Some(stranger.id.to_string().as_str()));
    assert!(repo.get_polls().unwrap().is_empty());
}

#[test]
fn test_delete_operations() {
    let cast = cast();
    let mut repo = repository(&cast);
    let mut poll = lunch_poll(&cast.admin);
    let extra = poll.add_sub_poll("When", "");
    extra.add_option("Noon", "");
    let extra_id = extra.id();
    let pizza = poll.sub_polls()[0].options()[0].id();
    repo.upsert_poll(&poll).unwrap();

    let report = repo.delete_sub_poll(extra_id).unwrap();
    assert_eq!(report.sub_polls.deleted, 1);
    assert_eq!(report.options.deleted, 1);

    repo.delete_option(pizza).unwrap();
    let stored = repo.get_poll(poll.id()).unwrap();
    assert_eq!(stored.sub_polls().len(), 1);
    assert_eq!(stored.option_count(), 1);

    repo.delete_poll(poll.id()).unwrap();
    assert!(repo.locks().is_empty());
    assert!(repo.get_poll(poll.id()).unwrap_err().is_not_found());
    assert!(repo.delete_poll(poll.id()).unwrap_err().is_not_found());
}

#[test]
fn test_access_lifecycle() {
    let cast = cast();
    let mut repo = repository(&cast);
    let poll = lunch_poll(&cast.admin);
    repo.upsert_poll(&poll).unwrap();

    let grant = repo.grant_access(cast.ann.id, poll.id()).unwrap();
    repo.grant_access(cast.bo.id, poll.id()).unwrap();

    let resolved = repo.get_access_by_token(grant.token.expose()).unwrap();
    assert_eq!(resolved.user, cast.ann);
    assert_eq!(repo.list_access(poll.id()).unwrap().len(), 2);
    assert_eq!(repo.list_access_as_admin(cast.admin.id).unwrap().len(), 2);
    assert!(repo.list_access_as_admin(cast.ann.id).unwrap().is_empty());

    repo.revoke_access(cast.ann.id, poll.id()).unwrap();
    assert!(repo
        .get_access_by_token(grant.token.expose())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_grant_to_unknown_user_is_not_found() {
    let cast = cast();
    let mut repo = repository(&cast);
    let poll = lunch_poll(&cast.admin);
    repo.upsert_poll(&poll).unwrap();

    let stranger = Uuid::now_v7();
    let err = repo.grant_access(stranger, poll.id()).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.entity_id(), Some(stranger.to_string().as_str()));
}

#[test]
fn test_close_releases_handle() {
    let cast = cast();
    let repo = repository(&cast);
    assert!(repo.close().is_ok());
}
