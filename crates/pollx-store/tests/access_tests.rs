// Integration tests for access grant persistence

mod common;

use common::{admin, count, directory_with, lunch_poll, setup_db, two_by_two, voter};
use pollx_core::ExErrorKind;
use pollx_store::repo::access;
use pollx_store::repo::reconcile::{delete_poll, upsert_poll};
use uuid::Uuid;

#[test]
fn test_grant_and_resolve_by_token() {
    let mut conn = setup_db();
    let admin = admin();
    let guest = voter("Guest");
    let poll = lunch_poll(&admin);
    upsert_poll(&mut conn, &poll).unwrap();

    let granted = access::grant(&conn, &guest, poll.id()).unwrap();
    let directory = directory_with(&[&admin, &guest]);
    let resolved = access::get_by_token(&conn, &directory, granted.token.expose()).unwrap();

    assert_eq!(resolved, granted);
    assert_eq!(resolved.user, guest);
    assert_eq!(resolved.poll_id, poll.id());
}

#[test]
fn test_regrant_returns_existing_token() {
    let mut conn = setup_db();
    let guest = voter("Guest");
    let poll = lunch_poll(&admin());
    upsert_poll(&mut conn, &poll).unwrap();

    let first = access::grant(&conn, &guest, poll.id()).unwrap();
    let second = access::grant(&conn, &guest, poll.id()).unwrap();

    assert_eq!(first.token, second.token);
    assert_eq!(count(&conn, "access_grants"), 1);
}

#[test]
fn test_grant_on_unknown_poll_is_not_found() {
    let conn = setup_db();
    let err = access::grant(&conn, &voter("Guest"), Uuid::now_v7()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_unknown_token_does_not_echo_token() {
    let conn = setup_db();
    let directory = directory_with(&[]);
    let err = access::get_by_token(&conn, &directory, "secret-token-value").unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.to_string().contains("secret-token-value"));
}

#[test]
fn test_list_and_list_as_admin() {
    let mut conn = setup_db();
    let owner = admin();
    let other_admin = voter("Other");
    let (ann, bo) = (voter("Ann"), voter("Bo"));
    let owned = lunch_poll(&owner);
    let foreign = two_by_two(&other_admin);
    upsert_poll(&mut conn, &owned).unwrap();
    upsert_poll(&mut conn, &foreign).unwrap();

    access::grant(&conn, &ann, owned.id()).unwrap();
    access::grant(&conn, &bo, owned.id()).unwrap();
    access::grant(&conn, &ann, foreign.id()).unwrap();

    let directory = directory_with(&[&owner, &other_admin, &ann, &bo]);
    let on_owned = access::list(&conn, &directory, owned.id()).unwrap();
    assert_eq!(on_owned.len(), 2);

    let administered = access::list_as_admin(&conn, &directory, owner.id).unwrap();
    assert_eq!(administered.len(), 2);
    assert!(administered.iter().all(|a| a.poll_id == owned.id()));
}

#[test]
fn test_revoke() {
    let mut conn = setup_db();
    let guest = voter("Guest");
    let poll = lunch_poll(&admin());
    upsert_poll(&mut conn, &poll).unwrap();
    access::grant(&conn, &guest, poll.id()).unwrap();

    access::revoke(&conn, guest.id, poll.id()).unwrap();
    assert_eq!(count(&conn, "access_grants"), 0);

    let err = access::revoke(&conn, guest.id, poll.id()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_delete_poll_removes_its_grants() {
    let mut conn = setup_db();
    let poll = lunch_poll(&admin());
    upsert_poll(&mut conn, &poll).unwrap();
    access::grant(&conn, &voter("Ann"), poll.id()).unwrap();
    access::grant(&conn, &voter("Bo"), poll.id()).unwrap();

    delete_poll(&mut conn, poll.id()).unwrap();
    assert_eq!(count(&conn, "access_grants"), 0);
    assert_eq!(count(&conn, "polls"), 0);
}
