mod common;

use common::{FakeProvisioner, TestHost, shadow_with_alice};
use passwd_srv::crypt::PasswordHasher;
use passwd_srv::protocol::{Request, ResultCode};

#[test]
fn test_change_password_succeeds() {
    let host = TestHost::new(&shadow_with_alice(), "alice");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));
    let store = host.store();
    let before = store.find("alice").unwrap().unwrap();
    assert!(before.hash.starts_with("$1$oldsalt$"));

    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "newpw123", &host.caller));
    assert_eq!(code, ResultCode::Success);

    let after = store.find("alice").unwrap().unwrap();
    assert!(after.hash.starts_with("$6$"));
    assert!(PasswordHasher::verify("newpw123", &after.hash));
    assert!(pwhash::unix::verify("newpw123", &after.hash));
    assert!(!PasswordHasher::verify("oldpw", &after.hash));
    assert_eq!(after.with_hash(&before.hash), before);

    // neighbours untouched
    assert_eq!(store.find("alicia").unwrap().unwrap().hash, "!");
    assert_eq!(store.find("root").unwrap().unwrap().hash, "*");
}

#[test]
fn test_change_password_unknown_user_leaves_store_alone() {
    let shadow = shadow_with_alice();
    let host = TestHost::new(&shadow, "bob");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::change_password("bob", "x", "y", &host.caller));
    assert_eq!(code, ResultCode::UserNotFound);
    assert_eq!(host.shadow_contents(), shadow);
}

#[test]
fn test_change_password_wrong_old_password() {
    let shadow = shadow_with_alice();
    let host = TestHost::new(&shadow, "alice");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw!", "newpw123", &host.caller));
    assert_eq!(code, ResultCode::PasswordMismatch);
    assert_eq!(host.shadow_contents(), shadow);
}

#[test]
fn test_change_password_by_admin() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "fromops", &host.caller));
    assert_eq!(code, ResultCode::Success);
    let record = host.store().find("alice").unwrap().unwrap();
    assert!(PasswordHasher::verify("fromops", &record.hash));
}

#[test]
fn test_other_callers_are_denied() {
    let shadow = shadow_with_alice();
    for caller in ["mallory", "ali", "alice2", "opsx"] {
        let host = TestHost::new(&shadow, caller);
        let provisioner = FakeProvisioner::new(&host);
        let dispatcher = host.dispatcher(provisioner.clone());

        let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "stolen", &host.caller));
        assert_eq!(code, ResultCode::InvalidUser, "caller {}", caller);

        let code = dispatcher.dispatch(Request::delete_user("alice", &host.caller));
        assert_eq!(code, ResultCode::InvalidUser, "caller {}", caller);

        assert_eq!(host.shadow_contents(), shadow);
        assert!(provisioner.calls().is_empty());
    }
}

#[test]
fn test_add_existing_user_never_provisions() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let provisioner = FakeProvisioner::new(&host);
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("alice", "pw", &host.caller));
    assert_eq!(code, ResultCode::UserExists);
    assert!(provisioner.calls().is_empty());
}

#[test]
fn test_add_user_succeeds() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let provisioner = FakeProvisioner::new(&host);
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("carol", "carolpw", &host.caller));
    assert_eq!(code, ResultCode::Success);
    assert_eq!(provisioner.calls(), vec!["provision carol"]);

    let record = host.store().find("carol").unwrap().unwrap();
    assert!(PasswordHasher::verify("carolpw", &record.hash));
    assert_eq!(record.last_change, "19000");
}

#[test]
fn test_add_user_rolls_back_when_password_not_stored() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let mut provisioner = FakeProvisioner::new(&host);
    provisioner.write_record = false;
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("carol", "carolpw", &host.caller));
    assert_eq!(code, ResultCode::PasswordUpdateFailed);
    assert_eq!(provisioner.calls(), vec!["provision carol", "deprovision carol"]);
    assert!(host.store().find("carol").unwrap().is_none());
}

#[test]
fn test_add_user_rolls_back_on_unsupported_method() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    std::fs::write(&host.login_defs, "ENCRYPT_METHOD BLOWFISH\n").unwrap();
    let provisioner = FakeProvisioner::new(&host);
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("carol", "carolpw", &host.caller));
    assert_eq!(code, ResultCode::PasswordUpdateFailed);
    assert_eq!(provisioner.calls(), vec!["provision carol", "deprovision carol"]);
    assert!(host.store().find("carol").unwrap().is_none());
}

#[test]
fn test_add_user_provisioning_failure() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let mut provisioner = FakeProvisioner::new(&host);
    provisioner.fail_add = true;
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("carol", "carolpw", &host.caller));
    assert_eq!(code, ResultCode::UserAddFailed);
    assert_eq!(provisioner.calls(), vec!["provision carol"]);
}

#[test]
fn test_delete_user_succeeds() {
    let host = TestHost::new(&shadow_with_alice(), "alice");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::delete_user("alice", &host.caller));
    assert_eq!(code, ResultCode::Success);
    assert!(host.store().find("alice").unwrap().is_none());
    assert!(host.store().find("alicia").unwrap().is_some());
}

#[test]
fn test_delete_unknown_user() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let provisioner = FakeProvisioner::new(&host);
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::delete_user("ali", &host.caller));
    assert_eq!(code, ResultCode::UserNotFound);
    assert!(provisioner.calls().is_empty());
}

#[test]
fn test_delete_user_that_survives_removal() {
    let host = TestHost::new(&shadow_with_alice(), "ops");
    let mut provisioner = FakeProvisioner::new(&host);
    provisioner.keep_on_delete = true;
    let dispatcher = host.dispatcher(provisioner);

    let code = dispatcher.dispatch(Request::delete_user("alice", &host.caller));
    assert_eq!(code, ResultCode::UserDeleteFailed);
}

#[test]
fn test_invalid_params_rejected_before_side_effects() {
    let shadow = shadow_with_alice();
    let host = TestHost::new(&shadow, "ops");
    let provisioner = FakeProvisioner::new(&host);
    let dispatcher = host.dispatcher(provisioner.clone());

    let code = dispatcher.dispatch(Request::add_user("eve:0", "pw", &host.caller));
    assert_eq!(code, ResultCode::InvalidParam);
    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "a\nroot::0:0:::::", &host.caller));
    assert_eq!(code, ResultCode::InvalidParam);

    assert!(provisioner.calls().is_empty());
    assert_eq!(host.shadow_contents(), shadow);
}

#[test]
fn test_missing_shadow_database_is_fatal() {
    let host = TestHost::new("", "alice");
    std::fs::remove_file(&host.shadow).unwrap();
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "new", &host.caller));
    assert_eq!(code, ResultCode::Fatal);
}

#[test]
fn test_refresh_picks_up_new_method() {
    let host = TestHost::new(&shadow_with_alice(), "alice");
    let dispatcher = host.dispatcher(FakeProvisioner::new(&host));

    let code = dispatcher.dispatch(Request::change_password("alice", "oldpw", "second", &host.caller));
    assert_eq!(code, ResultCode::Success);
    assert!(host.store().find("alice").unwrap().unwrap().hash.starts_with("$6$"));

    std::fs::write(&host.login_defs, "ENCRYPT_METHOD SHA256\n").unwrap();
    let code = dispatcher.dispatch(Request::change_password("alice", "second", "third", &host.caller));
    assert_eq!(code, ResultCode::Success);
    assert!(host.store().find("alice").unwrap().unwrap().hash.starts_with("$6$"));

    dispatcher.refresh();
    let code = dispatcher.dispatch(Request::change_password("alice", "third", "fourth", &host.caller));
    assert_eq!(code, ResultCode::Success);
    let record = host.store().find("alice").unwrap().unwrap();
    assert!(record.hash.starts_with("$5$"));
    assert!(PasswordHasher::verify("fourth", &record.hash));
}
