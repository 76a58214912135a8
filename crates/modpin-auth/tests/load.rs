use modpin_auth::{AuthError, CredentialStore};
use tempfile::tempdir;

#[test]
fn missing_file_is_empty_store() {
    let dir = tempdir().unwrap();
    let store = CredentialStore::load(dir.path().join("absent")).unwrap();
    assert!(store.is_empty());
    assert!(store.lookup("any.example").is_none());
}

#[test]
fn directory_is_a_read_error() {
    let dir = tempdir().unwrap();
    let result = CredentialStore::load(dir.path());
    assert!(matches!(result, Err(AuthError::Read { .. })));
}

#[test]
fn default_only_answers_every_host() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("netrc");
    std::fs::write(&path, "default login bot password token\n").unwrap();

    let store = CredentialStore::load(&path).unwrap();
    for host in ["github.com", "git.internal", "example.org"] {
        let cred = store.lookup(host).expect("default entry");
        assert!(cred.is_default());
        assert_eq!(cred.login, "bot");
        assert_eq!(cred.secret, "token");
    }
}

#[test]
fn quoted_secret_round_trips_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("netrc");
    std::fs::write(
        &path,
        "machine git.internal\n\tlogin \"svc account\"\n\tpassword \"p a s s\"\n",
    )
    .unwrap();

    let store = CredentialStore::load(&path).unwrap();
    let cred = store.lookup("git.internal").unwrap();
    assert_eq!(cred.login, "svc account");
    assert_eq!(cred.secret, "p a s s");
}
