use std::fs;
use std::path::{Path, PathBuf};

use passview::command::HostEnv;
use passview::config::{Backend, BackendConfig};
use passview::session::Session;
use passview::PassviewError;

fn session(store: &Path) -> Session {
    let config = BackendConfig {
        backend: Backend::Host,
        custom_cmd: "pass".to_owned(),
        store_path: store.to_path_buf(),
        software_fallback: true,
    };
    let host = HostEnv {
        uid: 1000,
        gid: 1000,
        gnupg_dir: None,
    };

    Session::new(config, host)
}

fn populate(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
}

fn names(session: &Session) -> Vec<String> {
    session
        .visible_entries()
        .into_iter()
        .map(|entry| entry.name.clone())
        .collect()
}

#[test]
fn refresh_loads_the_index() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), &["bank.gpg", "email/gmail.gpg", "email/work.gpg"]);
    let mut session = session(dir.path());

    assert!(session.index().is_empty());
    assert_eq!(session.generation(), 0);

    assert_eq!(session.refresh().unwrap(), 3);
    assert_eq!(session.generation(), 1);
    assert_eq!(names(&session), ["bank", "email/gmail", "email/work"]);
}

#[test]
fn refresh_picks_up_new_entries() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), &["bank.gpg"]);
    let mut session = session(dir.path());
    session.refresh().unwrap();

    populate(dir.path(), &["social/site.gpg"]);
    assert_eq!(session.refresh().unwrap(), 2);
    assert_eq!(session.generation(), 2);
}

#[test]
fn failed_refresh_leaves_an_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), &["bank.gpg"]);
    let mut session = session(dir.path());
    session.refresh().unwrap();

    let missing: PathBuf = dir.path().join("gone");
    let mut config = session.config().clone();
    config.store_path = missing;

    assert!(matches!(
        session.set_config(config),
        Err(PassviewError::StoreDoesntExist(_))
    ));
    assert!(session.index().is_empty());
    assert!(session.visible_entries().is_empty());
    assert_eq!(session.generation(), 2);
}

#[test]
fn query_filters_visible_entries() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), &["bank.gpg", "email/gmail.gpg", "email/work.gpg"]);
    let mut session = session(dir.path());
    session.refresh().unwrap();

    session.set_query("MAIL");
    assert_eq!(session.query(), "MAIL");
    assert_eq!(names(&session), ["email/gmail", "email/work"]);

    session.set_query("");
    assert_eq!(names(&session).len(), 3);
}

#[test]
fn folder_navigation() {
    let dir = tempfile::tempdir().unwrap();
    populate(
        dir.path(),
        &["bank.gpg", "email/gmail.gpg", "email/old/yahoo.gpg"],
    );
    let mut session = session(dir.path());
    session.refresh().unwrap();

    assert!(session.path().is_empty());
    assert!(!session.enter("bank"));
    assert!(!session.enter("nowhere"));

    assert!(session.enter("email"));
    assert!(session.enter("old"));
    assert_eq!(session.path(), ["email", "old"]);
    assert_eq!(session.entry_name("yahoo"), "email/old/yahoo");
    assert!(session.folder().files.contains("yahoo"));

    session.nav_to(1);
    assert_eq!(session.path(), ["email"]);
    assert_eq!(session.entry_name("gmail"), "email/gmail");

    assert!(session.up());
    assert!(!session.up());
    assert_eq!(session.entry_name("bank"), "bank");
}

#[test]
fn refresh_returns_to_the_root_folder() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), &["email/gmail.gpg"]);
    let mut session = session(dir.path());
    session.refresh().unwrap();

    assert!(session.enter("email"));
    session.refresh().unwrap();
    assert!(session.path().is_empty());
}

#[test]
fn invocations_use_the_session_config() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(dir.path());

    let reveal = session.reveal_invocation("email/gmail").unwrap();
    assert_eq!(reveal.program, "pass");
    assert_eq!(reveal.args, ["show", "email/gmail"]);

    let clone = session.clone_invocation("https://example.com/pass.git");
    assert_eq!(
        clone.args,
        [
            "clone".to_owned(),
            "https://example.com/pass.git".to_owned(),
            dir.path().to_string_lossy().into_owned(),
        ]
    );
}
