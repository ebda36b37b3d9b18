//! Behaviour every `TrustStore` backend must share. The PEM directory store
//! runs on real files; the tool-driven stores run behind fakes that keep
//! state the way the real tools do.

mod common;

use common::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use trustctl_core::{find_removable, TrustError, Whitelist, WhitelistItem};
use trustctl_store::platform::keychain::SYSTEM_KEYCHAINS;
use trustctl_store::platform::{JavaStore, KeychainStore, NssStore, WindowsStore};
use trustctl_store::{BackupArea, Session, StoreState, TrustStore};
use walkdir::WalkDir;

fn fingerprints(store: &dyn TrustStore) -> BTreeSet<String> {
    store
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.fingerprint)
        .collect()
}

/// Relative path to contents for every file under `dir`.
fn tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().display().to_string();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn keep_three() -> Whitelist {
    Whitelist::new(vec![
        WhitelistItem::fingerprint("b2b11f74d42446e0"),
        WhitelistItem::fingerprint("9BCD3181278EEB06"),
        WhitelistItem::issuer_common_name("DigiCert"),
    ])
}

fn resolver_agrees_with_listing(store: &dyn TrustStore, _area: &BackupArea) {
    let snapshot = store.list().unwrap();
    let whitelist = keep_three();

    let removable: BTreeSet<&str> = find_removable(&snapshot, &whitelist)
        .into_iter()
        .map(|c| c.fingerprint.as_str())
        .collect();
    let expected: BTreeSet<&str> = snapshot
        .iter()
        .filter(|c| !whitelist.allows(c))
        .map(|c| c.fingerprint.as_str())
        .collect();
    assert_eq!(removable, expected);
    assert_eq!(removable.len(), 3);

    assert_eq!(find_removable(&snapshot, &Whitelist::default()).len(), snapshot.len());
    assert!(find_removable(&[], &whitelist).is_empty());
}

fn remove_requires_backup(store: &dyn TrustStore, area: &BackupArea) {
    let before = fingerprints(store);
    let mut session = Session::new(store, area);

    let err = session.remove(&keep_three()).unwrap_err();
    assert!(matches!(err, TrustError::NoBackup { .. }), "{err}");
    assert_eq!(session.state(), StoreState::Unmodified);
    assert_eq!(fingerprints(store), before);
}

fn backup_remove_restore_round_trips(store: &dyn TrustStore, area: &BackupArea) {
    let before = fingerprints(store);
    let mut session = Session::new(store, area);

    session.backup().unwrap();
    session.remove(&keep_three()).unwrap();
    assert_eq!(store.list().unwrap().len(), 3);

    session.restore().unwrap();
    assert_eq!(fingerprints(store), before);
}

fn repeated_backup_is_equivalent(store: &dyn TrustStore, area: &BackupArea) {
    let mut session = Session::new(store, area);

    let first = session.backup().unwrap().clone();
    let first_payload = tree(&first.payload());
    let second = session.backup().unwrap().clone();

    assert_eq!(first.store, second.store);
    assert_eq!(first.fingerprints, second.fingerprints);
    assert_eq!(tree(&second.payload()), first_payload);
}

fn whitelist_then_restore_counts(store: &dyn TrustStore, area: &BackupArea) {
    let original = store.list().unwrap().len();
    let whitelist = Whitelist::new(vec![
        WhitelistItem::fingerprint(STARFIELD_SHA256),
        WhitelistItem::fingerprint(&GLOBALSIGN_SHA256[..8]),
    ]);

    let mut session = Session::new(store, area);
    session.ensure_backup().unwrap();
    let report = session.remove(&whitelist).unwrap();
    assert_eq!(report.before, original);
    assert_eq!(report.retained, 2);
    assert!(report.removed.iter().any(|c| c.fingerprint == ROGUE_SHA256));
    assert_eq!(store.list().unwrap().len(), 2);

    // A later invocation restores from disk.
    let mut later = Session::new(store, area);
    later.restore().unwrap();
    assert_eq!(store.list().unwrap().len(), original);
}

fn restore_without_backup_fails_untouched(store: &dyn TrustStore, area: &BackupArea) {
    let before = fingerprints(store);
    let mut session = Session::new(store, area);

    let err = session.restore().unwrap_err();
    assert!(matches!(err, TrustError::NoBackupFound { .. }), "{err}");
    assert_eq!(fingerprints(store), before);
}

macro_rules! contract {
    ($module:ident, |$tmp:ident| $setup:expr) => {
        contract!(@each $module, |$tmp| $setup;
            resolver_agrees_with_listing,
            remove_requires_backup,
            backup_remove_restore_round_trips,
            repeated_backup_is_equivalent,
            whitelist_then_restore_counts,
            restore_without_backup_fails_untouched,
        );
    };
    (@each $module:ident, |$tmp:ident| $setup:expr; $($name:ident),* $(,)?) => {
        mod $module {
            use super::*;
            $(
                #[test]
                fn $name() {
                    let $tmp = tempfile::tempdir().unwrap();
                    let area = BackupArea::new($tmp.path().join("backups"));
                    let store = $setup;
                    super::$name(&store, &area);
                }
            )*
        }
    };
}

contract!(pem_dir_store, |tmp| pem_dir(tmp.path(), ALL));

contract!(windows_store, |tmp| WindowsStore::root(FakeWindows::with(ALL)));

contract!(keychain_store, |tmp| KeychainStore::system(FakeKeychain::with(&[
    (SYSTEM_KEYCHAINS[0], &ALL[3..]),
    (SYSTEM_KEYCHAINS[1], &ALL[..3]),
])));

contract!(nss_store, |tmp| {
    let db = tmp.path().join("nssdb");
    FakeCertutil::seed(&db, ALL);
    NssStore::new(db, FakeCertutil::default())
});

contract!(java_store, |tmp| {
    let keystore = tmp.path().join("cacerts");
    FakeKeytool::seed(&keystore, ALL);
    JavaStore::new(keystore, FakeKeytool)
});

#[test]
fn windows_restore_reports_refused_certificates() {
    let tmp = tempfile::tempdir().unwrap();
    let fake = FakeWindows::with(ALL);
    let store = WindowsStore::root(&fake);
    let area = BackupArea::new(tmp.path());

    let mut session = Session::new(&store, &area);
    session.backup().unwrap();
    session.remove(&keep_three()).unwrap();
    assert_eq!(fake.len(), 3);

    fake.refuse(ROGUE);
    match session.restore().unwrap_err() {
        TrustError::PartialRestore { store, failed } => {
            assert_eq!(store, "windows");
            assert_eq!(failed.len(), 1);
            assert!(failed[0].starts_with(ROGUE_SHA256), "{failed:?}");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Everything else came back.
    assert_eq!(fake.len(), ALL.len() - 1);
}

#[test]
fn windows_remove_addresses_thumbprints() {
    let fake = FakeWindows::with(&[STARFIELD, ROGUE]);
    let store = WindowsStore::root(&fake);
    let certs = store.list().unwrap();
    let rogue: Vec<_> = certs.iter().filter(|c| c.fingerprint == ROGUE_SHA256).collect();

    store.remove(&rogue).unwrap();
    assert!(fake
        .calls()
        .contains(&"certutil -delstore Root cb45463688f2120ec21d15fe520acbb76fd4def1".to_string()));
    assert_eq!(fake.len(), 1);
}

#[test]
fn keychain_restore_reports_refused_certificates() {
    let tmp = tempfile::tempdir().unwrap();
    let fake = FakeKeychain::with(&[(SYSTEM_KEYCHAINS[1], ALL)]);
    let store = KeychainStore::system(&fake);
    let area = BackupArea::new(tmp.path());

    let mut session = Session::new(&store, &area);
    session.backup().unwrap();
    session.remove(&keep_three()).unwrap();
    assert!(!fake.holds(SYSTEM_KEYCHAINS[1], ROGUE));

    fake.refuse(ROGUE);
    match session.restore().unwrap_err() {
        TrustError::PartialRestore { store, failed } => {
            assert_eq!(store, "keychain");
            assert_eq!(failed.len(), 1);
            assert!(failed[0].starts_with(&format!("{ROGUE_SHA256} (")), "{failed:?}");
            assert!(failed[0].contains("Totally Legit Root CA"), "{failed:?}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fake.holds(SYSTEM_KEYCHAINS[1], SHADY));
    assert_eq!(store.list().unwrap().len(), ALL.len() - 1);
}

#[test]
fn keychain_restore_checks_presence_per_keychain() {
    let tmp = tempfile::tempdir().unwrap();
    let system: &[&[u8]] = &[ROGUE];
    let roots: &[&[u8]] = &[STARFIELD, ROGUE];
    let fake = FakeKeychain::with(&[(SYSTEM_KEYCHAINS[0], system), (SYSTEM_KEYCHAINS[1], roots)]);
    let store = KeychainStore::system(&fake);
    let area = BackupArea::new(tmp.path());

    let mut session = Session::new(&store, &area);
    session.backup().unwrap();

    let certs = store.list().unwrap();
    let in_system: Vec<_> = certs
        .iter()
        .filter(|c| c.fingerprint == ROGUE_SHA256 && c.source == SYSTEM_KEYCHAINS[0])
        .collect();
    store.remove(&in_system).unwrap();
    assert!(!fake.holds(SYSTEM_KEYCHAINS[0], ROGUE));

    session.restore().unwrap();
    assert!(fake.holds(SYSTEM_KEYCHAINS[0], ROGUE));
    assert!(fake.holds(SYSTEM_KEYCHAINS[1], ROGUE));
}

#[test]
fn nss_refuses_nickname_shared_with_a_kept_certificate() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("nssdb");
    FakeCertutil::seed_rows(&db, &[("corp", STARFIELD), ("corp", ROGUE), ("other", GLOBALSIGN)]);
    let fake = FakeCertutil::default();
    let store = NssStore::new(&db, &fake);
    let area = BackupArea::new(tmp.path().join("backups"));
    let before = FakeCertutil::rows(&db);

    let mut session = Session::new(&store, &area);
    session.backup().unwrap();
    let keep_starfield = Whitelist::new(vec![WhitelistItem::fingerprint(STARFIELD_SHA256)]);
    match session.remove(&keep_starfield).unwrap_err() {
        TrustError::AmbiguousEntry { entry, .. } => assert_eq!(entry, "corp"),
        other => panic!("unexpected error: {other}"),
    }

    assert!(fake.deletes().is_empty());
    assert_eq!(FakeCertutil::rows(&db), before);
}

#[test]
fn nss_empties_a_nickname_holding_two_removable_certificates() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("nssdb");
    FakeCertutil::seed_rows(&db, &[("corp", ROGUE), ("keep", STARFIELD), ("corp", SHADY)]);
    let fake = FakeCertutil::default();
    let store = NssStore::new(&db, &fake);
    let area = BackupArea::new(tmp.path().join("backups"));

    let mut session = Session::new(&store, &area);
    session.backup().unwrap();
    let keep_starfield = Whitelist::new(vec![WhitelistItem::fingerprint(STARFIELD_SHA256)]);
    let report = session.remove(&keep_starfield).unwrap();
    assert_eq!(report.removed.len(), 2);
    assert_eq!(fake.deletes(), ["corp", "corp"]);
    assert_eq!(fingerprints(&store), BTreeSet::from([STARFIELD_SHA256.to_string()]));

    session.restore().unwrap();
    assert_eq!(FakeCertutil::rows(&db).len(), 3);
}

#[test]
fn java_remove_deletes_by_alias() {
    let tmp = tempfile::tempdir().unwrap();
    let keystore = tmp.path().join("cacerts");
    FakeKeytool::seed(&keystore, &[STARFIELD, ROGUE]);
    let store = JavaStore::new(&keystore, FakeKeytool);

    let certs = store.list().unwrap();
    assert!(certs.iter().any(|c| c.source == "totallylegitrootca"));
    let rogue: Vec<_> = certs.iter().filter(|c| c.fingerprint == ROGUE_SHA256).collect();
    store.remove(&rogue).unwrap();
    assert_eq!(fingerprints(&store), BTreeSet::from([STARFIELD_SHA256.to_string()]));
}
